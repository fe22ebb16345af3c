//! A path-addressed resource and its registry.
//!
//! Grounded on `examples/original_source/resource.go`'s `Resource` struct
//! and `server.go`'s `AddResource`/`RemoveResource`/`RemoveResourceByPath`,
//! restructured around a [`std::sync::RwLock`] per `SPEC_FULL.md` §5 ("never
//! a plain mutable map under concurrent access") — the original's bare
//! `map[string]*Resource` has no synchronization at all.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::message::Message;

/// An error returned by a resource handler. The dispatcher turns this
/// into a `5.00 Internal Server Error` response.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// A resource handler: takes the fully-decoded request and returns either
/// the response to send, or an error.
pub type Handler = dyn Fn(&Message) -> Result<Message, HandlerError> + Send + Sync;

/// A path plus its per-method handlers. A `None` handler for the method
/// the request arrived with produces a `4.05 Method Not Allowed`.
///
/// Handlers are kept behind an `Arc` rather than a `Box` so the registry
/// can clone one out and drop its read lock before the handler runs — a
/// resource directory-style handler that registers or removes a resource
/// from within its own invocation (see `SPEC_FULL.md` §5 and §8 scenario
/// 6) must not still be holding that lock when it calls back into
/// [`ResourceRegistry::add`]/[`ResourceRegistry::remove`].
#[derive(Default)]
pub struct Resource {
  path: String,
  on_get: Option<Arc<Handler>>,
  on_post: Option<Arc<Handler>>,
  on_put: Option<Arc<Handler>>,
  on_delete: Option<Arc<Handler>>,
}

impl fmt::Debug for Resource {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Resource")
     .field("path", &self.path)
     .field("on_get", &self.on_get.is_some())
     .field("on_post", &self.on_post.is_some())
     .field("on_put", &self.on_put.is_some())
     .field("on_delete", &self.on_delete.is_some())
     .finish()
  }
}

impl Resource {
  /// Begin building a resource registered at `path`.
  ///
  /// # Panics
  /// Panics if `path` is empty or does not start with `/`, matching the
  /// registry invariant in `SPEC_FULL.md` §3.
  pub fn new(path: impl Into<String>) -> Self {
    let path = path.into();
    assert!(path.starts_with('/') && !path.is_empty(),
            "resource path must be non-empty and start with '/', got {path:?}");
    Resource { path, ..Default::default() }
  }

  /// The path this resource is registered under.
    pub fn path(&self) -> &str {
    &self.path
  }

  /// Register a GET handler.
  pub fn get(mut self, f: impl Fn(&Message) -> Result<Message, HandlerError> + Send + Sync + 'static) -> Self {
    self.on_get = Some(Arc::new(f));
    self
  }

  /// Register a POST handler.
  pub fn post(mut self, f: impl Fn(&Message) -> Result<Message, HandlerError> + Send + Sync + 'static) -> Self {
    self.on_post = Some(Arc::new(f));
    self
  }

  /// Register a PUT handler.
  pub fn put(mut self, f: impl Fn(&Message) -> Result<Message, HandlerError> + Send + Sync + 'static) -> Self {
    self.on_put = Some(Arc::new(f));
    self
  }

  /// Register a DELETE handler.
  pub fn delete(mut self, f: impl Fn(&Message) -> Result<Message, HandlerError> + Send + Sync + 'static) -> Self {
    self.on_delete = Some(Arc::new(f));
    self
  }

  /// Clone out the handler registered for `method`, if any.
  pub(crate) fn handler(&self, method: crate::message::Method) -> Option<Arc<Handler>> {
    use crate::message::Method;
    match method {
      | Method::Get => self.on_get.clone(),
      | Method::Post => self.on_post.clone(),
      | Method::Put => self.on_put.clone(),
      | Method::Delete => self.on_delete.clone(),
    }
  }
}

/// The server's path -> [`Resource`] table.
///
/// Reads happen on every inbound datagram; writes happen rarely, usually
/// from inside a handler reacting to the request it was just given (e.g.
/// a Resource Directory's POST handler registering the path it was just
/// asked to track). The `RwLock` lets many concurrent dispatch workers
/// read the table while a write is serialized against both readers and
/// other writers.
#[derive(Default)]
pub struct ResourceRegistry {
  resources: RwLock<HashMap<String, Resource>>,
}

impl ResourceRegistry {
  /// Construct an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Register `resource`, overwriting any existing entry at the same path.
  pub fn add(&self, resource: Resource) {
    let mut resources = self.resources.write().unwrap_or_else(|e| e.into_inner());
    resources.insert(resource.path.clone(), resource);
  }

  /// Remove the resource at `path`, if any. No-op if absent.
  pub fn remove(&self, path: &str) {
    let mut resources = self.resources.write().unwrap_or_else(|e| e.into_inner());
    resources.remove(path);
  }

  /// Run `f` with the resource registered at `path`, if any is. Holds a
  /// read lock for the duration of `f`; `f` must be read-only (inspecting
  /// presence, cloning a handler out) and must not call back into
  /// [`ResourceRegistry::add`]/[`ResourceRegistry::remove`] on this same
  /// registry — `std::sync::RwLock` is not reentrant, so a write from
  /// inside `f` on the thread already holding this read guard deadlocks.
  /// Dispatch uses [`ResourceRegistry::handler_for`] instead, which clones
  /// the matched handler out and releases the lock before the handler
  /// itself runs, specifically so handlers are free to mutate the
  /// registry.
  pub fn with<R>(&self, path: &str, f: impl FnOnce(Option<&Resource>) -> R) -> R {
    let resources = self.resources.read().unwrap_or_else(|e| e.into_inner());
    f(resources.get(path))
  }

  /// Look up the resource at `path` and clone out the handler registered
  /// for `method`, if any, then release the read lock. Returns `None` if
  /// `path` isn't registered at all, `Some(None)` if it is registered but
  /// has no handler for `method`, and `Some(Some(handler))` otherwise.
  ///
  /// The returned handler is safe to invoke after this call returns even
  /// if invoking it adds to or removes from this same registry.
  pub(crate) fn handler_for(&self, path: &str, method: crate::message::Method) -> Option<Option<Arc<Handler>>> {
    let resources = self.resources.read().unwrap_or_else(|e| e.into_inner());
    resources.get(path).map(|r| r.handler(method))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  #[should_panic(expected = "must be non-empty")]
  fn rejects_empty_path() {
    Resource::new("");
  }

  #[test]
  #[should_panic(expected = "start with '/'")]
  fn rejects_path_without_leading_slash() {
    Resource::new("rd");
  }

  #[test]
  fn add_remove_lookup_round_trip() {
    let registry = ResourceRegistry::new();
    registry.add(Resource::new("/rd"));

    assert!(registry.with("/rd", |r| r.is_some()));
    assert!(registry.with("/nope", |r| r.is_none()));

    registry.remove("/rd");
    assert!(registry.with("/rd", |r| r.is_none()));
  }

  #[test]
  fn remove_is_noop_when_absent() {
    let registry = ResourceRegistry::new();
    registry.remove("/never-added");
  }

  #[test]
  fn add_overwrites_existing_entry() {
    let registry = ResourceRegistry::new();
    registry.add(Resource::new("/rd").get(|_| unreachable!()));
    registry.add(Resource::new("/rd"));

    registry.with("/rd", |r| assert!(r.unwrap().handler(crate::message::Method::Get).is_none()));
  }

  #[test]
  fn handler_for_distinguishes_missing_path_from_missing_handler() {
    let registry = ResourceRegistry::new();
    registry.add(Resource::new("/rd").get(|req| Ok(req.clone())));

    assert!(registry.handler_for("/nope", crate::message::Method::Get).is_none());
    assert_eq!(registry.handler_for("/rd", crate::message::Method::Post).unwrap().is_none(), true);
    assert!(registry.handler_for("/rd", crate::message::Method::Get).unwrap().is_some());
  }

  #[test]
  fn handler_invoked_after_handler_for_can_mutate_the_registry_without_deadlock() {
    let registry = Arc::new(ResourceRegistry::new());
    let inner = Arc::clone(&registry);
    registry.add(Resource::new("/rd").post(move |req| {
                                        inner.add(Resource::new("/rd/child"));
                                        Ok(req.clone())
                                      }));

    let handler = registry.handler_for("/rd", crate::message::Method::Post).unwrap().unwrap();
    let req = crate::message::builder::MessageBuilder::new().ty(crate::message::Type::Confirmable)
                                                             .code(crate::message::Code::new(0, 2))
                                                             .id(crate::message::Id(1))
                                                             .token(crate::message::Token(vec![]))
                                                             .build();
    (handler.as_ref())(&req).unwrap();

    assert!(registry.with("/rd/child", |r| r.is_some()));
  }
}
