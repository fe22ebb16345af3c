//! A minimal resource directory-style server: `POST /rd` registers a new
//! child resource that can be read back with `GET` and removed with
//! `DELETE`.
//!
//! Run with `cargo run --example server`.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use coapd::message::response;
use coapd::resource::Resource;
use coapd::server::{Server, INSECURE_PORT};

fn main() -> std::io::Result<()> {
  simple_logger::SimpleLogger::new().init().expect("logger already initialized");

  let server = Arc::new(Server::bind(INSECURE_PORT)?);
  let next_id = Arc::new(AtomicU32::new(1));

  {
    let server = Arc::clone(&server);
    let next_id = Arc::clone(&next_id);
    server.resources().add(Resource::new("/rd").post(move |req| {
                                                  let id = next_id.fetch_add(1, Ordering::SeqCst);
                                                  let path = format!("/rd/{id:x}");

                                                  // The dispatcher releases its read lock on the
                                                  // registry before invoking this handler, so it's
                                                  // safe to register (and, below, remove) a
                                                  // resource from inside a handler invocation.
                                                  let server_for_delete = Arc::clone(&server);
                                                  let path_for_delete = path.clone();
                                                  server.resources().add(Resource::new(path.as_str()).get(|req| {
                                                                                          Ok(response::content(req))
                                                                                        })
                                                                                        .delete(move |req| {
                                                                                          server_for_delete.resources()
                                                                                                            .remove(&path_for_delete);
                                                                                          Ok(response::deleted(req))
                                                                                        }));

                                                  let mut resp = response::created(req);
                                                  resp.options.add(coapd::option::LOCATION_PATH.number,
                                                                    path.trim_start_matches('/').as_bytes().to_vec());
                                                  Ok(resp)
                                                }));
  }

  server.resources().add(Resource::new("/.well-known/core").get(|req| {
                                                                let mut resp = response::content(req);
                                                                resp.payload = Some(b"</rd>;rt=\"core.rd\"".to_vec());
                                                                Ok(resp)
                                                              }));

  log::info!("serving CoAP on 0.0.0.0:{INSECURE_PORT}");
  server.run()
}
