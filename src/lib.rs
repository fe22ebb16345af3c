//! coapd — a server-side implementation of the Constrained Application
//! Protocol (RFC 7252).
//!
//! This crate decodes and encodes CoAP messages over UDP, dispatches
//! requests to user-registered [`resource::Resource`]s by path and
//! method, and builds well-formed responses via [`message::response`]'s
//! named constructors. It implements the core request/response model of
//! RFC 7252; reliability (retransmission, deduplication), observe, and
//! block-wise transfer are out of scope — see `SPEC_FULL.md` for the
//! full module and non-goal list.
//!
//! ```no_run
//! use coapd::message::response;
//! use coapd::resource::Resource;
//! use coapd::server::Server;
//!
//! # fn main() -> std::io::Result<()> {
//! let server = Server::bind(coapd::server::INSECURE_PORT)?;
//! server.resources().add(Resource::new("/hello").get(|req| Ok(response::content(req))));
//! server.run()
//! # }
//! ```

pub mod error;
pub mod message;
pub mod option;
pub mod resource;
pub mod server;
pub mod wire;

pub use message::Message;
pub use resource::{Resource, ResourceRegistry};
pub use server::Server;
