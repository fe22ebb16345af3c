//! The UDP listener: read loop, decode, validate, route, serialize, send.
//!
//! Grounded on `examples/original_source/server.go`'s `ListenOn`/
//! `routeRequest`, restructured in the blocking-read-loop style of the
//! teacher's `kwap/src/blocking/server.rs` (`Server::start`), but concrete
//! — one `std::net::UdpSocket`, no `Platform` generic — since this spec
//! targets a single deployment shape (std, UDP, no DTLS in the core).

use std::fmt;
use std::net::{SocketAddr, UdpSocket};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::message::{code, response, Message};
use crate::resource::ResourceRegistry;
use crate::wire::hex::hex_dump;

/// The well-known CoAP port (RFC 7252 §12.3, "coap" service name).
pub const INSECURE_PORT: u16 = 5683;
/// The well-known CoAP-over-DTLS port ("coaps"); DTLS itself is outside
/// this crate's scope (see `SPEC_FULL.md` §1).
pub const SECURE_PORT: u16 = 5684;

/// The dispatcher reads each datagram into a buffer this large; larger
/// datagrams are truncated by the socket read itself (RFC 7252 doesn't
/// mandate a maximum, but §4.6 recommends implementations bound it).
const MAX_PACKET_SIZE: usize = 2048;

/// RFC 7252 §4.8 retransmission/congestion tuning knobs.
///
/// These are carried by the server for a future reliability state
/// machine (retransmission, deduplication, congestion control) and are
/// not consumed anywhere in the current dispatch path — see the open
/// question in `SPEC_FULL.md` §9.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransmissionParameters {
  pub ack_timeout: Duration,
  pub ack_random_factor: f64,
  pub max_retransmit: u32,
  pub n_start: u32,
  pub default_leisure: Duration,
  pub probing_rate: u32,
}

impl Default for TransmissionParameters {
  fn default() -> Self {
    TransmissionParameters { ack_timeout: Duration::from_secs(2),
                             ack_random_factor: 1.5,
                             max_retransmit: 4,
                             n_start: 1,
                             default_leisure: Duration::from_secs(5),
                             probing_rate: 1 }
  }
}

impl fmt::Display for TransmissionParameters {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f,
           "{{ ack_timeout: {:?}, ack_random_factor: {}, max_retransmit: {}, n_start: {}, default_leisure: {:?}, probing_rate: {} }}",
           self.ack_timeout,
           self.ack_random_factor,
           self.max_retransmit,
           self.n_start,
           self.default_leisure,
           self.probing_rate)
  }
}

/// A CoAP server bound to one UDP socket.
pub struct Server {
  socket: UdpSocket,
  parameters: TransmissionParameters,
  registry: Arc<ResourceRegistry>,
}

impl Server {
  /// Bind to `port` on all interfaces with default transmission
  /// parameters.
  pub fn bind(port: u16) -> std::io::Result<Self> {
    Self::bind_config(port, TransmissionParameters::default())
  }

  /// Bind to `port` with explicit transmission parameters.
  pub fn bind_config(port: u16, parameters: TransmissionParameters) -> std::io::Result<Self> {
    let socket = UdpSocket::bind(("0.0.0.0", port))?;
    Ok(Server { socket, parameters, registry: Arc::new(ResourceRegistry::new()) })
  }

  /// The server's resource registry; add/remove resources here either
  /// before [`Server::run`] or from within a handler.
  pub fn resources(&self) -> &ResourceRegistry {
    &self.registry
  }

  /// The transmission parameters this server was configured with.
  pub fn parameters(&self) -> &TransmissionParameters {
    &self.parameters
  }

  /// Run the blocking read loop on the calling thread forever (until the
  /// socket errors, e.g. because it was shut down from another thread).
  pub fn run(&self) -> std::io::Result<()> {
    let mut buf = [0u8; MAX_PACKET_SIZE];
    log::info!("coapd listening on {}", self.socket.local_addr()?);

    loop {
      let (n, peer) = match self.socket.recv_from(&mut buf) {
        | Ok(ok) => ok,
        | Err(e) => {
          log::warn!("socket read failed: {e}");
          return Err(e);
        },
      };

      self.handle_datagram(&buf[..n], peer);
    }
  }

  /// Run the read loop, handing each datagram's processing to one of
  /// `workers` long-lived threads after it is read off the socket. Per
  /// `SPEC_FULL.md` §5, each worker owns only its own message and peer
  /// address; the resource registry and the (cloned) outbound socket are
  /// the only state shared across workers.
  pub fn run_threaded(self: Arc<Self>, workers: usize) -> std::io::Result<()> {
    assert!(workers > 0, "run_threaded requires at least one worker");

    let (tx, rx) = mpsc::channel::<(Vec<u8>, SocketAddr)>();
    let rx = Arc::new(std::sync::Mutex::new(rx));

    let handles: Vec<_> = (0..workers).map(|_| {
                                        let server = Arc::clone(&self);
                                        let rx = Arc::clone(&rx);
                                        thread::spawn(move || loop {
                                          let next = rx.lock().unwrap_or_else(|e| e.into_inner()).recv();
                                          match next {
                                            | Ok((bytes, peer)) => server.handle_datagram(&bytes, peer),
                                            | Err(_) => return,
                                          }
                                        })
                                      })
                                      .collect();

    let mut buf = [0u8; MAX_PACKET_SIZE];
    log::info!("coapd listening on {} with {workers} workers",
               self.socket.local_addr()?);

    loop {
      let (n, peer) = match self.socket.recv_from(&mut buf) {
        | Ok(ok) => ok,
        | Err(e) => {
          log::warn!("socket read failed: {e}");
          drop(tx);
          for h in handles {
            let _ = h.join();
          }
          return Err(e);
        },
      };

      if tx.send((buf[..n].to_vec(), peer)).is_err() {
        break;
      }
    }

    Ok(())
  }

  fn handle_datagram(&self, bytes: &[u8], peer: SocketAddr) {
    log::trace!("received packet from {peer}:\n{}", hex_dump(bytes));

    let msg = match Message::decode_from(bytes, Some(peer)) {
      | Ok(msg) => msg,
      | Err(e) => {
        log::debug!("dropping unparseable datagram from {peer}: {e}");
        return;
      },
    };

    log::trace!("decoded message: {msg}");

    use crate::message::Type as MsgType;
    if matches!(msg.ty, MsgType::Acknowledgement | MsgType::Reset) {
      // Server-initiated transactions are out of scope for this core.
      return;
    }

    let resp = self.route(&msg);
    log::trace!("sending response: {resp}");

    if let Err(e) = self.socket.send_to(&resp.encode(), peer) {
      log::warn!("failed to send response to {peer}: {e}");
    }
  }

  fn route(&self, msg: &Message) -> Message {
    if msg.validate() != code::OK {
      return response::bad_request(msg);
    }

    let path = match msg.uri_path() {
      | Some(p) => p,
      | None => return response::bad_request(msg),
    };

    let method = match msg.code.method() {
      | Some(m) => m,
      | None => return response::bad_request(msg),
    };

    // `handler_for` clones the matched handler out from behind a read lock
    // and releases that lock before returning, so the handler below is
    // free to call `add`/`remove` on this same registry (e.g. a resource
    // directory registering or dropping a child resource) without
    // deadlocking against itself.
    let handler = match self.registry.handler_for(&path, method) {
      | None => return response::not_found(msg),
      | Some(None) => return response::method_not_allowed(msg),
      | Some(Some(handler)) => handler,
    };

    match (handler.as_ref())(msg) {
      | Ok(resp) => resp,
      | Err(e) => {
        log::debug!("handler for {path} errored: {e}");
        response::internal_server_error(msg)
      },
    }
  }
}
