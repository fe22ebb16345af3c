//! The CoAP message model (RFC 7252 §3): header, token, options and
//! payload, plus decode/encode between this typed representation and raw
//! datagram bytes.
//!
//! Grounded on `examples/original_source/message.go`'s `Message` struct
//! and `decode`/`ToBytes` functions, and on the teacher's
//! `kwap_msg::alloc::Message` (same field set, same derive list).

pub mod builder;
mod opt_codec;
pub mod response;

use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;

use crate::error::DecodeError;
use crate::option::{self, ContentFormat};
use crate::wire::num;

/// Message type (RFC 7252 §3), 2 bits on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Type {
  /// Confirmable: the sender expects an acknowledgement.
  Confirmable,
  /// Non-confirmable: no acknowledgement expected.
  NonConfirmable,
  /// Acknowledgement, possibly piggy-backing a response.
  Acknowledgement,
  /// Reset: the message could not be processed.
  Reset,
}

impl Type {
  fn to_wire(self) -> u8 {
    match self {
      | Type::Confirmable => 0,
      | Type::NonConfirmable => 1,
      | Type::Acknowledgement => 2,
      | Type::Reset => 3,
    }
  }

  fn from_wire(b: u8) -> Self {
    match b & 0b11 {
      | 0 => Type::Confirmable,
      | 1 => Type::NonConfirmable,
      | 2 => Type::Acknowledgement,
      | _ => Type::Reset,
    }
  }
}

impl fmt::Display for Type {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      | Type::Confirmable => "CON",
      | Type::NonConfirmable => "NON",
      | Type::Acknowledgement => "ACK",
      | Type::Reset => "RST",
    };
    write!(f, "{s}")
  }
}

/// A request method, carried as the class-0 detail of [`Code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
  /// `GET` (0.01)
  Get,
  /// `POST` (0.02)
  Post,
  /// `PUT` (0.03)
  Put,
  /// `DELETE` (0.04)
  Delete,
}

/// Message code: a `(class, detail)` pair, wire form `class<<5 | detail`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Code {
  /// `0` request, `2` success, `4` client error, `5` server error.
  pub class: u8,
  /// Granular status within the class; always `0` for requests other than methods.
  pub detail: u8,
}

impl Code {
  /// Construct a code directly from its class and detail.
  pub const fn new(class: u8, detail: u8) -> Self {
    Code { class, detail }
  }

  /// `0.00`, the empty message code (used by pings).
  pub const EMPTY: Code = Code::new(0, 0);

  fn to_wire(self) -> u8 {
    (self.class << 5) | self.detail
  }

  fn from_wire(b: u8) -> Self {
    Code { class: b >> 5, detail: b & 0b0001_1111 }
  }

  /// If this code is a request method (class 0, nonzero detail), which one.
  pub fn method(self) -> Option<Method> {
    if self.class != 0 {
      return None;
    }
    match self.detail {
      | 1 => Some(Method::Get),
      | 2 => Some(Method::Post),
      | 3 => Some(Method::Put),
      | 4 => Some(Method::Delete),
      | _ => None,
    }
  }

  /// `true` for the empty message code `0.00`.
  pub fn is_empty(self) -> bool {
    self.class == 0 && self.detail == 0
  }
}

impl fmt::Display for Code {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}.{:02}", self.class, self.detail)
  }
}

/// Named response codes used by [`response`], RFC 7252 §5.9/§12.1.2.
pub mod code {
  use super::Code;

  pub const OK: Code = Code::new(2, 0);
  pub const CREATED: Code = Code::new(2, 1);
  pub const DELETED: Code = Code::new(2, 2);
  pub const VALID: Code = Code::new(2, 3);
  pub const CHANGED: Code = Code::new(2, 4);
  pub const CONTENT: Code = Code::new(2, 5);

  pub const BAD_REQUEST: Code = Code::new(4, 0);
  pub const UNAUTHORIZED: Code = Code::new(4, 1);
  pub const BAD_OPTION: Code = Code::new(4, 2);
  pub const FORBIDDEN: Code = Code::new(4, 3);
  pub const NOT_FOUND: Code = Code::new(4, 4);
  pub const METHOD_NOT_ALLOWED: Code = Code::new(4, 5);
  pub const NOT_ACCEPTABLE: Code = Code::new(4, 6);
  pub const PRECONDITION_FAILED: Code = Code::new(4, 12);
  pub const REQUEST_ENTITY_TOO_LARGE: Code = Code::new(4, 13);
  pub const UNSUPPORTED_CONTENT_FORMAT: Code = Code::new(4, 15);

  pub const INTERNAL_SERVER_ERROR: Code = Code::new(5, 0);
  pub const NOT_IMPLEMENTED: Code = Code::new(5, 1);
  pub const BAD_GATEWAY: Code = Code::new(5, 2);
  pub const SERVICE_UNAVAILABLE: Code = Code::new(5, 3);
  pub const GATEWAY_TIMEOUT: Code = Code::new(5, 4);
  pub const PROXYING_NOT_SUPPORTED: Code = Code::new(5, 5);
}

/// 16-bit message identifier, RFC 7252 §3.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Id(pub u16);

impl fmt::Display for Id {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "0x{:04X}", self.0)
  }
}

/// 0-8 opaque bytes correlating a response to its request, RFC 7252 §3.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Token(pub Vec<u8>);

impl Token {
  /// Length in bytes; guaranteed `<= 8` for any `Token` produced by
  /// [`Message::decode`] or [`builder`].
  pub fn len(&self) -> usize {
    self.0.len()
  }

  /// `true` if this token is empty.
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl fmt::Display for Token {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "0x")?;
    for b in &self.0 {
      write!(f, "{b:02X}")?;
    }
    Ok(())
  }
}

/// The ordered option map of a [`Message`]: option number to a non-empty
/// list of opaque values, stored/emitted in ascending option-number order
/// (a [`BTreeMap`] gives this for free) while repeated values of one
/// option preserve insertion order (a `Vec` per key).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options(BTreeMap<u16, Vec<Vec<u8>>>);

impl Options {
  pub(crate) fn add_raw(&mut self, number: u16, value: Vec<u8>) {
    self.0.entry(number).or_default().push(value);
  }

  /// Append a value to the list of values under `number`, creating the
  /// list if this is the first value for that option.
  pub fn add(&mut self, number: u16, value: impl Into<Vec<u8>>) {
    self.add_raw(number, value.into());
  }

  /// Replace any existing values under `number` with a single `value`.
  pub fn set(&mut self, number: u16, value: impl Into<Vec<u8>>) {
    self.0.insert(number, vec![value.into()]);
  }

  /// The values registered under `number`, in insertion order, if any.
  pub fn get(&self, number: u16) -> Option<&[Vec<u8>]> {
    self.0.get(&number).map(|v| v.as_slice())
  }

  /// `true` if at least one value is present under `number`.
  pub fn has(&self, number: u16) -> bool {
    self.0.contains_key(&number)
  }

  /// Iterate `(option number, values)` pairs in ascending number order.
  pub fn iter(&self) -> impl Iterator<Item = (&u16, &Vec<Vec<u8>>)> {
    self.0.iter()
  }

  /// `true` if no options are present.
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Reassemble the repeated Uri-Path (11) option values as `/seg1/seg2/…`.
  ///
  /// Returns `None` if no Uri-Path option is present at all (the root
  /// path, a bare `/`, is represented as an empty-string segment, not as
  /// an absent option).
  pub fn uri_path(&self) -> Option<String> {
    let segments = self.get(option::URI_PATH.number)?;
    let mut path = String::new();
    for seg in segments {
      path.push('/');
      path.push_str(&String::from_utf8_lossy(seg));
    }
    Some(path)
  }

  /// The Content-Format option's value (RFC 7252 §5.10.3), decoded as a
  /// `Uint` per RFC 7252 §3.2's numeric-value rules: an empty encoding
  /// means code `0` (`text/plain`); otherwise the shortest big-endian
  /// encoding of the code.
  pub fn content_format(&self) -> Result<Option<ContentFormat>, DecodeError> {
    let values = match self.get(option::CONTENT_FORMAT.number) {
      | Some(v) => v,
      | None => return Ok(None),
    };
    let raw = &values[0];
    let code = match raw.len() {
      | 0 => 0u16,
      | 1 => raw[0] as u16,
      | 2 => u16::from_be_bytes([raw[0], raw[1]]),
      | _ => return Err(DecodeError::InvalidContentFormat),
    };
    Ok(Some(ContentFormat::from(code)))
  }
}

impl fmt::Display for Options {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (number, values) in self.iter() {
      write!(f, "'{}'=[", option::name(*number))?;
      let def = option::lookup(*number);
      for v in values {
        match def.map(|d| d.format) {
          | Some(option::OptionFormat::Empty) => write!(f, "{{}},")?,
          | Some(option::OptionFormat::String) => write!(f, "{:?},", String::from_utf8_lossy(v))?,
          | Some(option::OptionFormat::Uint) => {
            if let Ok(n) = num::to_big_endian(v) {
              write!(f, "{n},")?;
            }
          },
          | _ => write!(f, "{},", crate::wire::hex::hex_dump(v).trim())?,
        }
      }
      write!(f, "] ")?;
    }
    Ok(())
  }
}

/// The CoAP message: header fields, options and an optional payload.
///
/// `source` is populated by the dispatcher from the UDP peer address and
/// is never part of the wire encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
  pub ty: Type,
  pub code: Code,
  pub id: Id,
  pub token: Token,
  pub options: Options,
  pub payload: Option<Vec<u8>>,
  pub source: Option<SocketAddr>,
}

const VERSION: u8 = 1;

impl Message {
  /// Decode a datagram with no known peer address. See [`Message::decode_from`]
  /// to additionally record the sender.
  pub fn decode(buffer: &[u8]) -> Result<Message, DecodeError> {
    Self::decode_from(buffer, None)
  }

  /// Decode a datagram received from `peer`.
  pub fn decode_from(buffer: &[u8], peer: Option<SocketAddr>) -> Result<Message, DecodeError> {
    if buffer.len() < 4 {
      return Err(DecodeError::PacketTooShort);
    }

    let version = buffer[0] >> 6;
    if version != VERSION {
      return Err(DecodeError::InvalidMessageVersion);
    }

    let ty = Type::from_wire(buffer[0] >> 4);
    let tkl = buffer[0] & 0x0F;
    if tkl > 8 {
      return Err(DecodeError::InvalidTokenLength);
    }

    if buffer.len() < 4 + tkl as usize {
      return Err(DecodeError::PacketTooShort);
    }

    let code = Code::from_wire(buffer[1]);
    let id = Id(u16::from_be_bytes([buffer[2], buffer[3]]));
    let token = Token(buffer[4..4 + tkl as usize].to_vec());

    let rest = &buffer[4 + tkl as usize..];
    let (options, cursor) = opt_codec::decode(rest)?;

    let payload = if cursor < rest.len() {
      // cursor sits on the 0xFF marker; the payload is everything after it.
      Some(rest[cursor + 1..].to_vec())
    } else {
      None
    };

    // Validate Content-Format shape eagerly so a malformed option can't
    // silently pass through to a handler.
    options.content_format()?;

    Ok(Message { ty, code, id, token, options, payload, source: peer })
  }

  /// Encode this message to its wire representation.
  pub fn encode(&self) -> Vec<u8> {
    let mut out = Vec::new();

    out.push((VERSION << 6) | (self.ty.to_wire() << 4) | self.token.len() as u8);
    out.push(self.code.to_wire());
    out.extend_from_slice(&self.id.0.to_be_bytes());
    out.extend_from_slice(&self.token.0);
    out.extend_from_slice(&opt_codec::encode(&self.options));

    if let Some(payload) = &self.payload {
      if !payload.is_empty() {
        out.push(opt_codec::PAYLOAD_MARKER);
        out.extend_from_slice(payload);
      }
    }

    out
  }

  /// `true` if `number` has at least one value present.
  pub fn has_option(&self, number: u16) -> bool {
    self.options.has(number)
  }

  /// Reassembled Uri-Path, see [`Options::uri_path`].
  pub fn uri_path(&self) -> Option<String> {
    self.options.uri_path()
  }

  /// Validate this message per RFC 7252 §5.5.2: a payload without a
  /// Content-Format option is a client error. Returns the response
  /// [`Code`] to send (`code::OK` if the message is valid).
  pub fn validate(&self) -> Code {
    let has_payload = self.payload.as_ref().is_some_and(|p| !p.is_empty());
    if has_payload && !self.has_option(option::CONTENT_FORMAT.number) {
      return code::BAD_REQUEST;
    }
    code::OK
  }
}

impl fmt::Display for Message {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f,
           "Message{{type={}, code={}, id={}, tkn={}, options={}, payload={:?}, from={:?}}}",
           self.ty,
           self.code,
           self.id,
           self.token,
           self.options,
           self.payload.as_ref().map(|p| String::from_utf8_lossy(p).into_owned()),
           self.source)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn sample_bytes() -> Vec<u8> {
    // POST /rd, Uri-Host=localhost, Uri-Port=5683, Uri-Query x4, payload "alex123" (no Content-Format)
    vec![0x44, 0x02, 0x1B, 0x2B, 0x00, 0x00, 0x3F, 0x3D, 0x39, 0x6C, 0x6F, 0x63, 0x61, 0x6C,
         0x68, 0x6F, 0x73, 0x74, 0x42, 0x16, 0x33, 0x42, 0x72, 0x64, 0x47, 0x65, 0x70, 0x3D,
         0x61, 0x6C, 0x65, 0x78, 0x03, 0x62, 0x3D, 0x55, 0x06, 0x6C, 0x74, 0x3D, 0x33, 0x30,
         0x30, 0x0B, 0x30, 0x31, 0x32, 0x33, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x30, 0xFF,
         0x61, 0x6C, 0x65, 0x78, 0x31, 0x32, 0x33]
  }

  #[test]
  fn decodes_post_rd_scenario() {
    let bytes = sample_bytes();
    let msg = Message::decode(&bytes).unwrap();

    assert_eq!(msg.ty, Type::Confirmable);
    assert_eq!(msg.code, Code::new(0, 2));
    assert_eq!(msg.id, Id(0x1B2B));
    assert_eq!(msg.token.0, vec![0x00, 0x00, 0x3F, 0x3D]);
    assert_eq!(msg.uri_path().as_deref(), Some("/rd"));
    assert_eq!(msg.payload.as_deref(), Some(&b"alex123"[..]));
    assert_eq!(msg.validate(), code::BAD_REQUEST);
  }

  #[test]
  fn round_trips_post_rd_scenario() {
    let bytes = sample_bytes();
    let msg = Message::decode(&bytes).unwrap();
    assert_eq!(msg.encode(), bytes);
  }

  #[test]
  fn too_short_packet_rejected() {
    assert_eq!(Message::decode(&[0xCA, 0xFE]), Err(DecodeError::PacketTooShort));
  }

  #[test]
  fn invalid_version_rejected() {
    assert_eq!(Message::decode(&[0xCA, 0xFE, 0xBA, 0xBE]),
               Err(DecodeError::InvalidMessageVersion));
  }

  #[test]
  fn invalid_token_length_rejected() {
    let bytes = [0x4A, 0x02, 0x22, 0x72, 0x04, 0x71, 0xBD, 0x4A, 0xF3, 0xA3, 0x47, 0x09];
    assert_eq!(Message::decode(&bytes), Err(DecodeError::InvalidTokenLength));
  }

  #[test]
  fn invalid_option_number_rejected() {
    // header byte -> tkl 0, code GET, id 0, then option byte 0x20 (number 2, unregistered)
    let bytes = [0x40, 0x01, 0x00, 0x00, 0x20];
    assert_eq!(Message::decode(&bytes),
               Err(DecodeError::InvalidOptionNumber(2)));
  }

  #[test]
  fn truncation_never_panics() {
    let bytes = sample_bytes();
    for k in 0..bytes.len() {
      let _ = Message::decode(&bytes[..k]);
    }
  }

  #[test]
  fn empty_options_are_present_not_absent_after_build() {
    let msg = builder::MessageBuilder::new()
      .ty(Type::Confirmable)
      .code(Code::new(0, 1))
      .id(Id(1))
      .token(Token(vec![]))
      .build();
    assert!(msg.options.is_empty());
  }
}
