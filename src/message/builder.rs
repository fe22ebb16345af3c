//! Fluent, compile-time-enforced composition of a [`Message`](super::Message).
//!
//! RFC 7252 gives every message a fixed field order (type, code, message
//! ID, token, then optionally options/payload); `SPEC_FULL.md` asks for
//! that order to be enforced "at the type or object level". The original
//! Go source enforces it by renaming the builder struct after each step
//! (`messageBuilder -> messageCodeBuilder -> messageIdBuilder ->
//! messageTokenBuilder -> messagePayloadBuilder`, see
//! `examples/original_source/message_builder.go`) so that only the
//! builder method for the next step is in scope. This is the same trick,
//! made a compiler guarantee with Rust's type system: each step is its
//! own zero-sized-marker-free struct, and a method is only defined on the
//! struct that represents having completed its prerequisite step.

use super::{Code, Id, Message, Options, Token, Type};
use crate::option::{self, ContentFormat};

/// Step one: choose the message [`Type`].
#[derive(Debug, Default)]
pub struct MessageBuilder {
  _private: (),
}

/// Step two: the type is set, choose the [`Code`].
#[derive(Debug)]
pub struct WithType {
  ty: Type,
}

/// Step three: type and code are set, choose the [`Id`].
#[derive(Debug)]
pub struct WithCode {
  ty: Type,
  code: Code,
}

/// Step four: type, code and id are set, choose the [`Token`].
#[derive(Debug)]
pub struct WithId {
  ty: Type,
  code: Code,
  id: Id,
}

/// Final step: every required field is set. Options and payload are
/// optional from here; [`WithToken::build`] yields a [`Message`] with an
/// empty (never absent) options map if none are added.
#[derive(Debug)]
pub struct WithToken {
  ty: Type,
  code: Code,
  id: Id,
  token: Token,
  options: Options,
  payload: Option<Vec<u8>>,
}

impl MessageBuilder {
  /// Begin building a new message.
  pub fn new() -> Self {
    Self::default()
  }

  /// Set the message type.
  pub fn ty(self, ty: Type) -> WithType {
    WithType { ty }
  }
}

impl WithType {
  /// Set the message code.
  pub fn code(self, code: Code) -> WithCode {
    WithCode { ty: self.ty, code }
  }
}

impl WithCode {
  /// Set an explicit message ID.
  pub fn id(self, id: Id) -> WithId {
    WithId { ty: self.ty, code: self.code, id }
  }

  /// Choose a random 16-bit message ID, as a client or server minting a
  /// new exchange would.
  pub fn random_id(self) -> WithId {
    self.id(Id(rand::random()))
  }
}

impl WithId {
  /// Set an explicit token (0-8 bytes; longer tokens are truncated to 8,
  /// matching the wire invariant enforced on decode).
  pub fn token(self, token: Token) -> WithToken {
    let mut token = token;
    token.0.truncate(8);
    WithToken { ty: self.ty,
                code: self.code,
                id: self.id,
                token,
                options: Options::default(),
                payload: None }
  }

  /// Choose a random 0-8 byte token. This implementation always mints a
  /// full 8-byte token, matching the original source's `NewToken`.
  pub fn random_token(self) -> WithToken {
    self.token(Token(rand::random::<[u8; 8]>().to_vec()))
  }
}

impl WithToken {
  /// Append `values` to the list under `number`, preserving insertion
  /// order; repeated calls with the same number concatenate rather than
  /// overwrite.
  pub fn option(mut self, number: u16, value: impl Into<Vec<u8>>) -> Self {
    self.options.add(number, value);
    self
  }

  /// Set the payload and its Content-Format option in one step. The
  /// Content-Format option value is the minimal big-endian encoding of
  /// `format` (1 byte if its code is < 256, else 2 bytes).
  pub fn with_payload(mut self, format: ContentFormat, bytes: impl Into<Vec<u8>>) -> Self {
    self.options.set(option::CONTENT_FORMAT.number, format.bytes());
    self.payload = Some(bytes.into());
    self
  }

  /// Finish building the message.
  pub fn build(self) -> Message {
    Message { ty: self.ty,
              code: self.code,
              id: self.id,
              token: self.token,
              options: self.options,
              payload: self.payload,
              source: None }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::message::code;

  #[test]
  fn builds_a_minimal_message() {
    let msg = MessageBuilder::new().ty(Type::Confirmable)
                                   .code(Code::new(0, 1))
                                   .id(Id(42))
                                   .token(Token(vec![1, 2, 3]))
                                   .build();

    assert_eq!(msg.id, Id(42));
    assert_eq!(msg.token.0, vec![1, 2, 3]);
    assert!(msg.options.is_empty());
    assert!(msg.payload.is_none());
  }

  #[test]
  fn with_payload_sets_content_format_option() {
    let msg = MessageBuilder::new().ty(Type::NonConfirmable)
                                   .code(code::CONTENT)
                                   .random_id()
                                   .random_token()
                                   .with_payload(ContentFormat::Json, &b"{}"[..])
                                   .build();

    assert_eq!(msg.payload.as_deref(), Some(&b"{}"[..]));
    assert_eq!(msg.options.content_format().unwrap(), Some(ContentFormat::Json));
    assert_eq!(msg.token.len(), 8);
  }

  #[test]
  fn repeated_options_concatenate_in_order() {
    let msg = MessageBuilder::new().ty(Type::Confirmable)
                                   .code(Code::new(0, 1))
                                   .id(Id(1))
                                   .token(Token(vec![]))
                                   .option(option::URI_PATH.number, b"a".to_vec())
                                   .option(option::URI_PATH.number, b"b".to_vec())
                                   .build();

    let values = msg.options.get(option::URI_PATH.number).unwrap();
    assert_eq!(values, &[b"a".to_vec(), b"b".to_vec()]);
  }
}
