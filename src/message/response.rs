//! One convenience constructor per named response code (RFC 7252 §5.9),
//! each building an Acknowledgement carrying the request's message ID and
//! token, with empty options and payload.
//!
//! Grounded 1:1 on `examples/original_source/message_builder.go`'s
//! `New<X>ResponseMessage` functions and their shared `responseWithCode`
//! helper.

use super::builder::MessageBuilder;
use super::{code, Code, Message, Type};

fn response_with_code(request: &Message, code: Code) -> Message {
  MessageBuilder::new().ty(Type::Acknowledgement)
                       .code(code)
                       .id(request.id)
                       .token(request.token.clone())
                       .build()
}

macro_rules! response_ctors {
  ($($(#[$meta:meta])* $fn_name:ident => $code:path),+ $(,)?) => {
    $(
      $(#[$meta])*
      pub fn $fn_name(request: &Message) -> Message {
        response_with_code(request, $code)
      }
    )+
  };
}

response_ctors! {
  /// `2.00 Ok`
  ok => code::OK,
  /// `2.01 Created`
  created => code::CREATED,
  /// `2.02 Deleted`
  deleted => code::DELETED,
  /// `2.03 Valid`
  valid => code::VALID,
  /// `2.04 Changed`
  changed => code::CHANGED,
  /// `2.05 Content`
  content => code::CONTENT,
  /// `4.00 Bad Request`
  bad_request => code::BAD_REQUEST,
  /// `4.01 Unauthorized`
  unauthorized => code::UNAUTHORIZED,
  /// `4.02 Bad Option`
  bad_option => code::BAD_OPTION,
  /// `4.03 Forbidden`
  forbidden => code::FORBIDDEN,
  /// `4.04 Not Found`
  not_found => code::NOT_FOUND,
  /// `4.05 Method Not Allowed`
  method_not_allowed => code::METHOD_NOT_ALLOWED,
  /// `4.06 Not Acceptable`
  not_acceptable => code::NOT_ACCEPTABLE,
  /// `4.12 Precondition Failed`
  precondition_failed => code::PRECONDITION_FAILED,
  /// `4.13 Request Entity Too Large`
  request_entity_too_large => code::REQUEST_ENTITY_TOO_LARGE,
  /// `4.15 Unsupported Content Format`
  unsupported_content_format => code::UNSUPPORTED_CONTENT_FORMAT,
  /// `5.00 Internal Server Error`
  internal_server_error => code::INTERNAL_SERVER_ERROR,
  /// `5.01 Not Implemented`
  not_implemented => code::NOT_IMPLEMENTED,
  /// `5.02 Bad Gateway`
  bad_gateway => code::BAD_GATEWAY,
  /// `5.03 Service Unavailable`
  service_unavailable => code::SERVICE_UNAVAILABLE,
  /// `5.04 Gateway Timeout`
  gateway_timeout => code::GATEWAY_TIMEOUT,
  /// `5.05 Proxying Not Supported`
  proxying_not_supported => code::PROXYING_NOT_SUPPORTED,
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::message::{Id, Token};

  fn a_request() -> Message {
    MessageBuilder::new().ty(Type::Confirmable)
                         .code(Code::new(0, 1))
                         .id(Id(0xBEEF))
                         .token(Token(vec![9, 9]))
                         .build()
  }

  #[test]
  fn every_ctor_inherits_id_and_token_and_acks() {
    let req = a_request();

    for f in [ok, created, deleted, valid, changed, content, bad_request, unauthorized,
              bad_option, forbidden, not_found, method_not_allowed, not_acceptable,
              precondition_failed, request_entity_too_large, unsupported_content_format,
              internal_server_error, not_implemented, bad_gateway, service_unavailable,
              gateway_timeout, proxying_not_supported]
    {
      let resp = f(&req);
      assert_eq!(resp.id, req.id);
      assert_eq!(resp.token, req.token);
      assert_eq!(resp.ty, Type::Acknowledgement);
      assert!(resp.options.is_empty());
      assert!(resp.payload.is_none());
    }
  }

  #[test]
  fn codes_match_rfc_7252() {
    let req = a_request();
    assert_eq!(created(&req).code, Code::new(2, 1));
    assert_eq!(not_found(&req).code, Code::new(4, 4));
    assert_eq!(internal_server_error(&req).code, Code::new(5, 0));
  }
}
