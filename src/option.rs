//! The static CoAP option registry (RFC 7252 §5.10 / §12.2).
//!
//! Every option number the server will accept on the wire is listed here,
//! along with the wire format its value must be interpreted as and the
//! Critical/Unsafe/NoCacheKey/Repeatable flags from RFC 7252 §5.4.6. An
//! option number absent from this table is rejected during decode with
//! [`crate::error::DecodeError::InvalidOptionNumber`].

use core::fmt;

/// The shape of an option's value, used only for pretty-printing and to
/// decide whether [`crate::wire::num`] should be consulted when rendering.
/// The bytes themselves are kept opaque at the [`crate::Message`] level
/// regardless of format; only serialization boundaries (the `Display`
/// impls here and in [`crate::message`]) interpret them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionFormat {
  /// No value; presence of the option is the signal (e.g. If-None-Match).
  Empty,
  /// Arbitrary bytes with no further structure (e.g. ETag).
  Opaque,
  /// An unsigned integer, see [`crate::wire::num`].
  Uint,
  /// A UTF-8 string.
  String,
}

/// A single entry of the option registry.
#[derive(Debug, Clone, Copy)]
pub struct OptionDef {
  /// The option number, e.g. `11` for Uri-Path.
  pub number: u16,
  /// Human-readable canonical name, e.g. `"Uri-Path"`.
  pub name: &'static str,
  /// Wire format of the option's value.
  pub format: OptionFormat,
  /// Critical (C) flag: unrecognized critical options must reject the message.
  pub critical: bool,
  /// Unsafe (U) flag: unsafe-to-forward by a proxy.
  pub unsafe_to_forward: bool,
  /// NoCacheKey (N) flag.
  pub no_cache_key: bool,
  /// Repeatable (R) flag: the option may appear more than once.
  pub repeatable: bool,
  /// Default value, if the option has one (e.g. Max-Age defaults to 60).
  pub default: Option<u32>,
}

macro_rules! option_table {
  ($($konst:ident => { number: $num:literal, name: $name:literal, format: $fmt:ident $(, critical: $c:literal)? $(, unsafe_to_forward: $u:literal)? $(, no_cache_key: $n:literal)? $(, repeatable: $r:literal)? $(, default: $d:literal)? $(,)? }),+ $(,)?) => {
    $(
      #[allow(dead_code)]
      pub const $konst: OptionDef = OptionDef {
        number: $num,
        name: $name,
        format: OptionFormat::$fmt,
        critical: option_table!(@bool $($c)?),
        unsafe_to_forward: option_table!(@bool $($u)?),
        no_cache_key: option_table!(@bool $($n)?),
        repeatable: option_table!(@bool $($r)?),
        default: option_table!(@default $($d)?),
      };
    )+

    /// All registered options, in ascending number order.
    pub const REGISTRY: &[OptionDef] = &[$($konst),+];
  };
  (@bool) => { false };
  (@bool $v:literal) => { $v };
  (@default) => { None };
  (@default $v:literal) => { Some($v) };
}

option_table! {
  IF_MATCH => { number: 1, name: "If-Match", format: Opaque, repeatable: true },
  URI_HOST => { number: 3, name: "Uri-Host", format: String, critical: true, unsafe_to_forward: true },
  ETAG => { number: 4, name: "ETag", format: Opaque, repeatable: true },
  IF_NONE_MATCH => { number: 5, name: "If-None-Match", format: Empty, critical: true },
  URI_PORT => { number: 7, name: "Uri-Port", format: Uint, critical: true, unsafe_to_forward: true },
  LOCATION_PATH => { number: 8, name: "Location-Path", format: String, repeatable: true },
  URI_PATH => { number: 11, name: "Uri-Path", format: String, critical: true, unsafe_to_forward: true, repeatable: true },
  CONTENT_FORMAT => { number: 12, name: "Content-Format", format: Uint },
  MAX_AGE => { number: 14, name: "Max-Age", format: Uint, unsafe_to_forward: true, default: 60 },
  URI_QUERY => { number: 15, name: "Uri-Query", format: String, critical: true, unsafe_to_forward: true, repeatable: true },
  ACCEPT => { number: 17, name: "Accept", format: Uint, critical: true },
  LOCATION_QUERY => { number: 20, name: "Location-Query", format: Uint, repeatable: true },
  PROXY_URI => { number: 35, name: "Proxy-Uri", format: String, critical: true, unsafe_to_forward: true },
  PROXY_SCHEME => { number: 39, name: "Proxy-Scheme", format: Uint, critical: true, unsafe_to_forward: true },
  SIZE1 => { number: 60, name: "Size1", format: Uint, no_cache_key: true },
}

/// Look up the registry entry for an option number, if recognized.
pub fn lookup(number: u16) -> Option<&'static OptionDef> {
  REGISTRY.iter().find(|def| def.number == number)
}

/// A printable name for an option number: the registered name if known,
/// or `"Unknown(<n>)"` otherwise. The original source this system was
/// distilled from returns an empty string here for unknown numbers; this
/// is treated as a bug and not reproduced (see the open question in
/// `SPEC_FULL.md` §9).
pub fn name(number: u16) -> std::borrow::Cow<'static, str> {
  match lookup(number) {
    | Some(def) => std::borrow::Cow::Borrowed(def.name),
    | None => std::borrow::Cow::Owned(format!("Unknown({number})")),
  }
}

/// The IANA Content-Format registry values this server recognizes by
/// name; any other value round-trips as [`ContentFormat::Other`].
#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
  /// `text/plain; charset=utf-8`
  Text,
  /// `application/link-format`
  LinkFormat,
  /// `application/xml`
  Xml,
  /// `application/octet-stream`
  OctetStream,
  /// `application/exi`
  Exi,
  /// `application/json`
  Json,
  /// Any other registered or unregistered Content-Format code.
  Other(u16),
}

impl ContentFormat {
  /// The minimal big-endian encoding of this content format's numeric
  /// code: 1 byte if it fits under 256, otherwise 2 bytes.
  pub fn bytes(&self) -> Vec<u8> {
    let code = u16::from(*self);
    if code < 256 {
      vec![code as u8]
    } else {
      code.to_be_bytes().to_vec()
    }
  }
}

impl From<ContentFormat> for u16 {
  fn from(f: ContentFormat) -> Self {
    use ContentFormat::*;
    match f {
      | Text => 0,
      | LinkFormat => 40,
      | Xml => 41,
      | OctetStream => 42,
      | Exi => 47,
      | Json => 50,
      | Other(n) => n,
    }
  }
}

impl From<u16> for ContentFormat {
  fn from(n: u16) -> Self {
    use ContentFormat::*;
    match n {
      | 0 => Text,
      | 40 => LinkFormat,
      | 41 => Xml,
      | 42 => OctetStream,
      | 47 => Exi,
      | 50 => Json,
      | other => Other(other),
    }
  }
}

impl fmt::Display for ContentFormat {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    use ContentFormat::*;
    match self {
      | Text => write!(f, "text/plain;charset=utf-8"),
      | LinkFormat => write!(f, "application/link-format"),
      | Xml => write!(f, "application/xml"),
      | OctetStream => write!(f, "application/octet-stream"),
      | Exi => write!(f, "application/exi"),
      | Json => write!(f, "application/json"),
      | Other(n) => write!(f, "unknown({n})"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn looks_up_known_numbers() {
    assert_eq!(lookup(11).unwrap().name, "Uri-Path");
    assert_eq!(lookup(60).unwrap().name, "Size1");
    assert!(lookup(9999).is_none());
  }

  #[test]
  fn unknown_number_renders_placeholder() {
    assert_eq!(name(9999), "Unknown(9999)");
    assert_eq!(name(11), "Uri-Path");
  }

  #[test]
  fn content_format_round_trips() {
    for cf in [ContentFormat::Text,
               ContentFormat::LinkFormat,
               ContentFormat::Xml,
               ContentFormat::OctetStream,
               ContentFormat::Exi,
               ContentFormat::Json]
    {
      let code: u16 = cf.into();
      assert_eq!(ContentFormat::from(code), cf);
    }
  }

  #[test]
  fn content_format_bytes_are_minimal() {
    assert_eq!(ContentFormat::Json.bytes(), vec![50]);
    assert_eq!(ContentFormat::Other(300).bytes(), vec![1, 44]);
  }
}
