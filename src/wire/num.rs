//! Decoding opaque option values into unsigned integers.
//!
//! CoAP option values are raw bytes; an option registered with [`Uint`
//! format](crate::option::OptionFormat::Uint) is a big-endian or
//! little-endian unsigned integer of whatever length the sender chose to
//! send, zero-padded the way RFC 7252 intends (shortest encoding, no
//! leading/trailing zero bytes required).
//!
//! [`Uint`]: crate::option::OptionFormat::Uint

use core::fmt;

/// An unsigned integer decoded from an option value, tagged with the width
/// chosen by [`to_big_endian`]/[`to_little_endian`] based on the input
/// length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Number {
  /// 1-byte value
  U8(u8),
  /// 2-byte value
  U16(u16),
  /// 3- or 4-byte value
  U32(u32),
  /// 5- to 8-byte value, or any longer value truncated to the last/first 8 bytes
  U64(u64),
}

impl Number {
  /// Widen this value to a `u64`, regardless of which variant it is.
  pub fn as_u64(&self) -> u64 {
    match *self {
      | Number::U8(n) => n as u64,
      | Number::U16(n) => n as u64,
      | Number::U32(n) => n as u64,
      | Number::U64(n) => n,
    }
  }
}

impl fmt::Display for Number {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_u64())
  }
}

/// A number value of zero length was presented; RFC 7252 options never
/// encode a `Uint` of length 0 (the empty encoding of a `Uint` option means
/// the value `0`, handled by callers before reaching here).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZeroLengthNumber;

impl fmt::Display for ZeroLengthNumber {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "number of zero length is invalid")
  }
}

impl std::error::Error for ZeroLengthNumber {}

fn pad_be(b: &[u8], target_len: usize) -> Vec<u8> {
  let mut target = vec![0u8; target_len];
  target[target_len - b.len()..].copy_from_slice(b);
  target
}

fn pad_le(b: &[u8], target_len: usize) -> Vec<u8> {
  let mut target = vec![0u8; target_len];
  target[..b.len()].copy_from_slice(b);
  target
}

/// Decode a big-endian unsigned integer from an opaque option value.
///
/// Widths of 3 and 5..7 bytes are zero-padded on the left (the
/// most-significant side) up to 4 and 8 bytes respectively before being
/// read back as `u32`/`u64`. Anything longer than 8 bytes is truncated to
/// its trailing 8 bytes.
pub fn to_big_endian(bytes: &[u8]) -> Result<Number, ZeroLengthNumber> {
  match bytes.len() {
    | 0 => Err(ZeroLengthNumber),
    | 1 => Ok(Number::U8(bytes[0])),
    | 2 => Ok(Number::U16(u16::from_be_bytes([bytes[0], bytes[1]]))),
    | 3 => {
      let padded = pad_be(bytes, 4);
      Ok(Number::U32(u32::from_be_bytes(padded.try_into().unwrap())))
    },
    | 4 => Ok(Number::U32(u32::from_be_bytes(bytes.try_into().unwrap()))),
    | 5..=7 => {
      let padded = pad_be(bytes, 8);
      Ok(Number::U64(u64::from_be_bytes(padded.try_into().unwrap())))
    },
    | 8 => Ok(Number::U64(u64::from_be_bytes(bytes.try_into().unwrap()))),
    | n => {
      let tail = &bytes[n - 8..];
      Ok(Number::U64(u64::from_be_bytes(tail.try_into().unwrap())))
    },
  }
}

/// Decode a little-endian unsigned integer from an opaque option value.
///
/// Mirrors [`to_big_endian`], but padding for 3- and 5..7-byte values is
/// applied on the right (the least-significant side stays where it is),
/// and values longer than 8 bytes are truncated to their leading 8 bytes.
pub fn to_little_endian(bytes: &[u8]) -> Result<Number, ZeroLengthNumber> {
  match bytes.len() {
    | 0 => Err(ZeroLengthNumber),
    | 1 => Ok(Number::U8(bytes[0])),
    | 2 => Ok(Number::U16(u16::from_le_bytes([bytes[0], bytes[1]]))),
    | 3 => {
      let padded = pad_le(bytes, 4);
      Ok(Number::U32(u32::from_le_bytes(padded.try_into().unwrap())))
    },
    | 4 => Ok(Number::U32(u32::from_le_bytes(bytes.try_into().unwrap()))),
    | 5..=7 => {
      let padded = pad_le(bytes, 8);
      Ok(Number::U64(u64::from_le_bytes(padded.try_into().unwrap())))
    },
    | 8 => Ok(Number::U64(u64::from_le_bytes(bytes.try_into().unwrap()))),
    | _ => {
      let head = &bytes[..8];
      Ok(Number::U64(u64::from_le_bytes(head.try_into().unwrap())))
    },
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn zero_length_fails() {
    assert_eq!(to_big_endian(&[]), Err(ZeroLengthNumber));
    assert_eq!(to_little_endian(&[]), Err(ZeroLengthNumber));
  }

  #[test]
  fn one_byte() {
    assert_eq!(to_big_endian(&[0xAB]).unwrap(), Number::U8(0xAB));
  }

  #[test]
  fn two_bytes_be_vs_le() {
    assert_eq!(to_big_endian(&[0x01, 0x02]).unwrap(), Number::U16(0x0102));
    assert_eq!(to_little_endian(&[0x01, 0x02]).unwrap(), Number::U16(0x0201));
  }

  #[test]
  fn three_bytes_pads_to_u32() {
    assert_eq!(to_big_endian(&[0x01, 0x02, 0x03]).unwrap(),
               Number::U32(0x00010203));
    assert_eq!(to_little_endian(&[0x01, 0x02, 0x03]).unwrap(),
               Number::U32(0x00030201));
  }

  #[test]
  fn four_bytes() {
    assert_eq!(to_big_endian(&[0x01, 0x02, 0x03, 0x04]).unwrap(),
               Number::U32(0x01020304));
  }

  #[test]
  fn five_to_seven_bytes_pad_to_u64() {
    assert_eq!(to_big_endian(&[0x01, 0x02, 0x03, 0x04, 0x05]).unwrap(),
               Number::U64(0x0001020304050000u64 >> 16));
    assert_eq!(to_little_endian(&[0x01, 0x02, 0x03, 0x04, 0x05]).unwrap(),
               Number::U64(0x0504030201));
  }

  #[test]
  fn eight_bytes() {
    let bytes = [1, 2, 3, 4, 5, 6, 7, 8];
    assert_eq!(to_big_endian(&bytes).unwrap(),
               Number::U64(u64::from_be_bytes(bytes)));
  }

  #[test]
  fn more_than_eight_bytes_truncates() {
    let bytes = [0xFF; 3]
      .into_iter()
      .chain([1, 2, 3, 4, 5, 6, 7, 8])
      .collect::<Vec<_>>();

    assert_eq!(to_big_endian(&bytes).unwrap(), Number::U64(0x0102030405060708));
    assert_eq!(to_little_endian(&bytes).unwrap(),
               Number::U64(u64::from_le_bytes([0xFF, 0xFF, 0xFF, 1, 2, 3, 4, 5])));
  }
}
