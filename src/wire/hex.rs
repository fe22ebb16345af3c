//! Trace-level hex dumping of raw datagrams, ambient debugging support
//! only — not part of the wire codec itself.

/// Render `bytes` as a `xxd`-style hex dump for `log::trace!` call sites.
pub fn hex_dump(bytes: &[u8]) -> String {
  let mut out = String::with_capacity(bytes.len() * 3);
  for (i, chunk) in bytes.chunks(16).enumerate() {
    out.push_str(&format!("{:08x}  ", i * 16));
    for b in chunk {
      out.push_str(&format!("{b:02x} "));
    }
    out.push('\n');
  }
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn dumps_short_buffer_on_one_line() {
    let dump = hex_dump(&[0xCA, 0xFE]);
    assert_eq!(dump, "00000000  ca fe \n");
  }
}
