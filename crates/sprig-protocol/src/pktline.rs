//! Pkt-line framing.
//!
//! A pkt-line is a four hex digit length, counting the header itself,
//! followed by the payload. `0000` is the flush packet that ends a section.

use std::io::{self, Read, Write};

use crate::error::{ProtocolError, ProtocolResult};

/// Length of the hex length header.
pub const HEADER_LEN: usize = 4;

/// Largest framed length four hex digits can describe.
pub const MAX_PKT_LEN: usize = 0xffff;

/// The flush packet.
pub const FLUSH_PKT: &[u8; 4] = b"0000";

/// One frame read off the wire.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PktLine {
    /// `0000`: end of a protocol section.
    Flush,
    /// Payload with trailing whitespace removed.
    Data(Vec<u8>),
}

impl PktLine {
    pub fn is_flush(&self) -> bool {
        matches!(self, Self::Flush)
    }

    /// The payload, or `None` for a flush.
    pub fn data(&self) -> Option<&[u8]> {
        match self {
            Self::Flush => None,
            Self::Data(data) => Some(data),
        }
    }
}

/// Read until `buf` is full or the stream ends. Returns the byte count.
fn read_full<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

fn parse_length(header: &[u8; HEADER_LEN]) -> ProtocolResult<usize> {
    if !header.iter().all(u8::is_ascii_hexdigit) {
        return Err(ProtocolError::MalformedLine(format!(
            "length header is not hex: {:?}",
            String::from_utf8_lossy(header)
        )));
    }
    let text = std::str::from_utf8(header)
        .map_err(|_| ProtocolError::MalformedLine("length header is not ASCII".into()))?;
    usize::from_str_radix(text, 16)
        .map_err(|e| ProtocolError::MalformedLine(format!("length header {text:?}: {e}")))
}

/// Read one pkt-line.
///
/// Consumes exactly the header plus the declared payload. A declared length
/// of 1 to 4 cannot hold its own header and is rejected; a stream that ends
/// early is a [`ProtocolError::PartialRead`].
pub fn read_line<R: Read + ?Sized>(reader: &mut R) -> ProtocolResult<PktLine> {
    let mut header = [0u8; HEADER_LEN];
    let got = read_full(reader, &mut header)?;
    if got < HEADER_LEN {
        return Err(ProtocolError::PartialRead {
            expected: HEADER_LEN,
            actual: got,
        });
    }

    let len = parse_length(&header)?;
    if len == 0 {
        return Ok(PktLine::Flush);
    }
    if len <= HEADER_LEN {
        return Err(ProtocolError::MalformedLine(format!(
            "length {len} is shorter than the header"
        )));
    }

    let mut payload = vec![0u8; len - HEADER_LEN];
    let got = read_full(reader, &mut payload)?;
    if got < payload.len() {
        return Err(ProtocolError::PartialRead {
            expected: payload.len(),
            actual: got,
        });
    }
    let trimmed = payload.trim_ascii_end().len();
    payload.truncate(trimmed);
    Ok(PktLine::Data(payload))
}

/// Frame `payload` as a newline-terminated pkt-line.
pub fn write_line(payload: &[u8]) -> ProtocolResult<Vec<u8>> {
    let len = payload.len() + HEADER_LEN + 1;
    if len > MAX_PKT_LEN {
        return Err(ProtocolError::LineTooLong {
            len,
            max: MAX_PKT_LEN,
        });
    }
    let mut buf = Vec::with_capacity(len);
    buf.extend_from_slice(format!("{len:04x}").as_bytes());
    buf.extend_from_slice(payload);
    buf.push(b'\n');
    Ok(buf)
}

/// Write a flush packet.
pub fn write_flush<W: Write + ?Sized>(writer: &mut W) -> ProtocolResult<()> {
    writer.write_all(FLUSH_PKT)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    #[test]
    fn flush_consumes_four_bytes() {
        let mut cursor = Cursor::new(b"0000rest".to_vec());
        assert_eq!(read_line(&mut cursor).unwrap(), PktLine::Flush);
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn service_line() {
        let mut cursor = Cursor::new(b"001e# service=git-upload-pack\n".to_vec());
        let line = read_line(&mut cursor).unwrap();
        assert_eq!(line.data(), Some(&b"# service=git-upload-pack"[..]));
    }

    #[test]
    fn lengths_one_to_four_are_malformed() {
        for header in ["0001", "0002", "0003", "0004"] {
            let err = read_line(&mut Cursor::new(header.as_bytes().to_vec())).unwrap_err();
            assert!(matches!(err, ProtocolError::MalformedLine(_)), "{header}");
        }
    }

    #[test]
    fn non_hex_header_is_malformed() {
        let err = read_line(&mut Cursor::new(b"00zz".to_vec())).unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedLine(_)));
    }

    #[test]
    fn short_payload_is_partial_read() {
        let err = read_line(&mut Cursor::new(b"000ahi".to_vec())).unwrap_err();
        assert!(matches!(
            err,
            ProtocolError::PartialRead {
                expected: 6,
                actual: 2
            }
        ));
    }

    #[test]
    fn short_header_is_partial_read() {
        let err = read_line(&mut Cursor::new(b"00".to_vec())).unwrap_err();
        assert!(matches!(err, ProtocolError::PartialRead { expected: 4, actual: 2 }));
    }

    #[test]
    fn write_counts_header_and_newline() {
        let line = write_line(b"want 0123").unwrap();
        assert_eq!(line, b"000ewant 0123\n");
    }

    #[test]
    fn write_rejects_oversized() {
        let payload = vec![b'x'; MAX_PKT_LEN];
        assert!(matches!(
            write_line(&payload),
            Err(ProtocolError::LineTooLong { .. })
        ));
    }

    #[test]
    fn write_flush_bytes() {
        let mut out = Vec::new();
        write_flush(&mut out).unwrap();
        assert_eq!(out, b"0000");
    }

    #[test]
    fn consecutive_lines() {
        let mut wire = write_line(b"first").unwrap();
        wire.extend_from_slice(FLUSH_PKT);
        wire.extend(write_line(b"second").unwrap());
        let mut cursor = Cursor::new(wire);
        assert_eq!(read_line(&mut cursor).unwrap().data(), Some(&b"first"[..]));
        assert!(read_line(&mut cursor).unwrap().is_flush());
        assert_eq!(read_line(&mut cursor).unwrap().data(), Some(&b"second"[..]));
    }

    proptest! {
        #[test]
        fn written_lines_read_back(payload in "[a-zA-Z0-9 =#/^{}.-]{0,200}") {
            let framed = write_line(payload.as_bytes()).unwrap();
            let line = read_line(&mut Cursor::new(framed)).unwrap();
            prop_assert_eq!(line.data(), Some(payload.trim_end().as_bytes()));
        }
    }
}
