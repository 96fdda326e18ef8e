//! The upload-pack reference advertisement.
//!
//! ```text
//! 001e# service=git-upload-pack\n
//! 0000
//! 00..<id> HEAD\0<capabilities>\n
//! 00..<id> refs/heads/master\n
//! 0000
//! ```

use std::io::{Cursor, Read, Write};

use serde::{Deserialize, Serialize};
use sprig_types::ObjectId;
use tracing::debug;

use crate::error::{ProtocolError, ProtocolResult};
use crate::pktline::{read_line, write_flush, write_line, PktLine};

/// First line of a smart upload-pack advertisement.
pub const SERVICE_LINE: &str = "# service=git-upload-pack";

/// A single advertised ref.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub id: ObjectId,
    pub name: String,
    /// Capability tokens carried after the NUL byte, usually only on the
    /// first line.
    pub capabilities: Vec<String>,
}

impl Reference {
    /// Parse one `<id> <name>[\0<caps>]` line.
    pub fn parse_line(line: &[u8]) -> ProtocolResult<Self> {
        let mut fields = line.split(|&b| b == 0);
        let description = fields.next().unwrap_or_default();
        let caps = fields.next();
        if fields.next().is_some() {
            return Err(ProtocolError::MalformedRef(format!(
                "more than one NUL in {:?}",
                String::from_utf8_lossy(line)
            )));
        }

        let description = std::str::from_utf8(description).map_err(|_| {
            ProtocolError::MalformedRef(format!("not UTF-8: {:?}", String::from_utf8_lossy(line)))
        })?;
        let (id, name) = description
            .trim()
            .split_once(' ')
            .map(|(id, name)| (id.trim(), name.trim()))
            .filter(|(_, name)| !name.is_empty())
            .ok_or_else(|| ProtocolError::MalformedRef(description.to_string()))?;

        let capabilities = match caps {
            Some(caps) => String::from_utf8_lossy(caps)
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            None => Vec::new(),
        };

        Ok(Self {
            id: ObjectId::from_hex(id)?,
            name: name.to_string(),
            capabilities,
        })
    }

    /// `want <id>` as a pkt-line.
    pub fn want_line(&self) -> ProtocolResult<Vec<u8>> {
        write_line(format!("want {}", self.id).as_bytes())
    }

    /// `have <id>` as a pkt-line.
    pub fn have_line(&self) -> ProtocolResult<Vec<u8>> {
        write_line(format!("have {}", self.id).as_bytes())
    }
}

/// Verify that a response body starts like a smart advertisement: a
/// four-hex-digit length followed by `#`.
///
/// A dumb HTTP server answers the same URL with a plain `info/refs` listing,
/// which fails here before any parsing is attempted.
pub fn check_magic(body: &[u8]) -> ProtocolResult<()> {
    let ok = body.len() > 4
        && body[..4]
            .iter()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(b))
        && body[4] == b'#';
    if ok {
        Ok(())
    } else {
        let head = &body[..body.len().min(16)];
        Err(ProtocolError::BadMagic(format!(
            "{:?}",
            String::from_utf8_lossy(head)
        )))
    }
}

/// The refs a remote advertised, in wire order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceAdvertisement {
    pub references: Vec<Reference>,
}

impl ReferenceAdvertisement {
    /// Parse an advertisement from a stream positioned at the service line.
    pub fn parse<R: Read + ?Sized>(reader: &mut R) -> ProtocolResult<Self> {
        match read_line(reader)? {
            PktLine::Data(line) if line == SERVICE_LINE.as_bytes() => {}
            other => {
                return Err(ProtocolError::UnexpectedLine {
                    expected: SERVICE_LINE.to_string(),
                    found: describe(&other),
                })
            }
        }
        let after_service = read_line(reader)?;
        if !after_service.is_flush() {
            return Err(ProtocolError::UnexpectedLine {
                expected: "flush".to_string(),
                found: describe(&after_service),
            });
        }

        let mut references = Vec::new();
        while let PktLine::Data(line) = read_line(reader)? {
            references.push(Reference::parse_line(&line)?);
        }
        debug!(count = references.len(), "parsed reference advertisement");
        Ok(Self { references })
    }

    /// Check the magic prefix of a full response body, then parse it.
    pub fn from_response_body(body: &[u8]) -> ProtocolResult<Self> {
        check_magic(body)?;
        Self::parse(&mut Cursor::new(body))
    }

    pub fn len(&self) -> usize {
        self.references.len()
    }

    pub fn is_empty(&self) -> bool {
        self.references.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reference> {
        self.references.iter()
    }

    /// Look up a ref by its full name.
    pub fn find(&self, name: &str) -> Option<&Reference> {
        self.references.iter().find(|r| r.name == name)
    }

    /// Server capabilities, taken from the first line that carries any.
    pub fn capabilities(&self) -> &[String] {
        self.references
            .iter()
            .map(|r| r.capabilities.as_slice())
            .find(|caps| !caps.is_empty())
            .unwrap_or_default()
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.capabilities()
            .iter()
            .any(|c| c == name || c.split_once('=').is_some_and(|(key, _)| key == name))
    }

    /// Value of a `key=value` capability such as `agent`.
    pub fn capability_value(&self, key: &str) -> Option<&str> {
        self.capabilities()
            .iter()
            .filter_map(|c| c.split_once('='))
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v)
    }

    /// Target of a `symref=<from>:<to>` capability.
    pub fn symref(&self, from: &str) -> Option<&str> {
        self.capabilities()
            .iter()
            .filter_map(|c| c.strip_prefix("symref="))
            .filter_map(|pair| pair.split_once(':'))
            .find(|(f, _)| *f == from)
            .map(|(_, to)| to)
    }

    /// Write a want line for every advertised ref, then a flush packet.
    pub fn write_wants<W: Write + ?Sized>(&self, writer: &mut W) -> ProtocolResult<()> {
        for reference in &self.references {
            writer.write_all(&reference.want_line()?)?;
        }
        write_flush(writer)
    }
}

fn describe(line: &PktLine) -> String {
    match line {
        PktLine::Flush => "flush".to_string(),
        PktLine::Data(data) => format!("{:?}", String::from_utf8_lossy(data)),
    }
}
