//! Smart-HTTP discovery for sprig.
//!
//! Covers the first exchange of git's smart HTTP protocol: fetching
//! `info/refs?service=git-upload-pack` and parsing the pkt-line framed
//! reference advertisement that comes back. Pack negotiation and transfer
//! are not implemented; [`Reference::want_line`] and
//! [`Reference::have_line`] compose the lines a negotiation would start with.

pub mod advertisement;
pub mod discovery;
pub mod endpoint;
pub mod error;
pub mod pktline;

pub use advertisement::{check_magic, Reference, ReferenceAdvertisement, SERVICE_LINE};
pub use discovery::{check_response, discover, info_refs_url, Discovery, DiscoveryConfig};
pub use endpoint::service;
pub use error::{ProtocolError, ProtocolResult};
pub use pktline::{read_line, write_flush, write_line, PktLine, FLUSH_PKT, MAX_PKT_LEN};
