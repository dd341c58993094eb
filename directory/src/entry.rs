//! Directory listing records
//!
//! A consolidated listing is one format-version byte (`0x01`) followed by
//! records until the buffer ends:
//!
//! ```text
//! ip [4, network order] | port u16 | players u16 | score keeping u16 |
//! version u32 | name [64 raw bytes] | description [zero-terminated]
//! ```

use log::warn;
use shared::bytestream::latin1_to_string;
use shared::{ByteStream, UnderrunError};
use std::fmt;
use std::net::Ipv4Addr;

pub const LISTING_FORMAT_VERSION: u8 = 0x01;
pub const NAME_LEN: usize = 64;

/// A record field ran out of bytes. No entries are returned when this happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("failed to read {field}: {source}")]
pub struct DecodeError {
    pub field: &'static str,
    #[source]
    pub source: UnderrunError,
}

trait Field<T> {
    fn field(self, name: &'static str) -> Result<T, DecodeError>;
}

impl<T> Field<T> for Result<T, UnderrunError> {
    fn field(self, name: &'static str) -> Result<T, DecodeError> {
        self.map_err(|source| DecodeError {
            field: name,
            source,
        })
    }
}

/// One game server as advertised by the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// The raw 64-byte name field, one `char` per byte. Padding is kept.
    pub name: String,
    pub description: String,
    pub ip: Ipv4Addr,
    pub port: u16,
    pub score_keeping: u16,
    pub players: u16,
    pub version: u32,
}

impl DirectoryEntry {
    pub fn decode(stream: &mut ByteStream<'_>) -> Result<Self, DecodeError> {
        let ip = stream.read_bytes(4).field("ip address")?;
        let port = stream.read_u16().field("port")?;
        let players = stream.read_u16().field("player count")?;
        let score_keeping = stream.read_u16().field("score keeping")?;
        let version = stream.read_u32().field("server version")?;
        let name = stream.read_bytes(NAME_LEN).field("server name")?;
        let description = stream
            .read_zero_terminated_string()
            .field("server description")?;

        Ok(DirectoryEntry {
            name: latin1_to_string(name),
            description,
            ip: Ipv4Addr::new(ip[0], ip[1], ip[2], ip[3]),
            port,
            score_keeping,
            players,
            version,
        })
    }

    /// The name up to its first NUL, for display.
    pub fn display_name(&self) -> &str {
        match self.name.find('\0') {
            Some(end) => &self.name[..end],
            None => &self.name,
        }
    }

    /// Appends this record in wire layout. Names longer than 64 bytes are
    /// truncated and shorter ones padded with zeros; characters outside
    /// Latin-1 become `?`.
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.ip.octets());
        out.extend_from_slice(&self.port.to_le_bytes());
        out.extend_from_slice(&self.players.to_le_bytes());
        out.extend_from_slice(&self.score_keeping.to_le_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());

        let mut name = [0u8; NAME_LEN];
        for (slot, c) in name.iter_mut().zip(self.name.chars()) {
            *slot = latin1_byte(c);
        }
        out.extend_from_slice(&name);

        out.extend(self.description.chars().map(latin1_byte));
        out.push(0);
    }
}

fn latin1_byte(c: char) -> u8 {
    u8::try_from(u32::from(c)).unwrap_or(b'?')
}

impl fmt::Display for DirectoryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.display_name())?;
        writeln!(f, "ss://{}:{}", self.ip, self.port)?;
        writeln!(f, "{}", self.description)?;
        writeln!(f, "{} players", self.players)?;
        writeln!(f, "{} score keeping", self.score_keeping)?;
        write!(f, "{} server version", self.version)
    }
}

/// The server list, in the order the directory sent it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    pub entries: Vec<DirectoryEntry>,
}

impl Directory {
    /// Decodes a consolidated listing.
    ///
    /// An unexpected format-version byte is logged and decoding carries on.
    /// A record cut short anywhere fails the whole listing.
    pub fn decode(data: &[u8]) -> Result<Self, DecodeError> {
        let mut stream = ByteStream::new(data);

        let header = stream.read_u8().field("listing header")?;
        if header != LISTING_FORMAT_VERSION {
            warn!("unexpected listing header: 0x{:02x}", header);
        }

        let mut entries = Vec::new();
        while !stream.is_empty() {
            entries.push(DirectoryEntry::decode(&mut stream)?);
        }

        Ok(Directory { entries })
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![LISTING_FORMAT_VERSION];
        for entry in &self.entries {
            entry.encode_into(&mut out);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DirectoryEntry> {
        self.entries.iter()
    }
}

impl IntoIterator for Directory {
    type Item = DirectoryEntry;
    type IntoIter = std::vec::IntoIter<DirectoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Directory {
    type Item = &'a DirectoryEntry;
    type IntoIter = std::slice::Iter<'a, DirectoryEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
