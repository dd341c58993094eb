//! Datagram layouts spoken with the directory server
//!
//! All multi-byte fields are little-endian. Every datagram starts with a
//! two-byte opcode; fragment envelopes additionally carry a two-byte sub-type
//! marker at the start of their payload.

use shared::{ByteStream, UnderrunError};

/// Protocol version sent at login by the VIE client.
pub const PROTOCOL_VIE: u16 = 0x0001;
/// Protocol version sent at login by the Continuum client.
pub const PROTOCOL_CONTINUUM: u16 = 0x0011;

/// Non-fatal problems with a single inbound datagram.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("unhandled opcode 0x{0:02x} 0x{1:02x}")]
    UnknownOpcode(u8, u8),
    #[error("unknown sub-type 0x{0:02x} 0x{1:02x} inside a fragment envelope")]
    UnknownSubType(u8, u8),
    #[error("truncated {what}: expected at least {expected} bytes, got {actual}")]
    Truncated {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Datagrams the client sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outbound {
    Login { key: u32, protocol_version: u16 },
    ListRequest { min_players: u32 },
    Ack { id: u32 },
    Disconnect,
}

impl Outbound {
    pub fn encode(&self) -> Vec<u8> {
        match *self {
            Outbound::Login {
                key,
                protocol_version,
            } => {
                let mut out = Vec::with_capacity(8);
                out.extend_from_slice(&[0x00, 0x01]);
                out.extend_from_slice(&key.to_le_bytes());
                out.extend_from_slice(&protocol_version.to_le_bytes());
                out
            }
            Outbound::ListRequest { min_players } => {
                let mut out = Vec::with_capacity(11);
                out.extend_from_slice(&[0x00, 0x03, 0, 0, 0, 0, 0x01]);
                out.extend_from_slice(&min_players.to_le_bytes());
                out
            }
            Outbound::Ack { id } => {
                let mut out = Vec::with_capacity(6);
                out.extend_from_slice(&[0x00, 0x04]);
                out.extend_from_slice(&id.to_le_bytes());
                out
            }
            Outbound::Disconnect => vec![0x00, 0x07],
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Outbound::Login { .. } => "login",
            Outbound::ListRequest { .. } => "list request",
            Outbound::Ack { .. } => "ack",
            Outbound::Disconnect => "disconnect",
        }
    }
}

/// Datagrams the server sends, borrowed from the receive buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound<'a> {
    /// `00 02`: hello/challenge, answered with a list request.
    Challenge,
    /// `00 03`: one fragment of the directory listing.
    Fragment { id: u32, payload: &'a [u8] },
    /// `00 04`: ack or keepalive echo.
    Ack { id: u32 },
    /// `00 07`: the server is closing the session.
    Disconnect,
    /// `00 0e`: informational list-response header.
    ListResponse(&'a [u8]),
}

impl<'a> Inbound<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self, ProtocolError> {
        let opcode = match data {
            [a, b, ..] => [*a, *b],
            _ => {
                return Err(ProtocolError::Truncated {
                    what: "datagram",
                    expected: 2,
                    actual: data.len(),
                })
            }
        };
        let body = &data[2..];

        match opcode {
            [0x00, 0x02] => Ok(Inbound::Challenge),
            [0x00, 0x03] => {
                let id = read_id(body, "fragment envelope")?;
                Ok(Inbound::Fragment {
                    id,
                    payload: &body[4..],
                })
            }
            [0x00, 0x04] => Ok(Inbound::Ack {
                id: read_id(body, "ack")?,
            }),
            [0x00, 0x07] => Ok(Inbound::Disconnect),
            [0x00, 0x0e] => Ok(Inbound::ListResponse(body)),
            [a, b] => Err(ProtocolError::UnknownOpcode(a, b)),
        }
    }
}

fn read_id(body: &[u8], what: &'static str) -> Result<u32, ProtocolError> {
    ByteStream::new(body)
        .read_u32()
        .map_err(|e| ProtocolError::Truncated {
            what,
            expected: e.expected + 2,
            actual: e.actual + 2,
        })
}

/// Fields of the informational `00 0e` datagram.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListResponseHeader {
    pub size: u8,
    pub packet_type: u16,
    pub packet_id: u32,
}

impl ListResponseHeader {
    /// Parses the body that follows the opcode: seven unknown bytes, the
    /// header fields, then two trailing unknown bytes.
    pub fn parse(body: &[u8]) -> Result<Self, UnderrunError> {
        let mut stream = ByteStream::new(body);
        stream.skip(7)?;
        let size = stream.read_u8()?;
        let packet_type = stream.read_u16()?;
        let packet_id = stream.read_u32()?;
        stream.skip(2)?;

        Ok(ListResponseHeader {
            size,
            packet_type,
            packet_id,
        })
    }
}
