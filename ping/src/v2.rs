//! Ping protocol version 2: optional global and per-arena population summaries
//!
//! The request carries an option bitmask next to the timestamp. The server
//! echoes both, then appends the sections the options ask for.

use crate::PingError;
use shared::{timestamp_millis, ByteStream, Transport, UnderrunError};
use std::fmt;
use std::time::Duration;

pub const GLOBAL_SUMMARY: u32 = 0x01;
pub const ARENA_SUMMARY: u32 = 0x02;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobalSummary {
    pub total: u32,
    pub playing: u32,
}

impl fmt::Display for GlobalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Total: {}, Playing: {}", self.total, self.playing)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaSummary {
    pub name: String,
    pub total: u16,
    pub playing: u16,
}

impl fmt::Display for ArenaSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}/{}", self.name, self.playing, self.total)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingV2Response {
    pub client_time: u32,
    pub options: u32,
    /// Round trip time in milliseconds.
    pub lag: u32,
    pub global: Option<GlobalSummary>,
    pub arenas: Vec<ArenaSummary>,
}

impl PingV2Response {
    /// Decodes a response received at `now`.
    ///
    /// Which sections follow the header is decided by the options the server
    /// echoed back, not the ones that were requested.
    pub fn decode(data: &[u8], now: u32) -> Result<Self, UnderrunError> {
        let mut stream = ByteStream::new(data);
        let client_time = stream.read_u32()?;
        let options = stream.read_u32()?;

        let global = if options & GLOBAL_SUMMARY != 0 {
            Some(GlobalSummary {
                total: stream.read_u32()?,
                playing: stream.read_u32()?,
            })
        } else {
            None
        };

        let mut arenas = Vec::new();
        if options & ARENA_SUMMARY != 0 {
            while !stream.is_empty() {
                let name = stream.read_zero_terminated_string()?;
                if name.is_empty() {
                    break;
                }
                let total = stream.read_u16()?;
                let playing = stream.read_u16()?;
                arenas.push(ArenaSummary {
                    name,
                    total,
                    playing,
                });
            }
        }

        Ok(PingV2Response {
            client_time,
            options,
            lag: now.wrapping_sub(client_time),
            global,
            arenas,
        })
    }
}

impl fmt::Display for PingV2Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Lag: {}ms", self.lag)?;
        if let Some(global) = &self.global {
            write!(f, "\nGlobalSummary: {}", global)?;
        }
        for (i, arena) in self.arenas.iter().enumerate() {
            write!(f, "\nArena {}: {}", i, arena)?;
        }
        Ok(())
    }
}

pub fn encode_request(now: u32, options: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(8);
    out.extend_from_slice(&now.to_le_bytes());
    out.extend_from_slice(&options.to_le_bytes());
    out
}

pub async fn ping<T: Transport>(
    transport: &mut T,
    options: u32,
    deadline: Duration,
) -> Result<PingV2Response, PingError> {
    transport
        .write(&encode_request(timestamp_millis(), options))
        .await?;

    let data = transport.read_with_deadline(deadline).await?;
    Ok(PingV2Response::decode(&data, timestamp_millis())?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(client_time: u32, options: u32) -> Vec<u8> {
        encode_request(client_time, options)
    }

    fn arena(out: &mut Vec<u8>, name: &str, total: u16, playing: u16) {
        out.extend_from_slice(name.as_bytes());
        out.push(0);
        out.extend_from_slice(&total.to_le_bytes());
        out.extend_from_slice(&playing.to_le_bytes());
    }

    #[test]
    fn test_request_layout() {
        assert_eq!(
            encode_request(1, GLOBAL_SUMMARY | ARENA_SUMMARY),
            vec![1, 0, 0, 0, 3, 0, 0, 0]
        );
    }

    #[test]
    fn test_header_only() {
        let resp = PingV2Response::decode(&header(500, 0), 520).unwrap();

        assert_eq!(resp.lag, 20);
        assert_eq!(resp.global, None);
        assert!(resp.arenas.is_empty());
        assert_eq!(resp.to_string(), "Lag: 20ms");
    }

    #[test]
    fn test_full_response() {
        let mut data = header(100, GLOBAL_SUMMARY | ARENA_SUMMARY);
        data.extend_from_slice(&250u32.to_le_bytes());
        data.extend_from_slice(&180u32.to_le_bytes());
        arena(&mut data, "0", 40, 30);
        arena(&mut data, "duel", 12, 8);

        let resp = PingV2Response::decode(&data, 150).unwrap();
        assert_eq!(
            resp.global,
            Some(GlobalSummary {
                total: 250,
                playing: 180
            })
        );
        assert_eq!(resp.arenas.len(), 2);
        assert_eq!(resp.arenas[1].name, "duel");
        assert_eq!(resp.arenas[1].playing, 8);

        let text = resp.to_string();
        assert!(text.contains("GlobalSummary: Total: 250, Playing: 180"));
        assert!(text.contains("Arena 0: 0: 30/40"));
        assert!(text.contains("Arena 1: duel: 8/12"));
    }

    #[test]
    fn test_empty_arena_name_ends_the_list() {
        let mut data = header(0, ARENA_SUMMARY);
        arena(&mut data, "pub", 5, 5);
        data.push(0);
        data.extend_from_slice(b"ignored");

        let resp = PingV2Response::decode(&data, 0).unwrap();
        assert_eq!(resp.arenas.len(), 1);
    }

    #[test]
    fn test_truncated_arena_fails() {
        let mut data = header(0, ARENA_SUMMARY);
        data.extend_from_slice(b"pub\0");
        data.push(5);

        assert!(PingV2Response::decode(&data, 0).is_err());
    }

    #[test]
    fn test_truncated_global_summary_fails() {
        let mut data = header(0, GLOBAL_SUMMARY);
        data.extend_from_slice(&[1, 0, 0, 0]);

        let err = PingV2Response::decode(&data, 0).unwrap_err();
        assert_eq!(err.offset, 12);
    }
}
