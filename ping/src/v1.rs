//! Ping protocol version 1: player count and round trip time

use crate::PingError;
use shared::{timestamp_millis, ByteStream, Transport, UnderrunError};
use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingV1Response {
    pub player_count: u32,
    /// Echo of the timestamp the client sent.
    pub client_time: u32,
    /// Round trip time in milliseconds.
    pub lag: u32,
}

impl PingV1Response {
    /// Decodes a response to a request sent at `sent_at`, received at `now`.
    pub fn decode(data: &[u8], sent_at: u32, now: u32) -> Result<Self, UnderrunError> {
        let mut stream = ByteStream::new(data);
        let player_count = stream.read_u32()?;
        let client_time = stream.read_u32()?;

        Ok(PingV1Response {
            player_count,
            client_time,
            lag: now.wrapping_sub(sent_at),
        })
    }
}

impl fmt::Display for PingV1Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerCount: {}, Lag: {}ms", self.player_count, self.lag)
    }
}

pub fn encode_request(now: u32) -> Vec<u8> {
    now.to_le_bytes().to_vec()
}

pub async fn ping<T: Transport>(
    transport: &mut T,
    deadline: Duration,
) -> Result<PingV1Response, PingError> {
    let sent_at = timestamp_millis();
    transport.write(&encode_request(sent_at)).await?;

    let data = transport.read_with_deadline(deadline).await?;
    let now = timestamp_millis();

    Ok(PingV1Response::decode(&data, sent_at, now)?)
}
