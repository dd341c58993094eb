//! # Ping Client Library
//!
//! Measures latency and population of a zone through its ping service. Each
//! ping is a single request datagram answered by a single response, so there
//! is no session state: write, wait once for the reply, decode.
//!
//! - `v1`: player count and lag
//! - `v2`: lag plus optional global and per-arena player summaries

pub mod v1;
pub mod v2;

use shared::{Connection, TransportError, UnderrunError};
use std::time::Duration;

pub use v1::PingV1Response;
pub use v2::{ArenaSummary, GlobalSummary, PingV2Response};

#[derive(Debug, thiserror::Error)]
pub enum PingError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("failed to decode ping response: {0}")]
    Decode(#[from] UnderrunError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PingVersion {
    #[default]
    V1,
    V2,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PingResponse {
    V1(PingV1Response),
    V2(PingV2Response),
}

impl std::fmt::Display for PingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PingResponse::V1(resp) => write!(f, "{}", resp),
            PingResponse::V2(resp) => write!(f, "{}", resp),
        }
    }
}

/// Dials `addr` and pings it once. V2 asks for both summaries.
pub async fn ping(
    addr: &str,
    version: PingVersion,
    debug: bool,
    deadline: Duration,
) -> Result<PingResponse, PingError> {
    let mut connection = Connection::dial(addr).await?;
    connection.set_debug(debug);

    match version {
        PingVersion::V1 => Ok(PingResponse::V1(
            v1::ping(&mut connection, deadline).await?,
        )),
        PingVersion::V2 => Ok(PingResponse::V2(
            v2::ping(
                &mut connection,
                v2::GLOBAL_SUMMARY | v2::ARENA_SUMMARY,
                deadline,
            )
            .await?,
        )),
    }
}
