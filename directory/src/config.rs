use crate::packets::PROTOCOL_VIE;
use shared::READ_DEADLINE;
use std::time::Duration;

/// Tunables for one directory session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryConfig {
    /// Servers with fewer players are filtered out by the directory.
    pub min_players: u32,
    /// Key sent in the login datagram.
    pub login_key: u32,
    /// Client protocol version sent at login.
    pub protocol_version: u16,
    /// How long each read waits for a datagram.
    pub read_deadline: Duration,
    /// Consecutive read timeouts tolerated before giving up.
    pub max_timeouts: u32,
    /// Whether fragments with an unrecognized sub-type marker are still acked.
    ///
    /// Off by default: such fragments are logged and dropped unacknowledged.
    /// A server that stops sending until each fragment is acked will stall in
    /// that case, and turning this on unblocks it.
    pub ack_unrecognized: bool,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            min_players: 0,
            login_key: 0,
            protocol_version: PROTOCOL_VIE,
            read_deadline: READ_DEADLINE,
            max_timeouts: 5,
            ack_unrecognized: false,
        }
    }
}
