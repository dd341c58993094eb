pub mod bytestream;
pub mod connection;
pub mod hexdump;

pub use bytestream::{ByteOrder, ByteStream, UnderrunError};
pub use connection::{Connection, Transport, TransportError};

use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const DIRECTORY_PORT: u16 = 4990;
pub const PING_PORT: u16 = 5001;

/// How long a single read waits for the next datagram.
pub const READ_DEADLINE: Duration = Duration::from_secs(5);

/// Receive buffer size; larger than any datagram the servers send.
pub const MAX_DATAGRAM_SIZE: usize = 2048;

/// Current wall-clock time in milliseconds, truncated to the 32-bit field the
/// ping protocol echoes back.
pub fn timestamp_millis() -> u32 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::from_secs(0))
        .as_millis() as u32
}
