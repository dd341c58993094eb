//! # Directory Client Library
//!
//! Client side of the directory service protocol. The directory server keeps
//! the list of running game zones; this crate logs in, asks for the list, and
//! turns the stream of UDP fragments it receives back into [`Directory`]
//! entries.
//!
//! ## Protocol Overview
//!
//! The exchange is driven entirely by what the server sends:
//!
//! 1. The client sends a login datagram.
//! 2. The server answers with a challenge; the client replies with a list
//!    request carrying a minimum player filter.
//! 3. The server sends the listing in fragments. Each fragment is acked by
//!    sequence id, without waiting for anything in return.
//! 4. Once the listing is complete the client disconnects and decodes it.
//!
//! UDP gives no ordering or delivery guarantees, so fragments are held by id
//! and only stitched together once the listing is known to be complete.
//!
//! ### Fragmentation Schemes
//! Servers use one of two schemes, told apart by the first two payload bytes:
//! - Plain chunks, where the last fragment carries a distinct final marker
//! - Length-prefixed chunks, where every fragment announces the total size
//!
//! See [`fragments`] for the details of each.
//!
//! ## Module Organization
//!
//! ### Packets Module (`packets`)
//! Outbound datagram encoders and inbound opcode classification.
//!
//! ### Fragments Module (`fragments`)
//! Per-scheme fragment stores and their completion rules.
//!
//! ### Entry Module (`entry`)
//! The record layout of the reassembled listing.
//!
//! ### Session Module (`session`)
//! The state machine tying the above to a [`shared::Transport`].
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use directory::{DirectoryConfig, DirectorySession};
//! use shared::Connection;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let connection = Connection::dial("127.0.0.1:4990").await?;
//!     let mut session = DirectorySession::new(connection, DirectoryConfig::default());
//!
//!     for entry in session.directory().await? {
//!         println!("{}", entry);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod entry;
pub mod fragments;
pub mod packets;
pub mod session;

pub use config::DirectoryConfig;
pub use entry::{DecodeError, Directory, DirectoryEntry};
pub use fragments::{FragmentKind, FragmentStore, SubFormat};
pub use packets::{Inbound, Outbound, ProtocolError};
pub use session::{DirectoryError, DirectorySession, SessionState};
