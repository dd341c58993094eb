//! Directory session state machine
//!
//! One [`DirectorySession`] owns one transport and runs the listing exchange:
//!
//! ```text
//! AwaitingHello -> CollectingFragments -> Consolidating -> Disconnecting -> Done
//!        \________________\_____________________________________________-> Failed
//! ```
//!
//! Every loop iteration waits (bounded by the read deadline) for exactly one
//! datagram and reacts to it. Fragments are acked as they arrive; the session
//! never waits for an ack to be confirmed, and a retransmitted fragment simply
//! replaces the stored copy.

use crate::config::DirectoryConfig;
use crate::entry::{DecodeError, Directory};
use crate::fragments::{FragmentKind, FragmentStore, SubFormat};
use crate::packets::{Inbound, ListResponseHeader, Outbound, ProtocolError};
use log::{debug, info, warn};
use shared::{Transport, TransportError};

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("timeout x{0}")]
    Timeout(u32),
    #[error("server requested disconnection")]
    PeerDisconnect,
    #[error("failed to decode directory: {0}")]
    Decode(#[from] DecodeError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingHello,
    CollectingFragments,
    Consolidating,
    Disconnecting,
    Done,
    Failed,
}

pub struct DirectorySession<T> {
    transport: T,
    config: DirectoryConfig,
    plain: FragmentStore,
    sized: FragmentStore,
    plain_complete: bool,
    sized_complete: bool,
    state: SessionState,
}

impl<T: Transport> DirectorySession<T> {
    pub fn new(transport: T, config: DirectoryConfig) -> Self {
        Self {
            transport,
            config,
            plain: FragmentStore::new(SubFormat::Plain),
            sized: FragmentStore::new(SubFormat::LengthPrefixed),
            plain_complete: false,
            sized_complete: false,
            state: SessionState::AwaitingHello,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Requests the server list and decodes it.
    ///
    /// Either every entry is returned or an error; a listing that fails to
    /// decode yields no entries at all.
    pub async fn directory(&mut self) -> Result<Directory, DirectoryError> {
        let listing = self.collect().await?;

        match Directory::decode(&listing) {
            Ok(directory) => {
                info!("Received {} directory entries", directory.len());
                Ok(directory)
            }
            Err(e) => {
                warn!("failed to decode directory listing: {}", e);
                self.transition(SessionState::Failed);
                Err(e.into())
            }
        }
    }

    /// Runs the exchange up to and including the disconnect and returns the
    /// consolidated listing bytes, fragment headers stripped.
    pub async fn collect(&mut self) -> Result<Vec<u8>, DirectoryError> {
        self.reset();

        let result = self.run().await;
        if let Err(e) = &result {
            warn!("directory session failed: {}", e);
            self.plain.clear();
            self.sized.clear();
            self.transition(SessionState::Failed);
        }
        result
    }

    fn reset(&mut self) {
        self.plain.clear();
        self.sized.clear();
        self.plain_complete = false;
        self.sized_complete = false;
        self.state = SessionState::AwaitingHello;
    }

    async fn run(&mut self) -> Result<Vec<u8>, DirectoryError> {
        self.send(Outbound::Login {
            key: self.config.login_key,
            protocol_version: self.config.protocol_version,
        })
        .await?;

        let mut timeouts = 0;
        let format = loop {
            let datagram = match self
                .transport
                .read_with_deadline(self.config.read_deadline)
                .await
            {
                Ok(datagram) => {
                    timeouts = 0;
                    datagram
                }
                Err(TransportError::Timeout(deadline)) => {
                    timeouts += 1;
                    warn!(
                        "No datagram within {:?} ({}/{})",
                        deadline, timeouts, self.config.max_timeouts
                    );
                    if timeouts >= self.config.max_timeouts {
                        return Err(DirectoryError::Timeout(timeouts));
                    }
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            self.handle_datagram(&datagram).await?;

            if let Some(format) = self.completed_format() {
                break format;
            }
        };

        self.transition(SessionState::Consolidating);
        let listing = match format {
            SubFormat::Plain => self.plain.consolidate(),
            SubFormat::LengthPrefixed => self.sized.consolidate(),
        };
        debug!(
            "consolidated {} plain / {} length-prefixed fragments into {} bytes",
            self.plain.len(),
            self.sized.len(),
            listing.len()
        );
        self.plain.clear();
        self.sized.clear();

        self.transition(SessionState::Disconnecting);
        if let Err(e) = self.send(Outbound::Disconnect).await {
            warn!("Failed to send disconnect: {}", e);
        }
        self.transition(SessionState::Done);

        Ok(listing)
    }

    /// Plain listings win when both could be complete.
    fn completed_format(&self) -> Option<SubFormat> {
        if self.plain_complete {
            Some(SubFormat::Plain)
        } else if self.sized_complete {
            Some(SubFormat::LengthPrefixed)
        } else {
            None
        }
    }

    async fn handle_datagram(&mut self, data: &[u8]) -> Result<(), DirectoryError> {
        let inbound = match Inbound::parse(data) {
            Ok(inbound) => inbound,
            Err(e) => {
                warn!("Skipping datagram: {}", e);
                return Ok(());
            }
        };

        match inbound {
            Inbound::Challenge => {
                if self.state == SessionState::AwaitingHello {
                    self.send(Outbound::ListRequest {
                        min_players: self.config.min_players,
                    })
                    .await?;
                } else {
                    debug!("ignoring challenge while {:?}", self.state);
                }
            }
            Inbound::Fragment { id, payload } => self.on_fragment(id, payload).await,
            Inbound::Ack { id: 0 } => {
                info!("Server acked id 0, disconnecting");
                if let Err(e) = self.send(Outbound::Disconnect).await {
                    warn!("Failed to send disconnect: {}", e);
                }
            }
            Inbound::Ack { id } => debug!("server ack {}", id),
            Inbound::Disconnect => {
                info!("Disconnection requested from server");
                return Err(DirectoryError::PeerDisconnect);
            }
            Inbound::ListResponse(body) => match ListResponseHeader::parse(body) {
                Ok(header) => info!(
                    "Directory list response: size {} type 0x{:04x} id {}",
                    header.size, header.packet_type, header.packet_id
                ),
                Err(e) => warn!("Malformed directory list response: {}", e),
            },
        }

        Ok(())
    }

    async fn on_fragment(&mut self, id: u32, payload: &[u8]) {
        let kind = match FragmentKind::classify(payload) {
            Ok(kind) => kind,
            Err(e) => {
                self.reject_fragment(id, e).await;
                return;
            }
        };

        let store = match kind.format() {
            SubFormat::Plain => &mut self.plain,
            SubFormat::LengthPrefixed => &mut self.sized,
        };
        if let Err(e) = store.add(id, payload.to_vec()) {
            self.reject_fragment(id, e).await;
            return;
        }
        debug!("stored fragment {} ({:?}, {} bytes)", id, kind, payload.len());

        match kind.format() {
            SubFormat::Plain if kind.is_final() => self.plain_complete = true,
            SubFormat::Plain => {}
            SubFormat::LengthPrefixed => {
                if self.sized.is_length_satisfied() {
                    self.sized_complete = true;
                }
            }
        }

        if self.state == SessionState::AwaitingHello {
            self.transition(SessionState::CollectingFragments);
        }

        self.ack(id).await;
    }

    async fn reject_fragment(&mut self, id: u32, reason: ProtocolError) {
        warn!("Dropping fragment {}: {}", id, reason);
        if self.config.ack_unrecognized {
            self.ack(id).await;
        }
    }

    async fn ack(&mut self, id: u32) {
        if let Err(e) = self.send(Outbound::Ack { id }).await {
            warn!("Cannot ack fragment {}: {}", id, e);
        }
    }

    async fn send(&mut self, packet: Outbound) -> Result<(), TransportError> {
        debug!("sending {}", packet.name());
        self.transport.write(&packet.encode()).await
    }

    fn transition(&mut self, next: SessionState) {
        if self.state != next {
            debug!("directory session: {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}
