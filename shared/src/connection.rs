//! Datagram transport used by the directory and ping clients
//!
//! [`Transport`] is the seam the protocol state machines are written against;
//! [`Connection`] is the production implementation on a connected tokio UDP
//! socket. The socket is released when the `Connection` is dropped, so every
//! exit path of a caller closes it.

use crate::hexdump;
use crate::MAX_DATAGRAM_SIZE;
use log::info;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{lookup_host, UdpSocket};
use tokio::time::timeout;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to resolve {addr}: {source}")]
    Resolve { addr: String, source: io::Error },
    #[error("failed to dial {addr}: {source}")]
    Dial { addr: String, source: io::Error },
    #[error("failed to write datagram: {0}")]
    Write(#[source] io::Error),
    #[error("failed to read datagram: {0}")]
    Read(#[source] io::Error),
    #[error("no datagram received within {0:?}")]
    Timeout(Duration),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}

/// A duplex datagram channel to a single peer.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Sends one datagram.
    async fn write(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Waits at most `deadline` for the next datagram.
    async fn read_with_deadline(&mut self, deadline: Duration) -> Result<Vec<u8>, TransportError>;
}

pub struct Connection {
    socket: UdpSocket,
    peer: SocketAddr,
    debug: bool,
}

impl Connection {
    /// Connects to `addr` in `host:port` form.
    pub async fn dial(addr: &str) -> Result<Self, TransportError> {
        info!("Connecting to {}...", addr);

        let peer = lookup_host(addr)
            .await
            .map_err(|source| TransportError::Resolve {
                addr: addr.to_string(),
                source,
            })?
            .next()
            .ok_or_else(|| TransportError::Resolve {
                addr: addr.to_string(),
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses found"),
            })?;

        let local = if peer.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let dial_err = |source| TransportError::Dial {
            addr: addr.to_string(),
            source,
        };
        let socket = UdpSocket::bind(local).await.map_err(dial_err)?;
        socket.connect(peer).await.map_err(dial_err)?;

        info!("Connected.");

        Ok(Connection {
            socket,
            peer,
            debug: false,
        })
    }

    /// Enables hex dumps of every datagram sent and received.
    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }
}

impl Transport for Connection {
    async fn write(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if self.debug {
            hexdump::log_prefix(data, "C2S |");
        }
        self.socket
            .send(data)
            .await
            .map_err(TransportError::Write)?;
        Ok(())
    }

    async fn read_with_deadline(&mut self, deadline: Duration) -> Result<Vec<u8>, TransportError> {
        let mut buffer = [0u8; MAX_DATAGRAM_SIZE];

        let len = match timeout(deadline, self.socket.recv(&mut buffer)).await {
            Ok(Ok(len)) => len,
            Ok(Err(e)) => return Err(TransportError::Read(e)),
            Err(_) => return Err(TransportError::Timeout(deadline)),
        };

        let data = buffer[..len].to_vec();
        if self.debug {
            hexdump::log_prefix(&data, "S2C |");
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::{assert_err, assert_ok};

    async fn peer_socket() -> (UdpSocket, String) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap().to_string();
        (socket, addr)
    }

    #[tokio::test]
    async fn test_dial_and_write() {
        let (peer, addr) = peer_socket().await;
        let mut conn = Connection::dial(&addr).await.unwrap();
        assert_eq!(conn.peer_addr().to_string(), addr);

        assert_ok!(conn.write(&[0x00, 0x07]).await);

        let mut buf = [0u8; 16];
        let (len, from) = peer.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..len], &[0x00, 0x07]);
        assert_eq!(from.port(), conn.local_addr().unwrap().port());
    }

    #[tokio::test]
    async fn test_read_returns_datagram() {
        let (peer, addr) = peer_socket().await;
        let mut conn = Connection::dial(&addr).await.unwrap();
        conn.set_debug(true);

        let client_port = conn.local_addr().unwrap().port();
        peer.send_to(&[0x00, 0x02, 0xaa], ("127.0.0.1", client_port))
            .await
            .unwrap();

        let data = conn
            .read_with_deadline(Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(data, vec![0x00, 0x02, 0xaa]);
    }

    #[tokio::test]
    async fn test_read_times_out() {
        let (_peer, addr) = peer_socket().await;
        let mut conn = Connection::dial(&addr).await.unwrap();

        let deadline = Duration::from_millis(50);
        let err = assert_err!(conn.read_with_deadline(deadline).await);
        assert!(err.is_timeout());
        assert!(matches!(err, TransportError::Timeout(d) if d == deadline));
    }

    #[tokio::test]
    async fn test_dial_rejects_unresolvable_address() {
        let result = Connection::dial("not an address").await;
        assert!(matches!(result, Err(TransportError::Resolve { .. })));
    }
}
