//! TCP transport
//!
//! Opens the local socket for the first usable candidate and later connects
//! it to that same candidate.

use super::SocketOpts;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use tokio::net::{TcpSocket, TcpStream};

/// Socket opened for one of the resolved candidates
#[derive(Debug)]
pub struct PreparedSocket {
    socket: Socket,
    peer: SocketAddr,
}

impl PreparedSocket {
    /// Candidate this socket was created for
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Apply socket options before connecting
    pub fn apply(&self, opts: &SocketOpts) -> io::Result<()> {
        opts.apply(&self.socket)
    }

    /// Connect to the candidate and hand the socket to tokio
    pub async fn connect(self) -> io::Result<TcpStream> {
        self.socket.set_nonblocking(true)?;
        let std_stream: std::net::TcpStream = self.socket.into();
        let socket = TcpSocket::from_std_stream(std_stream);
        let stream = socket.connect(self.peer).await?;

        tracing::debug!("TCP connection established to {}", self.peer);
        Ok(stream)
    }
}

/// Open a stream socket for the first candidate whose family yields one
///
/// Candidates are tried in order. Returns `None` when no candidate produced
/// a socket.
pub fn open_socket(candidates: &[SocketAddr]) -> Option<PreparedSocket> {
    candidates.iter().find_map(|peer| {
        match Socket::new(Domain::for_address(*peer), Type::STREAM, Some(Protocol::TCP)) {
            Ok(socket) => Some(PreparedSocket {
                socket,
                peer: *peer,
            }),
            Err(e) => {
                tracing::debug!("Cannot open socket for {}: {}", peer, e);
                None
            }
        }
    })
}
