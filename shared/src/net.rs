//! Transport wrapper: one reliable, ordered connection to one peer.
//!
//! The server role binds a non-blocking TCP listener (auto-incrementing the
//! port on conflicts); the client role connects out. Messages travel as
//! length-prefixed frames so the fixed per-tag size check applies to each
//! one individually. `poll()` never blocks: it drains whatever the socket
//! has and returns the resulting events, so the caller's tick stays in
//! control of all scheduling.

use crate::collision::GameResult;
use crate::position::Direction;
use crate::protocol::{Message, MAX_MESSAGE_LEN};
use log::{debug, error, info, warn};
use std::collections::VecDeque;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{Shutdown, TcpListener, TcpStream, ToSocketAddrs};
use std::time::Duration;
use thiserror::Error;

/// Bounded bind retries before server initialization fails.
const BIND_ATTEMPTS: u16 = 200;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const FRAME_HEADER_LEN: usize = 2;

#[derive(Debug, Error)]
pub enum NetError {
    #[error("transport error: {0}")]
    Io(#[from] io::Error),
    #[error("no free port in {first}..={last}")]
    BindExhausted { first: u16, last: u16 },
    #[error("cannot resolve server address {0}")]
    BadAddress(String),
    #[error("{message} may only be sent by the {role} role")]
    RoleViolation {
        message: &'static str,
        role: &'static str,
    },
    #[error("no peer connected")]
    NotConnected,
}

/// Transport events drained by [`NetChannel::poll`], in arrival order.
#[derive(Debug)]
pub enum ChannelEvent {
    Connected,
    Disconnected,
    Message(Message),
}

enum Role {
    Server { listener: TcpListener },
    Client,
}

pub struct NetChannel {
    role: Role,
    peer: Option<TcpStream>,
    recv_buf: Vec<u8>,
    send_buf: Vec<u8>,
    pending: VecDeque<ChannelEvent>,
}

impl NetChannel {
    /// Binds a listener, walking up from `port` until a free one is found.
    /// Returns the channel and the port actually bound.
    pub fn server(port: u16) -> Result<(NetChannel, u16), NetError> {
        let mut candidate = port;
        let mut listener = None;
        for _ in 0..BIND_ATTEMPTS {
            match TcpListener::bind(("0.0.0.0", candidate)) {
                Ok(bound) => {
                    listener = Some(bound);
                    break;
                }
                Err(e) => {
                    debug!("port {candidate} unavailable: {e}");
                    candidate = candidate.checked_add(1).ok_or(NetError::BindExhausted {
                        first: port,
                        last: candidate,
                    })?;
                }
            }
        }
        let listener = listener.ok_or(NetError::BindExhausted {
            first: port,
            last: candidate,
        })?;
        listener.set_nonblocking(true)?;
        let bound = listener.local_addr()?.port();
        info!("listening on port {bound}");

        Ok((
            NetChannel {
                role: Role::Server { listener },
                peer: None,
                recv_buf: Vec::new(),
                send_buf: Vec::new(),
                pending: VecDeque::new(),
            },
            bound,
        ))
    }

    /// Connects to a server; any failure here is an initialization failure
    /// and the session must not proceed.
    pub fn client(address: &str, port: u16) -> Result<NetChannel, NetError> {
        let target = (address, port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| NetError::BadAddress(format!("{address}:{port}")))?;
        let stream = TcpStream::connect_timeout(&target, CONNECT_TIMEOUT)?;
        stream.set_nonblocking(true)?;
        stream.set_nodelay(true)?;
        info!("connected to {target}");

        let mut pending = VecDeque::new();
        pending.push_back(ChannelEvent::Connected);

        Ok(NetChannel {
            role: Role::Client,
            peer: Some(stream),
            recv_buf: Vec::new(),
            send_buf: Vec::new(),
            pending,
        })
    }

    pub fn is_server(&self) -> bool {
        matches!(self.role, Role::Server { .. })
    }

    pub fn is_connected(&self) -> bool {
        self.peer.is_some()
    }

    /// Drains all pending transport activity without blocking and returns
    /// the resulting events in order.
    pub fn poll(&mut self) -> Vec<ChannelEvent> {
        self.accept_peer();
        self.flush_send();
        self.read_peer();
        self.pending.drain(..).collect()
    }

    pub fn disconnect(&mut self) {
        if let Some(stream) = self.peer.take() {
            let _ = stream.shutdown(Shutdown::Both);
        }
        self.recv_buf.clear();
        self.send_buf.clear();
    }

    pub fn send_start_game(&mut self, msg: Message) -> Result<(), NetError> {
        self.send_as_server(msg)
    }

    pub fn send_game_state(&mut self, msg: Message) -> Result<(), NetError> {
        self.send_as_server(msg)
    }

    pub fn send_stop_game(&mut self, result: GameResult) -> Result<(), NetError> {
        self.send_as_server(Message::StopGame { result })
    }

    pub fn send_direction_change(&mut self, direction: Direction) -> Result<(), NetError> {
        let msg = Message::DirectionChange { direction };
        if self.is_server() {
            error!("refusing to send {} from the server role", msg.name());
            return Err(NetError::RoleViolation {
                message: msg.name(),
                role: "client",
            });
        }
        self.transmit(msg)
    }

    fn send_as_server(&mut self, msg: Message) -> Result<(), NetError> {
        if !self.is_server() {
            error!("refusing to send {} from the client role", msg.name());
            return Err(NetError::RoleViolation {
                message: msg.name(),
                role: "server",
            });
        }
        self.transmit(msg)
    }

    fn transmit(&mut self, msg: Message) -> Result<(), NetError> {
        if self.peer.is_none() {
            warn!("{} not sent: no peer connected", msg.name());
            return Err(NetError::NotConnected);
        }
        let payload = msg.encode();
        self.send_buf
            .extend_from_slice(&(payload.len() as u16).to_le_bytes());
        self.send_buf.extend_from_slice(&payload);
        self.flush_send();
        Ok(())
    }

    fn accept_peer(&mut self) {
        let Role::Server { listener } = &self.role else {
            return;
        };
        loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    if self.peer.is_some() {
                        warn!("refusing connection from {addr}: session occupied");
                        continue;
                    }
                    if let Err(e) = stream.set_nonblocking(true) {
                        error!("cannot configure peer socket: {e}");
                        continue;
                    }
                    let _ = stream.set_nodelay(true);
                    info!("peer connected from {addr}");
                    self.peer = Some(stream);
                    self.pending.push_back(ChannelEvent::Connected);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => {
                    error!("accept failed: {e}");
                    break;
                }
            }
        }
    }

    fn flush_send(&mut self) {
        if self.send_buf.is_empty() {
            return;
        }
        let Some(stream) = self.peer.as_mut() else {
            self.send_buf.clear();
            return;
        };
        let mut failed = None;
        while !self.send_buf.is_empty() {
            match stream.write(&self.send_buf) {
                Ok(0) => {
                    failed = Some("peer write end closed".to_string());
                    break;
                }
                Ok(n) => {
                    self.send_buf.drain(..n);
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    failed = Some(format!("write failed: {e}"));
                    break;
                }
            }
        }
        if let Some(reason) = failed {
            self.drop_peer(&reason);
        }
    }

    fn read_peer(&mut self) {
        let mut closed = None;
        if let Some(stream) = self.peer.as_mut() {
            let mut chunk = [0u8; 2048];
            loop {
                match stream.read(&mut chunk) {
                    Ok(0) => {
                        closed = Some("peer closed connection".to_string());
                        break;
                    }
                    Ok(n) => self.recv_buf.extend_from_slice(&chunk[..n]),
                    Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => {
                        closed = Some(format!("read failed: {e}"));
                        break;
                    }
                }
            }
        } else {
            return;
        }
        if let Some(reason) = closed {
            self.drop_peer(&reason);
            return;
        }
        self.parse_frames();
    }

    fn parse_frames(&mut self) {
        while self.recv_buf.len() >= FRAME_HEADER_LEN {
            let len = u16::from_le_bytes([self.recv_buf[0], self.recv_buf[1]]) as usize;
            if len == 0 || len > MAX_MESSAGE_LEN {
                // Framing is gone; a byte stream cannot resynchronize.
                self.drop_peer(&format!("frame length {len} out of bounds"));
                return;
            }
            if self.recv_buf.len() < FRAME_HEADER_LEN + len {
                break;
            }
            match Message::decode(&self.recv_buf[FRAME_HEADER_LEN..FRAME_HEADER_LEN + len]) {
                Ok(msg) => self.pending.push_back(ChannelEvent::Message(msg)),
                Err(e) => warn!("dropping invalid message: {e}"),
            }
            self.recv_buf.drain(..FRAME_HEADER_LEN + len);
        }
    }

    fn drop_peer(&mut self, reason: &str) {
        info!("peer disconnected: {reason}");
        self.peer = None;
        self.recv_buf.clear();
        self.send_buf.clear();
        self.pending.push_back(ChannelEvent::Disconnected);
    }
}
