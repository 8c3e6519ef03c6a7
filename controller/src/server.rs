use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::time::Duration;

use log::{info, warn};
use servocmd::{CHANNEL_COUNT, ParseError, parse};
use thiserror::Error;

use crate::hardware::ServoBus;
use crate::servo::{ChannelOutcome, ServoManager};
use crate::shutdown::Shutdown;
use crate::status;

// largest possible UDP payload, so no datagram is ever truncated
const RECV_BUFFER_SIZE: usize = 65_535;
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Why a datagram was discarded without touching any servo.
#[derive(Debug, Error, PartialEq)]
pub enum Rejection {
    #[error("payload is not valid UTF-8")]
    NotUtf8,

    #[error(transparent)]
    Parse(#[from] ParseError),
}

pub struct Handled {
    pub from: SocketAddr,
    pub message: String,
    pub result: Result<[ChannelOutcome; CHANNEL_COUNT], Rejection>,
}

/// Binds the command socket. The read timeout lets the loop notice a
/// shutdown request while no datagrams arrive.
pub fn bind(address: &str, port: u16) -> io::Result<UdpSocket> {
    let socket = UdpSocket::bind((address, port))?;
    socket.set_read_timeout(Some(POLL_INTERVAL))?;
    Ok(socket)
}

/// Receives one datagram at a time and applies it before reading the next.
pub struct Server<B: ServoBus> {
    socket: UdpSocket,
    manager: ServoManager<B>,
    buffer: Vec<u8>,
}

impl<B: ServoBus> Server<B> {
    pub fn new(socket: UdpSocket, manager: ServoManager<B>) -> Self {
        Server { socket, manager, buffer: vec![0u8; RECV_BUFFER_SIZE] }
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    pub fn into_manager(self) -> ServoManager<B> {
        self.manager
    }

    pub fn run(&mut self, shutdown: &Shutdown) {
        info!("Receive loop started on {:?}", self.local_addr().ok());

        while !shutdown.requested() {
            match self.serve_one() {
                Ok(Some(handled)) => self.report(&handled),
                Ok(None) => {}
                Err(e) => warn!("UDP receive error: {}", e),
            }
        }

        info!("Receive loop stopped");
    }

    /// Waits up to the poll interval for a datagram. `None` if none came.
    pub fn serve_one(&mut self) -> io::Result<Option<Handled>> {
        let (len, from) = match self.socket.recv_from(&mut self.buffer) {
            Ok(received) => received,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
                ) =>
            {
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let buffer = std::mem::take(&mut self.buffer);
        let handled = self.handle(from, &buffer[..len]);
        self.buffer = buffer;
        Ok(Some(handled))
    }

    pub fn handle(&mut self, from: SocketAddr, payload: &[u8]) -> Handled {
        let (message, result) = match std::str::from_utf8(payload) {
            Ok(text) => {
                let result = parse(text)
                    .map(|command| self.manager.apply(&command))
                    .map_err(Rejection::from);
                (text.to_string(), result)
            }
            Err(_) => (String::from_utf8_lossy(payload).into_owned(), Err(Rejection::NotUtf8)),
        };
        Handled { from, message, result }
    }

    fn report(&self, handled: &Handled) {
        println!("{}", status::message_header(handled.from, &handled.message));
        match &handled.result {
            Ok(outcomes) => {
                for line in status::outcome_lines(&self.manager.pins(), outcomes) {
                    println!("  {}", line);
                }
            }
            Err(rejection) => println!("  {}", status::rejection_line(rejection)),
        }
        println!();
    }
}
