use std::io;
use std::net::UdpSocket;

use log::{debug, info};

/// Fire-and-forget datagram sender for servo commands.
pub struct Sender {
    socket: UdpSocket,
    target: String,
}

impl Sender {
    pub fn new(host: &str, port: u16) -> io::Result<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        let target = format!("{}:{}", host, port);
        info!("UDP sender ready for {}", target);
        Ok(Sender { socket, target })
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn send(&self, command: &str) -> io::Result<()> {
        let sent = self.socket.send_to(command.as_bytes(), &self.target)?;
        debug!("{} bytes to {}", sent, self.target);
        Ok(())
    }
}
