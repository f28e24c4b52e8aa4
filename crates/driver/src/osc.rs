use crate::event::Event;
use anyhow::Context;
use crossbeam_channel::Sender;
use log::{debug, warn};
use rosc::decoder::decode_udp;
use rosc::{OscMessage, OscPacket, encoder};
use std::net::{SocketAddr, UdpSocket};
use std::thread;

const MAX_PACKET: usize = 1536;

/// Outbound half of the engine connection.
pub(crate) trait OscTransport {
    fn send(&mut self, msg: OscMessage) -> anyhow::Result<()>;

    /// Port the engine should send replies to.
    fn reply_port(&self) -> u16;
}

pub(crate) struct UdpTransport {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpTransport {
    /// Binds an ephemeral local port used both for sending and for replies.
    pub fn bind(target: SocketAddr) -> anyhow::Result<Self> {
        let socket = UdpSocket::bind("127.0.0.1:0").context("Can't bind OSC socket")?;
        Ok(Self { socket, target })
    }

    /// Forwards every inbound message to the dispatch loop until it goes away.
    pub fn spawn_listener(&self, events: Sender<Event>) -> anyhow::Result<()> {
        let socket = self.socket.try_clone()?;
        thread::Builder::new()
            .name("osc-in".to_string())
            .spawn(move || listen(socket, events))?;
        Ok(())
    }
}

impl OscTransport for UdpTransport {
    fn send(&mut self, msg: OscMessage) -> anyhow::Result<()> {
        let buf = encoder::encode(&OscPacket::Message(msg))
            .map_err(|e| anyhow::anyhow!("Can't encode OSC message: {e:?}"))?;
        self.socket.send_to(&buf, self.target)?;
        Ok(())
    }

    fn reply_port(&self) -> u16 {
        self.socket.local_addr().map(|a| a.port()).unwrap_or_default()
    }
}

fn listen(socket: UdpSocket, events: Sender<Event>) {
    let mut buf = [0u8; MAX_PACKET];
    loop {
        let size = match socket.recv_from(&mut buf) {
            Ok((size, _)) => size,
            Err(e) => {
                warn!("OSC receive failed: {e}");
                continue;
            }
        };
        let packet = match decode_udp(&buf[..size]) {
            Ok((_, packet)) => packet,
            Err(e) => {
                debug!("Dropping undecodable OSC packet: {e:?}");
                continue;
            }
        };
        let mut messages = Vec::new();
        flatten(packet, &mut messages);
        for msg in messages {
            if events.send(Event::Osc(msg)).is_err() {
                return;
            }
        }
    }
}

fn flatten(packet: OscPacket, out: &mut Vec<OscMessage>) {
    match packet {
        OscPacket::Message(msg) => out.push(msg),
        OscPacket::Bundle(bundle) => {
            for p in bundle.content {
                flatten(p, out);
            }
        }
    }
}
