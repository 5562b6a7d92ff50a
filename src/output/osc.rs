//! OSC control message dispatcher
//!
//! One message per addressed channel per cycle, fresh or stale. Sends are
//! fire-and-forget: a failed send is logged and counted, and the next cycle
//! resends the current state anyway.

use rosc::{OscMessage, OscPacket, OscType};
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use crate::config::{AddressScheme, OscConfig};
use crate::control::{ChannelId, ChannelValue, CycleSnapshot};
use crate::error::{DispatchError, GesturaError};

/// Channel → address table for a naming scheme, in send order
pub fn addresses(scheme: AddressScheme, ear_address: Option<&str>) -> Vec<(ChannelId, String)> {
    let names: [(ChannelId, &str); 6] = match scheme {
        AddressScheme::Legacy => [
            (ChannelId::Head, "/cap"),
            (ChannelId::Eyes, "/ochi"),
            (ChannelId::LeftHand, "/mana1"),
            (ChannelId::LeftHandOpen, "/mana1_inchisa"),
            (ChannelId::RightHand, "/mana2"),
            (ChannelId::RightHandOpen, "/mana2_inchisa"),
        ],
        AddressScheme::Named => [
            (ChannelId::Head, "/head"),
            (ChannelId::Eyes, "/eyes"),
            (ChannelId::LeftHand, "/manaStanga"),
            (ChannelId::LeftHandOpen, "/manaStangaInchisa"),
            (ChannelId::RightHand, "/manaDreapta"),
            (ChannelId::RightHandOpen, "/manaDreaptaInchisa"),
        ],
    };

    let mut table: Vec<(ChannelId, String)> = names
        .iter()
        .map(|(id, addr)| (*id, addr.to_string()))
        .collect();

    if let Some(addr) = ear_address {
        table.push((ChannelId::EyeRatio, addr.to_string()));
    }

    table
}

/// OSC arguments for a channel value
pub fn encode_value(value: ChannelValue) -> Vec<OscType> {
    match value {
        ChannelValue::Vector3([x, y, z]) => {
            vec![OscType::Float(x), OscType::Float(y), OscType::Float(z)]
        }
        ChannelValue::Scalar(v) => vec![OscType::Float(v)],
        ChannelValue::Flag(on) => vec![OscType::Int(i32::from(on))],
    }
}

/// Outcome of one cycle's dispatch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    pub sent: usize,
    pub failed: usize,
}

/// Sends channel snapshots to the OSC target
pub struct OscDispatcher {
    socket: UdpSocket,
    target: SocketAddr,
    addresses: Vec<(ChannelId, String)>,
}

impl OscDispatcher {
    /// Resolve the target and bind an ephemeral local socket
    pub fn new(config: &OscConfig) -> Result<Self, GesturaError> {
        let target_str = format!("{}:{}", config.target_host, config.target_port);
        let target = target_str
            .to_socket_addrs()
            .map_err(|e| DispatchError::Target(format!("{}: {}", target_str, e)))?
            .next()
            .ok_or_else(|| DispatchError::Target(format!("{}: no addresses", target_str)))?;

        let bind_addr = if target.is_ipv6() { "[::]:0" } else { "0.0.0.0:0" };
        let socket = UdpSocket::bind(bind_addr)
            .map_err(|e| DispatchError::Bind(format!("{}: {}", bind_addr, e)))?;

        // never let a full send buffer stall the cycle
        socket
            .set_nonblocking(true)
            .map_err(|e| DispatchError::Bind(format!("Failed to set non-blocking: {}", e)))?;

        let addresses = addresses(config.scheme, config.ear_address.as_deref());

        tracing::info!(
            "OSC dispatcher sending {} channels to {} ({:?} addresses)",
            addresses.len(),
            target,
            config.scheme
        );

        Ok(Self {
            socket,
            target,
            addresses,
        })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Address assigned to a channel, if it is sent at all
    pub fn address(&self, id: ChannelId) -> Option<&str> {
        self.addresses
            .iter()
            .find(|(c, _)| *c == id)
            .map(|(_, addr)| addr.as_str())
    }

    /// Messages for one snapshot, in send order
    pub fn messages(&self, snapshot: &CycleSnapshot) -> Vec<OscMessage> {
        self.addresses
            .iter()
            .map(|(id, addr)| OscMessage {
                addr: addr.clone(),
                args: encode_value(snapshot.get(*id)),
            })
            .collect()
    }

    /// Send one message per addressed channel
    pub fn dispatch(&self, snapshot: &CycleSnapshot) -> DispatchReport {
        let mut report = DispatchReport::default();

        for msg in self.messages(snapshot) {
            match self.send(msg) {
                Ok(()) => report.sent += 1,
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!("{}", e);
                }
            }
        }

        report
    }

    fn send(&self, msg: OscMessage) -> Result<(), DispatchError> {
        let addr = msg.addr.clone();
        let bytes = rosc::encoder::encode(&OscPacket::Message(msg))
            .map_err(|e| DispatchError::Encode(format!("{}: {}", addr, e)))?;

        self.socket
            .send_to(&bytes, self.target)
            .map_err(|e| DispatchError::Send(format!("{}: {}", addr, e)))?;

        Ok(())
    }
}
