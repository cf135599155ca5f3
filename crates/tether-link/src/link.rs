use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};
use std::time::{Duration, Instant};

use mavlink::{
    common::{HEARTBEAT_DATA, MavAutopilot, MavMessage, MavModeFlag, MavState, MavType},
    MavHeader, MavlinkVersion,
};
use serde::Deserialize;
use tracing::{debug, info, trace};

use crate::error::VehicleError;
use crate::Result;

/// Largest MAVLink v2 frame (279 bytes) with headroom.
const MAX_FRAME: usize = 512;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// Address to bind the UDP listener on.
    pub host: String,
    /// Carried as u32 so an out-of-range value can be rejected explicitly
    /// instead of silently truncated.
    pub port: u32,
    /// MAVLink ids we use (ground station side).
    pub sys_id: u8,
    pub comp_id: u8,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 14550,
            sys_id: 255,
            comp_id: 190,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    NotListening,
    Listening,
    Established,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeUnit {
    Millis,
    Seconds,
}

/// One UDP session to a vehicle.
///
/// Lifecycle is monotonic: `NotListening` at construction, `Listening` after
/// a successful [`VehicleLink::listen`], `Established` once a heartbeat has
/// been received. Target ids, peer address, and start time exist iff the
/// link is established.
pub struct VehicleLink {
    cfg: LinkConfig,
    state: LinkState,
    socket: Option<UdpSocket>,
    peer: Option<SocketAddr>,
    target: Option<(u8, u8)>,
    established_at: Option<Instant>,
    seq: u8,
}

impl VehicleLink {
    pub fn new(cfg: LinkConfig) -> Self {
        Self {
            cfg,
            state: LinkState::NotListening,
            socket: None,
            peer: None,
            target: None,
            established_at: None,
            seq: 0,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    pub fn is_established(&self) -> bool {
        self.state == LinkState::Established
    }

    /// Bind the UDP listener at `host:port`.
    ///
    /// Fails with `InvalidPort`/`InvalidAddress` for malformed parameters and
    /// `AlreadyListening` if called twice; re-binding an active socket is
    /// never attempted.
    pub fn listen(&mut self) -> Result<()> {
        if self.state != LinkState::NotListening {
            return Err(VehicleError::AlreadyListening);
        }
        if self.cfg.port > u16::MAX as u32 {
            return Err(VehicleError::InvalidPort(self.cfg.port));
        }
        let port = self.cfg.port as u16;
        let addr = (self.cfg.host.as_str(), port)
            .to_socket_addrs()
            .map_err(|_| VehicleError::InvalidAddress(self.cfg.host.clone()))?
            .next()
            .ok_or_else(|| VehicleError::InvalidAddress(self.cfg.host.clone()))?;

        self.socket = Some(UdpSocket::bind(addr)?);
        self.state = LinkState::Listening;
        info!("link: listening on {}", addr);
        Ok(())
    }

    /// Block until a heartbeat arrives from the vehicle.
    ///
    /// `timeout: None` waits indefinitely; `Some(d)` fails with `Timeout`
    /// once `d` has elapsed with no heartbeat. On receipt the link becomes
    /// `Established` and the sender's system/component ids and address are
    /// captured. Calling on an already-established link is a no-op.
    pub fn await_heartbeat(&mut self, timeout: Option<Duration>) -> Result<()> {
        match self.state {
            LinkState::NotListening => return Err(VehicleError::NotListening),
            LinkState::Established => return Ok(()),
            LinkState::Listening => {}
        }
        let deadline = timeout.map(|t| Instant::now() + t);

        loop {
            let (hdr, msg, from) = self.recv_until(deadline, "heartbeat")?;
            // Ignore our own traffic (e.g. another GCS on the same sysid).
            if hdr.system_id == self.cfg.sys_id {
                continue;
            }
            if matches!(msg, MavMessage::HEARTBEAT(_)) {
                self.peer = Some(from);
                self.target = Some((hdr.system_id, hdr.component_id));
                self.established_at = Some(Instant::now());
                self.state = LinkState::Established;
                info!(
                    "link: established with system {} component {} at {}",
                    hdr.system_id, hdr.component_id, from
                );
                return Ok(());
            }
            trace!("link: skipping non-heartbeat message while establishing");
        }
    }

    /// Elapsed time since the heartbeat that established the connection.
    pub fn age_of_connection(&self, unit: AgeUnit) -> Result<u64> {
        let start = self.established_at.ok_or(VehicleError::NotEstablished)?;
        let elapsed = start.elapsed();
        Ok(match unit {
            AgeUnit::Millis => elapsed.as_millis() as u64,
            AgeUnit::Seconds => elapsed.as_secs(),
        })
    }

    /// System id of the connected vehicle.
    pub fn target_system(&self) -> Result<u8> {
        self.target
            .map(|(sys, _)| sys)
            .ok_or(VehicleError::NotEstablished)
    }

    /// Component id of the connected vehicle.
    pub fn target_component(&self) -> Result<u8> {
        self.target
            .map(|(_, comp)| comp)
            .ok_or(VehicleError::NotEstablished)
    }

    /// Send one framed message to the vehicle. All protocol sends gate here:
    /// nothing is transmitted before the connection is established.
    pub fn send(&mut self, msg: &MavMessage) -> Result<()> {
        if self.state != LinkState::Established {
            return Err(VehicleError::NotEstablished);
        }
        let socket = self.socket.as_ref().ok_or(VehicleError::NotEstablished)?;
        let peer = self.peer.ok_or(VehicleError::NotEstablished)?;

        self.seq = self.seq.wrapping_add(1);
        let hdr = MavHeader {
            system_id: self.cfg.sys_id,
            component_id: self.cfg.comp_id,
            sequence: self.seq,
        };
        let mut buf = Vec::with_capacity(MAX_FRAME);
        mavlink::write_versioned_msg(&mut buf, MavlinkVersion::V2, hdr, msg)?;
        socket.send_to(&buf, peer)?;
        debug!("link: sent {} bytes to {}", buf.len(), peer);
        Ok(())
    }

    /// Ground-station heartbeat; ArduSub-family firmwares expect one
    /// periodically once a session is up.
    pub fn send_heartbeat(&mut self) -> Result<()> {
        let hb = HEARTBEAT_DATA {
            custom_mode: 0,
            mavtype: MavType::MAV_TYPE_GCS,
            autopilot: MavAutopilot::MAV_AUTOPILOT_INVALID,
            base_mode: MavModeFlag::empty(),
            system_status: MavState::MAV_STATE_ACTIVE,
            mavlink_version: 3,
        };
        self.send(&MavMessage::HEARTBEAT(hb))
    }

    /// Receive one framed message, skipping datagrams that do not parse.
    /// `timeout` bounds the whole wait, not a single read.
    pub fn recv_message(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<(MavHeader, MavMessage)> {
        if self.state == LinkState::NotListening {
            return Err(VehicleError::NotListening);
        }
        let deadline = timeout.map(|t| Instant::now() + t);
        let (hdr, msg, _) = self.recv_until(deadline, "message")?;
        Ok((hdr, msg))
    }

    /// Local address of the bound socket (useful when bound to port 0).
    pub fn local_addr(&self) -> Result<SocketAddr> {
        let socket = self.socket.as_ref().ok_or(VehicleError::NotListening)?;
        Ok(socket.local_addr()?)
    }

    fn recv_until(
        &mut self,
        deadline: Option<Instant>,
        what: &'static str,
    ) -> Result<(MavHeader, MavMessage, SocketAddr)> {
        let socket = self.socket.as_ref().ok_or(VehicleError::NotListening)?;
        let mut buf = [0u8; MAX_FRAME];

        loop {
            match deadline {
                Some(d) => {
                    let remaining = d.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        return Err(VehicleError::Timeout(what));
                    }
                    socket.set_read_timeout(Some(remaining))?;
                }
                None => socket.set_read_timeout(None)?,
            }

            let (n, from) = match socket.recv_from(&mut buf) {
                Ok(ok) => ok,
                Err(e)
                    if matches!(
                        e.kind(),
                        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                    ) =>
                {
                    return Err(VehicleError::Timeout(what));
                }
                Err(e) => return Err(e.into()),
            };

            // One message per datagram; peek the magic byte for the version.
            let mut reader = &buf[..n];
            let parsed = match buf.first() {
                Some(&mavlink::MAV_STX_V2) => {
                    mavlink::read_v2_msg::<MavMessage, _>(&mut reader)
                }
                Some(&mavlink::MAV_STX) => {
                    mavlink::read_v1_msg::<MavMessage, _>(&mut reader)
                }
                _ => {
                    trace!("link: dropping {} non-mavlink bytes from {}", n, from);
                    continue;
                }
            };
            match parsed {
                Ok((hdr, msg)) => return Ok((hdr, msg, from)),
                Err(e) => {
                    trace!("link: unparseable datagram from {}: {}", from, e);
                    continue;
                }
            }
        }
    }
}
