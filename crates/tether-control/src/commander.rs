use std::time::{Duration, Instant};

use mavlink::common::{MavMessage, MavModeFlag};
use tracing::{debug, info};

use tether_link::{AgeUnit, VehicleError, VehicleLink};

use crate::encode::{encode, EncodeContext};
use crate::intent::{CommandIntent, ModeMap, YawDirection};

/// Translates semantic vehicle intents into wire messages and submits them
/// through an established [`VehicleLink`].
///
/// Borrows the link exclusively for its lifetime; construction fails unless
/// the link has already seen a heartbeat, so no send can ever race
/// establishment. Every successful call transmits exactly one datagram and
/// performs no retries.
pub struct Commander<'a> {
    link: &'a mut VehicleLink,
}

impl<'a> Commander<'a> {
    pub fn new(link: &'a mut VehicleLink) -> Result<Self, VehicleError> {
        if !link.is_established() {
            return Err(VehicleError::ConnectionNotEstablished);
        }
        Ok(Self { link })
    }

    /// Arm the motors. `wait` bounds the confirmation wait: `None` is
    /// fire-and-forget, `Some(d)` blocks until the vehicle reports
    /// motors-armed or fails with `Timeout` after `d`.
    pub fn arm(&mut self, wait: Option<Duration>) -> Result<(), VehicleError> {
        info!("commander: arming");
        self.dispatch(&CommandIntent::Arm, &ModeMap::default())?;
        match wait {
            Some(timeout) => self.wait_motors_state(true, timeout),
            None => Ok(()),
        }
    }

    /// Disarm the motors; `wait` as in [`Commander::arm`].
    pub fn disarm(&mut self, wait: Option<Duration>) -> Result<(), VehicleError> {
        info!("commander: disarming");
        self.dispatch(&CommandIntent::Disarm, &ModeMap::default())?;
        match wait {
            Some(timeout) => self.wait_motors_state(false, timeout),
            None => Ok(()),
        }
    }

    /// Set the flight mode by name, resolved through the vehicle-supplied
    /// mapping. `UnknownMode` sends nothing.
    pub fn set_mode(&mut self, mode: &str, modes: &ModeMap) -> Result<(), VehicleError> {
        info!("commander: setting mode {}", mode);
        self.dispatch(&CommandIntent::SetMode(mode.to_string()), modes)
    }

    /// Move relative to the current position, in meters (NED axes).
    pub fn set_position(&mut self, x: f32, y: f32, z: f32) -> Result<(), VehicleError> {
        self.dispatch(&CommandIntent::SetPositionNed { x, y, z }, &ModeMap::default())
    }

    /// Target velocity in m/s (NED axes).
    pub fn set_velocity(&mut self, x: f32, y: f32, z: f32) -> Result<(), VehicleError> {
        self.dispatch(&CommandIntent::SetVelocityNed { x, y, z }, &ModeMap::default())
    }

    /// Target acceleration in m/s^2 (NED axes).
    pub fn set_acceleration(&mut self, x: f32, y: f32, z: f32) -> Result<(), VehicleError> {
        self.dispatch(
            &CommandIntent::SetAccelerationNed { x, y, z },
            &ModeMap::default(),
        )
    }

    pub fn set_yaw(
        &mut self,
        yaw_deg: f32,
        rate_dps: f32,
        direction: YawDirection,
        relative: bool,
    ) -> Result<(), VehicleError> {
        self.dispatch(
            &CommandIntent::SetYaw { yaw_deg, rate_dps, direction, relative },
            &ModeMap::default(),
        )
    }

    pub fn set_camera_pitch(&mut self, pitch_deg: f32, rate: f32) -> Result<(), VehicleError> {
        self.dispatch(
            &CommandIntent::SetCameraPitch { pitch_deg, rate },
            &ModeMap::default(),
        )
    }

    pub fn lights(&mut self, on: bool) -> Result<(), VehicleError> {
        info!("commander: lights {}", if on { "on" } else { "off" });
        self.dispatch(&CommandIntent::SetLights(on), &ModeMap::default())
    }

    /// Encode and send one intent. One datagram per successful call.
    pub fn dispatch(
        &mut self,
        intent: &CommandIntent,
        modes: &ModeMap,
    ) -> Result<(), VehicleError> {
        let ctx = EncodeContext {
            target_system: self.link.target_system()?,
            target_component: self.link.target_component()?,
            age_ms: self.link.age_of_connection(AgeUnit::Millis)?,
            modes,
        };
        let msg = encode(intent, &ctx)?;
        self.link.send(&msg)
    }

    /// Block until a vehicle heartbeat reports the requested armed state.
    fn wait_motors_state(&mut self, armed: bool, timeout: Duration) -> Result<(), VehicleError> {
        let what = if armed {
            "motors-armed confirmation"
        } else {
            "motors-disarmed confirmation"
        };
        let target = self.link.target_system()?;
        let deadline = Instant::now() + timeout;

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(VehicleError::Timeout(what));
            }
            let (hdr, msg) = match self.link.recv_message(Some(remaining)) {
                Ok(ok) => ok,
                Err(VehicleError::Timeout(_)) => return Err(VehicleError::Timeout(what)),
                Err(e) => return Err(e),
            };
            if hdr.system_id != target {
                continue;
            }
            if let MavMessage::HEARTBEAT(hb) = msg {
                let is_armed = hb
                    .base_mode
                    .contains(MavModeFlag::MAV_MODE_FLAG_SAFETY_ARMED);
                if is_armed == armed {
                    debug!("commander: {} received", what);
                    return Ok(());
                }
            }
        }
    }
}
