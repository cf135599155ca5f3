//! Closed tables for the magic numbers the protocol encoding needs.
//!
//! Wire values stay exactly what ArduSub-style vehicles expect; keeping them
//! here, keyed by intent, makes the mapping auditable in one place.

use mavlink::common::{COMMAND_LONG_DATA, MavCmd, MavFrame, MavMessage, PositionTargetTypemask};

use tether_link::VehicleError;

/// Servo output channel wired to the lights on the stock vehicle build.
pub const LIGHTS_SERVO_CHANNEL: f32 = 10.0;
/// PWM pulse width that switches the lights on; 0 switches them off.
pub const LIGHTS_PWM_ON: f32 = 1500.0;
/// Gimbal device id addressed by camera pitch commands.
pub const GIMBAL_DEVICE_FIXED: f32 = 32.0;

/// Which derivative of motion a local-frame setpoint carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetpointOrder {
    Position,
    Velocity,
    Acceleration,
}

impl SetpointOrder {
    /// Raw type-mask bits selecting which setpoint fields the vehicle honors.
    pub fn type_mask_bits(self) -> u16 {
        match self {
            SetpointOrder::Position => 3576,
            SetpointOrder::Velocity => 3527,
            SetpointOrder::Acceleration => 3135,
        }
    }

    /// Type-mask / coordinate-frame pair for this order. The frame is always
    /// wire value 9 (`MAV_FRAME_BODY_OFFSET_NED`): setpoints are relative to
    /// the vehicle's current position.
    pub fn profile(self) -> (PositionTargetTypemask, MavFrame) {
        (
            PositionTargetTypemask::from_bits_truncate(self.type_mask_bits()),
            MavFrame::MAV_FRAME_BODY_OFFSET_NED,
        )
    }
}

/// The seven-parameter generic command shape used for discrete actions.
///
/// The fixed-size array makes the length invariant structural; only
/// [`LongCommand::from_slice`] can observe a wrong count, and it rejects it
/// before anything reaches the transport.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LongCommand {
    pub command: MavCmd,
    pub params: [f32; 7],
}

impl LongCommand {
    pub fn new(command: MavCmd, params: [f32; 7]) -> Self {
        Self { command, params }
    }

    pub fn from_slice(command: MavCmd, params: &[f32]) -> Result<LongCommand, VehicleError> {
        let params: [f32; 7] = params
            .try_into()
            .map_err(|_| VehicleError::MalformedCommand(params.len()))?;
        Ok(Self { command, params })
    }

    pub fn into_message(self, target_system: u8, target_component: u8) -> MavMessage {
        let [p1, p2, p3, p4, p5, p6, p7] = self.params;
        MavMessage::COMMAND_LONG(COMMAND_LONG_DATA {
            target_system,
            target_component,
            command: self.command.into(),
            confirmation: 0,
            param1: p1,
            param2: p2,
            param3: p3,
            param4: p4,
            param5: p5,
            param6: p6,
            param7: p7,
        })
    }
}
