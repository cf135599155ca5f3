//! Pure intent-to-message encoding. No transport access happens here, which
//! keeps every field value checkable without a socket.

use mavlink::common::{MavCmd, MavMessage, SET_POSITION_TARGET_LOCAL_NED_DATA};

use tether_link::VehicleError;

use crate::intent::{CommandIntent, ModeMap};
use crate::wire::{
    LongCommand, SetpointOrder, GIMBAL_DEVICE_FIXED, LIGHTS_PWM_ON, LIGHTS_SERVO_CHANNEL,
};

/// Connection-derived inputs the encoding needs.
pub struct EncodeContext<'a> {
    pub target_system: u8,
    pub target_component: u8,
    /// Connection age in milliseconds, used as the setpoint timestamp.
    pub age_ms: u64,
    pub modes: &'a ModeMap,
}

/// Encode one intent into the single wire message it maps to.
pub fn encode(intent: &CommandIntent, ctx: &EncodeContext) -> Result<MavMessage, VehicleError> {
    match intent {
        CommandIntent::Arm => long_command(
            ctx,
            MavCmd::MAV_CMD_COMPONENT_ARM_DISARM,
            &[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ),
        CommandIntent::Disarm => long_command(
            ctx,
            MavCmd::MAV_CMD_COMPONENT_ARM_DISARM,
            &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0],
        ),
        CommandIntent::SetMode(name) => {
            let mode_id = ctx.modes.resolve(name)?;
            // param1 carries the base-mode flags; 1 = custom-mode-enabled,
            // param2 the firmware's custom mode id.
            long_command(
                ctx,
                MavCmd::MAV_CMD_DO_SET_MODE,
                &[1.0, mode_id as f32, 0.0, 0.0, 0.0, 0.0, 0.0],
            )
        }
        CommandIntent::SetPositionNed { x, y, z } => {
            Ok(setpoint(ctx, SetpointOrder::Position, [*x, *y, *z]))
        }
        CommandIntent::SetVelocityNed { x, y, z } => {
            Ok(setpoint(ctx, SetpointOrder::Velocity, [*x, *y, *z]))
        }
        CommandIntent::SetAccelerationNed { x, y, z } => {
            Ok(setpoint(ctx, SetpointOrder::Acceleration, [*x, *y, *z]))
        }
        CommandIntent::SetYaw {
            yaw_deg,
            rate_dps,
            direction,
            relative,
        } => long_command(
            ctx,
            MavCmd::MAV_CMD_CONDITION_YAW,
            &[
                *yaw_deg,
                *rate_dps,
                direction.as_param(),
                if *relative { 1.0 } else { 0.0 },
                0.0,
                0.0,
                0.0,
            ],
        ),
        CommandIntent::SetCameraPitch { pitch_deg, rate } => long_command(
            ctx,
            MavCmd::MAV_CMD_DO_GIMBAL_MANAGER_PITCHYAW,
            &[*pitch_deg, 0.0, *rate, 0.0, GIMBAL_DEVICE_FIXED, 0.0, 0.0],
        ),
        CommandIntent::SetLights(on) => long_command(
            ctx,
            MavCmd::MAV_CMD_DO_SET_SERVO,
            &[
                LIGHTS_SERVO_CHANNEL,
                if *on { LIGHTS_PWM_ON } else { 0.0 },
                0.0,
                0.0,
                0.0,
                0.0,
                0.0,
            ],
        ),
    }
}

/// Every long-command send goes through the seven-parameter check, even when
/// the caller hands over a literal of the right length.
pub fn long_command(
    ctx: &EncodeContext,
    command: MavCmd,
    params: &[f32],
) -> Result<MavMessage, VehicleError> {
    let cmd = LongCommand::from_slice(command, params)?;
    Ok(cmd.into_message(ctx.target_system, ctx.target_component))
}

fn setpoint(ctx: &EncodeContext, order: SetpointOrder, vect: [f32; 3]) -> MavMessage {
    let (type_mask, coordinate_frame) = order.profile();
    let zero = [0.0f32; 3];
    let pos = if order == SetpointOrder::Position { vect } else { zero };
    let vel = if order == SetpointOrder::Velocity { vect } else { zero };
    let acc = if order == SetpointOrder::Acceleration { vect } else { zero };

    MavMessage::SET_POSITION_TARGET_LOCAL_NED(SET_POSITION_TARGET_LOCAL_NED_DATA {
        time_boot_ms: ctx.age_ms as u32,
        target_system: ctx.target_system,
        target_component: ctx.target_component,
        coordinate_frame,
        type_mask,
        x: pos[0],
        y: pos[1],
        z: pos[2],
        vx: vel[0],
        vy: vel[1],
        vz: vel[2],
        afx: acc[0],
        afy: acc[1],
        afz: acc[2],
        yaw: 0.0,
        yaw_rate: 0.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::YawDirection;
    use mavlink::common::MavFrame;

    fn ctx(modes: &ModeMap) -> EncodeContext<'_> {
        EncodeContext {
            target_system: 1,
            target_component: 1,
            age_ms: 4242,
            modes,
        }
    }

    fn expect_long(msg: MavMessage) -> mavlink::common::COMMAND_LONG_DATA {
        match msg {
            MavMessage::COMMAND_LONG(data) => data,
            other => panic!("expected COMMAND_LONG, got {:?}", other),
        }
    }

    #[test]
    fn arm_and_disarm_differ_only_in_param1() {
        let modes = ModeMap::default();
        let ctx = ctx(&modes);

        let arm = expect_long(encode(&CommandIntent::Arm, &ctx).expect("arm"));
        assert_eq!(arm.command, MavCmd::MAV_CMD_COMPONENT_ARM_DISARM);
        assert_eq!(arm.param1, 1.0);

        let disarm = expect_long(encode(&CommandIntent::Disarm, &ctx).expect("disarm"));
        assert_eq!(disarm.command, MavCmd::MAV_CMD_COMPONENT_ARM_DISARM);
        assert_eq!(disarm.param1, 0.0);
        for p in [arm.param2, arm.param7, disarm.param2, disarm.param7] {
            assert_eq!(p, 0.0);
        }
    }

    #[test]
    fn set_mode_resolves_through_the_supplied_map() {
        let modes: ModeMap = [("STABILIZE".to_string(), 0u32), ("ALT_HOLD".to_string(), 2)]
            .into_iter()
            .collect();
        let ctx = ctx(&modes);

        let data = expect_long(
            encode(&CommandIntent::SetMode("ALT_HOLD".into()), &ctx).expect("set_mode"),
        );
        assert_eq!(data.command, MavCmd::MAV_CMD_DO_SET_MODE);
        // Custom-mode-enabled flag, then the resolved mode id.
        assert_eq!([data.param1, data.param2], [1.0, 2.0]);
        assert_eq!(data.target_system, 1);

        let err = encode(&CommandIntent::SetMode("NOPE".into()), &ctx)
            .expect_err("unknown mode must fail");
        assert!(matches!(err, VehicleError::UnknownMode(_)));
    }

    #[test]
    fn setpoints_populate_exactly_one_triplet() {
        let modes = ModeMap::default();
        let ctx = ctx(&modes);
        let cases = [
            (CommandIntent::SetPositionNed { x: 1.0, y: 2.0, z: 3.0 }, 3576u16),
            (CommandIntent::SetVelocityNed { x: 1.0, y: 2.0, z: 3.0 }, 3527),
            (CommandIntent::SetAccelerationNed { x: 1.0, y: 2.0, z: 3.0 }, 3135),
        ];

        for (intent, mask) in cases {
            let msg = encode(&intent, &ctx).expect("setpoint");
            let data = match msg {
                MavMessage::SET_POSITION_TARGET_LOCAL_NED(data) => data,
                other => panic!("expected setpoint, got {:?}", other),
            };
            assert_eq!(data.type_mask.bits(), mask);
            assert_eq!(data.coordinate_frame, MavFrame::MAV_FRAME_BODY_OFFSET_NED);
            assert_eq!(data.time_boot_ms, 4242);

            let pos = [data.x, data.y, data.z];
            let vel = [data.vx, data.vy, data.vz];
            let acc = [data.afx, data.afy, data.afz];
            let filled = [1.0, 2.0, 3.0];
            let zero = [0.0; 3];
            match intent {
                CommandIntent::SetPositionNed { .. } => {
                    assert_eq!((pos, vel, acc), (filled, zero, zero));
                }
                CommandIntent::SetVelocityNed { .. } => {
                    assert_eq!((pos, vel, acc), (zero, filled, zero));
                }
                CommandIntent::SetAccelerationNed { .. } => {
                    assert_eq!((pos, vel, acc), (zero, zero, filled));
                }
                _ => unreachable!(),
            }
        }
    }

    #[test]
    fn long_command_rejects_wrong_parameter_counts() {
        let modes = ModeMap::default();
        let ctx = ctx(&modes);
        let err = long_command(&ctx, MavCmd::MAV_CMD_DO_SET_SERVO, &[10.0, 1500.0])
            .expect_err("two params must be rejected");
        assert!(matches!(err, VehicleError::MalformedCommand(2)));
    }

    #[test]
    fn yaw_command_carries_direction_and_relative_flag() {
        let modes = ModeMap::default();
        let ctx = ctx(&modes);
        let msg = encode(
            &CommandIntent::SetYaw {
                yaw_deg: 90.0,
                rate_dps: 15.0,
                direction: YawDirection::CounterClockwise,
                relative: true,
            },
            &ctx,
        )
        .expect("yaw");
        let data = expect_long(msg);
        assert_eq!(data.command, MavCmd::MAV_CMD_CONDITION_YAW);
        assert_eq!(
            [data.param1, data.param2, data.param3, data.param4],
            [90.0, 15.0, -1.0, 1.0]
        );
    }

    #[test]
    fn camera_pitch_addresses_the_fixed_gimbal_device() {
        let modes = ModeMap::default();
        let ctx = ctx(&modes);
        let msg = encode(
            &CommandIntent::SetCameraPitch { pitch_deg: -30.0, rate: 5.0 },
            &ctx,
        )
        .expect("pitch");
        let data = expect_long(msg);
        assert_eq!(data.command, MavCmd::MAV_CMD_DO_GIMBAL_MANAGER_PITCHYAW);
        assert_eq!(
            [data.param1, data.param2, data.param3, data.param4, data.param5],
            [-30.0, 0.0, 5.0, 0.0, 32.0]
        );
    }

    #[test]
    fn lights_toggle_the_servo_pwm() {
        let modes = ModeMap::default();
        let ctx = ctx(&modes);

        let on = expect_long(encode(&CommandIntent::SetLights(true), &ctx).expect("on"));
        assert_eq!(on.command, MavCmd::MAV_CMD_DO_SET_SERVO);
        assert_eq!([on.param1, on.param2], [10.0, 1500.0]);

        let off = expect_long(encode(&CommandIntent::SetLights(false), &ctx).expect("off"));
        assert_eq!([off.param1, off.param2], [10.0, 0.0]);
    }
}
