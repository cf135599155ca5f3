use std::collections::HashMap;

use serde::Deserialize;

use tether_link::VehicleError;

/// Rotation direction for a yaw command (wire values per MAV_CMD_CONDITION_YAW).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YawDirection {
    Clockwise,
    CounterClockwise,
    Shortest,
}

impl YawDirection {
    pub fn as_param(self) -> f32 {
        match self {
            YawDirection::Clockwise => 1.0,
            YawDirection::CounterClockwise => -1.0,
            YawDirection::Shortest => 0.0,
        }
    }
}

/// One semantic vehicle action. Built per call, encoded, and discarded;
/// nothing here is wire-level.
#[derive(Debug, Clone, PartialEq)]
pub enum CommandIntent {
    Arm,
    Disarm,
    SetMode(String),
    SetPositionNed { x: f32, y: f32, z: f32 },
    SetVelocityNed { x: f32, y: f32, z: f32 },
    SetAccelerationNed { x: f32, y: f32, z: f32 },
    SetYaw {
        yaw_deg: f32,
        rate_dps: f32,
        direction: YawDirection,
        relative: bool,
    },
    SetCameraPitch { pitch_deg: f32, rate: f32 },
    SetLights(bool),
}

/// Mode-name to custom-mode-id mapping for the connected vehicle.
///
/// The set differs across firmwares, so it is supplied by the caller at
/// runtime (the CLI reads it from config) and consumed read-only here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct ModeMap(HashMap<String, u32>);

impl ModeMap {
    pub fn resolve(&self, name: &str) -> Result<u32, VehicleError> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| VehicleError::UnknownMode(name.to_string()))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, u32)> for ModeMap {
    fn from_iter<I: IntoIterator<Item = (String, u32)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
