// ============================================================
// Layer 3 - Vehicle Sample Domain Type
// ============================================================
// One row of simulation output: the wheel state the controller
// sees (features) and the torques it should command (targets).
//
// Column order matters. The exported model consumes features
// in exactly the order of FEATURE_COLUMNS and produces targets
// in the order of TARGET_COLUMNS.

use serde::{Deserialize, Serialize};

/// Number of input features per sample
pub const FEATURE_COUNT: usize = 8;

/// Number of regression targets per sample
pub const TARGET_COUNT: usize = 2;

/// CSV column names for the model inputs, in model order
pub const FEATURE_COLUMNS: [&str; FEATURE_COUNT] = [
    "slip_ratio",
    "angular_velocity",
    "linear_speed",
    "current_brake_torque",
    "current_drive_torque",
    "speed_to_velocity_ratio",
    "excess_drive_torque",
    "slip_deviation",
];

/// CSV column names for the model outputs, in model order
pub const TARGET_COLUMNS: [&str; TARGET_COUNT] = [
    "desired_drive_torque",
    "desired_brake_torque",
];

/// Upper bound the controller applies to a predicted drive torque (N·m)
pub const MAX_DRIVE_TORQUE: f64 = 150.0;

/// Upper bound the controller applies to a predicted brake torque (N·m)
pub const MAX_BRAKE_TORQUE: f64 = 200.0;

/// A single labelled sample in physical units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleSample {
    pub features: [f64; FEATURE_COUNT],
    pub targets:  [f64; TARGET_COUNT],
}

impl VehicleSample {
    pub fn new(features: [f64; FEATURE_COUNT], targets: [f64; TARGET_COUNT]) -> Self {
        Self { features, targets }
    }

    /// True when every value is finite (no NaN / infinity from the simulator)
    pub fn is_finite(&self) -> bool {
        self.features.iter().chain(self.targets.iter()).all(|v| v.is_finite())
    }
}

/// Torque command produced by the model, in N·m.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TorqueCommand {
    pub drive_torque: f64,
    pub brake_torque: f64,
}

impl TorqueCommand {
    /// Build a command from raw model outputs (target order),
    /// clamped to the actuator limits.
    pub fn from_targets(targets: &[f64]) -> Self {
        let drive = targets.first().copied().unwrap_or(0.0);
        let brake = targets.get(1).copied().unwrap_or(0.0);
        Self {
            drive_torque: drive.clamp(0.0, MAX_DRIVE_TORQUE),
            brake_torque: brake.clamp(0.0, MAX_BRAKE_TORQUE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_torque_command_is_clamped() {
        let cmd = TorqueCommand::from_targets(&[180.0, -3.0]);
        assert_eq!(cmd.drive_torque, MAX_DRIVE_TORQUE);
        assert_eq!(cmd.brake_torque, 0.0);
    }

    #[test]
    fn test_non_finite_sample_detected() {
        let mut s = VehicleSample::new([0.0; FEATURE_COUNT], [1.0, 2.0]);
        assert!(s.is_finite());
        s.features[3] = f64::NAN;
        assert!(!s.is_finite());
    }
}
