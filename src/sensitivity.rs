//! Mouse-look arithmetic shared by the aiming game and the settings menu.
//!
//! Rotation follows the Source-engine formula `degrees = counts * sensitivity * yaw`,
//! so a sensitivity copied from the game feels the same here.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Degrees of rotation per mouse count at sensitivity 1.0
pub const YAW: f64 = 0.022;

/// Scales rotation degrees into percent-of-viewport crosshair travel
pub const CONVERSION_FACTOR: f64 = 1.5;

pub const DEFAULT_SENSITIVITY: f64 = 1.0;
pub const DEFAULT_DPI: u32 = 800;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensitivitySettings {
    pub sensitivity: f64,
    pub dpi: u32,
}

impl Default for SensitivitySettings {
    fn default() -> Self {
        Self {
            sensitivity: DEFAULT_SENSITIVITY,
            dpi: DEFAULT_DPI,
        }
    }
}

impl SensitivitySettings {
    pub fn effective_dpi(&self) -> f64 {
        effective_dpi(self.sensitivity, self.dpi)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    pub x: f64,
    pub y: f64,
}

pub fn calculate_rotation_angle(movement: f64, sensitivity: f64) -> f64 {
    movement * sensitivity * YAW
}

pub fn calculate_movement(movement_x: f64, movement_y: f64, sensitivity: f64) -> Rotation {
    Rotation {
        x: calculate_rotation_angle(movement_x, sensitivity),
        y: calculate_rotation_angle(movement_y, sensitivity),
    }
}

/// Display-only product of sensitivity and DPI
pub fn effective_dpi(sensitivity: f64, dpi: u32) -> f64 {
    sensitivity * dpi as f64
}

pub fn parse_sensitivity(input: &str) -> Result<f64, ValidationError> {
    match input.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        _ => Err(ValidationError::InvalidSensitivity),
    }
}

pub fn parse_dpi(input: &str) -> Result<u32, ValidationError> {
    match input.trim().parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ValidationError::InvalidDpi),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_matches_engine_formula() {
        for &(d, s) in &[(1.0, 1.0), (-7.0, 2.5), (123.0, 0.37), (0.0, 4.0)] {
            assert_eq!(calculate_rotation_angle(d, s), d * s * 0.022);
        }
    }

    #[test]
    fn movement_applies_formula_per_axis() {
        let rot = calculate_movement(10.0, -4.0, 2.0);
        assert_eq!(rot.x, 10.0 * 2.0 * YAW);
        assert_eq!(rot.y, -4.0 * 2.0 * YAW);
    }

    #[test]
    fn effective_dpi_is_product() {
        assert_eq!(effective_dpi(1.25, 800), 1000.0);
        assert_eq!(SensitivitySettings::default().effective_dpi(), 800.0);
    }

    #[test]
    fn parse_sensitivity_accepts_positive_floats() {
        assert_eq!(parse_sensitivity(" 1.75 "), Ok(1.75));
        assert_eq!(parse_sensitivity("2"), Ok(2.0));
    }

    #[test]
    fn parse_sensitivity_rejects_garbage() {
        for bad in ["", "abc", "0", "-1.2", "NaN", "inf"] {
            assert_eq!(
                parse_sensitivity(bad),
                Err(ValidationError::InvalidSensitivity),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn parse_dpi_rejects_zero_and_fractions() {
        assert_eq!(parse_dpi("1600"), Ok(1600));
        assert_eq!(parse_dpi("0"), Err(ValidationError::InvalidDpi));
        assert_eq!(parse_dpi("400.5"), Err(ValidationError::InvalidDpi));
    }
}
