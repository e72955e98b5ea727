//! Physical dimension of a feature.
//!
//! A display classification only: the store never converts or checks units.

use serde::{Deserialize, Serialize};

/// Physical dimension tag attached to every declared feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Dimension {
    /// Dimensionless (counts, ratios, indices).
    None,
    /// Detector quality score.
    Quality,
    Intensity,
    IntensitySquared,
    Position,
    Length,
    Time,
    Angle,
    Velocity,
    /// Events per unit of time.
    Rate,
}

impl Dimension {
    /// Every dimension, in declaration order.
    pub const ALL: [Dimension; 10] = [
        Dimension::None,
        Dimension::Quality,
        Dimension::Intensity,
        Dimension::IntensitySquared,
        Dimension::Position,
        Dimension::Length,
        Dimension::Time,
        Dimension::Angle,
        Dimension::Velocity,
        Dimension::Rate,
    ];

    /// Unit label for display, given the calibration's space and time units.
    ///
    /// ```
    /// use track_features::Dimension;
    ///
    /// assert_eq!(Dimension::Velocity.unit_label("µm", "s"), "µm/s");
    /// assert_eq!(Dimension::None.unit_label("µm", "s"), "");
    /// ```
    pub fn unit_label(&self, space_unit: &str, time_unit: &str) -> String {
        match self {
            Dimension::None | Dimension::Quality => String::new(),
            Dimension::Intensity => "counts".to_string(),
            Dimension::IntensitySquared => "counts^2".to_string(),
            Dimension::Position | Dimension::Length => space_unit.to_string(),
            Dimension::Time => time_unit.to_string(),
            Dimension::Angle => "rad".to_string(),
            Dimension::Velocity => format!("{space_unit}/{time_unit}"),
            Dimension::Rate => format!("/{time_unit}"),
        }
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Dimension::None => "NONE",
            Dimension::Quality => "QUALITY",
            Dimension::Intensity => "INTENSITY",
            Dimension::IntensitySquared => "INTENSITY_SQUARED",
            Dimension::Position => "POSITION",
            Dimension::Length => "LENGTH",
            Dimension::Time => "TIME",
            Dimension::Angle => "ANGLE",
            Dimension::Velocity => "VELOCITY",
            Dimension::Rate => "RATE",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_matches_serde_name() {
        for dim in Dimension::ALL {
            let json = serde_json::to_string(&dim).unwrap();
            assert_eq!(json, format!("\"{dim}\""));
        }
    }

    #[test]
    fn test_unit_labels() {
        assert_eq!(Dimension::Length.unit_label("pixel", "frame"), "pixel");
        assert_eq!(Dimension::Time.unit_label("pixel", "frame"), "frame");
        assert_eq!(Dimension::Rate.unit_label("pixel", "frame"), "/frame");
    }
}
