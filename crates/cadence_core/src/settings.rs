//! Engine settings
//!
//! Global playback controls plus the defaults every new instance and tween
//! starts from. Settings load from TOML; every field is optional.
//!
//! ```toml
//! speed = 0.5
//! suspend_when_hidden = false
//!
//! [tween]
//! duration = 800
//! easing = "easeOutQuad"
//!
//! [instance]
//! loop = "infinite"
//! direction = "alternate"
//! ```

use crate::error::{Result, SettingsError};
use serde::{Deserialize, Serialize};

/// Playback direction for instances
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayDirection {
    /// Play forward (0 -> duration)
    #[default]
    #[serde(rename = "normal")]
    Forward,
    /// Play in reverse (duration -> 0)
    Reverse,
    /// Alternate between forward and reverse each loop
    Alternate,
}

/// How many times an instance plays
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "LoopRepr", into = "LoopRepr")]
pub enum LoopCount {
    Finite(u32),
    Infinite,
}

impl Default for LoopCount {
    fn default() -> Self {
        LoopCount::Finite(1)
    }
}

impl From<u32> for LoopCount {
    fn from(count: u32) -> Self {
        LoopCount::Finite(count)
    }
}

/// Negative counts play zero times
impl From<i32> for LoopCount {
    fn from(count: i32) -> Self {
        LoopCount::Finite(count.max(0) as u32)
    }
}

/// `true` loops forever, `false` plays once
impl From<bool> for LoopCount {
    fn from(infinite: bool) -> Self {
        if infinite {
            LoopCount::Infinite
        } else {
            LoopCount::Finite(1)
        }
    }
}

#[derive(Deserialize, Serialize)]
#[serde(untagged)]
enum LoopRepr {
    Count(u32),
    Flag(bool),
    Named(String),
}

impl TryFrom<LoopRepr> for LoopCount {
    type Error = String;

    fn try_from(repr: LoopRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            LoopRepr::Count(n) => Ok(LoopCount::Finite(n)),
            LoopRepr::Flag(true) => Ok(LoopCount::Infinite),
            LoopRepr::Flag(false) => Ok(LoopCount::Finite(1)),
            LoopRepr::Named(name) if name == "infinite" => Ok(LoopCount::Infinite),
            LoopRepr::Named(name) => Err(format!("unknown loop value '{name}'")),
        }
    }
}

impl From<LoopCount> for LoopRepr {
    fn from(count: LoopCount) -> Self {
        match count {
            LoopCount::Finite(n) => LoopRepr::Count(n),
            LoopCount::Infinite => LoopRepr::Named("infinite".to_string()),
        }
    }
}

/// Defaults applied to every tween unless overridden per animation or keyframe
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TweenDefaults {
    /// Duration in milliseconds
    pub duration: f64,
    /// Delay before the first tween, in milliseconds
    pub delay: f64,
    /// Hold after the last tween, in milliseconds
    pub end_delay: f64,
    /// Easing expression, e.g. `easeOutQuad` or `spring(1, 80, 10, 0)`
    pub easing: String,
    /// Rounding granularity (0 = none, 10 = one decimal)
    pub round: f64,
}

impl Default for TweenDefaults {
    fn default() -> Self {
        Self {
            duration: 1000.0,
            delay: 0.0,
            end_delay: 0.0,
            easing: "easeOutElastic(1, .5)".to_string(),
            round: 0.0,
        }
    }
}

/// Defaults applied to every new instance
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct InstanceDefaults {
    #[serde(rename = "loop")]
    pub loop_count: LoopCount,
    pub direction: PlayDirection,
    pub autoplay: bool,
}

impl Default for InstanceDefaults {
    fn default() -> Self {
        Self {
            loop_count: LoopCount::Finite(1),
            direction: PlayDirection::Forward,
            autoplay: true,
        }
    }
}

/// Engine-wide settings
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Global playback-rate multiplier
    pub speed: f64,
    /// Stop requesting frames while the host is hidden
    pub suspend_when_hidden: bool,
    pub tween: TweenDefaults,
    pub instance: InstanceDefaults,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed: 1.0,
            suspend_when_hidden: true,
            tween: TweenDefaults::default(),
            instance: InstanceDefaults::default(),
        }
    }
}

impl Settings {
    /// Parse and validate settings from a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(source)?;
        settings.validate()?;
        tracing::debug!(
            speed = settings.speed,
            duration = settings.tween.duration,
            easing = %settings.tween.easing,
            "settings loaded"
        );
        Ok(settings)
    }

    /// Check a playback rate: it must be positive and finite
    pub fn validate_speed(speed: f64) -> Result<()> {
        if speed.is_finite() && speed > 0.0 {
            Ok(())
        } else {
            Err(SettingsError::Invalid {
                field: "speed",
                reason: format!("must be a positive number, got {speed}"),
            })
        }
    }

    /// Check that every value is usable by the engine
    pub fn validate(&self) -> Result<()> {
        Self::validate_speed(self.speed)?;
        if !(self.tween.duration.is_finite() && self.tween.duration >= 0.0) {
            return Err(SettingsError::Invalid {
                field: "tween.duration",
                reason: format!("must be zero or positive, got {}", self.tween.duration),
            });
        }
        if !self.tween.delay.is_finite() || !self.tween.end_delay.is_finite() {
            return Err(SettingsError::Invalid {
                field: "tween.delay",
                reason: "delays must be finite".to_string(),
            });
        }
        if !(self.tween.round.is_finite() && self.tween.round >= 0.0) {
            return Err(SettingsError::Invalid {
                field: "tween.round",
                reason: format!("must be zero or positive, got {}", self.tween.round),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.speed, 1.0);
        assert!(settings.suspend_when_hidden);
        assert_eq!(settings.tween.duration, 1000.0);
        assert_eq!(settings.tween.easing, "easeOutElastic(1, .5)");
        assert_eq!(settings.instance.loop_count, LoopCount::Finite(1));
        assert_eq!(settings.instance.direction, PlayDirection::Forward);
        assert!(settings.instance.autoplay);
    }

    #[test]
    fn test_partial_toml() {
        let settings = Settings::from_toml_str(
            r#"
            speed = 0.5

            [tween]
            duration = 800
            easing = "easeOutQuad"

            [instance]
            loop = "infinite"
            direction = "alternate"
            "#,
        )
        .unwrap();

        assert_eq!(settings.speed, 0.5);
        assert_eq!(settings.tween.duration, 800.0);
        assert_eq!(settings.tween.delay, 0.0);
        assert_eq!(settings.tween.easing, "easeOutQuad");
        assert_eq!(settings.instance.loop_count, LoopCount::Infinite);
        assert_eq!(settings.instance.direction, PlayDirection::Alternate);
        assert!(settings.instance.autoplay);
    }

    #[test]
    fn test_loop_forms() {
        let count = Settings::from_toml_str("[instance]\nloop = 3").unwrap();
        assert_eq!(count.instance.loop_count, LoopCount::Finite(3));

        let flag = Settings::from_toml_str("[instance]\nloop = true").unwrap();
        assert_eq!(flag.instance.loop_count, LoopCount::Infinite);

        assert!(Settings::from_toml_str("[instance]\nloop = \"forever\"").is_err());
    }

    #[test]
    fn test_direction_normal_name() {
        let settings = Settings::from_toml_str("[instance]\ndirection = \"normal\"").unwrap();
        assert_eq!(settings.instance.direction, PlayDirection::Forward);
    }

    #[test]
    fn test_invalid_speed() {
        let err = Settings::from_toml_str("speed = 0").unwrap_err();
        assert!(matches!(err, SettingsError::Invalid { field: "speed", .. }));
    }

    #[test]
    fn test_validate_speed() {
        assert!(Settings::validate_speed(0.25).is_ok());
        for speed in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(
                matches!(
                    Settings::validate_speed(speed),
                    Err(SettingsError::Invalid { field: "speed", .. })
                ),
                "{speed}"
            );
        }
    }

    #[test]
    fn test_malformed_toml() {
        let err = Settings::from_toml_str("speed = ").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }
}
