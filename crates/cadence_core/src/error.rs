//! Core error types

use crate::host::TargetId;
use thiserror::Error;

/// A property or target the host cannot animate
///
/// These are never fatal: the caller logs them and skips the offending
/// property so sibling properties and targets keep animating.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TargetError {
    /// The target exists but exposes no writable property by that name
    #[error("Can't find property '{property}' on target {target}")]
    UnknownProperty { target: TargetId, property: String },

    /// The target is not known to the host at all
    #[error("Target {0} can't be animated")]
    NotAnimatable(TargetId),
}

/// Errors raised while loading engine settings
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Settings document is not valid TOML or has the wrong shape
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    /// A field parsed but holds a value the engine cannot use
    #[error("Invalid setting '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Result type for settings operations
pub type Result<T> = std::result::Result<T, SettingsError>;
