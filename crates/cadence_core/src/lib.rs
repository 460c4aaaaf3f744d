//! Cadence Core
//!
//! The boundary between the Cadence animation engine and the environment it
//! animates:
//!
//! - **Host contract**: target lookup, property classification, value I/O,
//!   geometry, unit conversion and frame scheduling ([`Host`])
//! - **Memory host**: plain data objects and simulated elements ([`MemoryHost`])
//! - **Settings**: global speed and instance/tween defaults, loadable from TOML
//!
//! # Example
//!
//! ```rust
//! use cadence_core::{Host, MemoryHost, PropertyKind, RawValue};
//!
//! let mut host = MemoryHost::new();
//! let ball = host.add_object([("x", 0.0)]);
//!
//! assert_eq!(host.classify(ball, "x"), Ok(PropertyKind::Field));
//! host.write(ball, "x", PropertyKind::Field, RawValue::Number(42.0));
//! assert_eq!(host.field(ball, "x"), Some(&RawValue::Number(42.0)));
//! ```

pub mod error;
pub mod host;
pub mod memory;
pub mod settings;

pub use error::{SettingsError, TargetError};
pub use host::{
    format_number, is_transform_function, FrameHandle, Host, Point, PropertyKind, RawValue,
    TargetId, Viewport, TRANSFORM_FUNCTIONS,
};
pub use memory::{kebab_case, MemoryHost};
pub use settings::{InstanceDefaults, LoopCount, PlayDirection, Settings, TweenDefaults};
