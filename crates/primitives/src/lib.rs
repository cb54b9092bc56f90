//! Leaf value types for resource resolution: packed identifiers, typed
//! values, and the device configuration descriptor with its comparator.

/// Device configuration descriptor, variance axes and matching.
pub mod config;
/// Packed resource identifiers.
pub mod res_id;
/// Typed scalar values.
pub mod value;

pub use config::{Config, ConfigAxes, ConfigMatcher, LayoutDirection, NightMode, Orientation, QualifierMatcher};
pub use res_id::{APP_PACKAGE_ID, ParseResIdError, ResId, SYSTEM_PACKAGE_ID};
pub use value::{Value, ValueKind};
