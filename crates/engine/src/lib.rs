#![cfg_attr(doc, allow(rustdoc::private_intra_doc_links))]
//! Resource resolution over layered bundles.
//!
//! A [`ResourceEngine`] holds an ordered list of [`Bundle`]s and a device
//! [`Config`]. It assigns runtime package ids ([`registry`]), picks the best
//! matching entry for a resource id ([`resolve`]), applies overlays, flattens
//! style inheritance into cached [`Bag`]s ([`bag`]), and backs [`Theme`]s.
//!
//! Bundles are built in memory with [`BundleBuilder`]; there is no on-disk
//! container format.

/// Flattened bags and their cache.
pub mod bag;
/// Immutable resource containers and their builders.
pub mod bundle;
mod engine;
/// Error types.
pub mod error;
mod options;
/// Runtime package id assignment and reference rewriting.
pub mod registry;
/// Best-match entry selection, overlays and reference chasing.
pub mod resolve;
/// Attribute tables built from styles.
pub mod theme;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use bag::{Bag, BagEntry};
pub use bundle::{BuildValue, Bundle, BundleBuilder, BundleFlags, Cookie, IdMap, IdMapBuilder, PackageBuilder};
pub use engine::{EngineId, ResourceEngine, ResourceName};
pub use error::{BuildError, DecodeError, OptionsError, RegistryDiagnostic, ResolveError};
pub use options::EngineOptions;
pub use registry::{DynamicRefTable, PackageRegistry};
pub use resolve::{EntryData, EntryOrigin, MAX_REFERENCE_HOPS, ResolvedEntry, SelectedValue, Step, StepKind};
pub use restable_primitives::{
	APP_PACKAGE_ID, Config, ConfigAxes, ConfigMatcher, LayoutDirection, NightMode, Orientation, QualifierMatcher, ResId,
	SYSTEM_PACKAGE_ID, Value, ValueKind,
};
pub use theme::{MAX_ATTRIBUTE_HOPS, Theme, ThemeEntry};
