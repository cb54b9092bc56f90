use std::fmt;
use std::sync::Arc;

use restable_primitives::ResId;

/// Lookup failures. All are recoverable; callers typically fall back to a
/// default value or a less specific resource.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
	#[error("invalid resource id {0}")]
	InvalidId(ResId),
	#[error("no package assigned to runtime id 0x{package_id:02x} (resource {id})")]
	UnknownPackage { id: ResId, package_id: u8 },
	#[error("no entry for {0} in any loaded package or configuration")]
	NoEntry(ResId),
	#[error("resource {0} is a scalar, not a bag")]
	NotComplex(ResId),
	#[error("resource {0} is a bag, not a scalar")]
	IsComplex(ResId),
	#[error("parent {parent} of bag {bag} could not be resolved")]
	MissingParent { bag: ResId, parent: ResId },
	#[error("reference {0} could not be rewritten to a runtime package id")]
	UnresolvedReference(ResId),
	#[error("theme does not belong to this engine")]
	EngineMismatch,
	#[error("malformed resource name {0:?}")]
	BadName(String),
	#[error("no resource named {0}")]
	UnknownName(String),
}

/// Bounds and format failures while reading an entry table out of a bundle
/// arena. Never surfaced from lookups: the affected entry is treated as absent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
	#[error("truncated read: need {needed} bytes at offset {offset}, chunk is {len} bytes")]
	Truncated { offset: usize, needed: usize, len: usize },
	#[error("bad entry header at offset {offset}: size {size}")]
	BadEntryHeader { offset: usize, size: u16 },
	#[error("unknown value kind 0x{0:02x}")]
	UnknownValueKind(u8),
	#[error("entry index {index} out of range (table has {count})")]
	EntryOutOfRange { index: u16, count: u32 },
}

/// Failures while assembling a bundle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
	#[error("package {package} declares more than 255 types")]
	TooManyTypes { package: String },
	#[error("type {type_name} in package {package} has more than 65536 entries")]
	TooManyEntries { package: String, type_name: String },
	#[error("{package}:{type_name}/{entry} defined twice for config {config:?}")]
	DuplicateEntry {
		package: String,
		type_name: String,
		entry: String,
		config: String,
	},
	#[error("bundle {0} has more than 255 packages")]
	TooManyPackages(String),
}

/// Failure to load [`crate::EngineOptions`].
#[derive(Debug, Clone, thiserror::Error)]
pub enum OptionsError {
	#[error("invalid engine options: {0}")]
	Parse(#[from] toml::de::Error),
}

/// Non-fatal conditions recorded while assigning runtime package ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryDiagnostic {
	/// An overlay names a target bundle that is not loaded ahead of it. The
	/// overlay stays loaded but has no effect.
	OverlayTargetMissing { overlay: Arc<str>, target: Arc<str> },
	/// A non-dynamic package declared an id already held by a differently
	/// named package. The later package is not registered.
	PackageIdConflict {
		bundle: Arc<str>,
		package: Arc<str>,
		id: u8,
		existing: Arc<str>,
	},
}

impl fmt::Display for RegistryDiagnostic {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::OverlayTargetMissing { overlay, target } => {
				write!(f, "overlay {overlay}: target {target} is not loaded")
			}
			Self::PackageIdConflict {
				bundle,
				package,
				id,
				existing,
			} => write!(f, "{bundle}: package {package} wants id 0x{id:02x}, already held by {existing}"),
		}
	}
}
