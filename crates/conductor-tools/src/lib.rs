//! Conductor Tools - Capability Registry and Artifact Store
//!
//! This crate provides the capability side of the Conductor engine:
//! - Registry: capability registration and lookup by tool name
//! - Artifacts: the artifact blob store boundary (`put` / `get` by URI)
//! - Builtins: deterministic built-in capabilities (browser, email_api, ...)
//!
//! A capability is a named, versioned executable unit. The engine never
//! looks inside one; it only relies on the [`Capability`] contract.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod artifact;
pub mod builtins;
pub mod error;
pub mod registry;

pub use artifact::{ArtifactStore, MemoryArtifactStore};
pub use builtins::register_builtins;
pub use error::{Error, Result};
pub use registry::{
    Capability, CapabilityContext, CapabilityDefinition, CapabilityOutput, CapabilityRegistry,
};
