//! Registry - Capability registration and lookup
//!
//! Capabilities are registered once at start-up under their tool name and
//! looked up by that name at dispatch time. After initialisation the registry
//! is shared behind an `Arc` and never mutated.

use crate::artifact::ArtifactStore;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Capability metadata and parameter schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityDefinition {
    /// Unique tool name
    pub name: String,
    /// Capability version
    pub version: String,
    /// Human-readable description
    pub description: String,
    /// JSON schema for parameters read from the task context
    pub parameters: serde_json::Value,
    /// Whether the capability is enabled
    pub enabled: bool,
}

impl CapabilityDefinition {
    /// Create a new capability definition
    #[must_use]
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "1.0.0".to_string(),
            description: description.into(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
            enabled: true,
        }
    }

    /// Set the parameters schema
    #[must_use]
    pub fn with_parameters(mut self, parameters: serde_json::Value) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the version
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Set enabled status
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

/// Everything a capability sees of the task it runs for
#[derive(Clone)]
pub struct CapabilityContext {
    /// Task identifier
    pub task_id: String,
    /// Free-text task description
    pub description: String,
    /// Task context parameters
    pub params: serde_json::Map<String, serde_json::Value>,
    /// Where capabilities persist their outputs
    pub artifacts: Arc<dyn ArtifactStore>,
}

impl CapabilityContext {
    /// Create a new context
    pub fn new(
        task_id: impl Into<String>,
        description: impl Into<String>,
        params: serde_json::Map<String, serde_json::Value>,
        artifacts: Arc<dyn ArtifactStore>,
    ) -> Self {
        Self {
            task_id: task_id.into(),
            description: description.into(),
            params,
            artifacts,
        }
    }

    /// Read a string parameter, falling back to a default
    #[must_use]
    pub fn param_str(&self, key: &str, default: &str) -> String {
        self.params
            .get(key)
            .and_then(|v| v.as_str())
            .unwrap_or(default)
            .to_string()
    }

    /// Read a boolean parameter, falling back to a default
    #[must_use]
    pub fn param_bool(&self, key: &str, default: bool) -> bool {
        self.params
            .get(key)
            .and_then(|v| v.as_bool())
            .unwrap_or(default)
    }

    /// Read an unsigned integer parameter, falling back to a default
    #[must_use]
    pub fn param_u64(&self, key: &str, default: u64) -> u64 {
        self.params
            .get(key)
            .and_then(|v| v.as_u64())
            .unwrap_or(default)
    }

    /// Read a float parameter, falling back to a default
    #[must_use]
    pub fn param_f64(&self, key: &str, default: f64) -> f64 {
        self.params
            .get(key)
            .and_then(|v| v.as_f64())
            .unwrap_or(default)
    }

    /// Persist a JSON payload as an artifact and return its URI
    pub async fn store_json(&self, payload: &serde_json::Value) -> Result<String> {
        let bytes = serde_json::to_vec(payload)?;
        self.artifacts.put(bytes).await
    }
}

impl std::fmt::Debug for CapabilityContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapabilityContext")
            .field("task_id", &self.task_id)
            .field("description", &self.description)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Output of a successful capability invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapabilityOutput {
    /// Opaque result payload
    pub result: serde_json::Value,
    /// Artifact URIs created by this invocation
    pub artifacts: Vec<String>,
}

impl CapabilityOutput {
    /// Create an output with no artifacts
    #[must_use]
    pub fn new(result: serde_json::Value) -> Self {
        Self {
            result,
            artifacts: Vec::new(),
        }
    }

    /// Attach an artifact URI
    #[must_use]
    pub fn with_artifact(mut self, uri: impl Into<String>) -> Self {
        self.artifacts.push(uri.into());
        self
    }
}

/// Trait for capability implementations
#[async_trait::async_trait]
pub trait Capability: Send + Sync {
    /// Get the capability definition
    fn definition(&self) -> &CapabilityDefinition;

    /// Run the capability against a task context.
    ///
    /// Implementations do not enforce their own deadline; the caller does.
    async fn invoke(&self, ctx: &CapabilityContext) -> Result<CapabilityOutput>;
}

/// Registry for managing capabilities
pub struct CapabilityRegistry {
    capabilities: HashMap<String, Arc<dyn Capability>>,
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CapabilityRegistry {
    /// Create a new empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            capabilities: HashMap::new(),
        }
    }

    /// Register a capability, replacing any previous one with the same name
    pub fn register(&mut self, capability: Arc<dyn Capability>) {
        let name = capability.definition().name.clone();
        debug!(capability = %name, "Registering capability");
        self.capabilities.insert(name, capability);
    }

    /// Get a capability by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Capability>> {
        self.capabilities.get(name).cloned()
    }

    /// Resolve an enabled capability by name
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Capability>> {
        let capability = self
            .get(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        if !capability.definition().enabled {
            return Err(Error::Disabled(name.to_string()));
        }
        Ok(capability)
    }

    /// Check if a capability exists
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.capabilities.contains_key(name)
    }

    /// List all capability names, sorted
    #[must_use]
    pub fn list_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.capabilities.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// List all capability definitions, sorted by name
    #[must_use]
    pub fn list_definitions(&self) -> Vec<&CapabilityDefinition> {
        let mut defs: Vec<&CapabilityDefinition> =
            self.capabilities.values().map(|c| c.definition()).collect();
        defs.sort_by(|a, b| a.name.cmp(&b.name));
        defs
    }

    /// Get capability count
    #[must_use]
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Check if registry is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}
