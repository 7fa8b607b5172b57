//! Builtins - Built-in capabilities for Conductor
//!
//! Deterministic capabilities covering the default skill catalog:
//! - Research: browser, pdf_parser, vector_search, repo_reader
//! - Engineering: unit_test_runner
//! - Communication: email_api, calendar_api, ppt_api
//! - Media: tts, asr
//!
//! Every builtin reads its parameters from the task context, falls back to
//! fixed defaults, stores its payload in the artifact store and returns the
//! payload together with the artifact URI.

mod communication;
mod engineering;
mod media;
mod research;

pub use communication::{CalendarCapability, EmailCapability, PresentationCapability};
pub use engineering::UnitTestRunnerCapability;
pub use media::{AsrCapability, TtsCapability};
pub use research::{
    BrowserCapability, PdfParserCapability, RepoReaderCapability, VectorSearchCapability,
};

use crate::error::Result;
use crate::registry::{CapabilityContext, CapabilityOutput, CapabilityRegistry};
use std::sync::Arc;

/// Register all built-in capabilities with the registry
pub fn register_builtins(registry: &mut CapabilityRegistry) {
    // Research
    registry.register(Arc::new(BrowserCapability::new()));
    registry.register(Arc::new(PdfParserCapability::new()));
    registry.register(Arc::new(VectorSearchCapability::new()));
    registry.register(Arc::new(RepoReaderCapability::new()));

    // Engineering
    registry.register(Arc::new(UnitTestRunnerCapability::new()));

    // Communication
    registry.register(Arc::new(EmailCapability::new()));
    registry.register(Arc::new(CalendarCapability::new()));
    registry.register(Arc::new(PresentationCapability::new()));

    // Media
    registry.register(Arc::new(TtsCapability::new()));
    registry.register(Arc::new(AsrCapability::new()));
}

/// Wrap a builtin payload in the common envelope, store it, and build the output
pub(crate) async fn finish(
    ctx: &CapabilityContext,
    tool: &str,
    result: serde_json::Value,
    metadata: serde_json::Value,
) -> Result<CapabilityOutput> {
    let payload = serde_json::json!({
        "tool": tool,
        "status": "success",
        "result": result,
        "metadata": metadata,
    });
    let uri = ctx.store_json(&payload).await?;
    Ok(CapabilityOutput::new(payload).with_artifact(uri))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::{ArtifactStore, MemoryArtifactStore};
    use crate::registry::Capability;

    fn ctx(params: serde_json::Value, store: Arc<MemoryArtifactStore>) -> CapabilityContext {
        let params = params.as_object().cloned().unwrap_or_default();
        CapabilityContext::new("task-1", "do the thing", params, store)
    }

    #[test]
    fn test_register_builtins() {
        let mut registry = CapabilityRegistry::new();
        register_builtins(&mut registry);

        assert_eq!(registry.len(), 10);
        for name in [
            "browser",
            "pdf_parser",
            "vector_search",
            "repo_reader",
            "unit_test_runner",
            "email_api",
            "calendar_api",
            "ppt_api",
            "tts",
            "asr",
        ] {
            assert!(registry.has(name), "missing builtin {}", name);
        }
    }

    #[tokio::test]
    async fn test_builtins_store_their_payload() {
        let mut registry = CapabilityRegistry::new();
        register_builtins(&mut registry);
        let store = Arc::new(MemoryArtifactStore::new());

        for name in registry.list_names() {
            let capability = registry.resolve(name).unwrap();
            let output = capability
                .invoke(&ctx(serde_json::json!({}), store.clone()))
                .await
                .unwrap();

            assert_eq!(output.result["tool"], name);
            assert_eq!(output.result["status"], "success");
            assert_eq!(output.artifacts.len(), 1);

            let bytes = store.get(&output.artifacts[0]).await.unwrap();
            let stored: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(stored, output.result);
        }
    }

    #[tokio::test]
    async fn test_builtins_are_deterministic() {
        let store = Arc::new(MemoryArtifactStore::new());
        let capability = EmailCapability::new();
        let params = serde_json::json!({"to": "team@example.com", "subject": "Q4"});

        let first = capability
            .invoke(&ctx(params.clone(), store.clone()))
            .await
            .unwrap();
        let second = capability.invoke(&ctx(params, store)).await.unwrap();
        assert_eq!(first, second);
    }
}
