//! Research capabilities: browser, pdf_parser, vector_search, repo_reader

use super::finish;
use crate::error::Result;
use crate::registry::{Capability, CapabilityContext, CapabilityDefinition, CapabilityOutput};
use tracing::debug;

/// Fetches a web page
pub struct BrowserCapability {
    definition: CapabilityDefinition,
}

impl BrowserCapability {
    /// Create the capability
    #[must_use]
    pub fn new() -> Self {
        let definition = CapabilityDefinition::new("browser", "Fetch the content of a web page")
            .with_parameters(serde_json::json!({
                "type": "object",
                "properties": {
                    "url": {"type": "string", "description": "Page to fetch"}
                }
            }));
        Self { definition }
    }
}

impl Default for BrowserCapability {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Capability for BrowserCapability {
    fn definition(&self) -> &CapabilityDefinition {
        &self.definition
    }

    async fn invoke(&self, ctx: &CapabilityContext) -> Result<CapabilityOutput> {
        let url = ctx.param_str("url", "https://example.com");
        debug!(url = %url, "Fetching page");
        finish(
            ctx,
            "browser",
            serde_json::json!(format!("Fetched content from {}", url)),
            serde_json::json!({"url": url, "status_code": 200}),
        )
        .await
    }
}

/// Extracts text from a PDF document
pub struct PdfParserCapability {
    definition: CapabilityDefinition,
}

impl PdfParserCapability {
    /// Create the capability
    #[must_use]
    pub fn new() -> Self {
        let definition =
            CapabilityDefinition::new("pdf_parser", "Extract text from a PDF document")
                .with_parameters(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "file_path": {"type": "string"}
                    }
                }));
        Self { definition }
    }
}

impl Default for PdfParserCapability {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Capability for PdfParserCapability {
    fn definition(&self) -> &CapabilityDefinition {
        &self.definition
    }

    async fn invoke(&self, ctx: &CapabilityContext) -> Result<CapabilityOutput> {
        let file_path = ctx.param_str("file_path", "document.pdf");
        finish(
            ctx,
            "pdf_parser",
            serde_json::json!(format!("Extracted 150 pages from {}", file_path)),
            serde_json::json!({"pages": 150, "text_length": 45000}),
        )
        .await
    }
}

/// Semantic search over indexed documents
pub struct VectorSearchCapability {
    definition: CapabilityDefinition,
}

impl VectorSearchCapability {
    /// Create the capability
    #[must_use]
    pub fn new() -> Self {
        let definition =
            CapabilityDefinition::new("vector_search", "Search indexed documents by meaning")
                .with_parameters(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "query": {"type": "string"}
                    }
                }));
        Self { definition }
    }
}

impl Default for VectorSearchCapability {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Capability for VectorSearchCapability {
    fn definition(&self) -> &CapabilityDefinition {
        &self.definition
    }

    async fn invoke(&self, ctx: &CapabilityContext) -> Result<CapabilityOutput> {
        // Falls back to the task description when no explicit query is given
        let query = ctx.param_str("query", &ctx.description);
        finish(
            ctx,
            "vector_search",
            serde_json::json!([
                {"id": "doc-1", "score": 0.95, "text": "Relevant passage 1"},
                {"id": "doc-2", "score": 0.89, "text": "Relevant passage 2"},
                {"id": "doc-3", "score": 0.82, "text": "Relevant passage 3"}
            ]),
            serde_json::json!({"query": query, "total_results": 3}),
        )
        .await
    }
}

/// Reads and summarises a source repository
pub struct RepoReaderCapability {
    definition: CapabilityDefinition,
}

impl RepoReaderCapability {
    /// Create the capability
    #[must_use]
    pub fn new() -> Self {
        let definition =
            CapabilityDefinition::new("repo_reader", "Analyze a source code repository")
                .with_parameters(serde_json::json!({
                    "type": "object",
                    "properties": {
                        "repo_url": {"type": "string"}
                    }
                }));
        Self { definition }
    }
}

impl Default for RepoReaderCapability {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Capability for RepoReaderCapability {
    fn definition(&self) -> &CapabilityDefinition {
        &self.definition
    }

    async fn invoke(&self, ctx: &CapabilityContext) -> Result<CapabilityOutput> {
        let repo_url = ctx.param_str("repo_url", "https://github.com/example/repo");
        finish(
            ctx,
            "repo_reader",
            serde_json::json!(format!("Analyzed repository: {}", repo_url)),
            serde_json::json!({"files_analyzed": 47, "lines_of_code": 12500}),
        )
        .await
    }
}
