//! Communication capabilities: email_api, calendar_api, ppt_api
//!
//! These are the externally visible side effects of the catalog, so skills
//! bound to them usually declare `requires_approval`.

use super::finish;
use crate::error::Result;
use crate::registry::{Capability, CapabilityContext, CapabilityDefinition, CapabilityOutput};
use tracing::info;

/// Queues an outbound email
pub struct EmailCapability {
    definition: CapabilityDefinition,
}

impl EmailCapability {
    /// Create the capability
    #[must_use]
    pub fn new() -> Self {
        let definition = CapabilityDefinition::new("email_api", "Compose and queue an email")
            .with_parameters(serde_json::json!({
                "type": "object",
                "properties": {
                    "to": {"type": "string"},
                    "subject": {"type": "string"}
                }
            }));
        Self { definition }
    }
}

impl Default for EmailCapability {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Capability for EmailCapability {
    fn definition(&self) -> &CapabilityDefinition {
        &self.definition
    }

    async fn invoke(&self, ctx: &CapabilityContext) -> Result<CapabilityOutput> {
        let to = ctx.param_str("to", "user@example.com");
        let subject = ctx.param_str("subject", "Email Subject");
        info!(task_id = %ctx.task_id, to = %to, "Queueing email");
        finish(
            ctx,
            "email_api",
            serde_json::json!(format!("Email queued to {}", to)),
            serde_json::json!({"to": to, "subject": subject, "message_id": "msg-12345"}),
        )
        .await
    }
}

/// Creates a calendar event
pub struct CalendarCapability {
    definition: CapabilityDefinition,
}

impl CalendarCapability {
    /// Create the capability
    #[must_use]
    pub fn new() -> Self {
        let definition = CapabilityDefinition::new("calendar_api", "Create a calendar event")
            .with_parameters(serde_json::json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string"}
                }
            }));
        Self { definition }
    }
}

impl Default for CalendarCapability {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Capability for CalendarCapability {
    fn definition(&self) -> &CapabilityDefinition {
        &self.definition
    }

    async fn invoke(&self, ctx: &CapabilityContext) -> Result<CapabilityOutput> {
        let title = ctx.param_str("title", "Meeting");
        info!(task_id = %ctx.task_id, title = %title, "Creating calendar event");
        finish(
            ctx,
            "calendar_api",
            serde_json::json!(format!("Event '{}' created", title)),
            serde_json::json!({"event_id": "evt-67890", "attendees": 3}),
        )
        .await
    }
}

/// Builds a slide deck
pub struct PresentationCapability {
    definition: CapabilityDefinition,
}

impl PresentationCapability {
    /// Create the capability
    #[must_use]
    pub fn new() -> Self {
        let definition = CapabilityDefinition::new("ppt_api", "Build a presentation deck")
            .with_parameters(serde_json::json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string"}
                }
            }));
        Self { definition }
    }
}

impl Default for PresentationCapability {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Capability for PresentationCapability {
    fn definition(&self) -> &CapabilityDefinition {
        &self.definition
    }

    async fn invoke(&self, ctx: &CapabilityContext) -> Result<CapabilityOutput> {
        let title = ctx.param_str("title", "Presentation");
        finish(
            ctx,
            "ppt_api",
            serde_json::json!(format!("Created presentation: {}", title)),
            serde_json::json!({"slides": 12, "format": "pptx"}),
        )
        .await
    }
}
