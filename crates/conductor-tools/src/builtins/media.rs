//! Media capabilities: tts, asr

use super::finish;
use crate::error::Result;
use crate::registry::{Capability, CapabilityContext, CapabilityDefinition, CapabilityOutput};

/// Text to speech
pub struct TtsCapability {
    definition: CapabilityDefinition,
}

impl TtsCapability {
    /// Create the capability
    #[must_use]
    pub fn new() -> Self {
        let definition = CapabilityDefinition::new("tts", "Synthesize speech from text")
            .with_parameters(serde_json::json!({
                "type": "object",
                "properties": {
                    "text": {"type": "string"}
                }
            }));
        Self { definition }
    }
}

impl Default for TtsCapability {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Capability for TtsCapability {
    fn definition(&self) -> &CapabilityDefinition {
        &self.definition
    }

    async fn invoke(&self, ctx: &CapabilityContext) -> Result<CapabilityOutput> {
        let text = ctx.param_str("text", "Hello world");
        let chars = text.chars().count();
        finish(
            ctx,
            "tts",
            serde_json::json!(format!("Generated speech for {} characters", chars)),
            serde_json::json!({
                "duration_seconds": chars as f64 * 0.1,
                "voice": "en-US-neural"
            }),
        )
        .await
    }
}

/// Speech recognition
pub struct AsrCapability {
    definition: CapabilityDefinition,
}

impl AsrCapability {
    /// Create the capability
    #[must_use]
    pub fn new() -> Self {
        let definition = CapabilityDefinition::new("asr", "Transcribe an audio recording")
            .with_parameters(serde_json::json!({
                "type": "object",
                "properties": {
                    "audio_file": {"type": "string"}
                }
            }));
        Self { definition }
    }
}

impl Default for AsrCapability {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Capability for AsrCapability {
    fn definition(&self) -> &CapabilityDefinition {
        &self.definition
    }

    async fn invoke(&self, ctx: &CapabilityContext) -> Result<CapabilityOutput> {
        let audio_file = ctx.param_str("audio_file", "recording.mp3");
        finish(
            ctx,
            "asr",
            serde_json::json!("Transcribed: This is a sample transcription"),
            serde_json::json!({
                "audio_file": audio_file,
                "duration_seconds": 45,
                "confidence": 0.94
            }),
        )
        .await
    }
}
