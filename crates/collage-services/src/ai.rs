//! Mock AI effect backend.
//!
//! Simulates processing latency and returns a derived source for effects
//! that produce an image. Object detection only reports labels.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use collage_core::{
    AiEffectService, CollaboratorError, CollaboratorResult, EffectOptions, EffectOutcome,
};
use collage_document::AiEffect;

const DEFAULT_STYLE: &str = "artistic";
const DETECTED_LABELS: &str = "person, sky, nature";

/// An AI service that never leaves the process.
pub struct MockAiService {
    latency: Duration,
    offline: AtomicBool,
    calls: AtomicUsize,
}

impl MockAiService {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            offline: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// A service that answers immediately.
    pub fn instant() -> Self {
        Self::new(Duration::ZERO)
    }

    /// Makes every following call fail with `Unavailable`.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of calls received, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn outcome(effect: AiEffect, source: &str, options: &EffectOptions) -> EffectOutcome {
        let message = match effect {
            AiEffect::BackgroundRemoval => "Background removed successfully".to_string(),
            AiEffect::StyleTransfer => {
                let style = options
                    .get("style")
                    .map(String::as_str)
                    .unwrap_or(DEFAULT_STYLE);
                format!("Style transfer applied: {style}")
            }
            AiEffect::FaceEnhancement => "Face enhancement completed".to_string(),
            AiEffect::ObjectDetection => format!("Objects detected: {DETECTED_LABELS}"),
            AiEffect::Colorization => "Image colorized successfully".to_string(),
            AiEffect::Upscale => "Image upscaled successfully".to_string(),
        };

        let processed_source = effect
            .produces_image()
            .then(|| processed(source, effect));

        EffectOutcome {
            success: true,
            processed_source,
            message,
        }
    }
}

impl Default for MockAiService {
    fn default() -> Self {
        Self::instant()
    }
}

/// Tags a source with the effect that processed it.
fn processed(source: &str, effect: AiEffect) -> String {
    let sep = if source.contains('?') { '&' } else { '?' };
    format!("{source}{sep}ai={}", effect.id())
}

#[async_trait]
impl AiEffectService for MockAiService {
    async fn apply(
        &self,
        effect: AiEffect,
        source: &str,
        options: &EffectOptions,
    ) -> CollaboratorResult<EffectOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tracing::debug!("AI effect {} requested", effect.name());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.offline.load(Ordering::SeqCst) {
            tracing::warn!("AI service offline, dropping {} request", effect.name());
            return Err(CollaboratorError::Unavailable(
                "AI processing failed".to_string(),
            ));
        }

        if source.is_empty() {
            return Err(CollaboratorError::Rejected(
                "Image data and effect are required".to_string(),
            ));
        }

        Ok(Self::outcome(effect, source, options))
    }
}
