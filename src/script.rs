//! Edit scripts: a JSON list of steps replayed against an editor.
//!
//! ```json
//! [
//!   { "edit": { "op": "add_image", "source": "beach.png" } },
//!   { "edit": { "op": "use_layout_preset", "id": "grid-2" } },
//!   { "effect": { "image": 0, "effect": "colorization" } },
//!   { "save": { "name": "Summer Vacation" } }
//! ]
//! ```

use std::path::Path;

use serde::Deserialize;

use collage_core::{Command, CoreError, EffectOptions, EffectResolution, Editor};
use collage_document::AiEffect;

/// One script step.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    /// Any editor command
    Edit(Command),
    /// An AI effect on the image at `image`
    Effect {
        image: usize,
        effect: AiEffect,
        #[serde(default)]
        options: EffectOptions,
    },
    /// Persists the document through the repository
    Save { name: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Failed to read script {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid script: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Step {index} ({step}) failed: {source}")]
    Step {
        index: usize,
        step: String,
        source: CoreError,
    },
}

/// Counts of what a script run did.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub steps: usize,
    pub changed: usize,
    pub effects_applied: usize,
    pub effects_skipped: usize,
    pub saves: usize,
}

impl Step {
    fn label(&self) -> String {
        match self {
            Step::Edit(command) => command.display_name().to_string(),
            Step::Effect { effect, .. } => effect.name().to_string(),
            Step::Save { .. } => "Save".to_string(),
        }
    }
}

pub fn parse(json: &str) -> Result<Vec<Step>, ScriptError> {
    Ok(serde_json::from_str(json)?)
}

pub fn load(path: &Path) -> Result<Vec<Step>, ScriptError> {
    let json = std::fs::read_to_string(path).map_err(|source| ScriptError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse(&json)
}

/// Replays steps in order, stopping at the first failure.
pub async fn run(editor: &mut Editor, steps: &[Step]) -> Result<Summary, ScriptError> {
    let mut summary = Summary::default();

    for (index, step) in steps.iter().enumerate() {
        tracing::debug!("Step {}: {}", index, step.label());
        run_step(editor, step, &mut summary)
            .await
            .map_err(|source| ScriptError::Step {
                index,
                step: step.label(),
                source,
            })?;
        summary.steps += 1;
    }

    tracing::info!(
        "Script finished: {} steps, {} changes",
        summary.steps,
        summary.changed
    );
    Ok(summary)
}

async fn run_step(
    editor: &mut Editor,
    step: &Step,
    summary: &mut Summary,
) -> Result<(), CoreError> {
    match step {
        Step::Edit(command) => {
            if editor.execute(command)? {
                summary.changed += 1;
            }
        }
        Step::Effect {
            image,
            effect,
            options,
        } => {
            let id = editor
                .document()
                .images
                .get(*image)
                .map(|img| img.id)
                .ok_or_else(|| CoreError::NotFound(format!("image #{image}")))?;

            match editor.run_effect(id, *effect, options.clone()).await? {
                EffectResolution::Applied => {
                    summary.changed += 1;
                    summary.effects_applied += 1;
                }
                EffectResolution::Described(message) => {
                    tracing::info!("{}: {}", effect, message);
                    summary.effects_applied += 1;
                }
                EffectResolution::Stale => summary.effects_skipped += 1,
                EffectResolution::Failed(message) => {
                    tracing::warn!("{} failed: {}", effect, message);
                    summary.effects_skipped += 1;
                }
            }
        }
        Step::Save { name } => {
            let record = editor.save(name).await?;
            println!("Saved {} as {}", record.name, record.id);
            summary.saves += 1;
        }
    }
    Ok(())
}
