//! Floor simulator pipeline
//!
//! 1. Generates a texture for the requested material
//! 2. Stores it next to the final output as `.<stem>_temp.png`
//! 3. Composites it into the base room photo, or publishes the bare
//!    texture when no base photo is available

use crate::compositor;
use crate::config::FloorConfig;
use crate::errors::{AppError, Result};
use crate::llm::TextureGenerator;
use crate::metrics;
use crate::prompt::texture_prompt;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Outcome of a floor simulation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FloorResult {
    /// Where the image was written
    pub file_path: PathBuf,

    /// URL path the image is served under
    pub web_path: String,

    /// False when the base photo was missing and the bare texture was published
    pub composited: bool,
}

pub struct FloorGenerator {
    generator: Arc<dyn TextureGenerator>,
    config: FloorConfig,
}

impl FloorGenerator {
    pub fn new(generator: Arc<dyn TextureGenerator>, config: FloorConfig) -> Self {
        Self { generator, config }
    }

    /// Output file for a material and user; distinct per pair so concurrent users never share a file
    pub fn output_path(&self, material: &str, user_id: &str) -> PathBuf {
        self.config.output_dir.join(file_name(material, user_id))
    }

    pub fn web_path(&self, material: &str, user_id: &str) -> String {
        format!(
            "{}/{}",
            self.config.web_prefix.trim_end_matches('/'),
            file_name(material, user_id)
        )
    }

    /// Generate and publish the floor simulation for `material`
    #[instrument(skip(self))]
    pub async fn generate(&self, material: &str, user_id: &str) -> Result<FloorResult> {
        let material = normalize_slug(material, "material", true)?;
        let user_id = normalize_slug(user_id, "user_id", false)?;

        let outcome = self.generate_inner(&material, &user_id).await;
        match &outcome {
            Ok(result) => {
                metrics::record_floor_generation(&material, result.composited, true);
                info!(path = %result.file_path.display(), composited = result.composited, "Floor simulation ready");
            }
            Err(e) => {
                metrics::record_floor_generation(&material, false, false);
                warn!(error = %e, "Floor simulation failed");
            }
        }
        outcome
    }

    async fn generate_inner(&self, material: &str, user_id: &str) -> Result<FloorResult> {
        let bytes = self.generator.generate_texture(&texture_prompt(material)).await?;

        let output_path = self.output_path(material, user_id);
        let temp_path = temp_path_for(&output_path);
        tokio::fs::create_dir_all(&self.config.output_dir)
            .await
            .map_err(|e| AppError::io(&self.config.output_dir, e))?;
        tokio::fs::write(&temp_path, &bytes)
            .await
            .map_err(|e| AppError::io(&temp_path, e))?;

        let base_path = self.config.base_image_path.clone();
        let composited = tokio::fs::try_exists(&base_path).await.unwrap_or(false);

        if composited {
            let (texture, output) = (temp_path.clone(), output_path.clone());
            let joined = tokio::task::spawn_blocking(move || {
                compositor::composite(&base_path, &texture, &output)
            })
            .await;
            // The temp texture goes away whatever the composite did
            if let Err(e) = tokio::fs::remove_file(&temp_path).await {
                warn!(path = %temp_path.display(), error = %e, "Failed to remove temp texture");
            }
            joined.map_err(|e| AppError::Internal {
                message: format!("Composite task failed: {}", e),
            })??;
        } else {
            // Decode first so a broken download is never published as-is
            let check = temp_path.clone();
            let decoded = tokio::task::spawn_blocking(move || compositor::load_image(&check))
                .await
                .map_err(|e| AppError::Internal {
                    message: format!("Decode task failed: {}", e),
                })?;
            if let Err(e) = decoded {
                let _ = tokio::fs::remove_file(&temp_path).await;
                return Err(e);
            }
            warn!(base = %self.config.base_image_path.display(), "Base photo missing, publishing bare texture");
            tokio::fs::rename(&temp_path, &output_path)
                .await
                .map_err(|e| AppError::io(&output_path, e))?;
        }

        Ok(FloorResult {
            web_path: self.web_path(material, user_id),
            file_path: output_path,
            composited,
        })
    }
}

fn file_name(material: &str, user_id: &str) -> String {
    format!("{}_{}.png", material, user_id)
}

/// `piso/wood_7.png` -> `piso/.wood_7_temp.png`; output names never start with a dot
fn temp_path_for(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!(".{}_temp.png", stem))
}

/// Lower-case and require `[a-z0-9-]+` (plus `_` when `allow_underscore`).
/// The user id never contains `_`, so the last `_` of a file name splits it unambiguously.
fn normalize_slug(value: &str, field: &str, allow_underscore: bool) -> Result<String> {
    let slug = value.trim().to_lowercase();
    let valid = !slug.is_empty()
        && slug.chars().all(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || (allow_underscore && c == '_')
        });
    if !valid {
        return Err(AppError::Validation {
            message: format!("Invalid {}: {:?}", field, value),
            field: Some(field.to_string()),
        });
    }
    Ok(slug)
}
