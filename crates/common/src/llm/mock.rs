//! Mock provider for development and testing

use super::{ChatCompleter, ChatOptions, TextureGenerator};
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use std::io::Cursor;

const TEXTURE_SIZE: u32 = 64;

/// Deterministic offline stand-in for the chat and image APIs
#[derive(Debug, Clone, Default)]
pub struct MockClient;

impl MockClient {
    pub fn new() -> Self {
        Self
    }

    /// Colour derived from the prompt text so different materials look different
    fn texture_color(prompt: &str) -> Rgb<u8> {
        let hash = prompt
            .bytes()
            .fold(0x811c_9dc5_u32, |h, b| (h ^ u32::from(b)).wrapping_mul(0x0100_0193));
        let [r, g, b, _] = hash.to_le_bytes();
        Rgb([r, g, b])
    }
}

#[async_trait]
impl ChatCompleter for MockClient {
    async fn complete(&self, system: &str, user: &str, _options: &ChatOptions) -> Result<String> {
        let informed = system
            .lines()
            .filter(|l| l.contains(": {"))
            .count();
        Ok(format!(
            "Gracias por tu mensaje: \"{}\". Tengo {} sección(es) de información relevante. \
            [Respuesta simulada - API de OpenAI no configurada]",
            user.trim(),
            informed
        ))
    }

    fn model_name(&self) -> &str {
        "mock-chat"
    }
}

#[async_trait]
impl TextureGenerator for MockClient {
    async fn generate_texture(&self, prompt: &str) -> Result<Vec<u8>> {
        let texture = RgbImage::from_pixel(TEXTURE_SIZE, TEXTURE_SIZE, Self::texture_color(prompt));
        let mut bytes = Vec::new();
        texture
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .map_err(|e| AppError::Encode {
                message: e.to_string(),
            })?;
        Ok(bytes)
    }
}
