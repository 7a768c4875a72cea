//! Hero image acquisition, placeholder rendering and optimization.
//!
//! A post always gets exactly one hero image. The generated image is preferred;
//! when generation fails, returns a payload too small to be a real image, or
//! cannot be decoded, an offline gradient placeholder is written instead.
//!
//! Pixel work runs on the blocking thread pool.

use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, Rgb, RgbImage};
use std::path::Path;
use tokio::fs;
use tokio::task;
use tracing::{info, instrument, warn};

use crate::api::GenerativeModel;
use crate::compression::{
    CompressionLogEntry, compression_log_path, forget_compression, record_compression,
};
use crate::config::ImageSettings;
use crate::error::{Error, Outcome, Result};

const GRADIENT_START: [u8; 3] = [0x66, 0x7e, 0xea];
const GRADIENT_END: [u8; 3] = [0x76, 0x4b, 0xa2];

/// Reference canvas the circle layout is defined on.
const REFERENCE_SIZE: (f32, f32) = (1920.0, 1080.0);

/// `(cx, cy, r, alpha)` on the reference canvas, white fill.
const CIRCLES: [(f32, f32, f32, f32); 3] = [
    (960.0, 540.0, 100.0, 0.1),
    (1200.0, 300.0, 60.0, 0.05),
    (720.0, 780.0, 80.0, 0.05),
];

/// How the hero image on disk was produced.
#[derive(Debug, Clone, PartialEq)]
pub enum HeroAsset {
    Generated(CompressionLogEntry),
    Placeholder,
}

pub fn hero_prompt(title: &str) -> String {
    format!(
        "Generate a visually appealing, abstract 16:9 hero image for a tech blog about \"{title}\". \
         The image must NOT contain any text, letters, numbers, captions, or watermarks. \
         Pure imagery only."
    )
}

/// Ask the model for a hero image. Payloads not larger than
/// `settings.min_payload_bytes` are treated as failures.
#[instrument(level = "info", skip(model, settings))]
pub async fn hero_image<M: GenerativeModel>(
    model: &M,
    title: &str,
    settings: &ImageSettings,
) -> Outcome<Vec<u8>> {
    let min = settings.min_payload_bytes;
    Outcome::from_result(model.generate_image(&hero_prompt(title)).await).require(
        |bytes| bytes.len() > min,
        format!("image payload not larger than {min} bytes"),
    )
}

/// Produce the hero image at `path`, generated if possible, placeholder otherwise.
///
/// Only a failure to write the placeholder itself is an error.
#[instrument(level = "info", skip_all, fields(title = %title, path = %path.display()))]
pub async fn acquire_hero_image<M: GenerativeModel>(
    model: &M,
    title: &str,
    path: &Path,
    settings: &ImageSettings,
) -> Result<HeroAsset> {
    match hero_image(model, title, settings).await {
        Outcome::Success(bytes) => match save_and_optimize(bytes, path, settings).await {
            Ok(entry) => return Ok(HeroAsset::Generated(entry)),
            Err(e) => {
                warn!(error = %e, "Generated image could not be optimized, using placeholder")
            }
        },
        Outcome::Degraded(reason) => {
            warn!(%reason, "Hero image generation failed, using placeholder");
        }
    }

    write_placeholder(path, settings).await?;
    Ok(HeroAsset::Placeholder)
}

/// Linear interpolation along the top-left to bottom-right diagonal.
fn gradient_at(x: u32, y: u32, width: u32, height: u32) -> [f32; 3] {
    let fx = x as f32 / (width.max(2) - 1) as f32;
    let fy = y as f32 / (height.max(2) - 1) as f32;
    let t = ((fx + fy) / 2.0).clamp(0.0, 1.0);
    std::array::from_fn(|i| {
        GRADIENT_START[i] as f32 + (GRADIENT_END[i] as f32 - GRADIENT_START[i] as f32) * t
    })
}

/// Render the placeholder: a two-stop diagonal gradient with three translucent
/// white circles. Same settings, same pixels.
pub fn render_placeholder(settings: &ImageSettings) -> RgbImage {
    let (width, height) = (settings.width.max(1), settings.height.max(1));
    let sx = width as f32 / REFERENCE_SIZE.0;
    let sy = height as f32 / REFERENCE_SIZE.1;
    let circles: Vec<(f32, f32, f32, f32)> = CIRCLES
        .iter()
        .map(|&(cx, cy, r, alpha)| (cx * sx, cy * sy, r * sx.min(sy), alpha))
        .collect();

    RgbImage::from_fn(width, height, |x, y| {
        let mut rgb = gradient_at(x, y, width, height);
        let (px, py) = (x as f32 + 0.5, y as f32 + 0.5);
        for &(cx, cy, r, alpha) in &circles {
            if (px - cx).powi(2) + (py - cy).powi(2) <= r * r {
                for channel in &mut rgb {
                    *channel = *channel * (1.0 - alpha) + 255.0 * alpha;
                }
            }
        }
        Rgb(rgb.map(|c| c.round() as u8))
    })
}

fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    let encoder =
        PngEncoder::new_with_quality(&mut buf, CompressionType::Best, PngFilter::Adaptive);
    image.write_with_encoder(encoder)?;
    Ok(buf)
}

/// Decode, cover-resize to the configured size and re-encode as PNG.
pub fn optimize_png(bytes: &[u8], settings: &ImageSettings) -> Result<Vec<u8>> {
    let decoded = image::load_from_memory(bytes)?;
    let resized = decoded.resize_to_fill(settings.width, settings.height, FilterType::Lanczos3);
    encode_png(&resized)
}

async fn run_blocking<T: Send + 'static>(
    work: impl FnOnce() -> Result<T> + Send + 'static,
) -> Result<T> {
    task::spawn_blocking(work)
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))?
}

/// Optimize `bytes`, write them to `path` and log the size change in the
/// compression log next to the image.
#[instrument(level = "info", skip_all, fields(path = %path.display(), original = bytes.len()))]
pub async fn save_and_optimize(
    bytes: Vec<u8>,
    path: &Path,
    settings: &ImageSettings,
) -> Result<CompressionLogEntry> {
    let original_size = bytes.len() as u64;
    let settings = *settings;
    let optimized = run_blocking(move || optimize_png(&bytes, &settings)).await?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, &optimized).await?;

    let log_dir = path.parent().unwrap_or_else(|| Path::new("."));
    record_compression(
        &compression_log_path(log_dir),
        path,
        original_size,
        optimized.len() as u64,
    )
    .await
}

/// Render and write the placeholder. Not recorded in the compression log.
pub async fn write_placeholder(path: &Path, settings: &ImageSettings) -> Result<()> {
    let settings = *settings;
    let png = run_blocking(move || {
        encode_png(&DynamicImage::ImageRgb8(render_placeholder(&settings)))
    })
    .await?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, png).await?;
    info!(path = %path.display(), "Wrote placeholder hero image");
    Ok(())
}

/// Remove a hero image that no post refers to, along with its log entry.
pub async fn discard_hero_image(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }
    let log_dir = path.parent().unwrap_or_else(|| Path::new("."));
    forget_compression(&compression_log_path(log_dir), path).await
}
