//! Encoding composited rasters for the host.

use crate::raster::render_region;
use annota_core::viewport::export_region;
use annota_core::{RgbaImage, Scene};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, RgbImage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    /// Lossy; transparent areas are flattened onto white.
    Jpeg { quality: u8 },
}

impl ExportFormat {
    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg { .. } => "image/jpeg",
        }
    }
}

/// An encoded export, ready to hand to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedImage {
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
}

pub fn encode(raster: &RgbaImage, format: ExportFormat) -> Result<Vec<u8>, String> {
    let mut bytes = Vec::new();
    match format {
        ExportFormat::Png => {
            PngEncoder::new(&mut bytes)
                .write_image(
                    raster.as_raw(),
                    raster.width(),
                    raster.height(),
                    ExtendedColorType::Rgba8,
                )
                .map_err(|e| format!("Failed to encode PNG: {e}"))?;
        }
        ExportFormat::Jpeg { quality } => {
            let flat = flatten_on_white(raster);
            JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100))
                .write_image(
                    flat.as_raw(),
                    flat.width(),
                    flat.height(),
                    ExtendedColorType::Rgb8,
                )
                .map_err(|e| format!("Failed to encode JPEG: {e}"))?;
        }
    }
    Ok(bytes)
}

fn flatten_on_white(raster: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(raster.width(), raster.height(), |x, y| {
        let [r, g, b, a] = raster.get_pixel(x, y).0;
        let a = u16::from(a);
        let over = |c: u8| ((u16::from(c) * a + 255 * (255 - a)) / 255) as u8;
        image::Rgb([over(r), over(g), over(b)])
    })
}

/// Render the visible part of the image (plus annotations) at the stage
/// pixel ratio and encode it.
pub fn export_stage(scene: &Scene, format: ExportFormat) -> Result<ExportedImage, String> {
    let region = export_region(scene);
    let raster = render_region(scene, region, scene.stage.pixel_ratio);
    let bytes = encode(&raster, format)?;
    log::debug!(
        "exported {}x{} {} ({} bytes) from {region:?}",
        raster.width(),
        raster.height(),
        format.mime_type(),
        bytes.len()
    );
    Ok(ExportedImage {
        format,
        width: raster.width(),
        height: raster.height(),
        bytes,
    })
}
