use std::io::Cursor;
use std::path::{Path, PathBuf};

use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use uuid::Uuid;

use super::{encode_jpeg, flatten_to_rgb, open_image, RESIZE_JPEG_QUALITY};
use crate::error::ConvertError;
use crate::naming;

pub const RESIZE_MAX_WIDTH: u32 = 1920;
pub const RESIZE_MAX_HEIGHT: u32 = 1080;

/// Largest size inside `max_w`×`max_h` with the same aspect ratio; images
/// that already fit are returned unchanged.
pub fn fit_within(width: u32, height: u32, max_w: u32, max_h: u32) -> (u32, u32) {
    if width <= max_w && height <= max_h {
        return (width, height);
    }
    let scale = (f64::from(max_w) / f64::from(width)).min(f64::from(max_h) / f64::from(height));
    let w = ((f64::from(width) * scale).round() as u32).clamp(1, max_w);
    let h = ((f64::from(height) * scale).round() as u32).clamp(1, max_h);
    (w, h)
}

pub(super) fn resize_image(
    input: &Path,
    output_dir: &Path,
    job_id: Uuid,
) -> Result<PathBuf, ConvertError> {
    let (img, format) = open_image(input)?;
    let (w, h) = fit_within(img.width(), img.height(), RESIZE_MAX_WIDTH, RESIZE_MAX_HEIGHT);
    let resized = if (w, h) == (img.width(), img.height()) {
        img
    } else {
        img.resize_exact(w, h, FilterType::Lanczos3)
    };

    let (file_name, bytes) = match format {
        Some(ImageFormat::Png) => (naming::resized_output(job_id, "png"), encode_png(&resized)?),
        // JPEG stays JPEG; everything else becomes JPEG too.
        _ => (
            naming::resized_output(job_id, "jpg"),
            encode_jpeg(&flatten_to_rgb(&resized), RESIZE_JPEG_QUALITY)?,
        ),
    };

    let output = output_dir.join(file_name);
    std::fs::write(&output, bytes)?;
    Ok(output)
}

fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, ConvertError> {
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        Cursor::new(&mut buf),
        CompressionType::Best,
        PngFilter::Adaptive,
    );
    img.write_with_encoder(encoder)?;
    Ok(buf)
}
