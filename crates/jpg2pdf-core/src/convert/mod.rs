//! Conversion dispatch and the routines behind it.
//!
//! Every routine is a one-shot synchronous transformation: it reads the
//! stored upload, writes exactly one file into `output_dir` and returns its
//! path, or fails without leaving a usable output behind. Callers on an async
//! runtime should run [`convert`] on the blocking pool.

mod compress;
mod pdf;
mod resize;

use std::path::{Path, PathBuf};

use image::{imageops, DynamicImage, ImageFormat, ImageReader, Rgba, RgbaImage, RgbImage};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ConvertError;
use crate::kind::{ConversionKind, Routine};

pub use pdf::{fit_to_page, PageSize, A4_HEIGHT_PT, A4_WIDTH_PT};
pub use resize::{fit_within, RESIZE_MAX_HEIGHT, RESIZE_MAX_WIDTH};

/// JPEG quality used when embedding an image into a PDF.
pub const PDF_JPEG_QUALITY: u8 = 95;
/// JPEG quality for resized outputs.
pub const RESIZE_JPEG_QUALITY: u8 = 90;
/// JPEG quality for compressed outputs.
pub const COMPRESS_JPEG_QUALITY: u8 = 75;

/// Run the routine for `kind` on `input`, writing into `output_dir`.
pub fn convert(
    kind: ConversionKind,
    input: &Path,
    output_dir: &Path,
    job_id: Uuid,
) -> Result<PathBuf, ConvertError> {
    let routine = kind.routine().ok_or(ConvertError::Unsupported(kind))?;
    std::fs::create_dir_all(output_dir)?;

    debug!(%job_id, ?routine, input = %input.display(), "dispatching conversion");
    let output = match routine {
        Routine::ImageToPdf => pdf::image_to_pdf(input, output_dir, job_id)
            .map_err(ConvertError::during("convert image to PDF"))?,
        Routine::Resize => resize::resize_image(input, output_dir, job_id)
            .map_err(ConvertError::during("resize image"))?,
        Routine::Compress => compress::compress_image(input, output_dir, job_id)
            .map_err(ConvertError::during("compress image"))?,
    };
    info!(%job_id, ?routine, output = %output.display(), "conversion finished");
    Ok(output)
}

/// Decode an image, sniffing the format from its content.
fn open_image(path: &Path) -> Result<(DynamicImage, Option<ImageFormat>), ConvertError> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    let format = reader.format();
    Ok((reader.decode()?, format))
}

/// Drop any alpha channel by compositing over white.
fn flatten_to_rgb(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let mut canvas = RgbaImage::from_pixel(img.width(), img.height(), Rgba([255, 255, 255, 255]));
    imageops::overlay(&mut canvas, &img.to_rgba8(), 0, 0);
    DynamicImage::ImageRgba8(canvas).to_rgb8()
}

fn encode_jpeg(rgb: &RgbImage, quality: u8) -> Result<Vec<u8>, ConvertError> {
    let mut buf = Vec::new();
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
    encoder.encode_image(rgb)?;
    Ok(buf)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Cursor;
    use std::path::{Path, PathBuf};

    use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

    /// Write a `w`×`h` image in `format` and return its path.
    pub fn write_image(dir: &Path, name: &str, w: u32, h: u32, format: ImageFormat) -> PathBuf {
        let img = RgbaImage::from_fn(w, h, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, if x < w / 2 { 255 } else { 0 }])
        });
        let img = match format {
            ImageFormat::Jpeg | ImageFormat::Bmp => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(img).to_rgb8()),
            _ => DynamicImage::ImageRgba8(img),
        };
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), format).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, buf).unwrap();
        path
    }
}
