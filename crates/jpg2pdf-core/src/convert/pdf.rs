//! Image → single-page PDF.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use printpdf::{
    ColorBits, ColorSpace, Image, ImageFilter, ImageTransform, ImageXObject, Mm, PdfDocument, Pt,
    Px,
};
use uuid::Uuid;

use super::{encode_jpeg, flatten_to_rgb, open_image, PDF_JPEG_QUALITY};
use crate::error::ConvertError;
use crate::naming;

/// A4 width in PostScript points.
pub const A4_WIDTH_PT: f64 = 210.0 * 72.0 / 25.4;
/// A4 height in PostScript points.
pub const A4_HEIGHT_PT: f64 = 297.0 * 72.0 / 25.4;

/// One pixel is drawn as one point before scaling.
const PIXELS_PER_INCH: f32 = 72.0;

/// Page sizes are rounded down to this many millimetres.
const PAGE_STEP_MM: f64 = 1e-4;

/// Adobe APP14 segment declaring YCbCr data. It overrides the
/// `ColorTransform 0` that printpdf writes for every DCT image.
const ADOBE_YCBCR_SEGMENT: [u8; 16] = [
    0xFF, 0xEE, 0x00, 0x0E, b'A', b'd', b'o', b'b', b'e', 0x00, 0x64, 0x00, 0x00, 0x00, 0x00, 0x01,
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width_pt: f64,
    pub height_pt: f64,
    /// Factor applied to the pixel size; never above 1.
    pub scale: f64,
}

/// Fit a `width`×`height` pixel image onto A4, keeping the aspect ratio and
/// never enlarging it.
pub fn fit_to_page(width: u32, height: u32) -> PageSize {
    let (w, h) = (f64::from(width), f64::from(height));
    let scale = (A4_WIDTH_PT / w).min(A4_HEIGHT_PT / h).min(1.0);
    PageSize {
        width_pt: w * scale,
        height_pt: h * scale,
        scale,
    }
}

/// Largest millimetre length whose point value, as printpdf computes it in
/// `f32`, does not exceed `target_pt`.
fn page_length(target_pt: f64) -> Mm {
    let steps = (target_pt * 25.4 / 72.0 / PAGE_STEP_MM).floor();
    let mut mm = steps * PAGE_STEP_MM;
    while mm > 0.0 && f64::from(Pt::from(Mm(mm as f32)).0) > target_pt {
        mm -= PAGE_STEP_MM;
    }
    Mm(mm.max(0.0) as f32)
}

/// Insert the Adobe segment after the JFIF header, or right after SOI when
/// there is none.
fn mark_ycbcr(jpeg: Vec<u8>) -> Vec<u8> {
    let at = match jpeg.get(2..6) {
        Some([0xFF, 0xE0, hi, lo]) => 4 + usize::from(u16::from_be_bytes([*hi, *lo])),
        _ => 2,
    };
    if jpeg.len() < at {
        return jpeg;
    }
    let mut out = Vec::with_capacity(jpeg.len() + ADOBE_YCBCR_SEGMENT.len());
    out.extend_from_slice(&jpeg[..at]);
    out.extend_from_slice(&ADOBE_YCBCR_SEGMENT);
    out.extend_from_slice(&jpeg[at..]);
    out
}

pub(super) fn image_to_pdf(
    input: &Path,
    output_dir: &Path,
    job_id: Uuid,
) -> Result<PathBuf, ConvertError> {
    let (img, _) = open_image(input)?;
    let rgb = flatten_to_rgb(&img);
    let (width, height) = rgb.dimensions();
    let page = fit_to_page(width, height);
    let jpeg = mark_ycbcr(encode_jpeg(&rgb, PDF_JPEG_QUALITY)?);
    drop(rgb);

    let file_name = naming::pdf_output(job_id);
    let (doc, page_idx, layer_idx) = PdfDocument::new(
        file_name.as_str(),
        page_length(page.width_pt),
        page_length(page.height_pt),
        "Layer 1",
    );
    let layer = doc.get_page(page_idx).get_layer(layer_idx);

    let image = Image::from(ImageXObject {
        width: Px(width as usize),
        height: Px(height as usize),
        color_space: ColorSpace::Rgb,
        bits_per_component: ColorBits::Bit8,
        interpolate: true,
        image_data: jpeg,
        image_filter: Some(ImageFilter::DCT),
        smask: None,
        clipping_bbox: None,
    });
    image.add_to_layer(
        layer,
        ImageTransform {
            translate_x: Some(Mm(0.0)),
            translate_y: Some(Mm(0.0)),
            scale_x: Some(page.scale as f32),
            scale_y: Some(page.scale as f32),
            dpi: Some(PIXELS_PER_INCH),
            ..Default::default()
        },
    );

    let output = output_dir.join(&file_name);
    let mut writer = BufWriter::new(File::create(&output)?);
    doc.save(&mut writer)
        .map_err(|e| ConvertError::Pdf(format!("{e:?}")))?;

    Ok(output)
}
