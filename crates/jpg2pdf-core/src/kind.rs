use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Conversion requested by the client, by wire name (`jpg_to_pdf`, …).
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ConversionKind {
    #[default]
    JpgToPdf,
    PngToPdf,
    /// Accepted on the wire but has no routine; jobs of this kind fail.
    PdfToJpg,
    ResizeImage,
    CompressImage,
}

/// The conversion routines that actually exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routine {
    ImageToPdf,
    Resize,
    Compress,
}

impl ConversionKind {
    pub fn label(self) -> &'static str {
        match self {
            ConversionKind::JpgToPdf => "JPG to PDF",
            ConversionKind::PngToPdf => "PNG to PDF",
            ConversionKind::PdfToJpg => "PDF to JPG",
            ConversionKind::ResizeImage => "Resize Image",
            ConversionKind::CompressImage => "Compress Image",
        }
    }

    /// Dispatch table from requested kind to routine.
    pub fn routine(self) -> Option<Routine> {
        match self {
            ConversionKind::JpgToPdf | ConversionKind::PngToPdf => Some(Routine::ImageToPdf),
            ConversionKind::ResizeImage => Some(Routine::Resize),
            ConversionKind::CompressImage => Some(Routine::Compress),
            ConversionKind::PdfToJpg => None,
        }
    }
}
