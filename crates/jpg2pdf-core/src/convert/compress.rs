use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::{encode_jpeg, flatten_to_rgb, open_image, COMPRESS_JPEG_QUALITY};
use crate::error::ConvertError;
use crate::naming;

/// Re-encode as JPEG at a reduced quality. Dimensions are kept.
pub(super) fn compress_image(
    input: &Path,
    output_dir: &Path,
    job_id: Uuid,
) -> Result<PathBuf, ConvertError> {
    let (img, _) = open_image(input)?;
    let bytes = encode_jpeg(&flatten_to_rgb(&img), COMPRESS_JPEG_QUALITY)?;

    let output = output_dir.join(naming::compressed_output(job_id));
    std::fs::write(&output, bytes)?;
    Ok(output)
}
