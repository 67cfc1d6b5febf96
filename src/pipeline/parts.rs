//! File-to-parts conversion: one uploaded file → the image parts sent to the
//! provider.
//!
//! Images pass through untouched as a single part. PDFs are rasterised one
//! part per page, each PNG-encoded.

use crate::error::FileError;
use crate::pipeline::encode::encode_png;
use crate::pipeline::input::UploadedFile;
use crate::pipeline::render::render_pdf;
use tracing::debug;

/// One inline attachment of a provider request.
#[derive(Clone, PartialEq, Eq)]
pub struct FilePart {
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl std::fmt::Debug for FilePart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilePart")
            .field("mime_type", &self.mime_type)
            .field("data", &self.data.len())
            .finish()
    }
}

/// Convert `file` into provider parts.
///
/// `max_pixels` and `password` only apply to PDFs.
pub async fn to_parts(
    file: &UploadedFile,
    max_pixels: u32,
    password: Option<&str>,
) -> Result<Vec<FilePart>, FileError> {
    if file.is_image() {
        return Ok(vec![FilePart {
            mime_type: file.mime_type.clone(),
            data: file.bytes.clone(),
        }]);
    }

    if !file.is_pdf() {
        return Err(FileError::Conversion {
            file: file.name.clone(),
            detail: format!("unsupported MIME type {}", file.mime_type),
        });
    }

    let pages = render_pdf(
        &file.name,
        file.bytes.clone(),
        max_pixels,
        password.map(str::to_string),
    )
    .await?;

    let parts = pages
        .iter()
        .enumerate()
        .map(|(idx, img)| {
            encode_png(img)
                .map(|data| FilePart {
                    mime_type: "image/png".to_string(),
                    data,
                })
                .map_err(|e| FileError::Conversion {
                    file: file.name.clone(),
                    detail: format!("page {}: PNG encoding failed: {}", idx + 1, e),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    debug!("{}: {} page part(s)", file.name, parts.len());
    Ok(parts)
}
