//! Image encoding: rasterised pages → PNG bytes, parts → `ImageData`.
//!
//! VLM APIs (OpenAI, Anthropic, Gemini) accept images as base64 data-URIs
//! embedded in the JSON request body. Rendered PDF pages are PNG-encoded
//! because PNG is lossless; text crispness matters far more than file size.
//! Uploaded images are forwarded in their original encoding.

use crate::pipeline::parts::FilePart;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use edgequake_llm::ImageData;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// PNG-encode a rendered page.
pub fn encode_png(img: &DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

/// Wrap one part as base64 `ImageData` for the multimodal request.
///
/// `detail: "high"` asks tiling models for the full tile budget; without it
/// fine print and small tables are lost.
pub fn to_image_data(part: &FilePart) -> ImageData {
    let b64 = STANDARD.encode(&part.data);
    debug!("Encoded {} part → {} bytes base64", part.mime_type, b64.len());
    ImageData::new(b64, part.mime_type.as_str()).with_detail("high")
}
