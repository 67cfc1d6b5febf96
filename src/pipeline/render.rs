//! PDF rasterisation: render every page of an in-memory PDF to a
//! `DynamicImage` via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, preventing the Tokio worker
//! threads from stalling during CPU-heavy rendering.
//!
//! ## Why cap pixels, not DPI?
//!
//! Page sizes vary wildly: an A0 poster at 150 DPI would produce a
//! 12,000 × 17,000 px image. `max_rendered_pixels` caps the longest edge
//! regardless of physical size, keeping memory bounded.

use crate::error::FileError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use tracing::{debug, info};

/// Rasterise every page of `bytes` in page order.
pub async fn render_pdf(
    name: &str,
    bytes: Vec<u8>,
    max_pixels: u32,
    password: Option<String>,
) -> Result<Vec<DynamicImage>, FileError> {
    let file = name.to_string();

    tokio::task::spawn_blocking(move || render_pdf_blocking(&file, &bytes, max_pixels, password.as_deref()))
        .await
        .map_err(|e| FileError::Conversion {
            file: name.to_string(),
            detail: format!("render task panicked: {}", e),
        })?
}

fn render_pdf_blocking(
    name: &str,
    bytes: &[u8],
    max_pixels: u32,
    password: Option<&str>,
) -> Result<Vec<DynamicImage>, FileError> {
    let conversion = |detail: String| FileError::Conversion {
        file: name.to_string(),
        detail,
    };

    let pdfium = Pdfium::default();

    let document = pdfium.load_pdf_from_byte_slice(bytes, password).map_err(|e| {
        let err_str = format!("{:?}", e);
        if err_str.contains("Password") || err_str.contains("password") {
            if password.is_some() {
                conversion("wrong PDF password".to_string())
            } else {
                conversion("PDF is password-protected; supply --password".to_string())
            }
        } else {
            conversion(format!("corrupt or unreadable PDF: {}", err_str))
        }
    })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("{}: PDF loaded, {} pages", name, total_pages);

    let render_config = PdfRenderConfig::new()
        .set_target_width(max_pixels as i32)
        .set_maximum_height(max_pixels as i32);

    let mut images = Vec::with_capacity(total_pages);
    for (idx, page) in pages.iter().enumerate() {
        let bitmap = page
            .render_with_config(&render_config)
            .map_err(|e| conversion(format!("page {}: {:?}", idx + 1, e)))?;

        let image = bitmap.as_image();
        debug!(
            "{}: rendered page {} → {}x{} px",
            name,
            idx + 1,
            image.width(),
            image.height()
        );
        images.push(image);
    }

    if images.is_empty() {
        return Err(conversion("PDF has no pages".to_string()));
    }
    Ok(images)
}
