//! Input resolution: turn a user-supplied path, URL or byte buffer into an
//! [`UploadedFile`].
//!
//! The format is sniffed from magic bytes rather than trusted from the file
//! extension: `%PDF` for PDFs, `image::guess_format` for images. Anything
//! else is rejected with [`DocMergeError::UnsupportedFormat`] before a run
//! starts, so a bad selection never costs a provider call.

use crate::error::DocMergeError;
use std::path::Path;
use tracing::{debug, info};

pub const PDF_MIME: &str = "application/pdf";

/// One document submitted for analysis.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Display name (file name, or last URL path segment).
    pub name: String,
    /// Sniffed MIME type: `application/pdf` or `image/*`.
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for UploadedFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadedFile")
            .field("name", &self.name)
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

impl UploadedFile {
    /// Wrap raw bytes, sniffing the format.
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, DocMergeError> {
        let name = name.into();
        let mime_type = sniff_mime(&bytes).ok_or_else(|| DocMergeError::UnsupportedFormat {
            name: name.clone(),
            detected: describe_magic(&bytes),
        })?;
        Ok(Self {
            name,
            mime_type: mime_type.to_string(),
            bytes,
        })
    }

    pub fn is_pdf(&self) -> bool {
        self.mime_type == PDF_MIME
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

/// MIME type for PDFs and any image format the `image` crate recognises.
pub fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"%PDF") {
        return Some(PDF_MIME);
    }
    image::guess_format(bytes).ok().map(|f| f.to_mime_type())
}

fn describe_magic(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "empty file".to_string();
    }
    let head: Vec<String> = bytes.iter().take(4).map(|b| format!("{:02x}", b)).collect();
    format!("magic bytes {}", head.join(" "))
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve a path or URL to an [`UploadedFile`].
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<UploadedFile, DocMergeError> {
    if is_url(input) {
        download_url(input, timeout_secs).await
    } else if input.trim().is_empty() {
        Err(DocMergeError::InvalidInput {
            input: input.to_string(),
        })
    } else {
        resolve_local(Path::new(input)).await
    }
}

async fn resolve_local(path: &Path) -> Result<UploadedFile, DocMergeError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => DocMergeError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => DocMergeError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let file = UploadedFile::new(name, bytes)?;
    debug!(
        "Resolved local file: {} ({}, {} bytes)",
        path.display(),
        file.mime_type,
        file.bytes.len()
    );
    Ok(file)
}

async fn download_url(url: &str, timeout_secs: u64) -> Result<UploadedFile, DocMergeError> {
    info!("Downloading document from: {}", url);

    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| DocMergeError::DownloadFailed {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

    let map_send_err = |e: reqwest::Error| {
        if e.is_timeout() {
            DocMergeError::DownloadTimeout {
                url: url.to_string(),
                secs: timeout_secs,
            }
        } else {
            DocMergeError::DownloadFailed {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    };

    let response = client.get(url).send().await.map_err(map_send_err)?;

    if !response.status().is_success() {
        return Err(DocMergeError::DownloadFailed {
            url: url.to_string(),
            reason: format!("HTTP {}", response.status()),
        });
    }

    let bytes = response.bytes().await.map_err(map_send_err)?;
    let file = UploadedFile::new(filename_from_url(url), bytes.to_vec())?;

    info!("Downloaded {} ({} bytes)", file.name, file.bytes.len());
    Ok(file)
}

/// Last non-empty path segment of `url`, or `"downloaded"`.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut s| s.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty())
        .unwrap_or_else(|| "downloaded".to_string())
}

/// Resolve every input in order. The first failure aborts.
pub async fn resolve_all(inputs: &[String], timeout_secs: u64) -> Result<Vec<UploadedFile>, DocMergeError> {
    let mut files = Vec::with_capacity(inputs.len());
    for input in inputs {
        files.push(resolve_input(input, timeout_secs).await?);
    }
    Ok(files)
}
