//! Product image download for receipts
//!
//! Images are fetched with a bounded timeout and re-encoded to JPEG, the
//! only format the PDF embedder accepts. Every failure returns `None`; the
//! renderer draws a placeholder frame instead.

use std::io::{Seek, SeekFrom, Write};
use std::time::Duration;

use image::ImageFormat;
use tempfile::NamedTempFile;

/// Download an image and transcode it to a temporary JPEG file.
///
/// The temp file deletes itself on drop, so the caller just has to keep it
/// alive until rendering finishes.
pub async fn fetch_to_jpeg(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Option<NamedTempFile> {
    let response = match client.get(url).timeout(timeout).send().await {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Image download failed");
            return None;
        }
    };
    if !response.status().is_success() {
        tracing::warn!(url = %url, status = %response.status(), "Image download rejected");
        return None;
    }
    let bytes = match response.bytes().await {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Image body read failed");
            return None;
        }
    };

    let decoded = match image::load_from_memory(&bytes) {
        Ok(img) => img,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "Image decode failed");
            return None;
        }
    };

    let mut file = match NamedTempFile::new() {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!(error = %e, "Temp file creation failed");
            return None;
        }
    };

    // JPEG has no alpha channel
    let rgb = image::DynamicImage::ImageRgb8(decoded.to_rgb8());
    if let Err(e) = rgb.write_to(file.as_file_mut(), ImageFormat::Jpeg) {
        tracing::warn!(url = %url, error = %e, "JPEG transcode failed");
        return None;
    }
    if let Err(e) = file.as_file_mut().flush() {
        tracing::warn!(error = %e, "Temp file flush failed");
        return None;
    }
    if let Err(e) = file.as_file_mut().seek(SeekFrom::Start(0)) {
        tracing::warn!(error = %e, "Temp file rewind failed");
        return None;
    }

    Some(file)
}
