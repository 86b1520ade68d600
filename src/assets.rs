//! Logo and signature loading.
//!
//! Images are fetched before rendering so both outputs can embed them: HTML
//! as a `data:` URI, Typst as a file written next to the markup. An image
//! that cannot be loaded within the timeout is dropped and the quote renders
//! without it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{debug, warn};

use crate::error::{DevisError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    DataUri(String),
    Url(String),
    Path(PathBuf),
}

impl ImageSource {
    /// Relative paths resolve against `base_dir` (the data root).
    pub fn parse(reference: &str, base_dir: &Path) -> ImageSource {
        let reference = reference.trim();
        if reference.starts_with("data:") {
            ImageSource::DataUri(reference.to_string())
        } else if reference.starts_with("http://") || reference.starts_with("https://") {
            ImageSource::Url(reference.to_string())
        } else {
            let path = PathBuf::from(crate::config::expand_home_dir(reference));
            if path.is_absolute() {
                ImageSource::Path(path)
            } else {
                ImageSource::Path(base_dir.join(path))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedImage {
    pub mime: &'static str,
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

impl EmbeddedImage {
    fn from_bytes(bytes: Vec<u8>) -> Result<EmbeddedImage> {
        let (mime, extension) =
            sniff(&bytes).ok_or_else(|| DevisError::Image("unrecognized image format".into()))?;
        Ok(EmbeddedImage { mime, extension, bytes })
    }

    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }
}

fn sniff(bytes: &[u8]) -> Option<(&'static str, &'static str)> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Some(("image/png", "png"));
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some(("image/jpeg", "jpg"));
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Some(("image/gif", "gif"));
    }
    if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        return Some(("image/webp", "webp"));
    }
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(512)]);
    let head = head.trim_start();
    if head.starts_with("<svg") || (head.starts_with("<?xml") && head.contains("<svg")) {
        return Some(("image/svg+xml", "svg"));
    }
    None
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let (header, payload) = uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| DevisError::Image("malformed data URI".into()))?;
    if header.ends_with(";base64") {
        STANDARD
            .decode(payload.trim())
            .map_err(|e| DevisError::Image(format!("invalid base64 payload: {}", e)))
    } else {
        urlencoding::decode(payload)
            .map(|s| s.into_owned().into_bytes())
            .map_err(|e| DevisError::Image(format!("invalid data URI payload: {}", e)))
    }
}

fn fetch(url: &str, timeout: Duration) -> Result<Vec<u8>> {
    let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
    let response = client.get(url).send()?;
    if !response.status().is_success() {
        return Err(DevisError::Image(format!("{} returned {}", url, response.status())));
    }
    Ok(response.bytes()?.to_vec())
}

pub fn load_image(reference: &str, base_dir: &Path, timeout: Duration) -> Result<EmbeddedImage> {
    let bytes = match ImageSource::parse(reference, base_dir) {
        ImageSource::DataUri(uri) => decode_data_uri(&uri)?,
        ImageSource::Url(url) => {
            debug!(%url, ?timeout, "fetching image");
            fetch(&url, timeout)?
        }
        ImageSource::Path(path) => fs::read(&path)
            .map_err(|e| DevisError::Image(format!("{}: {}", path.display(), e)))?,
    };
    EmbeddedImage::from_bytes(bytes)
}

/// Load an optional image; failures are logged and yield `None`.
pub fn load_optional(
    reference: Option<&str>,
    base_dir: &Path,
    timeout: Duration,
) -> Option<EmbeddedImage> {
    let reference = reference.filter(|r| !r.trim().is_empty())?;
    match load_image(reference, base_dir, timeout) {
        Ok(image) => Some(image),
        Err(e) => {
            warn!(reference, error = %e, "image skipped");
            None
        }
    }
}

/// Logo and signature of the issuing company, loaded once per render.
#[derive(Debug, Clone, Default)]
pub struct CompanyImages {
    pub logo: Option<EmbeddedImage>,
    pub signature: Option<EmbeddedImage>,
}

impl CompanyImages {
    pub fn load(company: &crate::model::Company, base_dir: &Path, timeout: Duration) -> Self {
        CompanyImages {
            logo: load_optional(company.logo.as_deref(), base_dir, timeout),
            signature: load_optional(company.signature.as_deref(), base_dir, timeout),
        }
    }
}
