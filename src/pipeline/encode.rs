//! Document encoding: selected file → base64 payload + content type.
//!
//! Gemini accepts documents as `inlineData { mimeType, data }` where `data`
//! is bare base64. The document is first rendered as a self-describing data
//! URL (`data:<type>;base64,<payload>`) and only the segment after the `,`
//! delimiter is kept.
//!
//! This module also owns [`Preview`], the temporary copy of the document
//! shown while the form is filled in.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::BoletimError;
use crate::pipeline::input::SelectedFile;

/// Separator between the data URL header and its payload.
pub const DATA_URL_DELIMITER: char = ',';

/// A document ready to be embedded in an extraction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedDocument {
    /// Standard base64 without any header.
    pub data: String,
    pub content_type: String,
}

/// Build the data URL header for `content_type` (`data:<type>;base64`).
pub fn data_url_header(content_type: &str) -> String {
    format!("data:{content_type};base64")
}

/// Encode `bytes` as a complete data URL.
pub fn to_data_url(bytes: &[u8], content_type: &str) -> String {
    format!(
        "{}{}{}",
        data_url_header(content_type),
        DATA_URL_DELIMITER,
        STANDARD.encode(bytes)
    )
}

/// Return only the payload after the data URL delimiter.
pub fn payload_segment(data_url: &str) -> Option<&str> {
    data_url
        .split_once(DATA_URL_DELIMITER)
        .map(|(_, payload)| payload)
}

/// Read `file` fully and encode it for the extraction request.
///
/// Read failures propagate; nothing is cached between attempts.
pub async fn encode_document(file: &SelectedFile) -> Result<EncodedDocument, BoletimError> {
    let bytes = tokio::fs::read(file.path())
        .await
        .map_err(|e| BoletimError::from_io(file.path(), e))?;

    let data_url = to_data_url(&bytes, file.content_type());
    let data = payload_segment(&data_url)
        .ok_or_else(|| BoletimError::Internal("data URL has no payload segment".into()))?
        .to_string();
    debug!(
        "Encoded {} ({} bytes) to {} bytes base64",
        file.name(),
        bytes.len(),
        data.len()
    );

    Ok(EncodedDocument {
        data,
        content_type: file.content_type().to_string(),
    })
}

/// Temporary on-disk copy of the selected document for display.
///
/// Created when a file is selected and deleted when dropped, which the flow
/// does whenever the selection is replaced, retaken or reset.
#[derive(Debug)]
pub struct Preview {
    file: NamedTempFile,
}

impl Preview {
    /// Copy `selected` into a fresh temporary file with a matching extension.
    pub fn create(selected: &SelectedFile) -> Result<Self, BoletimError> {
        let suffix = extension_for(selected.content_type())
            .map(|ext| format!(".{ext}"))
            .unwrap_or_default();
        let file = tempfile::Builder::new()
            .prefix("boletim-preview-")
            .suffix(&suffix)
            .tempfile()
            .map_err(|e| BoletimError::Internal(format!("preview tempfile: {e}")))?;
        std::fs::copy(selected.path(), file.path())
            .map_err(|e| BoletimError::from_io(selected.path(), e))?;
        debug!("Preview for {} at {}", selected.name(), file.path().display());
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    if content_type.eq_ignore_ascii_case(crate::pipeline::input::PDF_CONTENT_TYPE) {
        return Some("pdf");
    }
    image::ImageFormat::from_mime_type(content_type)
        .and_then(|f| f.extensions_str().first().copied())
}
