use crate::error::MindmapError;
use crate::pipeline::input::SourceDocument;
use axum::extract::Multipart;

/// Name of the multipart field carrying the PDF.
pub const UPLOAD_FIELD: &str = "pdf";

/// Why an upload could not be turned into a [`SourceDocument`].
#[derive(Debug)]
pub enum UploadError {
    /// The multipart body itself was unreadable or had no file.
    BadForm(String),
    /// A file arrived but was rejected by intake.
    Rejected(MindmapError),
}

impl std::fmt::Display for UploadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UploadError::BadForm(msg) => f.write_str(msg),
            UploadError::Rejected(e) => write!(f, "{e}"),
        }
    }
}

/// Read the `pdf` field of a multipart upload.
///
/// Other fields are drained and ignored. The first `pdf` field wins.
pub async fn parse_multipart(mut multipart: Multipart) -> Result<SourceDocument, UploadError> {
    let mut document: Option<SourceDocument> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::BadForm(format!("Failed to read form field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == UPLOAD_FIELD && document.is_none() {
            let filename = field.file_name().map(str::to_string);
            let content_type = field.content_type().map(str::to_string);
            let data = field
                .bytes()
                .await
                .map_err(|e| UploadError::BadForm(format!("Failed to read file data: {}", e)))?
                .to_vec();

            if data.is_empty() && filename.as_deref().unwrap_or("").is_empty() {
                // Browsers send an empty part when no file was chosen.
                continue;
            }

            let doc = SourceDocument::from_upload(filename.as_deref(), content_type.as_deref(), data)
                .map_err(UploadError::Rejected)?;
            document = Some(doc);
        } else {
            let _ = field.bytes().await;
        }
    }

    document.ok_or_else(|| UploadError::BadForm("No PDF file uploaded".to_string()))
}
