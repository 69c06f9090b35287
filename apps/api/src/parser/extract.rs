//! Text extraction from uploaded resume files. PDF and plain text are the
//! only supported formats; everything else is rejected up front.

use crate::errors::AppError;

pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

pub fn ensure_within_limit(len: usize) -> Result<(), AppError> {
    if len > MAX_UPLOAD_BYTES {
        return Err(AppError::Validation(
            "Resume file exceeds the 5 MB limit".to_string(),
        ));
    }
    Ok(())
}

/// Pulls the text out of an uploaded resume. The content type may carry
/// parameters (`text/plain; charset=utf-8`); only the base type matters.
pub fn extract_text(content_type: &str, data: &[u8]) -> Result<String, AppError> {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    let text = match mime.as_str() {
        "application/pdf" => pdf_extract::extract_text_from_mem(data).map_err(|_| {
            AppError::Validation(
                "Could not extract text from the PDF. The file may be a scanned image, \
                 corrupted, or password-protected"
                    .to_string(),
            )
        })?,
        "text/plain" => String::from_utf8_lossy(data).into_owned(),
        other => {
            return Err(AppError::Validation(format!(
                "Unsupported file format '{other}'. Upload a PDF or plain-text resume"
            )))
        }
    };

    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::Validation(
            "No text could be extracted from the file. The resume may be a scanned image, \
             corrupted, or in an unsupported format"
                .to_string(),
        ));
    }

    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_passes_through() {
        let text = extract_text("text/plain", b"Asha Rao\nSoftware Engineer").unwrap();
        assert_eq!(text, "Asha Rao\nSoftware Engineer");
    }

    #[test]
    fn charset_parameter_is_ignored() {
        let text = extract_text("text/plain; charset=utf-8", b"hello").unwrap();
        assert_eq!(text, "hello");
    }

    #[test]
    fn unsupported_format_rejected() {
        let err = extract_text("image/png", b"\x89PNG").unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("Unsupported file format")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn blank_document_rejected() {
        let err = extract_text("text/plain", b"   \n\t  ").unwrap_err();
        match err {
            AppError::Validation(msg) => assert!(msg.contains("scanned image")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn size_limit_boundary() {
        assert!(ensure_within_limit(MAX_UPLOAD_BYTES).is_ok());
        assert!(ensure_within_limit(MAX_UPLOAD_BYTES + 1).is_err());
    }
}
