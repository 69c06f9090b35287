//! Object storage for uploaded resume files.

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

/// Keeps object keys predictable: anything outside `[A-Za-z0-9.-_]`
/// becomes a dash.
fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

fn object_key(student_id: Uuid, upload_id: Uuid, file_name: &str) -> String {
    format!(
        "resumes/{student_id}/{upload_id}-{}",
        sanitize_file_name(file_name)
    )
}

/// Uploads an original resume file and returns its object key. Keys are
/// namespaced per student so one student's uploads are a prefix scan.
pub async fn upload_resume_file(
    s3: &S3Client,
    bucket: &str,
    student_id: Uuid,
    file_name: &str,
    content_type: &str,
    bytes: Bytes,
) -> Result<String, AppError> {
    let key = object_key(student_id, Uuid::new_v4(), file_name);

    s3.put_object()
        .bucket(bucket)
        .key(&key)
        .body(ByteStream::from(bytes))
        .content_type(content_type)
        .send()
        .await
        .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

    info!("Uploaded resume file to s3://{bucket}/{key}");
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_replaces_unsafe_characters() {
        assert_eq!(
            sanitize_file_name("my resume (final).pdf"),
            "my-resume--final-.pdf"
        );
        assert_eq!(sanitize_file_name("../../etc/passwd"), "..-..-etc-passwd");
        assert_eq!(sanitize_file_name("plain_name.txt"), "plain_name.txt");
    }

    #[test]
    fn test_object_key_is_namespaced_per_student() {
        let student_id = Uuid::new_v4();
        let upload_id = Uuid::new_v4();
        let key = object_key(student_id, upload_id, "cv.pdf");
        assert_eq!(key, format!("resumes/{student_id}/{upload_id}-cv.pdf"));
    }
}
