//! Blob storage for face images. The public URL of a stored image is what the face
//! reading flow receives.

pub mod handlers;

use anyhow::Result;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

const FACE_IMAGE_PREFIX: &str = "face-images";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBlob {
    pub url: String,
    pub pathname: String,
    pub content_type: String,
}

fn face_image_key(id: Uuid, extension: &str) -> String {
    format!("{FACE_IMAGE_PREFIX}/{id}.{extension}")
}

fn public_url(base_url: &str, pathname: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), pathname)
}

/// Uploads an already validated image under a fresh key.
pub async fn store_face_image(
    s3: &aws_sdk_s3::Client,
    bucket: &str,
    public_base_url: &str,
    body: Bytes,
    content_type: &str,
    extension: &str,
) -> Result<StoredBlob> {
    let pathname = face_image_key(Uuid::new_v4(), extension);
    let size = body.len();

    s3.put_object()
        .bucket(bucket)
        .key(&pathname)
        .body(ByteStream::from(body))
        .content_type(content_type)
        .send()
        .await
        .map_err(|e| anyhow::anyhow!("S3 upload failed: {e}"))?;

    info!("Uploaded face image to s3://{bucket}/{pathname} ({size} bytes)");

    Ok(StoredBlob {
        url: public_url(public_base_url, &pathname),
        pathname,
        content_type: content_type.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_face_image_key_layout() {
        let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        assert_eq!(
            face_image_key(id, "webp"),
            "face-images/67e55044-10b1-426f-9247-bb680e5fe0c8.webp"
        );
    }

    #[test]
    fn test_public_url_joins_without_double_slash() {
        assert_eq!(
            public_url("https://cdn.example.com/", "face-images/a.jpg"),
            "https://cdn.example.com/face-images/a.jpg"
        );
    }
}
