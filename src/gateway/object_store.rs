//! Thin capability wrapper over the blob store.
//!
//! The orchestrator only ever talks to [`ObjectStoreGateway`]; the S3-backed
//! implementation lives here too. Every call is single-attempt — presigned
//! URLs and multipart handles are safe for the client to redo, so retry
//! policy stays with the caller.

use std::{collections::HashMap, time::Duration};

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client as S3Client,
    config::Region,
    presigning::PresigningConfig,
    primitives::ByteStream,
    types::{CompletedMultipartUpload, CompletedPart},
};
use bytes::Bytes;
use thiserror::Error;
use tracing::debug;

use crate::models::upload::PartETag;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("presign failed: {0}")]
    Presign(String),
    #[error("multipart operation failed: {0}")]
    Multipart(String),
    #[error("object operation failed: {0}")]
    Object(String),
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Object store operations the upload orchestrator depends on.
///
/// `parts` handed to `complete_multipart_upload` must already be sorted
/// ascending by part number; the store rejects out-of-order part lists.
#[async_trait]
pub trait ObjectStoreGateway: Send + Sync {
    /// Open a multipart upload and return its opaque upload id.
    async fn create_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        metadata: &HashMap<String, String>,
    ) -> GatewayResult<String>;

    /// Presign the PUT for one part (1-based part numbers).
    async fn presign_upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        expires_in: Duration,
    ) -> GatewayResult<String>;

    /// Stitch uploaded parts into the final object. Returns the location URL
    /// when the store reports one.
    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[PartETag],
    ) -> GatewayResult<Option<String>>;

    /// Abort an in-flight multipart upload and discard its parts.
    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> GatewayResult<()>;

    /// Presign a single-shot object PUT.
    async fn presign_put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> GatewayResult<String>;

    /// Presign an object GET for download.
    async fn presign_get_object(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> GatewayResult<String>;

    /// Upload a small payload directly through the server.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: Bytes,
    ) -> GatewayResult<()>;

    /// Delete an object.
    async fn delete_object(&self, bucket: &str, key: &str) -> GatewayResult<()>;
}

/// AWS S3 implementation, using the SDK client for both data calls and
/// presigning.
pub struct S3Gateway {
    client: S3Client,
}

impl S3Gateway {
    /// Build a gateway from ambient AWS credentials plus an explicit region.
    pub async fn new(region: &str) -> Self {
        let aws_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        let client = S3Client::new(&aws_config);

        debug!(region = %region, "created S3 gateway");

        Self { client }
    }

    fn presign_config(expires_in: Duration) -> GatewayResult<PresigningConfig> {
        PresigningConfig::expires_in(expires_in)
            .map_err(|e| GatewayError::Presign(format!("invalid expiry: {}", e)))
    }
}

#[async_trait]
impl ObjectStoreGateway for S3Gateway {
    async fn create_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        metadata: &HashMap<String, String>,
    ) -> GatewayResult<String> {
        let output = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .set_metadata(Some(metadata.clone()))
            .send()
            .await
            .map_err(|e| GatewayError::Multipart(format!("create failed: {}", e)))?;

        output
            .upload_id()
            .map(str::to_string)
            .ok_or_else(|| GatewayError::Multipart("no upload id returned".to_string()))
    }

    async fn presign_upload_part(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        part_number: i32,
        expires_in: Duration,
    ) -> GatewayResult<String> {
        let presigned = self
            .client
            .upload_part()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .part_number(part_number)
            .presigned(Self::presign_config(expires_in)?)
            .await
            .map_err(|e| GatewayError::Presign(format!("upload part: {}", e)))?;

        Ok(presigned.uri().to_string())
    }

    async fn complete_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        parts: &[PartETag],
    ) -> GatewayResult<Option<String>> {
        let completed: Vec<CompletedPart> = parts
            .iter()
            .map(|part| {
                CompletedPart::builder()
                    .e_tag(&part.e_tag)
                    .part_number(part.part_number)
                    .build()
            })
            .collect();

        let multipart_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(completed))
            .build();

        let output = self
            .client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(multipart_upload)
            .send()
            .await
            .map_err(|e| GatewayError::Multipart(format!("complete failed: {}", e)))?;

        Ok(output.location().map(str::to_string))
    }

    async fn abort_multipart_upload(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
    ) -> GatewayResult<()> {
        self.client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
            .map_err(|e| GatewayError::Multipart(format!("abort failed: {}", e)))?;

        Ok(())
    }

    async fn presign_put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> GatewayResult<String> {
        let presigned = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .presigned(Self::presign_config(expires_in)?)
            .await
            .map_err(|e| GatewayError::Presign(format!("put object: {}", e)))?;

        Ok(presigned.uri().to_string())
    }

    async fn presign_get_object(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> GatewayResult<String> {
        let presigned = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(Self::presign_config(expires_in)?)
            .await
            .map_err(|e| GatewayError::Presign(format!("get object: {}", e)))?;

        Ok(presigned.uri().to_string())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content_type: &str,
        body: Bytes,
    ) -> GatewayResult<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| GatewayError::Object(format!("put failed: {}", e)))?;

        Ok(())
    }

    async fn delete_object(&self, bucket: &str, key: &str) -> GatewayResult<()> {
        self.client
            .delete_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| GatewayError::Object(format!("delete failed: {}", e)))?;

        Ok(())
    }
}
