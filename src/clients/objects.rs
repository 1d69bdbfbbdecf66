use anyhow::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client,
    config::{Builder, Region},
    error::DisplayErrorContext,
    primitives::ByteStream,
};
use tracing::{debug, info};

use crate::{clients::ObjectStore, config::Config, error::AppError};

/// Uploads into one S3 bucket. Objects are addressed as `<base url>/<key>`.
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    base_url: String,
}

impl S3ObjectStore {
    /// Credentials come from the standard AWS provider chain.
    pub async fn connect(config: &Config) -> Result<Self, Error> {
        info!(bucket = %config.upload_bucket, "Configuring object store");

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.object_store_region.clone()))
            .load()
            .await;

        let mut builder = Builder::from(&shared);
        if let Some(endpoint) = &config.object_store_endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(Self::from_client(
            Client::from_conf(builder.build()),
            config.upload_bucket.clone(),
            config.upload_base_url(),
        ))
    }

    pub fn from_client(client: Client, bucket: String, base_url: String) -> Self {
        Self {
            client,
            bucket,
            base_url,
        }
    }

    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        body: Vec<u8>,
    ) -> Result<String, AppError> {
        let size = body.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| AppError::TransientService(format!("s3: {}", DisplayErrorContext(&e))))?;

        debug!(bucket = %self.bucket, key, size, "Object stored");

        Ok(self.object_url(key))
    }
}
