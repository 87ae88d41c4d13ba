//! S3 object store backend.
//!
//! Works against AWS S3 and S3-compatible services (MinIO, Ceph RGW, R2)
//! via endpoint override and path-style addressing.

use crate::error::{StoreError, StoreResult};
use crate::store::{ListPage, ObjectStat, ObjectStore};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use chrono::DateTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// S3 rejects delete batches larger than this.
const DELETE_BATCH_SIZE: usize = 1000;

/// Configuration for the S3 backend.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3Config {
    /// Bucket holding all objects.
    pub bucket: String,
    /// Region override. Falls back to the ambient AWS environment when `None`.
    pub region: Option<String>,
    /// Endpoint override for S3-compatible services.
    pub endpoint_url: Option<String>,
    /// Use path-style addressing. Most S3-compatible services require it.
    pub force_path_style: bool,
}

/// S3 [`ObjectStore`] implementation.
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Creates a store from an existing client and bucket.
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    /// Builds a store from the ambient AWS environment (credentials chain,
    /// profile, env vars) plus the overrides in `config`.
    pub async fn connect(config: S3Config) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = config.region.clone() {
            loader = loader.region(Region::new(region));
        }
        let shared = loader.load().await;

        let mut builder =
            aws_sdk_s3::config::Builder::from(&shared).force_path_style(config.force_path_style);
        if let Some(endpoint) = config.endpoint_url.clone() {
            builder = builder.endpoint_url(endpoint);
        }

        Self::new(Client::from_conf(builder.build()), config.bucket)
    }

    /// Returns the bucket this store operates on.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn backend_err(op: &str, key: &str, err: impl std::error::Error) -> StoreError {
    StoreError::Backend(format!("{op} {key}: {}", DisplayErrorContext(&err)))
}

#[async_trait]
impl ObjectStore for S3Store {
    fn backend_name(&self) -> &'static str {
        "s3"
    }

    async fn exists(&self, key: &str) -> StoreResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().map_or(false, |e| e.is_not_found()) => Ok(false),
            Err(err) => Err(backend_err("head", key, err)),
        }
    }

    async fn put_object(&self, key: &str, body: &[u8]) -> StoreResult<()> {
        debug!(key, bytes = body.len(), "putting object");
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body.to_vec()))
            .send()
            .await
            .map_err(|err| backend_err("put", key, err))?;
        Ok(())
    }

    async fn put_object_if_absent(&self, key: &str, body: &[u8]) -> StoreResult<bool> {
        match self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .if_none_match("*")
            .body(ByteStream::from(body.to_vec()))
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) => {
                // 412: the key already exists. 409: we lost a concurrent
                // conditional write for the same key.
                let status = err.raw_response().map(|r| r.status().as_u16());
                if matches!(status, Some(412) | Some(409)) {
                    Ok(false)
                } else {
                    Err(backend_err("put-if-absent", key, err))
                }
            }
        }
    }

    async fn get_object(&self, key: &str) -> StoreResult<Vec<u8>> {
        let resp = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(err) if err.as_service_error().map_or(false, |e| e.is_no_such_key()) => {
                return Err(StoreError::NotFound(key.to_string()));
            }
            Err(err) => return Err(backend_err("get", key, err)),
        };

        let bytes = resp
            .body
            .collect()
            .await
            .map_err(|err| backend_err("get", key, err))?;
        Ok(bytes.into_bytes().to_vec())
    }

    async fn list_objects(&self, prefix: &str, token: Option<&str>) -> StoreResult<ListPage> {
        let mut request = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix);
        if let Some(token) = token {
            request = request.continuation_token(token);
        }

        let resp = request
            .send()
            .await
            .map_err(|err| backend_err("list", prefix, err))?;

        let keys = resp
            .contents()
            .iter()
            .filter_map(|o| o.key().map(str::to_string))
            .collect();
        Ok(ListPage {
            keys,
            next_token: resp.next_continuation_token().map(str::to_string),
        })
    }

    async fn delete_objects(&self, keys: &[String]) -> StoreResult<()> {
        for chunk in keys.chunks(DELETE_BATCH_SIZE) {
            let identifiers = chunk
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|err| StoreError::Backend(format!("delete batch: {err}")))?;
            let delete = Delete::builder()
                .set_objects(Some(identifiers))
                .quiet(true)
                .build()
                .map_err(|err| StoreError::Backend(format!("delete batch: {err}")))?;

            debug!(count = chunk.len(), "deleting object batch");
            self.client
                .delete_objects()
                .bucket(&self.bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|err| backend_err("delete", "batch", err))?;
        }
        Ok(())
    }

    async fn stat(&self, key: &str) -> StoreResult<Option<ObjectStat>> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(resp) => {
                let last_modified = resp
                    .last_modified()
                    .and_then(|t| t.to_millis().ok())
                    .and_then(DateTime::from_timestamp_millis);
                Ok(Some(ObjectStat {
                    key: key.to_string(),
                    size: resp.content_length().unwrap_or(0).max(0) as u64,
                    last_modified,
                }))
            }
            Err(err) if err.as_service_error().map_or(false, |e| e.is_not_found()) => Ok(None),
            Err(err) => Err(backend_err("stat", key, err)),
        }
    }
}
