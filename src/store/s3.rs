//! Anonymous S3 client for public buckets, built on `aws-sdk-s3`.
//!
//! Listing drives the `ListObjectsV2` paginator one page per stream item;
//! objects are fetched with `GetObject` and their body streamed to disk
//! chunk by chunk. Requests are unsigned and never retried.

use std::path::Path;

use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::Client;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
use futures::StreamExt;
use futures::stream;
use tokio::io::AsyncWriteExt;

use super::{KeyPages, ObjectStore};
use crate::config::StoreConfig;
use crate::error::{Error, GetObjectSdkError, Result, StoreError, StoreResult};

/// Production [`ObjectStore`] backed by S3 or an S3-compatible endpoint.
#[derive(Clone, Debug)]
pub struct S3Store {
    client: Client,
    bucket: String,
    page_size: i32,
}

impl S3Store {
    /// Build an anonymous client for the configured bucket.
    ///
    /// Without an endpoint the bucket is addressed virtual-hosted style on
    /// AWS; with one it is addressed path-style (`<endpoint>/<bucket>/<key>`).
    ///
    /// # Arguments
    ///
    /// * `config` - Bucket, region, optional endpoint, page size and connect timeout
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the page size does not fit a `max-keys` value.
    pub async fn new(config: &StoreConfig) -> Result<Self> {
        let page_size = i32::try_from(config.page_size).map_err(|_| Error::Config {
            message: format!("page size {} is too large", config.page_size),
            key: Some("store.page_size".to_string()),
        })?;

        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .no_credentials()
            .retry_config(RetryConfig::disabled())
            .timeout_config(
                TimeoutConfig::builder()
                    .connect_timeout(config.connect_timeout)
                    .build(),
            );
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let shared = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.endpoint.is_some())
            .build();

        tracing::debug!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = ?config.endpoint,
            "S3 store configured"
        );

        Ok(Self {
            client: Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            page_size,
        })
    }

    /// Name of the bucket this store reads from
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

fn page_keys(output: &ListObjectsV2Output) -> Vec<String> {
    output
        .contents()
        .iter()
        .filter_map(|object| object.key().map(str::to_owned))
        .collect()
}

fn get_object_error(key: &str, err: GetObjectSdkError) -> StoreError {
    let missing = err
        .as_service_error()
        .is_some_and(GetObjectError::is_no_such_key)
        || err
            .raw_response()
            .is_some_and(|response| response.status().as_u16() == 404);
    if missing {
        StoreError::NotFound(key.to_string())
    } else {
        StoreError::GetObject(Box::new(err))
    }
}

fn write_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[async_trait::async_trait]
impl ObjectStore for S3Store {
    fn list_pages<'a>(&'a self, prefix: &'a str) -> KeyPages<'a> {
        let pages = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .into_paginator()
            .page_size(self.page_size)
            .send();

        stream::unfold(pages, |mut pages| async move {
            let page = pages
                .next()
                .await?
                .map(|output| page_keys(&output))
                .map_err(|e| StoreError::ListObjects(Box::new(e)));
            Some((page, pages))
        })
        .boxed()
    }

    async fn exists(&self, prefix: &str) -> StoreResult<bool> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .max_keys(1)
            .send()
            .await
            .map_err(|e| StoreError::ListObjects(Box::new(e)))?;
        Ok(!output.contents().is_empty())
    }

    async fn fetch(&self, key: &str, dest: &Path) -> StoreResult<()> {
        let mut output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| get_object_error(key, e))?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|e| write_error(dest, e))?;
        while let Some(chunk) = output.body.try_next().await? {
            file.write_all(&chunk)
                .await
                .map_err(|e| write_error(dest, e))?;
        }
        file.flush().await.map_err(|e| write_error(dest, e))?;
        Ok(())
    }
}
