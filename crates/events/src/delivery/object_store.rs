//! Result archiving to S3-compatible object storage.
//!
//! [`ObjectStoreSink::connect`] builds a client from static credentials and
//! makes sure the bucket exists before the sink is handed out. Each report is
//! uploaded as a publicly readable `text/plain` object whose URL becomes the
//! artifact URL of the dispatch.

use aws_credential_types::Credentials;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketCannedAcl, BucketLocationConstraint, CreateBucketConfiguration, ObjectCannedAcl,
};
use chrono::{DateTime, Utc};
use githook_core::config::{AwsConfig, DEFAULT_AWS_REGION};
use uuid::Uuid;

use crate::report::render_summary;
use crate::sink::{JobReport, LogSink, SinkError, SinkKind};

/// Provider name attached to the static credentials.
const CREDENTIALS_PROVIDER: &str = "githook-config";

const CONTENT_TYPE: &str = "text/plain";

/// Archives build reports in a bucket.
#[derive(Debug, Clone)]
pub struct ObjectStoreSink {
    client: aws_sdk_s3::Client,
    bucket: String,
    region: String,
    endpoint: Option<String>,
}

impl ObjectStoreSink {
    /// Create a client for `config` and ensure its bucket exists.
    ///
    /// The caller decides what a failure means; the coordinator drops the
    /// sink for the current dispatch.
    pub async fn connect(config: &AwsConfig) -> Result<Self, SinkError> {
        let region = config.region_or_default().to_string();
        let endpoint = Some(config.endpoint.trim_end_matches('/').to_string())
            .filter(|e| !e.is_empty());

        let credentials = Credentials::new(
            config.access.clone(),
            config.secret.clone(),
            None,
            None,
            CREDENTIALS_PROVIDER,
        );

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new(region.clone()))
            .credentials_provider(credentials);
        if let Some(endpoint) = &endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }
        let sdk_config = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(endpoint.is_some())
            .build();

        let sink = Self {
            client: aws_sdk_s3::Client::from_conf(s3_config),
            bucket: config.bucket.clone(),
            region,
            endpoint,
        };
        sink.ensure_bucket(&config.acl).await?;
        Ok(sink)
    }

    /// Create the bucket unless it already exists.
    async fn ensure_bucket(&self, acl: &str) -> Result<(), SinkError> {
        let head = self.client.head_bucket().bucket(&self.bucket).send().await;
        let err = match head {
            Ok(_) => return Ok(()),
            Err(err) => err,
        };

        let missing = err
            .as_service_error()
            .is_some_and(|service_err| service_err.is_not_found());
        if !missing {
            return Err(SinkError::ObjectStore(format!(
                "unable to check bucket {}: {}",
                self.bucket,
                DisplayErrorContext(&err)
            )));
        }

        let mut request = self.client.create_bucket().bucket(&self.bucket);
        if !acl.is_empty() {
            request = request.acl(BucketCannedAcl::from(acl));
        }
        if self.region != DEFAULT_AWS_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(self.region.as_str()))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => {
                tracing::info!(bucket = %self.bucket, region = %self.region, "Created log bucket");
                Ok(())
            }
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|service_err| service_err.is_bucket_already_owned_by_you()) =>
            {
                Ok(())
            }
            Err(err) => Err(SinkError::ObjectStore(format!(
                "unable to create bucket {}: {}",
                self.bucket,
                DisplayErrorContext(&err)
            ))),
        }
    }
}

#[async_trait::async_trait]
impl LogSink for ObjectStoreSink {
    fn name(&self) -> &'static str {
        "s3"
    }

    fn kind(&self) -> SinkKind {
        SinkKind::Archive
    }

    async fn log(&self, report: &JobReport<'_>) -> Result<Option<String>, SinkError> {
        let key = object_key(&report.result.job_label, report.result.started_at, Uuid::new_v4());
        let body = render_summary(report.result);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body.into_bytes()))
            .content_type(CONTENT_TYPE)
            .acl(ObjectCannedAcl::PublicRead)
            .send()
            .await
            .map_err(|err| {
                SinkError::ObjectStore(format!(
                    "unable to upload {key}: {}",
                    DisplayErrorContext(&err)
                ))
            })?;

        let url = object_url(self.endpoint.as_deref(), &self.bucket, &self.region, &key);
        tracing::info!(bucket = %self.bucket, key = %key, "Build report archived");
        Ok(Some(url))
    }
}

/// `<label>/<UTC timestamp>-<id>.log`
pub fn object_key(label: &str, started_at: DateTime<Utc>, id: Uuid) -> String {
    format!("{label}/{}-{id}.log", started_at.format("%Y%m%dT%H%M%SZ"))
}

/// Public retrieval URL for `key`, with each path segment percent-encoded.
///
/// Custom endpoints use path-style addressing; AWS uses virtual-hosted style.
pub fn object_url(endpoint: Option<&str>, bucket: &str, region: &str, key: &str) -> String {
    let key = key
        .split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/");
    match endpoint {
        Some(endpoint) => format!("{endpoint}/{bucket}/{key}"),
        None if region == DEFAULT_AWS_REGION => format!("https://{bucket}.s3.amazonaws.com/{key}"),
        None => format!("https://{bucket}.s3.{region}.amazonaws.com/{key}"),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn key_contains_label_timestamp_and_id() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let id = Uuid::nil();
        assert_eq!(
            object_key("repo1", at, id),
            "repo1/20240309T140507Z-00000000-0000-0000-0000-000000000000.log"
        );
    }

    #[test]
    fn keys_are_unique_per_upload() {
        let at = Utc::now();
        assert_ne!(
            object_key("repo1", at, Uuid::new_v4()),
            object_key("repo1", at, Uuid::new_v4())
        );
    }

    #[test]
    fn url_for_default_region() {
        assert_eq!(
            object_url(None, "logs", "us-east-1", "repo1/a.log"),
            "https://logs.s3.amazonaws.com/repo1/a.log"
        );
    }

    #[test]
    fn url_for_other_region() {
        assert_eq!(
            object_url(None, "logs", "eu-west-1", "repo1/a.log"),
            "https://logs.s3.eu-west-1.amazonaws.com/repo1/a.log"
        );
    }

    #[test]
    fn url_for_custom_endpoint() {
        assert_eq!(
            object_url(Some("http://minio:9000"), "logs", "us-east-1", "repo1/a.log"),
            "http://minio:9000/logs/repo1/a.log"
        );
    }

    #[test]
    fn url_escapes_unsafe_repository_names() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        let key = object_key("my repo#1?", at, Uuid::nil());
        assert_eq!(
            object_url(None, "logs", "us-east-1", &key),
            "https://logs.s3.amazonaws.com/my%20repo%231%3F/\
             20240309T140507Z-00000000-0000-0000-0000-000000000000.log"
        );
    }
}
