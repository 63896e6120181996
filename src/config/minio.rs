use serde::Deserialize;
use aws_sdk_s3::{config::Builder as S3ConfigBuilder, Client as S3Client};
use aws_config::Region;
use aws_sdk_s3::config::{Credentials, SharedCredentialsProvider};
use secrecy::{ExposeSecret, SecretString};

#[derive(Debug, Deserialize, Clone)]
pub struct MinIOSettings {
    pub endpoint: String,
    /// Browser-reachable endpoint used when signing upload/download URLs
    #[serde(default)]
    pub external_endpoint: Option<String>,
    pub access_key: SecretString,
    pub secret_key: SecretString,
    pub bucket_name: String,
    pub region: String,
}

impl MinIOSettings {
    pub fn presigned_url_endpoint(&self) -> &str {
        self.external_endpoint.as_deref().unwrap_or(&self.endpoint)
    }

    fn build_client(&self, endpoint: &str) -> S3Client {
        let creds = Credentials::new(
            self.access_key.expose_secret(),
            self.secret_key.expose_secret(),
            None,
            None,
            "smoras-minio",
        );

        let config = S3ConfigBuilder::new()
            .endpoint_url(endpoint)
            .credentials_provider(SharedCredentialsProvider::new(creds))
            .region(Region::new(self.region.clone()))
            .force_path_style(true) // MinIO serves buckets by path
            .behavior_version_latest()
            .build();

        S3Client::from_conf(config)
    }

    /// Client used for server-side object access.
    pub fn create_internal_s3_client(&self) -> S3Client {
        self.build_client(&self.endpoint)
    }

    /// Client used only for signing URLs handed to browsers.
    pub fn create_presigning_s3_client(&self) -> S3Client {
        self.build_client(self.presigned_url_endpoint())
    }
}
