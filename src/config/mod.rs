pub mod settings;
pub mod jwt;
pub mod minio;
pub mod backup;
