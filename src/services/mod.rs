pub mod minio_service;
pub mod scheduler;

pub use minio_service::MinIOService;
pub use scheduler::SchedulerService;
