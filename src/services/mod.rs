pub mod http_client;
pub mod task_service;

pub use http_client::HttpTaskService;
pub use task_service::{TaskService, UploadedPhoto};
