pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use models::{SubmitScoreRequest, SubmitScoreResponse};
pub use service::ScoreService;
