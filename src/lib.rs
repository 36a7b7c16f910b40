// Library crate for the Cortexbench gameplay server
// This file exposes the public API for integration tests

pub mod auth;
pub mod badges;
pub mod calendar;
pub mod games;
pub mod leaderboard;
pub mod population;
pub mod scores;
pub mod shared;
pub mod storage;
pub mod streak;

// Re-export commonly used types for easier access in tests
pub use badges::BadgeCatalog;
pub use games::{GameCatalog, ScoreDirection};
pub use scores::{ScoreService, SubmitScoreRequest, SubmitScoreResponse};
pub use shared::{AppError, AppState};
pub use storage::MemoryBackend;
