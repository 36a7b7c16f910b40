pub mod handlers;
pub mod repository;
pub mod service;

pub use repository::{LeaderboardEntryRow, LeaderboardRepository};
pub use service::{LeaderboardEntry, LeaderboardPage, LeaderboardService};
