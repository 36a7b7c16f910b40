pub mod handlers;
pub mod models;
pub mod repository;
pub mod service;

pub use models::{GamePopulationSummary, PopulationAggregateRow};
pub use repository::PopulationRepository;
pub use service::PopulationService;
