pub mod data_fetcher;
pub mod goal_model;
pub mod odds_fetcher;
pub mod predictor;
pub mod team_resolver;

pub use data_fetcher::*;
pub use goal_model::*;
pub use odds_fetcher::*;
pub use predictor::*;
pub use team_resolver::*;
