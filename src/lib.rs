pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod store;

pub use config::Config;
pub use error::{Result, ServiceError};
pub use models::{RankEntry, RankedCustomer};
pub use store::RankStore;
