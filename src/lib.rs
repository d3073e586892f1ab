pub mod analytics;
pub mod config;
pub mod error;
pub mod history;
pub mod insights;
pub mod logging;
pub mod price;
pub mod record;
pub mod server;
pub mod state;
pub mod stats;
pub mod store;
