pub mod api;
pub mod capture;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod flow;
pub mod home;
pub mod logging;
pub mod models;
pub mod stats;
pub mod tui;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use config::Config;
pub use utils::Profile;
