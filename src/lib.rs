pub mod agents;
pub mod client;
pub mod config;
pub mod domains;
pub mod error;
pub mod interfaces;
pub mod providers;
pub mod services;
pub mod store;
pub mod web;

pub use crate::client::Lumira;
pub use crate::config::Config;
pub use crate::error::{LumiraError, Result};
pub use crate::services::assistant::Assistant;
