pub mod api;
pub mod config;
pub mod course;
pub mod error;
pub mod generator;
pub mod progress;
pub mod store;
pub mod user;
pub mod utils;
