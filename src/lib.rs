pub mod api;
pub mod cli;
pub mod common;
pub mod config;
pub mod media;
pub mod models;
pub mod store;
pub mod utils;
pub mod validate;
