pub mod api;
pub mod config;
pub mod data_api;
pub mod dates;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod state;
