pub mod cache;
pub mod client;
pub mod config;
pub mod db;
pub mod errors;
pub mod llm_client;
pub mod models;
pub mod proxy;
pub mod routes;
pub mod state;
pub mod tools;
pub mod usage;
