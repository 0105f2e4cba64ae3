pub mod auth;
pub mod cloudinary;
pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod query;
pub mod routes;
pub mod state;
pub mod stats;
pub mod users;
pub mod validation;
