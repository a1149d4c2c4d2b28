pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod realtime;
pub mod reminders;
pub mod repos;
pub mod routes;
pub mod state;
pub mod uploads;
pub mod utils;

pub use state::AppState;
