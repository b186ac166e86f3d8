use crate::state::AppState;
use axum::Router;

mod dto;
mod error;
pub mod handlers;
pub mod jwt;
pub mod otp;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod service;

pub fn router() -> Router<AppState> {
    handlers::auth_routes()
}
