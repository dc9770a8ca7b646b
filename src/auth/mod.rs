use axum::Router;

use crate::state::AppState;

mod dto;
pub(crate) mod extractors;
pub mod handlers;
mod jwt;
mod password;
pub mod repo;
mod repo_types;
pub mod services;

pub use dto::PublicUser;
pub use extractors::AuthUser;
pub use repo_types::User;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
