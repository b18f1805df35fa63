//! HTTP API: auth callback redirect plus profile, game, statistics,
//! settings and ranking endpoints.

mod error;
mod extract;
mod handlers;
mod router;
mod state;

pub use error::{ApiError, AppError};
pub use handlers::{CallbackQuery, SubmitGameRequest};
pub use router::create_router;
pub use state::AppState;
