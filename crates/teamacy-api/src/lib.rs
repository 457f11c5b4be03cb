pub mod auth;
pub mod bootstrap;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod password;
pub mod state;
pub mod token;
pub mod validate;

pub use error::ApiError;
pub use state::{AppState, AppStateInner};
