//! HTTP API for remote worker control

mod server;
mod handlers;
mod types;

pub use handlers::{AppContext, AppState};
pub use server::{router, Server};
pub use types::*;
