//! Data models

mod request;
mod worker;

pub use request::*;
pub use worker::*;
