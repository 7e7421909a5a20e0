//! Web API module for the demo wallet
//!
//! JSON endpoints for the wallet registry, chain operations and price data.

pub mod error;
pub mod routes;
pub mod server;

pub use error::{ApiError, ApiResult, ErrorResponse};
pub use server::{create_app, AppState};
