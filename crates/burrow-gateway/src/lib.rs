//! HTTP gateway for the Burrow URL shortener.
//!
//! The gateway is a thin axum layer over a
//! [`Shortener`](burrow_core::Shortener): it reads the caller's identity from
//! a cookie, decodes request bodies, and maps service outcomes to status
//! codes. Backend wiring lives in [`storage`].

pub mod app;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod model;
pub mod state;
pub mod storage;

pub use app::App;
pub use error::AppError;
pub use state::AppState;
