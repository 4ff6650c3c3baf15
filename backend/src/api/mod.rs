//! HTTP API module.
//!
//! JSON handlers, server-rendered pages, the SSE activity log and the router
//! that ties them to the shared [`AppState`].

pub mod filters;
pub mod handlers;
pub mod logs;
pub mod pages;
pub mod server;
pub mod state;
pub mod types;

pub use logs::*;
pub use server::{router, start_server};
pub use state::AppState;
pub use types::*;
