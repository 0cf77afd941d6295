//! KSYK Network Library
//!
//! REST surface of the campus map and the clients that talk to it.
//!
//! # Architecture
//!
//! - **Server**: axum router over a shared SQLite [`Database`](ksyk_core::Database)
//! - **Client**: typed reqwest client carrying the admin session cookie
//! - **Offline**: response cache with per-route strategies and a background sync queue
//!
//! # Usage
//!
//! ```ignore
//! let state = AppState::new(db, config);
//! let listener = bind("127.0.0.1:8080").await?;
//! serve(listener, state, shutdown_signal()).await?;
//!
//! let client = ApiClient::new("http://127.0.0.1:8080")?;
//! client.login("admin", "secret").await?;
//! let buildings = client.list::<Building>().await?;
//! ```

pub mod client;
pub mod error;
mod handlers;
pub mod offline;
pub mod protocol;
pub mod response;
pub mod server;
pub mod session;

pub use client::ApiClient;
pub use error::{Error, Result};
pub use offline::{
    FetchOutcome, FetchedResponse, Fetcher, OfflineClient, Source, Strategy, SyncReport,
};
pub use protocol::ApiResource;
pub use response::ApiError;
pub use server::{bind, router, serve, AppState};
