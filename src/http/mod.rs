//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound (client.rs):
//!     options → build request (Content-Type, GNAP token)
//!     → signer.rs (optional signing, body restored afterwards)
//!     → reqwest::Client → response.rs (200 → Response, else errMessage / status line)
//!
//! Inbound (server.rs):
//!     ResolvedConfig + providers → AppState → Axum router → Server::listen_and_serve
//! ```

pub mod client;
pub mod response;
pub mod server;
pub mod signer;

pub use client::{
    do_request, with_body, with_cancellation, with_gnap_token, with_http_client, with_method,
    with_signer, with_timeout, RequestError, RequestOpt, RequestOptions,
};
pub use response::Response;
pub use server::{build_router, AppState, HttpServer, Server, ServerError};
pub use signer::{RequestSigner, SignError};
