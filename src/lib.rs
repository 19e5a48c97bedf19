//! Key management server start-up and authenticated HTTP client.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod providers;

pub use config::{resolve, ResolvedConfig};
pub use http::{do_request, HttpServer, Response};
pub use lifecycle::Shutdown;
