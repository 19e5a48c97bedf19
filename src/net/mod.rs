//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Start-up:
//!     tls-cacerts paths → tls.rs (PEM bundles → DER certs) → ResolvedConfig
//!
//! Serving:
//!     tls-serve-cert + tls-serve-key → tls.rs (RustlsConfig) → HTTPS listener
//! ```
//!
//! # Design Decisions
//! - TLS is optional; without a serve cert/key the listener speaks plain HTTP
//! - Failures name the offending file

pub mod tls;
