//! Pluggable request signing.

use reqwest::Request;

/// Error returned by a signer.
pub type SignError = Box<dyn std::error::Error + Send + Sync>;

/// Adds authentication material to an outgoing request.
///
/// Signers may take the request body while computing a digest; the client
/// restores the original bytes after `sign` returns.
pub trait RequestSigner: Send + Sync {
    fn sign(&self, req: &mut Request) -> Result<(), SignError>;
}

impl<F> RequestSigner for F
where
    F: Fn(&mut Request) -> Result<(), SignError> + Send + Sync,
{
    fn sign(&self, req: &mut Request) -> Result<(), SignError> {
        self(req)
    }
}
