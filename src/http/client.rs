//! Authenticated HTTP request client.
//!
//! # Responsibilities
//! - Build a request from a method, URL and in-memory body
//! - Attach a GNAP token and/or run a pluggable signer
//! - Execute through an injected (or shared default) `reqwest::Client`
//! - Unwrap `errMessage` payloads from non-200 responses
//!
//! # Design Decisions
//! - No retries; every failure is returned to the caller
//! - Options are closures applied in order, last one wins
//! - The body is held in memory so it can be replayed after signing

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use reqwest::header::{HeaderValue, InvalidHeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Body, Client, Method, StatusCode, Url};
use thiserror::Error;

use crate::http::response::{status_line, ErrorResponse, Response};
use crate::http::signer::{RequestSigner, SignError};
use crate::lifecycle::shutdown::ShutdownSignal;
use crate::observability::metrics;

const APPLICATION_JSON: &str = "application/json";
const GNAP_SCHEME: &str = "GNAP";

/// Errors returned by [`do_request`].
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("new request: {0}")]
    NewRequest(#[source] url::ParseError),

    #[error("new request: invalid GNAP token: {0}")]
    InvalidToken(#[source] InvalidHeaderValue),

    #[error("sign http request: {0}")]
    Sign(#[source] SignError),

    #[error("http do: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("http do: request cancelled")]
    Cancelled,

    #[error("read response body: {0}")]
    ReadBody(#[source] reqwest::Error),

    /// Non-200 response carrying an `errMessage`.
    #[error("{message}")]
    Server { status_code: u16, message: String },

    /// Non-200 response without a usable `errMessage`.
    #[error("{status}")]
    Status { status_code: u16, status: String },
}

impl RequestError {
    /// HTTP status code, when the server answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            RequestError::Server { status_code, .. } | RequestError::Status { status_code, .. } => {
                Some(*status_code)
            }
            _ => None,
        }
    }

    fn outcome(&self) -> &'static str {
        match self {
            RequestError::NewRequest(_) | RequestError::InvalidToken(_) => "invalid_request",
            RequestError::Sign(_) => "sign_failed",
            RequestError::Transport(_) | RequestError::ReadBody(_) => "transport_error",
            RequestError::Cancelled => "cancelled",
            RequestError::Server { .. } | RequestError::Status { .. } => "http_error",
        }
    }
}

/// Settings for a single request. Built through [`RequestOpt`]s.
pub struct RequestOptions {
    http_client: Client,
    method: Method,
    body: Vec<u8>,
    gnap_token: Option<String>,
    signer: Option<Arc<dyn RequestSigner>>,
    timeout: Option<Duration>,
    cancellation: Option<ShutdownSignal>,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self {
            http_client: default_client(),
            method: Method::GET,
            body: Vec::new(),
            gnap_token: None,
            signer: None,
            timeout: None,
            cancellation: None,
        }
    }
}

/// Configures request options.
pub type RequestOpt = Box<dyn FnOnce(&mut RequestOptions) + Send>;

fn default_client() -> Client {
    static CLIENT: OnceLock<Client> = OnceLock::new();
    CLIENT.get_or_init(Client::new).clone()
}

/// Use a custom HTTP client (TLS roots, proxies, pooling).
pub fn with_http_client(client: Client) -> RequestOpt {
    Box::new(move |o| o.http_client = client)
}

/// HTTP method. Default is GET.
pub fn with_method(method: Method) -> RequestOpt {
    Box::new(move |o| o.method = method)
}

/// Request body. Default is empty.
pub fn with_body(body: impl Into<Vec<u8>>) -> RequestOpt {
    let body = body.into();
    Box::new(move |o| o.body = body)
}

/// Send `Authorization: GNAP <token>`.
pub fn with_gnap_token(token: impl Into<String>) -> RequestOpt {
    let token = token.into();
    Box::new(move |o| o.gnap_token = Some(token))
}

/// Sign the request (e.g. HTTP Signatures) after headers are set.
pub fn with_signer(signer: Arc<dyn RequestSigner>) -> RequestOpt {
    Box::new(move |o| o.signer = Some(signer))
}

/// Deadline for the whole round trip, including reading the body.
pub fn with_timeout(timeout: Duration) -> RequestOpt {
    Box::new(move |o| o.timeout = Some(timeout))
}

/// Abort the request when `signal` fires.
pub fn with_cancellation(signal: ShutdownSignal) -> RequestOpt {
    Box::new(move |o| o.cancellation = Some(signal))
}

/// Make an HTTP request.
///
/// Returns the response only for HTTP 200. Any other status becomes an
/// error carrying the body's `errMessage` or, failing that, the status line.
pub async fn do_request<I>(url: &str, opts: I) -> Result<Response, RequestError>
where
    I: IntoIterator<Item = RequestOpt>,
{
    let mut op = RequestOptions::default();
    for opt in opts {
        opt(&mut op);
    }

    let method = op.method.clone();
    let started = Instant::now();
    let result = execute(url, op).await;

    let outcome = match &result {
        Ok(_) => "ok",
        Err(e) => e.outcome(),
    };
    metrics::record_client_request(method.as_str(), outcome, started.elapsed());
    result
}

async fn execute(url: &str, op: RequestOptions) -> Result<Response, RequestError> {
    let RequestOptions {
        http_client,
        method,
        body,
        gnap_token,
        signer,
        timeout,
        cancellation,
    } = op;

    let url = Url::parse(url).map_err(RequestError::NewRequest)?;

    let mut req = reqwest::Request::new(method, url);
    *req.body_mut() = Some(Body::from(body.clone()));
    *req.timeout_mut() = timeout;
    req.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));

    if let Some(token) = gnap_token {
        let value = HeaderValue::from_str(&format!("{GNAP_SCHEME} {token}"))
            .map_err(RequestError::InvalidToken)?;
        req.headers_mut().insert(AUTHORIZATION, value);
    }

    if let Some(signer) = signer {
        signer.sign(&mut req).map_err(RequestError::Sign)?;
        // Signing may have consumed the body; send exactly what was signed over.
        *req.body_mut() = Some(Body::from(body));
    }

    let round_trip = async move {
        let resp = http_client
            .execute(req)
            .await
            .map_err(RequestError::Transport)?;
        let status = resp.status();
        // `bytes` consumes the response, releasing the connection on every path.
        let body = resp.bytes().await.map_err(RequestError::ReadBody)?;
        Ok::<_, RequestError>((status, body))
    };

    let (status, body) = match cancellation {
        Some(mut signal) => {
            if signal.is_triggered() {
                return Err(RequestError::Cancelled);
            }
            tokio::select! {
                biased;
                _ = signal.recv() => return Err(RequestError::Cancelled),
                result = round_trip => result?,
            }
        }
        None => round_trip.await?,
    };

    if status != StatusCode::OK {
        let status_code = status.as_u16();
        if let Some(message) = ErrorResponse::message_from(&body) {
            return Err(RequestError::Server {
                status_code,
                message,
            });
        }
        return Err(RequestError::Status {
            status_code,
            status: status_line(status),
        });
    }

    Ok(Response {
        status: status_line(status),
        status_code: status.as_u16(),
        body: body.to_vec(),
    })
}
