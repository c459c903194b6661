//! Structured transport errors and their classification

use std::error::Error as StdError;
use std::fmt;

use thiserror::Error;
use url::Url;

use quay_core::error::QuayError;

/// Transport-level failure code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportCode {
    /// The request exceeded its timeout
    Timeout,
    /// The host name did not resolve
    DnsNotFound,
    /// The peer reset or aborted the connection
    ConnectionReset,
    /// The connection could not be established
    ConnectionRefused,
    /// The server answered with a non-success status
    HttpStatus,
    /// The body was not the expected JSON
    Decode,
    /// Anything else
    Other,
}

impl fmt::Display for TransportCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            TransportCode::Timeout => "ETIMEDOUT",
            TransportCode::DnsNotFound => "ENOTFOUND",
            TransportCode::ConnectionReset => "ECONNRESET",
            TransportCode::ConnectionRefused => "ECONNREFUSED",
            TransportCode::HttpStatus => "EHTTPSTATUS",
            TransportCode::Decode => "EDECODE",
            TransportCode::Other => "EUNKNOWN",
        };
        f.write_str(code)
    }
}

/// How a registry lookup reacts to a failed request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// 404 or an unresolvable host
    NotFound,
    /// 401 or 403
    Unauthorized,
    /// Timeout or connection reset
    Transport,
    /// 5xx
    ServerError,
    /// Anything the engine has no specific policy for
    Unrecognized,
}

/// A failed HTTP request
#[derive(Debug, Error)]
#[error("{code} requesting {url}: {message}")]
pub struct HttpError {
    /// Response status, when a response arrived
    pub status: Option<u16>,
    /// Transport-level code
    pub code: TransportCode,
    /// Requested URL
    pub url: String,
    /// Host of the requested URL
    pub host: Option<String>,
    /// Human readable detail
    pub message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl HttpError {
    /// Error for a non-success response status
    pub fn status(url: &str, status: u16) -> Self {
        Self {
            status: Some(status),
            code: TransportCode::HttpStatus,
            url: url.to_string(),
            host: host_of(url),
            message: format!("server responded with status {}", status),
            source: None,
        }
    }

    /// Error for a body that could not be decoded
    pub fn decode<E>(url: &str, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            status: None,
            code: TransportCode::Decode,
            url: url.to_string(),
            host: host_of(url),
            message: format!("invalid JSON body: {}", source),
            source: Some(Box::new(source)),
        }
    }

    /// Error raised by the HTTP client itself
    pub fn transport(url: &str, source: reqwest::Error) -> Self {
        let code = transport_code(&source);
        Self {
            status: source.status().map(|s| s.as_u16()),
            code,
            url: url.to_string(),
            host: host_of(url),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Whether retrying the same request could succeed
    pub fn is_retryable(&self) -> bool {
        match self.code {
            TransportCode::Timeout | TransportCode::ConnectionReset => true,
            TransportCode::HttpStatus => self.status.map_or(false, |s| s >= 500),
            _ => false,
        }
    }

    /// Place this failure in the registry error taxonomy
    pub fn classify(&self) -> FailureClass {
        match (self.code, self.status) {
            (TransportCode::DnsNotFound, _) => FailureClass::NotFound,
            (_, Some(404)) => FailureClass::NotFound,
            (_, Some(401)) | (_, Some(403)) => FailureClass::Unauthorized,
            (_, Some(status)) if status >= 500 => FailureClass::ServerError,
            (TransportCode::Timeout, _) | (TransportCode::ConnectionReset, _) => {
                FailureClass::Transport
            },
            _ => FailureClass::Unrecognized,
        }
    }

    /// Whether the request targeted the same scheme, host and port as `url`
    pub fn is_same_origin(&self, url: &Url) -> bool {
        Url::parse(&self.url)
            .map(|own| own.origin() == url.origin())
            .unwrap_or(false)
    }
}

impl From<HttpError> for QuayError {
    fn from(err: HttpError) -> Self {
        match (err.classify(), err.status) {
            (FailureClass::NotFound, _) => QuayError::NotFound { url: err.url },
            (FailureClass::Unauthorized, Some(status)) => QuayError::Unauthorized {
                url: err.url,
                status,
            },
            (FailureClass::ServerError, Some(status)) => QuayError::ServerError {
                url: err.url,
                status,
            },
            (FailureClass::Transport, _) if err.code == TransportCode::Timeout => {
                QuayError::Timeout { url: err.url }
            },
            _ => QuayError::Network {
                message: err.to_string(),
                source: Some(Box::new(err)),
            },
        }
    }
}

fn host_of(url: &str) -> Option<String> {
    quay_core::utils::url_host(url)
}

/// Map a reqwest failure onto a transport code by walking its source chain
fn transport_code(err: &reqwest::Error) -> TransportCode {
    if err.is_timeout() {
        return TransportCode::Timeout;
    }
    if err.is_decode() {
        return TransportCode::Decode;
    }
    if err.is_status() {
        return TransportCode::HttpStatus;
    }

    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            match io.kind() {
                std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::BrokenPipe => return TransportCode::ConnectionReset,
                std::io::ErrorKind::ConnectionRefused => return TransportCode::ConnectionRefused,
                std::io::ErrorKind::TimedOut => return TransportCode::Timeout,
                _ => {},
            }
        }

        let text = cause.to_string();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return TransportCode::DnsNotFound;
        }

        source = cause.source();
    }

    if err.is_connect() {
        TransportCode::ConnectionRefused
    } else {
        TransportCode::Other
    }
}
