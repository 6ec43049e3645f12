use thiserror::Error;

/// Errors raised while talking to the scheduling portal.
#[derive(Debug, Error)]
pub enum PortalError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The portal answered the login submission by redirecting back to the
    /// login form, which is how it signals rejected credentials.
    #[error("login rejected: portal redirected back to the login form")]
    CredentialsRejected,

    /// A non-2xx status outside the cases the portal is known to emit.
    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// The response body could not be parsed as JSON, even after the
    /// single embedded-object recovery pass.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The body parsed as JSON but carries no `"data"` key. Typically the
    /// portal silently served an HTML login page or an error document in
    /// place of the gadget payload.
    #[error("response from {context} carries no \"data\" key")]
    MissingDataKey { context: String },

    /// The configured base URL could not be parsed.
    #[error("invalid base URL \"{url}\": {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// Every attempt failed transiently; wraps the error from the last one.
    #[error("retry budget exhausted after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<PortalError>,
    },
}
