use thiserror::Error;

// ─── Top-level error hierarchy ───────────────────────────────────────────────

/// Structured error hierarchy for `ficscout`.
///
/// Each subsystem defines its own error variant. Library callers can match on
/// these to decide recovery strategy; internal code continues to use
/// `anyhow::Result` for ad-hoc context chains.
#[derive(Debug, Error)]
pub enum FicscoutError {
    // ── Config ───────────────────────────────────────────────────────────
    #[error("config: {0}")]
    Config(#[from] ConfigError),

    // ── Providers ───────────────────────────────────────────────────────
    #[error("provider: {0}")]
    Provider(#[from] ProviderError),

    // ── Settings store ──────────────────────────────────────────────────
    #[error("store: {0}")]
    Store(#[from] StoreError),

    // ── Browse sessions ─────────────────────────────────────────────────
    #[error("session: {0}")]
    Session(#[from] SessionError),

    // ── Generic fallthrough (wraps anyhow for interop) ──────────────────
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ─── Config errors ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load config: {0}")]
    Load(String),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

// ─── Provider errors ────────────────────────────────────────────────────────

/// Upstream metadata provider failure. Always caught at the resolution
/// engine boundary; never propagates past `resolve`/`resolve_all_links`.
/// A provider's legitimate negative answer is `Ok(None)`, not an error.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider {provider} request failed: {message}")]
    Request {
        provider: &'static str,
        message: String,
    },

    #[error("provider {provider} returned status {status}")]
    Status { provider: &'static str, status: u16 },

    #[error("provider {provider} returned a malformed payload: {message}")]
    Payload {
        provider: &'static str,
        message: String,
    },

    #[error("operation {operation} not supported by provider {provider}")]
    Unsupported {
        provider: &'static str,
        operation: &'static str,
    },
}

impl ProviderError {
    pub fn provider(&self) -> &'static str {
        match self {
            Self::Request { provider, .. }
            | Self::Status { provider, .. }
            | Self::Payload { provider, .. }
            | Self::Unsupported { provider, .. } => provider,
        }
    }
}

// ─── Settings store errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlx: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("empty location batch")]
    EmptyBatch,
}

// ─── Browse session errors ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found: {0}")]
    NotFound(uuid::Uuid),

    #[error("only the session owner may navigate")]
    NotOwner,

    #[error("session expired")]
    Expired,

    #[error("page {page} out of range (last page is {last})")]
    PageOutOfRange { page: usize, last: usize },
}

// ─── Convenience re-exports ─────────────────────────────────────────────────

/// Shorthand result type for the crate.
pub type Result<T> = std::result::Result<T, FicscoutError>;
