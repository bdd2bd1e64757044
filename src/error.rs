use thiserror::Error;

pub type Result<T, E = CredentialError> = std::result::Result<T, E>;

/// Prefix of the aggregated error returned when every provider of a chain failed.
pub const CHAIN_EXHAUSTED_PREFIX: &str =
    "unable to get credentials from any of the providers in the chain:";

/// Errors surfaced by providers, the chain and the unified credential handle.
///
/// Messages are part of the public contract: validation errors in particular are
/// compared verbatim by callers, so each variant renders its payload unchanged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CredentialError {
    /// Missing or invalid configuration, raised before any network call.
    #[error("{0}")]
    Validation(String),

    /// The HTTP collaborator failed (connect, proxy, invalid method, read).
    #[error("{0}")]
    Transport(String),

    /// The remote answered, but not with usable credentials.
    #[error("{0}")]
    Protocol(String),

    /// Every candidate of a provider chain failed.
    #[error("{} {}", CHAIN_EXHAUSTED_PREFIX, .0.join(", "))]
    ChainExhausted(Vec<String>),
}

impl CredentialError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Prepends operation context while keeping the error class.
    pub fn context(self, ctx: &str) -> Self {
        match self {
            Self::Validation(m) => Self::Validation(format!("{ctx}: {m}")),
            Self::Transport(m) => Self::Transport(format!("{ctx}: {m}")),
            Self::Protocol(m) => Self::Protocol(format!("{ctx}: {m}")),
            chain @ Self::ChainExhausted(_) => chain,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Transport(_) => "transport",
            Self::Protocol(_) => "protocol",
            Self::ChainExhausted(_) => "chain_exhausted",
        }
    }
}
