//! Error types for TextGlass

/// Result type alias using TextGlass's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for TextGlass operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed or inconsistent configuration documents
    #[error("configuration error: {0}")]
    Config(String),

    /// A patch or attribute document targets a different domain or version
    #[error("domain mismatch: {0}")]
    DomainMismatch(String),

    /// A base pattern document was loaded into an already initialized builder
    #[error("domain already initialized: {0}")]
    AlreadyInitialized(String),

    /// A transformer could not be applied to its input
    #[error("transformer error: {0}")]
    Transform(String),

    /// File IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new domain mismatch error
    pub fn domain_mismatch(msg: impl Into<String>) -> Self {
        Self::DomainMismatch(msg.into())
    }

    /// Create a new already-initialized error
    pub fn already_initialized(msg: impl Into<String>) -> Self {
        Self::AlreadyInitialized(msg.into())
    }

    /// Create a new transformer error
    pub fn transform(msg: impl Into<String>) -> Self {
        Self::Transform(msg.into())
    }

    /// Prefix the message with `context`, keeping the variant.
    ///
    /// JSON errors carry their own line and column and pass through unchanged.
    pub fn with_context(self, context: impl std::fmt::Display) -> Self {
        match self {
            Self::Config(msg) => Self::Config(format!("{}: {}", context, msg)),
            Self::DomainMismatch(msg) => Self::DomainMismatch(format!("{}: {}", context, msg)),
            Self::AlreadyInitialized(msg) => {
                Self::AlreadyInitialized(format!("{}: {}", context, msg))
            }
            Self::Transform(msg) => Self::Transform(format!("{}: {}", context, msg)),
            Self::Io(e) => Self::Io(std::io::Error::new(e.kind(), format!("{}: {}", context, e))),
            Self::Serialization(e) => Self::Serialization(e),
        }
    }

    /// Whether this error was raised while loading configuration
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::DomainMismatch(_)
                | Self::AlreadyInitialized(_)
                | Self::Io(_)
                | Self::Serialization(_)
        )
    }
}
