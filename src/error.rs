use std::path::PathBuf;

/// Fatal render failure. Per-block problems never surface here; they are
/// rendered inline instead.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("sanitizer environment unavailable: {0}")]
    Environment(#[from] EnvironmentError),
}

/// The sanitizer could not be built from the requested allowlist.
#[derive(Debug, thiserror::Error)]
pub enum EnvironmentError {
    #[error("tag <{0}> is always removed together with its content and cannot be allowed")]
    StrippedTag(String),
    #[error("attribute {0:?} cannot be allowed")]
    ForbiddenAttribute(String),
}

/// A quiz or slide token could not be turned into a placeholder payload.
#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("payload is {size} bytes, limit is {limit}")]
    TooLarge { size: usize, limit: usize },
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid percent-encoded UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, thiserror::Error)]
pub enum HighlightError {
    #[error("highlighting failed: {0}")]
    Generate(#[from] syntect::Error),
    #[error("theme {0:?} not found")]
    UnknownTheme(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}
