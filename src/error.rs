use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid listen address '{addr}': {source}")]
    InvalidAddress {
        addr: String,
        #[source]
        source: std::net::AddrParseError,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid edge event: {0}")]
    Event(#[from] serde_json::Error),

    #[error("failed to encode distribution plan: {0}")]
    PlanEncoding(#[from] toml::ser::Error),

    #[error("invalid site configuration: {0}")]
    Site(String),
}

pub type Result<T> = std::result::Result<T, Error>;
