use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Endpoint error: {0}")]
    Endpoint(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// True when a send failed because nothing is listening on the other
    /// side of the channel. The page agent treats this as "dispatcher
    /// unreachable" and raises a connection-lost overlay.
    pub fn is_disconnected(&self) -> bool {
        match self {
            Error::Transport(msg) => msg.contains("no receiving end"),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
