use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("no subscribers for topic {0}")]
    NoSubscribers(String),

    #[error("publish failed on topic {0}: {1}")]
    PublishFailed(String, String),

    #[error("subscribe failed on topic {0}: {1}")]
    SubscribeFailed(String, String),

    #[error("malformed inbound message: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("unknown control command: {0}")]
    UnknownCommand(String),
}

pub type Result<T> = std::result::Result<T, TransportError>;
