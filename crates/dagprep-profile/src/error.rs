use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProfileError>;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profiles are incomparable: no shared columns")]
    Incomparable,

    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}
