use thiserror::Error;

#[derive(Debug, Error)]
pub enum CollectorError {
    #[error("The hub auth token must not be empty")]
    EmptyAuthToken,

    #[error(transparent)]
    InvalidSinkUrl(#[from] url::ParseError),

    #[error(transparent)]
    HttpClient(#[from] reqwest::Error),
}
