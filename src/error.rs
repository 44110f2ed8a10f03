use thiserror::Error;

/// Failures surfaced to the window's status line. None of them are fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewerError {
    #[error("No images found for that search. Try a different term.")]
    EmptyResult,

    #[error("Nothing to show yet. Search for something first.")]
    NoDocument,

    #[error("Fetch failed: {0}")]
    Fetch(String),
}

impl From<reqwest::Error> for ViewerError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => ViewerError::Fetch(format!("server returned {}", status)),
            None => ViewerError::Fetch(e.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ViewerError>;
