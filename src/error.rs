use thiserror::Error;

#[derive(Error, Debug)]
pub enum CovupError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("segmentation accounted for {accounted} of {total} report lines")]
    Segmentation { accounted: usize, total: usize },

    #[error("no output file map found for unit '{0}'")]
    FileMapNotFound(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, CovupError>;
