use thiserror::Error;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid report: {0}")]
    InvalidReport(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
