use thiserror::Error;

pub type Result<T> = std::result::Result<T, NotifyError>;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("D-Bus error: {0}")]
    Bus(#[from] zbus::Error),
    #[error("Unknown transport state '{0}'")]
    UnknownTransportState(String),
    #[error("Invalid D-Bus name or path '{0}': {1}")]
    InvalidName(String, String),
}

impl NotifyError {
    pub fn invalid_name(name: &str, error: impl ToString) -> Self {
        NotifyError::InvalidName(name.to_string(), error.to_string())
    }
}
