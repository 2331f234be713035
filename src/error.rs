use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScavengerError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Remote read failed: {operation} {target}: {message}")]
    RemoteRead {
        operation: &'static str,
        target: String,
        message: String,
    },

    #[error("Remote write failed: {operation} {target}: {message}")]
    RemoteWrite {
        operation: &'static str,
        target: String,
        message: String,
    },

    #[error("Invalid repository full name: {0}")]
    InvalidRepository(String),

    #[error("Task pool is shut down")]
    PoolClosed,
}

impl From<::config::ConfigError> for ScavengerError {
    fn from(err: ::config::ConfigError) -> Self {
        Self::ConfigError(err.to_string())
    }
}

impl ScavengerError {
    pub fn remote_read(
        operation: &'static str,
        target: impl Into<String>,
        err: impl std::fmt::Display,
    ) -> Self {
        Self::RemoteRead {
            operation,
            target: target.into(),
            message: err.to_string(),
        }
    }

    pub fn remote_write(
        operation: &'static str,
        target: impl Into<String>,
        err: impl std::fmt::Display,
    ) -> Self {
        Self::RemoteWrite {
            operation,
            target: target.into(),
            message: err.to_string(),
        }
    }

    /// Whether the error must stop the process before the scan starts.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::ConfigError(_))
    }
}
