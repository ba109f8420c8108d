use thiserror::Error;

#[derive(Error, Debug)]
pub enum OtpError {
    #[error("digit count must be at least 1")]
    ZeroLength,

    #[error("no one-time-code capability on this platform")]
    AutofillUnavailable,

    #[error("one-time-code request canceled")]
    AutofillCanceled,

    #[error("one-time-code provider failed: {0}")]
    AutofillProvider(String),
}

pub type Result<T> = std::result::Result<T, OtpError>;
