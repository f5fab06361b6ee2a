//! Video SDK errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VideoSdkError {
    #[error("Configuration error: {0}")]
    Config(String),
}
