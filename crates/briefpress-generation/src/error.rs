// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

pub type Result<T> = std::result::Result<T, GenerationError>;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Invalid response from {service}: {message}")]
    InvalidResponse { service: &'static str, message: String },

    #[error("API error from {service}: {status} - {message}")]
    ApiError {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
