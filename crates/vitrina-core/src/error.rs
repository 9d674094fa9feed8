// SPDX-FileCopyrightText: 2026 Vitrina Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared across the Vitrina workspace.

use thiserror::Error;

/// The primary error type used across Vitrina components.
///
/// Variants map one-to-one onto the recovery strategies applied at the
/// dispatch boundary: some clear the active conversation state, some leave
/// it untouched and merely re-prompt the user.
#[derive(Debug, Error)]
pub enum VitrinaError {
    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (database connection, query failure, serialization).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Chat transport errors (send/edit/download failure, rate limiting).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// AI backend errors (API failure, malformed response, timeout).
    #[error("backend error: {message}")]
    Backend {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The user's token balance does not cover the requested operation.
    #[error("insufficient balance: required {required}, have {balance}")]
    InsufficientBalance { required: i64, balance: i64 },

    /// Inbound media exceeds the configured size ceiling.
    #[error("media too large: {size_bytes} bytes (limit {limit_bytes})")]
    OversizedMedia { size_bytes: u64, limit_bytes: u64 },

    /// Inbound content does not satisfy what the active flow step expects.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// An operation required conversation state that does not exist.
    #[error("conversation state not found")]
    StateNotFound,

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl VitrinaError {
    /// Whether the dispatch boundary should clear the user's conversation
    /// state when this error surfaces.
    ///
    /// Input rejections (oversized media, malformed input, missing state)
    /// leave the flow where it was so the user can simply retry the step.
    /// Everything else is terminal for the flow.
    pub fn clears_state(&self) -> bool {
        !matches!(
            self,
            VitrinaError::OversizedMedia { .. }
                | VitrinaError::MalformedInput(_)
                | VitrinaError::StateNotFound
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_rejections_keep_state() {
        assert!(
            !VitrinaError::OversizedMedia {
                size_bytes: 10,
                limit_bytes: 7,
            }
            .clears_state()
        );
        assert!(!VitrinaError::MalformedInput("no caption".into()).clears_state());
        assert!(!VitrinaError::StateNotFound.clears_state());
    }

    #[test]
    fn terminal_errors_clear_state() {
        assert!(
            VitrinaError::InsufficientBalance {
                required: 25,
                balance: 5,
            }
            .clears_state()
        );
        assert!(
            VitrinaError::Backend {
                message: "timeout".into(),
                source: None,
            }
            .clears_state()
        );
        assert!(
            VitrinaError::Storage {
                source: Box::new(std::io::Error::other("disk gone")),
            }
            .clears_state()
        );
    }
}
