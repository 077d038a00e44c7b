//! Error type shared by the session controller and the web front end.

use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GameError {
    /// Start was requested before any track finished decoding.
    #[error("please select a song first")]
    NoTrackLoaded,
    /// The audio collaborator rejected the track bytes.
    #[error("could not decode track: {0}")]
    Decode(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Operation not allowed in the current session status.
    #[error("cannot {action} while {status}")]
    Busy {
        action: &'static str,
        status: &'static str,
    },
}

impl GameError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }
}

impl From<GameError> for JsValue {
    fn from(err: GameError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

pub type GameResult<T> = Result<T, GameError>;
