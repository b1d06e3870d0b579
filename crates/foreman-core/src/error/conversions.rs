//! From trait implementations for ForemanError conversions

use super::types::ForemanError;

impl From<std::io::Error> for ForemanError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<serde_json::Error> for ForemanError {
    fn from(error: serde_json::Error) -> Self {
        Self::json(error.to_string())
    }
}

impl From<rusqlite::Error> for ForemanError {
    fn from(error: rusqlite::Error) -> Self {
        Self::storage(error.to_string())
    }
}
