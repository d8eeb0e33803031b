//! Error types for ampli-sync payloads.

use thiserror::Error;

/// Errors raised while decoding a server payload.
#[derive(Debug, Error)]
pub enum PayloadError {
    /// The page carried changes but no `Records` object
    #[error("missing Records for table '{table}'")]
    MissingRecords {
        /// Table the page belongs to
        table: String,
    },

    /// `Records` was present but not a JSON object
    #[error("invalid Records for table '{table}': expected JSON object")]
    RecordsNotObject {
        /// Table the page belongs to
        table: String,
    },

    /// `Records` was an object with wrongly typed members
    #[error("invalid Records for table '{table}': {source}")]
    InvalidRecords {
        /// Table the page belongs to
        table: String,
        /// Underlying decode failure
        #[source]
        source: serde_json::Error,
    },

    /// A statement template was present but not a string
    #[error("invalid {field} for table '{table}': expected string")]
    InvalidTemplate {
        /// Table the page belongs to
        table: String,
        /// Wire name of the template
        field: &'static str,
    },
}

impl PayloadError {
    /// The table whose payload was rejected.
    pub fn table(&self) -> &str {
        match self {
            Self::MissingRecords { table }
            | Self::RecordsNotObject { table }
            | Self::InvalidRecords { table, .. }
            | Self::InvalidTemplate { table, .. } => table,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_names_table() {
        let err = PayloadError::RecordsNotObject {
            table: "assets_asset".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid Records for table 'assets_asset': expected JSON object"
        );
        assert_eq!(err.table(), "assets_asset");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<PayloadError>();
    }
}
