//! Domain error types.

/// Top-level error type for trendscore.
#[derive(Debug, thiserror::Error)]
pub enum TrendError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("insufficient history for {indicator}: have {bars} bars, need {minimum}")]
    InsufficientHistory {
        indicator: String,
        bars: usize,
        minimum: usize,
    },

    #[error("bar series for {symbol} rejected at index {index}: {reason}")]
    DataIntegrity {
        symbol: String,
        index: usize,
        reason: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrendError {
    pub(crate) fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        TrendError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// True for errors that only concern one symbol and must not abort a pass.
    pub fn is_per_symbol(&self) -> bool {
        matches!(
            self,
            TrendError::InsufficientHistory { .. }
                | TrendError::DataIntegrity { .. }
                | TrendError::NoData { .. }
        )
    }
}

impl From<&TrendError> for std::process::ExitCode {
    fn from(err: &TrendError) -> Self {
        let code: u8 = match err {
            TrendError::Io(_) => 1,
            TrendError::ConfigParse { .. }
            | TrendError::ConfigMissing { .. }
            | TrendError::ConfigInvalid { .. } => 2,
            TrendError::DataIntegrity { .. } | TrendError::DataSource { .. } => 3,
            TrendError::InsufficientHistory { .. } | TrendError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_history_message() {
        let err = TrendError::InsufficientHistory {
            indicator: "MFI(14)".into(),
            bars: 10,
            minimum: 14,
        };
        assert_eq!(
            err.to_string(),
            "insufficient history for MFI(14): have 10 bars, need 14"
        );
    }

    #[test]
    fn per_symbol_classification() {
        let history = TrendError::InsufficientHistory {
            indicator: "OBV".into(),
            bars: 0,
            minimum: 1,
        };
        assert!(history.is_per_symbol());

        let config = TrendError::config_invalid("score", "weight_macd", "bad");
        assert!(!config.is_per_symbol());
    }

    #[test]
    fn exit_codes_by_category() {
        use std::process::ExitCode;

        let config = TrendError::ConfigMissing {
            section: "backtest".into(),
            key: "data_dir".into(),
        };
        assert_eq!(ExitCode::from(&config), ExitCode::from(2));

        let data = TrendError::DataSource {
            reason: "boom".into(),
        };
        assert_eq!(ExitCode::from(&data), ExitCode::from(3));

        let none = TrendError::NoData {
            symbol: "AMD".into(),
        };
        assert_eq!(ExitCode::from(&none), ExitCode::from(5));
    }
}
