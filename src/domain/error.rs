//! Domain error types.

/// Failure raised by the indicator library.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IndicatorError {
    #[error("insufficient data: have {have} bars, need {need}")]
    InsufficientData { have: usize, need: usize },

    #[error("no traded volume in window")]
    NoVolume,

    #[error("invalid indicator parameter: {reason}")]
    InvalidParameter { reason: String },
}

/// Top-level error type for trendfolio.
#[derive(Debug, thiserror::Error)]
pub enum TrendfolioError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid configuration {key}: {reason}")]
    InvalidConfiguration { key: String, reason: String },

    #[error("insufficient data for {code}: have {bars} bars, need {minimum}")]
    InsufficientData {
        code: String,
        bars: usize,
        minimum: usize,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("report error: {reason}")]
    Report { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl TrendfolioError {
    pub fn invalid_config(key: &str, reason: impl Into<String>) -> Self {
        TrendfolioError::InvalidConfiguration {
            key: key.to_string(),
            reason: reason.into(),
        }
    }

    /// Process exit status for this error category.
    pub fn exit_status(&self) -> u8 {
        match self {
            TrendfolioError::Io(_) | TrendfolioError::Report { .. } => 1,
            TrendfolioError::ConfigParse { .. } | TrendfolioError::InvalidConfiguration { .. } => 2,
            TrendfolioError::Data { .. } => 3,
            TrendfolioError::InsufficientData { .. } => 4,
        }
    }
}

impl From<&TrendfolioError> for std::process::ExitCode {
    fn from(err: &TrendfolioError) -> Self {
        std::process::ExitCode::from(err.exit_status())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_message() {
        let err = IndicatorError::InsufficientData { have: 10, need: 14 };
        assert_eq!(err.to_string(), "insufficient data: have 10 bars, need 14");
    }

    #[test]
    fn invalid_config_helper() {
        let err = TrendfolioError::invalid_config("allocations", "sum exceeds 100%");
        assert_eq!(
            err.to_string(),
            "invalid configuration allocations: sum exceeds 100%"
        );
    }

    #[test]
    fn exit_codes_by_category() {
        let config = TrendfolioError::invalid_config("max_positions", "must be at least 1");
        assert_eq!(config.exit_status(), 2);
        let data = TrendfolioError::InsufficientData {
            code: "AAPL".into(),
            bars: 5,
            minimum: 200,
        };
        assert_eq!(data.exit_status(), 4);
    }
}
