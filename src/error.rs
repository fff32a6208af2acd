use chrono::NaiveDate;
use thiserror::Error;

/// Failure taxonomy shared by the fetcher, the event store and the engines.
///
/// None of these are fatal: `DataUnavailable` degrades to an empty series,
/// `Validation` is reported back to whoever submitted the input, and
/// `InsufficientData` marks a single computation as unavailable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    #[error("market data unavailable for {asset_id}: {reason}")]
    DataUnavailable { asset_id: String, reason: String },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("insufficient data for {subject}: {reason}")]
    InsufficientData { subject: String, reason: String },
}

impl CoreError {
    pub fn data_unavailable(asset_id: impl Into<String>, reason: impl ToString) -> Self {
        CoreError::DataUnavailable {
            asset_id: asset_id.into(),
            reason: reason.to_string(),
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        CoreError::Validation(reason.into())
    }

    pub fn insufficient(subject: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::InsufficientData {
            subject: subject.into(),
            reason: reason.into(),
        }
    }

    pub fn unparseable_date(raw: &str) -> Self {
        CoreError::Validation(format!("unparseable date '{}' (expected YYYY-MM-DD)", raw))
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;

/// Parse a `YYYY-MM-DD` date as used by event records and CLI flags
pub fn parse_date(raw: &str) -> CoreResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| CoreError::unparseable_date(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_iso_dates() {
        let date = parse_date(" 2022-02-24 ").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2022, 2, 24).unwrap());
    }

    #[test]
    fn rejects_garbage_dates() {
        assert!(matches!(parse_date("24/02/2022"), Err(CoreError::Validation(_))));
        assert!(matches!(parse_date("2022-02-30"), Err(CoreError::Validation(_))));
    }
}
