use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use std::sync::OnceLock;

use super::criteria::{
    CallSignCriterion, FromTimeCriterion, LocationIdCriterion, ReportSearchCriterion,
    ToTimeCriterion,
};
use crate::error::{Error, Result};

const MAX_CALL_SIGN_LEN: usize = 32;

fn call_sign_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Za-z0-9_-]+$").expect("valid call sign pattern"))
}

/// Validate a call sign. The value is returned unchanged on success.
pub fn validate_call_sign(call_sign: &str) -> Result<&str> {
    if call_sign.is_empty() {
        return Err(Error::invalid_input("call sign", "must not be empty"));
    }
    if call_sign.chars().count() > MAX_CALL_SIGN_LEN {
        return Err(Error::invalid_input(
            "call sign",
            format!("must be at most {MAX_CALL_SIGN_LEN} characters"),
        ));
    }
    if !call_sign_pattern().is_match(call_sign) {
        return Err(Error::invalid_input(
            "call sign",
            "may only contain letters, digits, '-' and '_'",
        ));
    }
    Ok(call_sign)
}

/// Parse an RFC 3339 timestamp and normalize it to the stored report_time form.
pub fn normalize_timestamp(field: &'static str, raw: &str) -> Result<String> {
    let parsed = DateTime::parse_from_rfc3339(raw.trim()).map_err(|e| {
        Error::invalid_input(field, format!("expected RFC 3339 timestamp ({e})"))
    })?;
    Ok(parsed
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// A user-supplied report filter, validated at the boundary.
///
/// Each value owns exactly one storage criterion and performs no SQL assembly
/// of its own.
#[derive(Debug)]
pub struct ApiReportSearchCriterion {
    criterion: Box<dyn ReportSearchCriterion>,
}

impl ApiReportSearchCriterion {
    fn wrap(criterion: impl ReportSearchCriterion + 'static) -> Self {
        Self {
            criterion: Box::new(criterion),
        }
    }

    /// Exact match on the filing agent's call sign.
    pub fn agent_call_sign(call_sign: &str) -> Result<Self> {
        let call_sign = validate_call_sign(call_sign)?;
        Ok(Self::wrap(CallSignCriterion::new(call_sign)))
    }

    pub fn location_id(raw: &str) -> Result<Self> {
        let id: i64 = raw
            .trim()
            .parse()
            .map_err(|_| Error::invalid_input("location id", "must be an integer"))?;
        if id <= 0 {
            return Err(Error::invalid_input("location id", "must be positive"));
        }
        Ok(Self::wrap(LocationIdCriterion::new(id)))
    }

    pub fn from_time(raw: &str) -> Result<Self> {
        let from = normalize_timestamp("from time", raw)?;
        Ok(Self::wrap(FromTimeCriterion::new(from)))
    }

    pub fn to_time(raw: &str) -> Result<Self> {
        let to = normalize_timestamp("to time", raw)?;
        Ok(Self::wrap(ToTimeCriterion::new(to)))
    }

    pub fn criterion(&self) -> &dyn ReportSearchCriterion {
        self.criterion.as_ref()
    }
}

/// Raw report search options as received from the caller.
#[derive(Debug, Clone, Default)]
pub struct ReportSearchParams {
    pub call_sign: Option<String>,
    pub location_id: Option<String>,
    pub from_time: Option<String>,
    pub to_time: Option<String>,
}

impl ReportSearchParams {
    /// Build API criteria for every supplied option, stopping at the first invalid one.
    pub fn to_criteria(&self) -> Result<Vec<ApiReportSearchCriterion>> {
        let mut criteria = Vec::new();

        if let Some(ref call_sign) = self.call_sign {
            criteria.push(ApiReportSearchCriterion::agent_call_sign(call_sign)?);
        }

        if let Some(ref location_id) = self.location_id {
            criteria.push(ApiReportSearchCriterion::location_id(location_id)?);
        }

        if let Some(ref from) = self.from_time {
            criteria.push(ApiReportSearchCriterion::from_time(from)?);
        }

        if let Some(ref to) = self.to_time {
            criteria.push(ApiReportSearchCriterion::to_time(to)?);
        }

        Ok(criteria)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::types::Value;

    #[test]
    fn test_call_sign_round_trip() {
        for input in ["ALPHA-1", "x", "bravo_two", "Z9"] {
            let api = ApiReportSearchCriterion::agent_call_sign(input).unwrap();
            let bindings = api.criterion().bindings();
            assert_eq!(
                bindings.get(CallSignCriterion::BINDING_NAME),
                Some(&Value::Text(input.to_string()))
            );
        }
    }

    #[test]
    fn test_invalid_call_signs_rejected() {
        let too_long = "A".repeat(MAX_CALL_SIGN_LEN + 1);
        for input in ["", " ALPHA", "ALPHA 1", "a'; DROP TABLE agents; --", too_long.as_str()] {
            let err = ApiReportSearchCriterion::agent_call_sign(input).unwrap_err();
            assert!(err.is_client_error(), "{input:?}");
        }
    }

    #[test]
    fn test_location_id_validation() {
        let api = ApiReportSearchCriterion::location_id("42").unwrap();
        assert_eq!(
            api.criterion().bindings().get(LocationIdCriterion::BINDING_NAME),
            Some(&Value::Integer(42))
        );
        assert!(ApiReportSearchCriterion::location_id("0").is_err());
        assert!(ApiReportSearchCriterion::location_id("-3").is_err());
        assert!(ApiReportSearchCriterion::location_id("four").is_err());
    }

    #[test]
    fn test_timestamps_normalized_to_utc() {
        let api = ApiReportSearchCriterion::from_time("2024-03-01T10:30:00+02:00").unwrap();
        assert_eq!(
            api.criterion().bindings().get(FromTimeCriterion::BINDING_NAME),
            Some(&Value::Text("2024-03-01T08:30:00Z".to_string()))
        );
        assert!(ApiReportSearchCriterion::to_time("yesterday").is_err());
    }

    #[test]
    fn test_params_to_criteria() {
        assert!(ReportSearchParams::default().to_criteria().unwrap().is_empty());

        let params = ReportSearchParams {
            call_sign: Some("ALPHA-1".to_string()),
            location_id: Some("2".to_string()),
            from_time: None,
            to_time: Some("2024-01-01T00:00:00Z".to_string()),
        };
        let fragments: Vec<String> = params
            .to_criteria()
            .unwrap()
            .iter()
            .map(|c| c.criterion().sql_fragment())
            .collect();
        assert_eq!(
            fragments,
            vec![
                "call_sign = :call_sign_sc_call_sign",
                "location_id = :location_id_sc_location_id",
                "report_time <= :report_time_sc_to_time",
            ]
        );
    }

    #[test]
    fn test_params_first_invalid_value_fails() {
        let params = ReportSearchParams {
            call_sign: Some("ok".to_string()),
            location_id: Some("nope".to_string()),
            ..Default::default()
        };
        match params.to_criteria().unwrap_err() {
            Error::InvalidInput { field, .. } => assert_eq!(field, "location id"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
