//! Storage-level search criteria.
//!
//! Each criterion contributes one boolean SQL expression and the named values
//! it references. Placeholder names are derived from the filtered column plus
//! an `_sc_<field>` suffix, so every criterion type owns a fixed, distinct set
//! of names. Using two instances of the same criterion type in one query is
//! not supported: they would emit the same placeholder.

use rusqlite::types::Value;
use std::collections::BTreeMap;
use std::fmt::Debug;

/// Placeholder name (without the leading `:`) to bound value.
pub type Bindings = BTreeMap<String, Value>;

/// A single filter predicate over location status reports.
///
/// `sql_fragment` must be one boolean expression (no `WHERE`, no trailing
/// operator) and reference exactly the keys returned by `bindings`.
pub trait ReportSearchCriterion: Debug + Send + Sync {
    fn sql_fragment(&self) -> String;

    fn bindings(&self) -> Bindings;
}

fn single_binding(name: &str, value: Value) -> Bindings {
    let mut bindings = Bindings::new();
    bindings.insert(name.to_string(), value);
    bindings
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSignCriterion {
    call_sign: String,
}

impl CallSignCriterion {
    pub const BINDING_NAME: &'static str = "call_sign_sc_call_sign";

    pub fn new(call_sign: impl Into<String>) -> Self {
        Self {
            call_sign: call_sign.into(),
        }
    }
}

impl ReportSearchCriterion for CallSignCriterion {
    fn sql_fragment(&self) -> String {
        format!("call_sign = :{}", Self::BINDING_NAME)
    }

    fn bindings(&self) -> Bindings {
        single_binding(Self::BINDING_NAME, Value::Text(self.call_sign.clone()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationIdCriterion {
    location_id: i64,
}

impl LocationIdCriterion {
    pub const BINDING_NAME: &'static str = "location_id_sc_location_id";

    pub fn new(location_id: i64) -> Self {
        Self { location_id }
    }
}

impl ReportSearchCriterion for LocationIdCriterion {
    fn sql_fragment(&self) -> String {
        format!("location_id = :{}", Self::BINDING_NAME)
    }

    fn bindings(&self) -> Bindings {
        single_binding(Self::BINDING_NAME, Value::Integer(self.location_id))
    }
}

/// Reports filed at or after the given RFC 3339 UTC timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FromTimeCriterion {
    from: String,
}

impl FromTimeCriterion {
    pub const BINDING_NAME: &'static str = "report_time_sc_from_time";

    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

impl ReportSearchCriterion for FromTimeCriterion {
    fn sql_fragment(&self) -> String {
        format!("report_time >= :{}", Self::BINDING_NAME)
    }

    fn bindings(&self) -> Bindings {
        single_binding(Self::BINDING_NAME, Value::Text(self.from.clone()))
    }
}

/// Reports filed at or before the given RFC 3339 UTC timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToTimeCriterion {
    to: String,
}

impl ToTimeCriterion {
    pub const BINDING_NAME: &'static str = "report_time_sc_to_time";

    pub fn new(to: impl Into<String>) -> Self {
        Self { to: to.into() }
    }
}

impl ReportSearchCriterion for ToTimeCriterion {
    fn sql_fragment(&self) -> String {
        format!("report_time <= :{}", Self::BINDING_NAME)
    }

    fn bindings(&self) -> Bindings {
        single_binding(Self::BINDING_NAME, Value::Text(self.to.clone()))
    }
}
