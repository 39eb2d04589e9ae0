use std::collections::btree_map::Entry;
use tracing::{debug, warn};

use super::criteria::{Bindings, ReportSearchCriterion};
use crate::error::{Error, Result};

/// A WHERE clause and the merged bindings for one search request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComposedQuery {
    where_clause: Option<String>,
    bindings: Bindings,
}

impl ComposedQuery {
    /// Combine criteria as `(frag1) AND (frag2) AND ...`.
    ///
    /// No criteria means no WHERE clause. Fails with `BindingCollision` if two
    /// criteria bind the same placeholder to different values.
    pub fn compose(criteria: &[&dyn ReportSearchCriterion]) -> Result<Self> {
        if criteria.is_empty() {
            return Ok(Self::default());
        }

        let mut fragments = Vec::with_capacity(criteria.len());
        let mut bindings = Bindings::new();

        for criterion in criteria {
            fragments.push(format!("({})", criterion.sql_fragment()));

            for (name, value) in criterion.bindings() {
                match bindings.entry(name) {
                    Entry::Vacant(slot) => {
                        slot.insert(value);
                    }
                    Entry::Occupied(existing) => {
                        if *existing.get() != value {
                            warn!("Binding collision on :{}", existing.key());
                            return Err(Error::BindingCollision {
                                name: existing.key().clone(),
                            });
                        }
                    }
                }
            }
        }

        let where_clause = fragments.join(" AND ");
        debug!(
            "Composed WHERE {where_clause} with bindings {:?}",
            bindings.keys().collect::<Vec<_>>()
        );

        Ok(Self {
            where_clause: Some(where_clause),
            bindings,
        })
    }

    pub fn where_clause(&self) -> Option<&str> {
        self.where_clause.as_deref()
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    /// Append the WHERE clause (if any) to a base query.
    pub fn apply_to(&self, base_sql: &str) -> String {
        match &self.where_clause {
            Some(clause) => format!("{base_sql} WHERE {clause}"),
            None => base_sql.to_string(),
        }
    }

    /// Bindings in the `(":name", value)` form rusqlite expects for named parameters.
    pub fn named_params(&self) -> Vec<(String, &dyn rusqlite::types::ToSql)> {
        self.bindings
            .iter()
            .map(|(name, value)| (format!(":{name}"), value as &dyn rusqlite::types::ToSql))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::criteria::{
        CallSignCriterion, FromTimeCriterion, LocationIdCriterion, ToTimeCriterion,
    };
    use rusqlite::types::Value;

    const BASE: &str = "SELECT * FROM location_status_reports";

    #[derive(Debug)]
    struct Clashing(&'static str);

    impl ReportSearchCriterion for Clashing {
        fn sql_fragment(&self) -> String {
            "status = :clash OR status IS NULL".to_string()
        }

        fn bindings(&self) -> Bindings {
            let mut b = Bindings::new();
            b.insert("clash".to_string(), Value::Text(self.0.to_string()));
            b
        }
    }

    #[test]
    fn test_empty_criteria_has_no_where_clause() {
        let composed = ComposedQuery::compose(&[]).unwrap();
        assert_eq!(composed.where_clause(), None);
        assert!(composed.bindings().is_empty());
        assert_eq!(composed.apply_to(BASE), BASE);
        assert_eq!(composed.apply_to(BASE), composed.apply_to(BASE));
    }

    #[test]
    fn test_single_criterion() {
        let call_sign = CallSignCriterion::new("ALPHA-1");
        let composed = ComposedQuery::compose(&[&call_sign]).unwrap();
        assert_eq!(
            composed.where_clause(),
            Some("(call_sign = :call_sign_sc_call_sign)")
        );
        assert_eq!(
            composed.apply_to(BASE),
            format!("{BASE} WHERE (call_sign = :call_sign_sc_call_sign)")
        );
    }

    #[test]
    fn test_fragments_joined_in_order_with_union_of_bindings() {
        let call_sign = CallSignCriterion::new("ALPHA-1");
        let location = LocationIdCriterion::new(3);
        let from = FromTimeCriterion::new("2024-01-01T00:00:00Z");
        let to = ToTimeCriterion::new("2024-02-01T00:00:00Z");
        let criteria: [&dyn ReportSearchCriterion; 4] = [&call_sign, &location, &from, &to];

        let composed = ComposedQuery::compose(&criteria).unwrap();
        assert_eq!(
            composed.where_clause(),
            Some(
                "(call_sign = :call_sign_sc_call_sign) AND \
                 (location_id = :location_id_sc_location_id) AND \
                 (report_time >= :report_time_sc_from_time) AND \
                 (report_time <= :report_time_sc_to_time)"
            )
        );

        let mut expected: Vec<String> = criteria
            .iter()
            .flat_map(|c| c.bindings().into_keys())
            .collect();
        expected.sort();
        let actual: Vec<String> = composed.bindings().keys().cloned().collect();
        assert_eq!(actual, expected);
        assert_eq!(
            composed.bindings().get("location_id_sc_location_id"),
            Some(&Value::Integer(3))
        );
    }

    #[test]
    fn test_fragment_with_or_is_parenthesized() {
        let call_sign = CallSignCriterion::new("ALPHA-1");
        let clash = Clashing("x");
        let composed = ComposedQuery::compose(&[&call_sign, &clash]).unwrap();
        assert_eq!(
            composed.where_clause(),
            Some("(call_sign = :call_sign_sc_call_sign) AND (status = :clash OR status IS NULL)")
        );
    }

    #[test]
    fn test_conflicting_values_collide() {
        let a = Clashing("one");
        let b = Clashing("two");
        let err = ComposedQuery::compose(&[&a, &b]).unwrap_err();
        match err {
            Error::BindingCollision { name } => assert_eq!(name, "clash"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!ComposedQuery::compose(&[&a, &b]).unwrap_err().is_client_error());
    }

    #[test]
    fn test_identical_values_merge() {
        let a = CallSignCriterion::new("BRAVO");
        let b = CallSignCriterion::new("BRAVO");
        let composed = ComposedQuery::compose(&[&a, &b]).unwrap();
        assert_eq!(composed.bindings().len(), 1);
    }

    #[test]
    fn test_named_params_prefix_colon() {
        let location = LocationIdCriterion::new(8);
        let composed = ComposedQuery::compose(&[&location]).unwrap();
        let params = composed.named_params();
        assert_eq!(params.len(), 1);
        assert_eq!(params[0].0, ":location_id_sc_location_id");
    }
}
