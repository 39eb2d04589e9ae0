pub mod compose;
pub mod criteria;
pub mod filters;

use rusqlite::Row;
use serde::Serialize;
use tracing::debug;

use crate::db::models::LocationStatusReport;
use crate::db::reports::report_from_row;
use crate::db::Database;
use crate::error::Result;
use compose::ComposedQuery;
use criteria::ReportSearchCriterion;
use filters::ApiReportSearchCriterion;

/// Base query for report search. The composer appends the WHERE clause.
const REPORT_SEARCH_SQL: &str =
    "SELECT r.report_id, r.agent_id, r.location_id, r.status, r.report_time, r.report_body
     FROM location_status_reports r
     JOIN agents a ON a.agent_id = r.agent_id";

#[derive(Debug, Clone, Serialize)]
pub struct ReportSearchOutput {
    pub total: usize,
    pub reports: Vec<LocationStatusReport>,
}

impl Database {
    /// Execute a base query with a composed WHERE clause, binding the merged
    /// named parameters. Rows come back in the database's natural order.
    pub fn query_composed<T, F>(
        &self,
        base_sql: &str,
        composed: &ComposedQuery,
        map_row: F,
    ) -> Result<Vec<T>>
    where
        F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
    {
        let sql = composed.apply_to(base_sql);
        debug!("Executing search: {sql}");

        let conn = self.handle()?;
        let mut stmt = conn.prepare(&sql)?;

        let named = composed.named_params();
        let param_refs: Vec<(&str, &dyn rusqlite::types::ToSql)> =
            named.iter().map(|(name, value)| (name.as_str(), *value)).collect();

        let rows = stmt.query_map(param_refs.as_slice(), map_row)?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Search location status reports matching every criterion.
    pub fn search_reports(
        &self,
        criteria: &[&dyn ReportSearchCriterion],
    ) -> Result<Vec<LocationStatusReport>> {
        let composed = ComposedQuery::compose(criteria)?;
        self.query_composed(REPORT_SEARCH_SQL, &composed, report_from_row)
    }

    /// Search using boundary-validated criteria.
    pub fn search_reports_by(
        &self,
        criteria: &[ApiReportSearchCriterion],
    ) -> Result<Vec<LocationStatusReport>> {
        let storage: Vec<&dyn ReportSearchCriterion> =
            criteria.iter().map(|c| c.criterion()).collect();
        self.search_reports(&storage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::{new_agent, new_location, new_report, seed_users, temp_db};
    use crate::error::Error;
    use crate::search::criteria::{Bindings, CallSignCriterion, LocationIdCriterion};
    use filters::ReportSearchParams;
    use rusqlite::types::Value;

    struct Fixture {
        _dir: tempfile::TempDir,
        db: Database,
        dock: i64,
        airfield: i64,
        alpha_report: i64,
    }

    fn fixture() -> Fixture {
        let (dir, db) = temp_db();
        seed_users(&db, 2);
        let alpha = db.add_agent(&new_agent("ALPHA-1", 1)).unwrap();
        let bravo = db.add_agent(&new_agent("BRAVO-2", 2)).unwrap();
        let dock = db.add_location(&new_location("Dock 7", None)).unwrap();
        let airfield = db.add_location(&new_location("Airfield", None)).unwrap();

        let alpha_report = db
            .add_report(&new_report(alpha, dock, "2024-01-10T09:00:00Z"))
            .unwrap();
        db.add_report(&new_report(bravo, dock, "2024-02-10T09:00:00Z"))
            .unwrap();
        db.add_report(&new_report(bravo, airfield, "2024-03-10T09:00:00Z"))
            .unwrap();

        Fixture {
            _dir: dir,
            db,
            dock,
            airfield,
            alpha_report,
        }
    }

    #[derive(Debug)]
    struct StatusAbove(i64);

    impl ReportSearchCriterion for StatusAbove {
        fn sql_fragment(&self) -> String {
            "status > :call_sign_sc_call_sign".to_string()
        }

        fn bindings(&self) -> Bindings {
            let mut b = Bindings::new();
            b.insert("call_sign_sc_call_sign".to_string(), Value::Integer(self.0));
            b
        }
    }

    #[test]
    fn test_no_criteria_returns_all_rows() {
        let f = fixture();
        assert_eq!(f.db.search_reports(&[]).unwrap().len(), 3);
    }

    #[test]
    fn test_no_ordering_imposed() {
        let composed = ComposedQuery::compose(&[]).unwrap();
        assert!(!composed.apply_to(REPORT_SEARCH_SQL).contains("ORDER BY"));

        let call_sign = CallSignCriterion::new("BRAVO-2");
        let composed = ComposedQuery::compose(&[&call_sign]).unwrap();
        assert!(!composed.apply_to(REPORT_SEARCH_SQL).contains("ORDER BY"));
    }

    #[test]
    fn test_two_criteria_single_match() {
        let f = fixture();
        let call_sign = CallSignCriterion::new("ALPHA-1");
        let location = LocationIdCriterion::new(f.dock);

        let results = f.db.search_reports(&[&call_sign, &location]).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].report_id, f.alpha_report);
    }

    #[test]
    fn test_two_criteria_no_match_is_empty() {
        let f = fixture();
        let call_sign = CallSignCriterion::new("ALPHA-1");
        let location = LocationIdCriterion::new(f.airfield);

        let results = f.db.search_reports(&[&call_sign, &location]).unwrap();
        assert!(results.is_empty());
    }

    #[test]
    fn test_collision_fails_before_execution() {
        // The database file is removed first: a query would fail with a
        // storage error, so getting BindingCollision proves nothing ran.
        let f = fixture();
        std::fs::remove_dir_all(f._dir.path()).unwrap();

        let call_sign = CallSignCriterion::new("ALPHA-1");
        let status = StatusAbove(10);
        let err = f.db.search_reports(&[&call_sign, &status]).unwrap_err();
        assert!(matches!(err, Error::BindingCollision { .. }));
    }

    #[test]
    fn test_search_by_params_with_time_range() {
        let f = fixture();
        let params = ReportSearchParams {
            call_sign: Some("BRAVO-2".to_string()),
            from_time: Some("2024-02-01T00:00:00Z".to_string()),
            to_time: Some("2024-02-28T23:59:59+00:00".to_string()),
            ..Default::default()
        };
        let criteria = params.to_criteria().unwrap();
        let results = f.db.search_reports_by(&criteria).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].location_id, f.dock);
    }

    #[test]
    fn test_filter_values_are_not_interpolated() {
        let f = fixture();
        let hostile = CallSignCriterion::new("x' OR '1'='1");
        assert!(f.db.search_reports(&[&hostile]).unwrap().is_empty());
    }

    #[test]
    fn test_storage_failure_propagates() {
        let f = fixture();
        let conn = f.db.handle().unwrap();
        conn.execute_batch("DROP TABLE location_status_reports;").unwrap();
        drop(conn);

        let err = f.db.search_reports(&[]).unwrap_err();
        assert!(matches!(err, Error::Storage { .. }));
    }
}
