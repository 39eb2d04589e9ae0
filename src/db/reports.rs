use rusqlite::{OptionalExtension, Row};

use super::models::{LocationStatusReport, NewLocationStatusReport};
use super::Database;
use crate::error::Result;
use crate::search::filters::normalize_timestamp;

pub(crate) fn report_from_row(row: &Row<'_>) -> rusqlite::Result<LocationStatusReport> {
    Ok(LocationStatusReport {
        report_id: row.get(0)?,
        agent_id: row.get(1)?,
        location_id: row.get(2)?,
        status: row.get(3)?,
        report_time: row.get(4)?,
        report_body: row.get(5)?,
    })
}

impl Database {
    /// File a report. `report_time` may carry any RFC 3339 offset; it is
    /// stored in UTC so time criteria compare it correctly as text.
    pub fn add_report(&self, report: &NewLocationStatusReport) -> Result<i64> {
        let report_time = normalize_timestamp("report time", &report.report_time)?;
        let conn = self.handle()?;
        conn.execute(
            "INSERT INTO location_status_reports (agent_id, location_id, status, report_time, report_body)
             VALUES (:agent_id, :location_id, :status, :report_time, :report_body)",
            rusqlite::named_params! {
                ":agent_id": report.agent_id,
                ":location_id": report.location_id,
                ":status": report.status,
                ":report_time": report_time,
                ":report_body": report.report_body,
            },
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_report(&self, report_id: i64) -> Result<Option<LocationStatusReport>> {
        let conn = self.handle()?;
        let report = conn
            .query_row(
                "SELECT report_id, agent_id, location_id, status, report_time, report_body
                 FROM location_status_reports WHERE report_id = :report_id",
                rusqlite::named_params! { ":report_id": report_id },
                report_from_row,
            )
            .optional()?;
        Ok(report)
    }

    pub fn delete_report(&self, report_id: i64) -> Result<usize> {
        let conn = self.handle()?;
        let deleted = conn.execute(
            "DELETE FROM location_status_reports WHERE report_id = :report_id",
            rusqlite::named_params! { ":report_id": report_id },
        )?;
        Ok(deleted)
    }
}
