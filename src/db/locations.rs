use rusqlite::{OptionalExtension, Row};

use super::models::{Location, NewLocation, NewRegion, Region};
use super::Database;
use crate::error::Result;

fn location_from_row(row: &Row<'_>) -> rusqlite::Result<Location> {
    Ok(Location {
        location_id: row.get(0)?,
        site_name: row.get(1)?,
        location: row.get(2)?,
        time_zone: row.get(3)?,
        region_id: row.get(4)?,
    })
}

impl Database {
    pub fn add_region(&self, region: &NewRegion) -> Result<i64> {
        let conn = self.handle()?;
        conn.execute(
            "INSERT INTO regions (name, summary) VALUES (:name, :summary)",
            rusqlite::named_params! { ":name": region.name, ":summary": region.summary },
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_region(&self, region_id: i64) -> Result<Option<Region>> {
        let conn = self.handle()?;
        let region = conn
            .query_row(
                "SELECT region_id, name, summary FROM regions WHERE region_id = :region_id",
                rusqlite::named_params! { ":region_id": region_id },
                |row| {
                    Ok(Region {
                        region_id: row.get(0)?,
                        name: row.get(1)?,
                        summary: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(region)
    }

    /// Delete a region. Locations in it keep existing with no region.
    pub fn delete_region(&self, region_id: i64) -> Result<usize> {
        let conn = self.handle()?;
        let deleted = conn.execute(
            "DELETE FROM regions WHERE region_id = :region_id",
            rusqlite::named_params! { ":region_id": region_id },
        )?;
        Ok(deleted)
    }

    pub fn add_location(&self, location: &NewLocation) -> Result<i64> {
        let conn = self.handle()?;
        conn.execute(
            "INSERT INTO locations (site_name, location, time_zone, region_id)
             VALUES (:site_name, :location, :time_zone, :region_id)",
            rusqlite::named_params! {
                ":site_name": location.site_name,
                ":location": location.location,
                ":time_zone": location.time_zone,
                ":region_id": location.region_id,
            },
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get_location(&self, location_id: i64) -> Result<Option<Location>> {
        let conn = self.handle()?;
        let location = conn
            .query_row(
                "SELECT location_id, site_name, location, time_zone, region_id
                 FROM locations WHERE location_id = :location_id",
                rusqlite::named_params! { ":location_id": location_id },
                location_from_row,
            )
            .optional()?;
        Ok(location)
    }

    pub fn update_location(&self, location_id: i64, location: &NewLocation) -> Result<usize> {
        let conn = self.handle()?;
        let updated = conn.execute(
            "UPDATE locations SET site_name = :site_name, location = :location,
                time_zone = :time_zone, region_id = :region_id
             WHERE location_id = :location_id",
            rusqlite::named_params! {
                ":location_id": location_id,
                ":site_name": location.site_name,
                ":location": location.location,
                ":time_zone": location.time_zone,
                ":region_id": location.region_id,
            },
        )?;
        Ok(updated)
    }

    /// Delete a location and, by cascade, its status reports.
    pub fn delete_location(&self, location_id: i64) -> Result<usize> {
        let conn = self.handle()?;
        let deleted = conn.execute(
            "DELETE FROM locations WHERE location_id = :location_id",
            rusqlite::named_params! { ":location_id": location_id },
        )?;
        Ok(deleted)
    }
}
