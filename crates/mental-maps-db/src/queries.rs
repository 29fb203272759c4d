use crate::Database;
use crate::models::{ElementRow, MapRow, ReportRow, UserRow};
use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{Connection, Row, params, params_from_iter};

const MAP_COLUMNS: &str =
    "map_id, owner_id, title, description, visibility, created_at, updated_at";
const ELEMENT_COLUMNS: &str = "element_id, map_id, type, x, y, content, style, created_at";
const REPORT_COLUMNS: &str = "report_id, map_id, author_id, reason, comment, status, created_at";

/// Predicate shared by the map page query and its count query.
#[derive(Debug, Clone)]
pub struct MapFilter<'a> {
    pub owner_id: &'a str,
    pub visibility: Option<&'a str>,
}

impl MapFilter<'_> {
    fn to_sql(&self) -> (String, Vec<Value>) {
        let mut clause = String::from(" WHERE owner_id = ?");
        let mut values = vec![Value::Text(self.owner_id.to_string())];
        if let Some(visibility) = self.visibility {
            clause.push_str(" AND visibility = ?");
            values.push(Value::Text(visibility.to_string()));
        }
        (clause, values)
    }
}

/// Predicate shared by the report page query and its count query.
#[derive(Debug, Clone, Default)]
pub struct ReportFilter<'a> {
    pub status: Option<&'a str>,
}

impl ReportFilter<'_> {
    fn to_sql(&self) -> (String, Vec<Value>) {
        match self.status {
            Some(status) => (" WHERE status = ?".into(), vec![Value::Text(status.to_string())]),
            None => (String::new(), Vec::new()),
        }
    }
}

impl Database {
    // -- Users --

    pub fn get_user(&self, user_id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT user_id, role FROM users WHERE user_id = ?1",
                [user_id],
                |row| {
                    Ok(UserRow {
                        user_id: row.get(0)?,
                        role: row.get(1)?,
                    })
                },
            )
            .optional()
        })
    }

    /// Insert a user or overwrite its role. Users are provisioned out of band;
    /// this exists for seeding.
    pub fn upsert_user(&self, user_id: &str, role: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (user_id, role) VALUES (?1, ?2)
                 ON CONFLICT(user_id) DO UPDATE SET role = excluded.role",
                (user_id, role),
            )?;
            Ok(())
        })
    }

    // -- Maps --

    pub fn insert_map(&self, map: &MapRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO maps (map_id, owner_id, title, description, visibility, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    map.map_id,
                    map.owner_id,
                    map.title,
                    map.description,
                    map.visibility,
                    map.created_at,
                    map.updated_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_map(&self, map_id: &str) -> Result<Option<MapRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {MAP_COLUMNS} FROM maps WHERE map_id = ?1"),
                [map_id],
                map_from_row,
            )
            .optional()
        })
    }

    pub fn map_exists(&self, map_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let found = conn
                .query_row("SELECT 1 FROM maps WHERE map_id = ?1", [map_id], |_| Ok(()))
                .optional()?;
            Ok(found.is_some())
        })
    }

    /// One page of maps, most recently updated first.
    pub fn list_maps(&self, filter: &MapFilter<'_>, limit: u32, offset: u64) -> Result<Vec<MapRow>> {
        let (clause, mut values) = filter.to_sql();
        values.push(Value::Integer(i64::from(limit)));
        values.push(Value::Integer(offset_param(offset)));
        let sql = format!(
            "SELECT {MAP_COLUMNS} FROM maps{clause}
             ORDER BY updated_at DESC, map_id DESC
             LIMIT ? OFFSET ?"
        );
        self.with_conn(|conn| query_all(conn, &sql, values, map_from_row))
    }

    pub fn count_maps(&self, filter: &MapFilter<'_>) -> Result<u64> {
        let (clause, values) = filter.to_sql();
        let sql = format!("SELECT COUNT(*) FROM maps{clause}");
        self.with_conn(|conn| count(conn, &sql, values))
    }

    // -- Elements --

    /// Insert an element and bump its map's `updated_at` to the element's
    /// `created_at`, atomically.
    pub fn insert_element(&self, element: &ElementRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.unchecked_transaction()?;
            tx.execute(
                "INSERT INTO elements (element_id, map_id, type, x, y, content, style, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    element.element_id,
                    element.map_id,
                    element.kind,
                    element.x,
                    element.y,
                    element.content,
                    element.style,
                    element.created_at,
                ],
            )?;
            tx.execute(
                "UPDATE maps SET updated_at = ?2 WHERE map_id = ?1",
                (&element.map_id, &element.created_at),
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    /// All elements of a map in insertion order.
    pub fn list_elements(&self, map_id: &str) -> Result<Vec<ElementRow>> {
        let sql = format!(
            "SELECT {ELEMENT_COLUMNS} FROM elements WHERE map_id = ?
             ORDER BY created_at ASC, rowid ASC"
        );
        self.with_conn(|conn| {
            query_all(conn, &sql, vec![Value::Text(map_id.to_string())], element_from_row)
        })
    }

    // -- Reports --

    pub fn insert_report(&self, report: &ReportRow) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO reports (report_id, map_id, author_id, reason, comment, status, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    report.report_id,
                    report.map_id,
                    report.author_id,
                    report.reason,
                    report.comment,
                    report.status,
                    report.created_at,
                ],
            )?;
            Ok(())
        })
    }

    /// One page of reports, newest first.
    pub fn list_reports(
        &self,
        filter: &ReportFilter<'_>,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<ReportRow>> {
        let (clause, mut values) = filter.to_sql();
        values.push(Value::Integer(i64::from(limit)));
        values.push(Value::Integer(offset_param(offset)));
        let sql = format!(
            "SELECT {REPORT_COLUMNS} FROM reports{clause}
             ORDER BY created_at DESC, report_id DESC
             LIMIT ? OFFSET ?"
        );
        self.with_conn(|conn| query_all(conn, &sql, values, report_from_row))
    }

    pub fn count_reports(&self, filter: &ReportFilter<'_>) -> Result<u64> {
        let (clause, values) = filter.to_sql();
        let sql = format!("SELECT COUNT(*) FROM reports{clause}");
        self.with_conn(|conn| count(conn, &sql, values))
    }
}

fn map_from_row(row: &Row<'_>) -> rusqlite::Result<MapRow> {
    Ok(MapRow {
        map_id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        visibility: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

fn element_from_row(row: &Row<'_>) -> rusqlite::Result<ElementRow> {
    Ok(ElementRow {
        element_id: row.get(0)?,
        map_id: row.get(1)?,
        kind: row.get(2)?,
        x: row.get(3)?,
        y: row.get(4)?,
        content: row.get(5)?,
        style: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<ReportRow> {
    Ok(ReportRow {
        report_id: row.get(0)?,
        map_id: row.get(1)?,
        author_id: row.get(2)?,
        reason: row.get(3)?,
        comment: row.get(4)?,
        status: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn query_all<T>(
    conn: &Connection,
    sql: &str,
    values: Vec<Value>,
    f: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt
        .query_map(params_from_iter(values), f)?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

fn count(conn: &Connection, sql: &str, values: Vec<Value>) -> Result<u64> {
    let n: i64 = conn.query_row(sql, params_from_iter(values), |row| row.get(0))?;
    Ok(u64::try_from(n).unwrap_or(0))
}

/// SQLite integers are signed; offsets past `i64::MAX` simply return nothing.
fn offset_param(offset: u64) -> i64 {
    i64::try_from(offset).unwrap_or(i64::MAX)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn open_db() -> (Database, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let db = Database::open_with_readers(&dir.path().join("test.db"), 2).expect("open db");
        db.upsert_user("u_alice", "member").unwrap();
        db.upsert_user("u_bob", "member").unwrap();
        (db, dir)
    }

    fn map_row(id: &str, owner: &str, visibility: &str, updated_at: &str) -> MapRow {
        MapRow {
            map_id: id.into(),
            owner_id: owner.into(),
            title: format!("title {id}"),
            description: String::new(),
            visibility: visibility.into(),
            created_at: "2026-01-01T00:00:00.000Z".into(),
            updated_at: updated_at.into(),
        }
    }

    fn element_row(id: &str, map_id: &str, created_at: &str) -> ElementRow {
        ElementRow {
            element_id: id.into(),
            map_id: map_id.into(),
            kind: "note".into(),
            x: 1.0,
            y: 2.5,
            content: String::new(),
            style: "{}".into(),
            created_at: created_at.into(),
        }
    }

    #[test]
    fn migrations_are_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("twice.db");
        Database::open(&path).unwrap().upsert_user("u_1", "member").unwrap();
        let db = Database::open(&path).unwrap();
        assert!(db.get_user("u_1").unwrap().is_some());
    }

    #[test]
    fn upsert_user_overwrites_role() {
        let (db, _dir) = open_db();
        db.upsert_user("u_alice", "moderator").unwrap();
        let user = db.get_user("u_alice").unwrap().unwrap();
        assert_eq!(user.role, "moderator");
        assert!(db.get_user("nobody").unwrap().is_none());
    }

    #[test]
    fn role_and_visibility_are_constrained() {
        let (db, _dir) = open_db();
        assert!(db.upsert_user("u_x", "admin").is_err());
        let bad = map_row("map_bad", "u_alice", "secret", "2026-01-01T00:00:00.000Z");
        assert!(db.insert_map(&bad).is_err());
    }

    #[test]
    fn map_listing_filters_orders_and_counts() {
        let (db, _dir) = open_db();
        db.insert_map(&map_row("map_a", "u_alice", "private", "2026-01-01T00:00:01.000Z")).unwrap();
        db.insert_map(&map_row("map_b", "u_alice", "public", "2026-01-01T00:00:03.000Z")).unwrap();
        db.insert_map(&map_row("map_c", "u_alice", "public", "2026-01-01T00:00:02.000Z")).unwrap();
        db.insert_map(&map_row("map_d", "u_bob", "public", "2026-01-01T00:00:09.000Z")).unwrap();

        let all = MapFilter { owner_id: "u_alice", visibility: None };
        let ids: Vec<_> = db.list_maps(&all, 10, 0).unwrap().into_iter().map(|m| m.map_id).collect();
        assert_eq!(ids, vec!["map_b", "map_c", "map_a"]);
        assert_eq!(db.count_maps(&all).unwrap(), 3);

        let public = MapFilter { owner_id: "u_alice", visibility: Some("public") };
        assert_eq!(db.count_maps(&public).unwrap(), 2);
        let page = db.list_maps(&public, 1, 1).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].map_id, "map_c");
    }

    #[test]
    fn filter_values_are_bound_not_interpolated() {
        let (db, _dir) = open_db();
        db.insert_map(&map_row("map_a", "u_alice", "private", "2026-01-01T00:00:01.000Z")).unwrap();
        let hostile = MapFilter { owner_id: "u_alice", visibility: Some("private' OR '1'='1") };
        assert_eq!(db.count_maps(&hostile).unwrap(), 0);
        let reports = ReportFilter { status: Some("new' OR '1'='1") };
        assert_eq!(db.count_reports(&reports).unwrap(), 0);
    }

    #[test]
    fn insert_element_touches_map() {
        let (db, _dir) = open_db();
        db.insert_map(&map_row("map_a", "u_alice", "private", "2026-01-01T00:00:01.000Z")).unwrap();
        db.insert_element(&element_row("el_2", "map_a", "2026-02-01T00:00:00.000Z")).unwrap();
        db.insert_element(&element_row("el_1", "map_a", "2026-02-01T00:00:00.000Z")).unwrap();

        let map = db.get_map("map_a").unwrap().unwrap();
        assert_eq!(map.updated_at, "2026-02-01T00:00:00.000Z");

        let ids: Vec<_> = db.list_elements("map_a").unwrap().into_iter().map(|e| e.element_id).collect();
        assert_eq!(ids, vec!["el_2", "el_1"]);
    }

    #[test]
    fn insert_element_requires_existing_map() {
        let (db, _dir) = open_db();
        assert!(db.insert_element(&element_row("el_1", "map_missing", "2026-02-01T00:00:00.000Z")).is_err());
        assert!(db.list_elements("map_missing").unwrap().is_empty());
    }

    #[test]
    fn reports_page_newest_first() {
        let (db, _dir) = open_db();
        db.insert_map(&map_row("map_a", "u_alice", "public", "2026-01-01T00:00:01.000Z")).unwrap();
        assert!(db.map_exists("map_a").unwrap());
        assert!(!db.map_exists("map_z").unwrap());

        for (id, ts) in [("rep_1", "2026-03-01T00:00:00.000Z"), ("rep_2", "2026-03-02T00:00:00.000Z")] {
            db.insert_report(&ReportRow {
                report_id: id.into(),
                map_id: "map_a".into(),
                author_id: "u_bob".into(),
                reason: "spam".into(),
                comment: String::new(),
                status: "new".into(),
                created_at: ts.into(),
            })
            .unwrap();
        }

        let all = ReportFilter::default();
        let ids: Vec<_> = db.list_reports(&all, 20, 0).unwrap().into_iter().map(|r| r.report_id).collect();
        assert_eq!(ids, vec!["rep_2", "rep_1"]);
        assert_eq!(db.count_reports(&ReportFilter { status: Some("new") }).unwrap(), 2);
        assert_eq!(db.count_reports(&ReportFilter { status: Some("resolved") }).unwrap(), 0);
    }
}
