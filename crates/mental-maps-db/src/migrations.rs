use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                user_id     TEXT PRIMARY KEY,
                role        TEXT NOT NULL DEFAULT 'member'
                            CHECK (role IN ('member', 'moderator'))
            );

            CREATE TABLE maps (
                map_id      TEXT PRIMARY KEY,
                owner_id    TEXT NOT NULL REFERENCES users(user_id),
                title       TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                visibility  TEXT NOT NULL DEFAULT 'private'
                            CHECK (visibility IN ('private', 'public')),
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_maps_owner_updated
                ON maps(owner_id, updated_at);

            CREATE TABLE elements (
                element_id  TEXT PRIMARY KEY,
                map_id      TEXT NOT NULL REFERENCES maps(map_id),
                type        TEXT NOT NULL,
                x           REAL NOT NULL,
                y           REAL NOT NULL,
                content     TEXT NOT NULL DEFAULT '',
                style       TEXT NOT NULL DEFAULT '{}',
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_elements_map_created
                ON elements(map_id, created_at);

            CREATE TABLE reports (
                report_id   TEXT PRIMARY KEY,
                map_id      TEXT NOT NULL REFERENCES maps(map_id),
                author_id   TEXT NOT NULL REFERENCES users(user_id),
                reason      TEXT NOT NULL,
                comment     TEXT NOT NULL DEFAULT '',
                status      TEXT NOT NULL DEFAULT 'new'
                            CHECK (status IN ('new')),
                created_at  TEXT NOT NULL
            );

            CREATE INDEX idx_reports_status_created
                ON reports(status, created_at);

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
