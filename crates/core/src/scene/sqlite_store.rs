//! SQLite-backed scene repository.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use super::{IngestStatus, Scene, SceneError, SceneImage, SceneRepository};

const SCENE_COLUMNS: &str = "id, owner, name, datasource, ingest_status, ingest_location, images, created_at, modified_at, version";

/// SQLite-backed scene repository.
pub struct SqliteSceneRepository {
    conn: Mutex<Connection>,
}

impl SqliteSceneRepository {
    /// Open (or create) the database at `path`.
    pub fn new(path: &Path) -> Result<Self, SceneError> {
        let conn = Connection::open(path).map_err(|e| SceneError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory repository (useful for testing).
    pub fn in_memory() -> Result<Self, SceneError> {
        let conn =
            Connection::open_in_memory().map_err(|e| SceneError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), SceneError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS scenes (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                name TEXT NOT NULL DEFAULT '',
                datasource TEXT NOT NULL,
                ingest_status TEXT NOT NULL,
                ingest_location TEXT,
                images TEXT NOT NULL DEFAULT '[]',
                created_at TEXT NOT NULL,
                modified_at TEXT NOT NULL,
                version INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_scenes_ingest_status ON scenes(ingest_status);
            CREATE INDEX IF NOT EXISTS idx_scenes_owner ON scenes(owner);
            "#,
        )
        .map_err(|e| SceneError::Database(e.to_string()))
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, SceneError> {
        self.conn
            .lock()
            .map_err(|_| SceneError::Database("connection lock poisoned".to_string()))
    }

    fn row_to_scene(row: &rusqlite::Row) -> rusqlite::Result<Scene> {
        let status_str: String = row.get(4)?;
        let images_json: String = row.get(6)?;
        let created_at_str: String = row.get(7)?;
        let modified_at_str: String = row.get(8)?;
        let version: i64 = row.get(9)?;

        let ingest_status = status_str.parse::<IngestStatus>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                4,
                rusqlite::types::Type::Text,
                e.into(),
            )
        })?;

        let images: Vec<SceneImage> = serde_json::from_str(&images_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
        })?;

        Ok(Scene {
            id: row.get(0)?,
            owner: row.get(1)?,
            name: row.get(2)?,
            datasource: row.get(3)?,
            ingest_status,
            ingest_location: row.get(5)?,
            images,
            created_at: parse_timestamp(7, &created_at_str)?,
            modified_at: parse_timestamp(8, &modified_at_str)?,
            version: version.max(0) as u64,
        })
    }

    fn query_scene(conn: &Connection, id: &str) -> Result<Option<Scene>, SceneError> {
        conn.query_row(
            &format!("SELECT {} FROM scenes WHERE id = ?", SCENE_COLUMNS),
            params![id],
            Self::row_to_scene,
        )
        .optional()
        .map_err(|e| SceneError::Database(e.to_string()))
    }
}

fn parse_timestamp(column: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                column,
                rusqlite::types::Type::Text,
                Box::new(e),
            )
        })
}

fn images_to_json(images: &[SceneImage]) -> Result<String, SceneError> {
    serde_json::to_string(images).map_err(|e| SceneError::Database(e.to_string()))
}

impl SceneRepository for SqliteSceneRepository {
    fn get(&self, id: &str) -> Result<Scene, SceneError> {
        let conn = self.lock()?;
        Self::query_scene(&conn, id)?.ok_or_else(|| SceneError::NotFound(id.to_string()))
    }

    fn insert(&self, scene: &Scene) -> Result<Scene, SceneError> {
        let conn = self.lock()?;

        if Self::query_scene(&conn, &scene.id)?.is_some() {
            return Err(SceneError::AlreadyExists(scene.id.clone()));
        }

        conn.execute(
            &format!(
                "INSERT INTO scenes ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                SCENE_COLUMNS
            ),
            params![
                scene.id,
                scene.owner,
                scene.name,
                scene.datasource,
                scene.ingest_status.as_str(),
                scene.ingest_location,
                images_to_json(&scene.images)?,
                scene.created_at.to_rfc3339(),
                scene.modified_at.to_rfc3339(),
                scene.version as i64,
            ],
        )
        .map_err(|e| SceneError::Database(e.to_string()))?;

        Ok(scene.clone())
    }

    fn update(&self, scene: &Scene) -> Result<Scene, SceneError> {
        let conn = self.lock()?;
        let now = Utc::now();

        let changed = conn
            .execute(
                "UPDATE scenes SET owner = ?, name = ?, datasource = ?, ingest_status = ?, ingest_location = ?, images = ?, modified_at = ?, version = version + 1 WHERE id = ? AND version = ?",
                params![
                    scene.owner,
                    scene.name,
                    scene.datasource,
                    scene.ingest_status.as_str(),
                    scene.ingest_location,
                    images_to_json(&scene.images)?,
                    now.to_rfc3339(),
                    scene.id,
                    scene.version as i64,
                ],
            )
            .map_err(|e| SceneError::Database(e.to_string()))?;

        if changed == 0 {
            return match Self::query_scene(&conn, &scene.id)? {
                None => Err(SceneError::NotFound(scene.id.clone())),
                Some(current) => Err(SceneError::Conflict {
                    scene_id: scene.id.clone(),
                    expected: scene.version,
                    actual: current.version,
                }),
            };
        }

        Ok(Scene {
            modified_at: now,
            version: scene.version + 1,
            ..scene.clone()
        })
    }

    fn set_ingest_status(
        &self,
        id: &str,
        status: IngestStatus,
        location: Option<&str>,
    ) -> Result<Scene, SceneError> {
        let conn = self.lock()?;

        let changed = conn
            .execute(
                "UPDATE scenes SET ingest_status = ?, ingest_location = COALESCE(?, ingest_location), modified_at = ?, version = version + 1 WHERE id = ?",
                params![status.as_str(), location, Utc::now().to_rfc3339(), id],
            )
            .map_err(|e| SceneError::Database(e.to_string()))?;

        if changed == 0 {
            return Err(SceneError::NotFound(id.to_string()));
        }

        Self::query_scene(&conn, id)?.ok_or_else(|| SceneError::NotFound(id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Band;
    use tempfile::TempDir;

    fn sample_scene(id: &str) -> Scene {
        Scene::new(id, "owner-1", "datasource-1")
            .with_name("scene name")
            .with_image(SceneImage {
                source_uri: "s3://imagery/a.tif".to_string(),
                bands: vec![Band {
                    name: "red".to_string(),
                    number: 1,
                }],
            })
    }

    #[test]
    fn test_insert_and_get() {
        let repo = SqliteSceneRepository::in_memory().unwrap();
        repo.insert(&sample_scene("s1")).unwrap();

        let scene = repo.get("s1").unwrap();
        assert_eq!(scene.owner, "owner-1");
        assert_eq!(scene.ingest_status, IngestStatus::ToBeIngested);
        assert_eq!(scene.images.len(), 1);
        assert_eq!(scene.images[0].bands[0].name, "red");
        assert_eq!(scene.version, 0);
    }

    #[test]
    fn test_get_missing_is_not_found() {
        let repo = SqliteSceneRepository::in_memory().unwrap();
        assert!(matches!(repo.get("nope"), Err(SceneError::NotFound(_))));
    }

    #[test]
    fn test_insert_duplicate_fails() {
        let repo = SqliteSceneRepository::in_memory().unwrap();
        repo.insert(&sample_scene("s1")).unwrap();
        assert!(matches!(
            repo.insert(&sample_scene("s1")),
            Err(SceneError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_update_bumps_version() {
        let repo = SqliteSceneRepository::in_memory().unwrap();
        repo.insert(&sample_scene("s1")).unwrap();

        let mut scene = repo.get("s1").unwrap();
        scene.ingest_status = IngestStatus::Ingesting;
        let updated = repo.update(&scene).unwrap();
        assert_eq!(updated.version, 1);

        let stored = repo.get("s1").unwrap();
        assert_eq!(stored.ingest_status, IngestStatus::Ingesting);
        assert_eq!(stored.version, 1);
    }

    #[test]
    fn test_stale_update_conflicts() {
        let repo = SqliteSceneRepository::in_memory().unwrap();
        repo.insert(&sample_scene("s1")).unwrap();

        let mut first = repo.get("s1").unwrap();
        let mut second = repo.get("s1").unwrap();

        first.ingest_status = IngestStatus::Ingesting;
        repo.update(&first).unwrap();

        second.ingest_status = IngestStatus::Ingesting;
        let err = repo.update(&second).unwrap_err();
        assert!(matches!(
            err,
            SceneError::Conflict {
                expected: 0,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn test_update_missing_is_not_found() {
        let repo = SqliteSceneRepository::in_memory().unwrap();
        assert!(matches!(
            repo.update(&sample_scene("ghost")),
            Err(SceneError::NotFound(_))
        ));
    }

    #[test]
    fn test_set_ingest_status_ignores_version() {
        let repo = SqliteSceneRepository::in_memory().unwrap();
        repo.insert(&sample_scene("s1")).unwrap();

        let claimed = repo
            .update(&repo.get("s1").unwrap().with_status(IngestStatus::Ingesting))
            .unwrap();

        // Someone else edits the scene after our claim.
        let mut edited = repo.get("s1").unwrap();
        edited.name = "renamed".to_string();
        repo.update(&edited).unwrap();
        assert!(repo.update(&claimed).is_err());

        let stored = repo
            .set_ingest_status("s1", IngestStatus::Ingested, Some("s3://tiles/layers"))
            .unwrap();
        assert_eq!(stored.ingest_status, IngestStatus::Ingested);
        assert_eq!(stored.ingest_location.as_deref(), Some("s3://tiles/layers"));
        assert_eq!(stored.name, "renamed");
        assert_eq!(stored.version, 3);

        let failed = repo
            .set_ingest_status("s1", IngestStatus::Failed, None)
            .unwrap();
        assert_eq!(failed.ingest_location.as_deref(), Some("s3://tiles/layers"));
    }

    #[test]
    fn test_set_ingest_status_missing_is_not_found() {
        let repo = SqliteSceneRepository::in_memory().unwrap();
        assert!(matches!(
            repo.set_ingest_status("ghost", IngestStatus::Failed, None),
            Err(SceneError::NotFound(_))
        ));
    }

    #[test]
    fn test_corrupt_timestamp_is_an_error() {
        let repo = SqliteSceneRepository::in_memory().unwrap();
        repo.insert(&sample_scene("s1")).unwrap();
        repo.lock()
            .unwrap()
            .execute(
                "UPDATE scenes SET created_at = 'yesterday' WHERE id = ?",
                params!["s1"],
            )
            .unwrap();

        assert!(matches!(repo.get("s1"), Err(SceneError::Database(_))));
    }

    #[test]
    fn test_persists_across_connections() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("scenes.db");

        {
            let repo = SqliteSceneRepository::new(&db_path).unwrap();
            let mut scene = sample_scene("s1");
            scene.ingest_location = Some("s3://tiles/layers".to_string());
            repo.insert(&scene).unwrap();
        }

        let repo = SqliteSceneRepository::new(&db_path).unwrap();
        let scene = repo.get("s1").unwrap();
        assert_eq!(scene.ingest_location.as_deref(), Some("s3://tiles/layers"));
    }
}
