//! Canonical registry: projects, media assets, multicam containers, and
//! graph snapshots, persisted in a local SQLite database.

use anyhow::Result;
use rusqlite::{params, Connection};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

mod model;

pub use model::{
    ContainerTrack, MediaAsset, MediaType, MultiCamContainer, Project, TranscriptWord,
};

pub fn app_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(std::env::temp_dir);
    base.join("storygraph")
}

pub struct RegistryDb {
    conn: Connection,
    path: PathBuf,
}

impl RegistryDb {
    pub fn open_or_create(path: &Path) -> Result<Self> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", &"WAL")?;
        conn.pragma_update(None, "synchronous", &"NORMAL")?;
        conn.pragma_update(None, "foreign_keys", &"ON")?;
        apply_migrations(&conn)?;
        Ok(Self { conn, path: path.to_path_buf() })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    // ---- projects ----

    pub fn create_project(&self, name: &str, description: Option<&str>) -> Result<Project> {
        let now = chrono::Utc::now().timestamp();
        let project = Project {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
            created_at: now,
            updated_at: now,
        };
        self.conn.execute(
            "INSERT INTO projects(id, name, description, created_at, updated_at) VALUES(?1, ?2, ?3, ?4, ?5)",
            params![project.id, project.name, project.description, now, now],
        )?;
        Ok(project)
    }

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, created_at, updated_at FROM projects ORDER BY created_at",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(Project {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                created_at: row.get(3)?,
                updated_at: row.get(4)?,
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    pub fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, description, created_at, updated_at FROM projects WHERE id = ?1",
        )?;
        let mut rows = stmt.query_map(params![id], |row| {
            Ok(Project {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
                created_at: row.get(3)?,
                updated_at: row.get(4)?,
            })
        })?;
        Ok(rows.next().transpose()?)
    }

    // ---- media assets ----

    /// Insert or replace every asset in one transaction. Batch ingest calls
    /// this once per completed batch so partial failures never land.
    pub fn bulk_upsert_assets(&mut self, assets: &[MediaAsset]) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let tx = self.conn.transaction()?;
        for asset in assets {
            let transcript_json = asset
                .transcript
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            tx.execute(
                "INSERT OR REPLACE INTO assets(file_name, project_id, clip_directory, file_path, media_type, start_tc, end_tc, duration, fps, resolution, scene, take_label, transcript_json, created_at, updated_at) \
                 VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)",
                params![
                    asset.file_name,
                    asset.project_id,
                    asset.clip_directory,
                    asset.file_path,
                    asset.media_type.as_str(),
                    asset.start_tc,
                    asset.end_tc,
                    asset.duration,
                    asset.fps,
                    asset.resolution,
                    asset.scene,
                    asset.take,
                    transcript_json,
                    now
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn list_assets(&self, project_id: &str) -> Result<Vec<MediaAsset>> {
        let mut stmt = self.conn.prepare(
            "SELECT file_name, project_id, clip_directory, file_path, media_type, start_tc, end_tc, duration, fps, resolution, scene, take_label, transcript_json \
             FROM assets WHERE project_id = ?1 ORDER BY file_name",
        )?;
        let rows = stmt.query_map(params![project_id], |row| {
            let media_type: String = row.get(4)?;
            let transcript_json: Option<String> = row.get(12)?;
            Ok(MediaAsset {
                file_name: row.get(0)?,
                project_id: row.get(1)?,
                clip_directory: row.get(2)?,
                file_path: row.get(3)?,
                media_type: MediaType::from_str_or_video(&media_type),
                start_tc: row.get(5)?,
                end_tc: row.get(6)?,
                duration: row.get(7)?,
                fps: row.get(8)?,
                resolution: row.get(9)?,
                scene: row.get(10)?,
                take: row.get(11)?,
                transcript: transcript_json
                    .as_deref()
                    .and_then(|j| serde_json::from_str(j).ok()),
            })
        })?;
        let mut out = Vec::new();
        for r in rows {
            out.push(r?);
        }
        Ok(out)
    }

    // ---- multicam containers ----

    pub fn bulk_upsert_containers(&mut self, containers: &[MultiCamContainer]) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        let tx = self.conn.transaction()?;
        for container in containers {
            let tracks_json = serde_json::to_string(&container.tracks)?;
            let transcript_json = container
                .transcript
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;
            tx.execute(
                "INSERT OR REPLACE INTO containers(id, project_id, name, fps, duration, start_tc, tracks_json, transcript_json, created_at, updated_at) \
                 VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                params![
                    container.id,
                    container.project_id,
                    container.name,
                    container.fps,
                    container.duration,
                    container.start_tc,
                    tracks_json,
                    transcript_json,
                    now
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    pub fn list_containers(&self, project_id: &str) -> Result<Vec<MultiCamContainer>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, project_id, name, fps, duration, start_tc, tracks_json, transcript_json \
             FROM containers WHERE project_id = ?1 ORDER BY created_at",
        )?;
        let rows = stmt.query_map(params![project_id], |row| {
            let tracks_json: String = row.get(6)?;
            let transcript_json: Option<String> = row.get(7)?;
            Ok((
                MultiCamContainer {
                    id: row.get(0)?,
                    project_id: row.get(1)?,
                    name: row.get(2)?,
                    fps: row.get(3)?,
                    duration: row.get(4)?,
                    start_tc: row.get(5)?,
                    tracks: Vec::new(),
                    transcript: None,
                },
                tracks_json,
                transcript_json,
            ))
        })?;
        let mut out = Vec::new();
        for r in rows {
            let (mut container, tracks_json, transcript_json) = r?;
            container.tracks = serde_json::from_str(&tracks_json)?;
            container.transcript = transcript_json
                .as_deref()
                .and_then(|j| serde_json::from_str(j).ok());
            out.push(container);
        }
        Ok(out)
    }

    // ---- graph snapshots ----

    pub fn put_graph(&self, project_id: &str, nodes: &Value, edges: &Value) -> Result<()> {
        let now = chrono::Utc::now().timestamp();
        self.conn.execute(
            "INSERT OR REPLACE INTO graphs(project_id, nodes_json, edges_json, updated_at) VALUES(?1, ?2, ?3, ?4)",
            params![project_id, nodes.to_string(), edges.to_string(), now],
        )?;
        Ok(())
    }

    pub fn get_graph(&self, project_id: &str) -> Result<Option<(Value, Value)>> {
        let mut stmt = self
            .conn
            .prepare("SELECT nodes_json, edges_json FROM graphs WHERE project_id = ?1")?;
        let mut rows = stmt.query_map(params![project_id], |row| {
            let nodes: String = row.get(0)?;
            let edges: String = row.get(1)?;
            Ok((nodes, edges))
        })?;
        match rows.next().transpose()? {
            Some((nodes, edges)) => Ok(Some((
                serde_json::from_str(&nodes)?,
                serde_json::from_str(&edges)?,
            ))),
            None => Ok(None),
        }
    }
}

fn apply_migrations(conn: &Connection) -> Result<()> {
    // Simple migration tracking by name
    conn.execute_batch(include_str!("../migrations/V0001__init.sql"))?;
    conn.execute(
        "INSERT OR IGNORE INTO migrations(name, applied_at) VALUES(?1, strftime('%s','now'))",
        params!["V0001__init"],
    )?;
    Ok(())
}
