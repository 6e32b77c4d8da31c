use crate::ids::{ObjectId, ObjectIdGenerator};
use crate::model::{Batch, BatchChanges, BatchStatus, NewBatch, NewProject, Project, ProjectChanges};
use crate::pagination::{Page, PageRequest};
use regex::Regex;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, Value as SqlValue, ValueRef};
use rusqlite::{Connection, OptionalExtension, Row, ToSql, params, params_from_iter};
use shared::db::{Assignments, Database, DbError};
use shared::time::timestamp_now;
use std::sync::Arc;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL,
    location TEXT NOT NULL,
    hectares REAL,
    description TEXT,
    certifier TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS projects_name ON projects (name);

CREATE TABLE IF NOT EXISTS batches (
    id TEXT PRIMARY KEY NOT NULL,
    project_id TEXT NOT NULL,
    tons_co2 REAL NOT NULL,
    price_per_ton REAL NOT NULL,
    status TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS batches_project_id ON batches (project_id);
";

const PROJECT_COLUMNS: &str = "id, name, location, hectares, description, certifier, created_at";
const BATCH_COLUMNS: &str = "id, project_id, tons_co2, price_per_ton, status, created_at";

impl ToSql for BatchStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for BatchStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value
            .as_str()?
            .parse()
            .map_err(|e: String| FromSqlError::Other(e.into()))
    }
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        location: row.get(2)?,
        hectares: row.get(3)?,
        description: row.get(4)?,
        certifier: row.get(5)?,
        created_at: row.get(6)?,
    })
}

fn batch_from_row(row: &Row<'_>) -> rusqlite::Result<Batch> {
    Ok(Batch {
        id: row.get(0)?,
        project_id: row.get(1)?,
        tons_co2: row.get(2)?,
        price_per_ton: row.get(3)?,
        status: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Filters for `GET /batches`; both are exact matches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchFilter {
    pub project_id: Option<String>,
    pub status: Option<String>,
}

/// Projects and batches, kept in one SQLite database.
#[derive(Clone)]
pub struct ProjectStore {
    db: Database,
    ids: Arc<ObjectIdGenerator>,
}

impl ProjectStore {
    /// Wraps `db`, creating the tables and indexes if they are missing.
    pub async fn open(db: Database) -> Result<Self, DbError> {
        db.call(|conn| conn.execute_batch(SCHEMA)).await?;
        Ok(ProjectStore {
            db,
            ids: Arc::new(ObjectIdGenerator::new()),
        })
    }

    pub async fn create_project(&self, new: NewProject) -> Result<Project, DbError> {
        let project = Project {
            id: self.ids.generate().to_string(),
            name: new.name,
            location: new.location,
            hectares: new.hectares,
            description: new.description,
            certifier: new.certifier,
            created_at: timestamp_now(),
        };

        let row = project.clone();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO projects (id, name, location, hectares, description, certifier, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        row.id,
                        row.name,
                        row.location,
                        row.hectares,
                        row.description,
                        row.certifier,
                        row.created_at
                    ],
                )
            })
            .await?;
        Ok(project)
    }

    pub async fn get_project(&self, id: ObjectId) -> Result<Option<Project>, DbError> {
        let id = id.to_string();
        self.db.call(move |conn| select_project(conn, &id)).await
    }

    /// Newest first. `search` is matched against the name.
    pub async fn list_projects(
        &self,
        search: Option<Regex>,
        page: PageRequest,
    ) -> Result<Page<Project>, DbError> {
        self.db
            .call(move |conn| {
                let (data, total) = match search {
                    Some(pattern) => {
                        let mut stmt = conn.prepare(&format!(
                            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY id DESC"
                        ))?;
                        let matching = stmt
                            .query_map([], project_from_row)?
                            .filter(|row| {
                                row.as_ref().map_or(true, |p| pattern.is_match(&p.name))
                            })
                            .collect::<rusqlite::Result<Vec<_>>>()?;
                        let total = matching.len() as u64;
                        let data = matching
                            .into_iter()
                            .skip(page.offset() as usize)
                            .take(page.limit() as usize)
                            .collect();
                        (data, total)
                    }
                    None => {
                        let total: i64 =
                            conn.query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?;
                        let mut stmt = conn.prepare(&format!(
                            "SELECT {PROJECT_COLUMNS} FROM projects ORDER BY id DESC LIMIT ?1 OFFSET ?2"
                        ))?;
                        let data = stmt
                            .query_map(
                                params![page.limit() as i64, page.offset() as i64],
                                project_from_row,
                            )?
                            .collect::<rusqlite::Result<Vec<_>>>()?;
                        (data, total as u64)
                    }
                };

                Ok(Page {
                    data,
                    page: page.page,
                    page_size: page.page_size,
                    total,
                })
            })
            .await
    }

    /// Applies the supplied fields. `None` if the project does not exist.
    pub async fn update_project(
        &self,
        id: ObjectId,
        changes: ProjectChanges,
    ) -> Result<Option<Project>, DbError> {
        let id = id.to_string();
        let mut assignments = Assignments::default();
        assignments.set("name", changes.name.map(SqlValue::Text));
        assignments.set("location", changes.location.map(SqlValue::Text));
        assignments.set("hectares", changes.hectares.map(SqlValue::Real));
        assignments.set("description", changes.description.map(SqlValue::Text));
        assignments.set("certifier", changes.certifier.map(SqlValue::Text));

        self.db
            .call(move |conn| {
                assignments.apply(conn, "projects", &id)?;
                select_project(conn, &id)
            })
            .await
    }

    /// Returns whether a project was removed. Batches and orders referencing
    /// it are left alone.
    pub async fn delete_project(&self, id: ObjectId) -> Result<bool, DbError> {
        let id = id.to_string();
        let deleted = self
            .db
            .call(move |conn| conn.execute("DELETE FROM projects WHERE id = ?1", [id]))
            .await?;
        Ok(deleted > 0)
    }

    pub async fn create_batch(&self, new: NewBatch) -> Result<Batch, DbError> {
        let batch = Batch {
            id: self.ids.generate().to_string(),
            project_id: new.project_id,
            tons_co2: new.tons_co2,
            price_per_ton: new.price_per_ton,
            status: new.status,
            created_at: timestamp_now(),
        };

        let row = batch.clone();
        self.db
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO batches (id, project_id, tons_co2, price_per_ton, status, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        row.id,
                        row.project_id,
                        row.tons_co2,
                        row.price_per_ton,
                        row.status,
                        row.created_at
                    ],
                )
            })
            .await?;
        Ok(batch)
    }

    pub async fn get_batch(&self, id: ObjectId) -> Result<Option<Batch>, DbError> {
        let id = id.to_string();
        self.db.call(move |conn| select_batch(conn, &id)).await
    }

    pub async fn list_batches(
        &self,
        filter: BatchFilter,
        page: PageRequest,
    ) -> Result<Page<Batch>, DbError> {
        self.db
            .call(move |conn| {
                let mut conditions = Vec::new();
                let mut values = Vec::new();
                if let Some(project_id) = filter.project_id {
                    conditions.push("project_id = ?");
                    values.push(SqlValue::Text(project_id));
                }
                if let Some(status) = filter.status {
                    conditions.push("status = ?");
                    values.push(SqlValue::Text(status));
                }
                let where_clause = if conditions.is_empty() {
                    String::new()
                } else {
                    format!(" WHERE {}", conditions.join(" AND "))
                };

                let total: i64 = conn.query_row(
                    &format!("SELECT COUNT(*) FROM batches{where_clause}"),
                    params_from_iter(values.iter()),
                    |row| row.get(0),
                )?;

                values.push(SqlValue::Integer(page.limit() as i64));
                values.push(SqlValue::Integer(page.offset() as i64));
                let mut stmt = conn.prepare(&format!(
                    "SELECT {BATCH_COLUMNS} FROM batches{where_clause} ORDER BY id DESC LIMIT ? OFFSET ?"
                ))?;
                let data = stmt
                    .query_map(params_from_iter(values.iter()), batch_from_row)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;

                Ok(Page {
                    data,
                    page: page.page,
                    page_size: page.page_size,
                    total: total as u64,
                })
            })
            .await
    }

    pub async fn update_batch(
        &self,
        id: ObjectId,
        changes: BatchChanges,
    ) -> Result<Option<Batch>, DbError> {
        let id = id.to_string();
        let mut assignments = Assignments::default();
        assignments.set("project_id", changes.project_id.map(SqlValue::Text));
        assignments.set("tons_co2", changes.tons_co2.map(SqlValue::Real));
        assignments.set("price_per_ton", changes.price_per_ton.map(SqlValue::Real));
        assignments.set(
            "status",
            changes.status.map(|s| SqlValue::Text(s.as_str().into())),
        );

        self.db
            .call(move |conn| {
                assignments.apply(conn, "batches", &id)?;
                select_batch(conn, &id)
            })
            .await
    }

    pub async fn delete_batch(&self, id: ObjectId) -> Result<bool, DbError> {
        let id = id.to_string();
        let deleted = self
            .db
            .call(move |conn| conn.execute("DELETE FROM batches WHERE id = ?1", [id]))
            .await?;
        Ok(deleted > 0)
    }
}

fn select_project(conn: &Connection, id: &str) -> rusqlite::Result<Option<Project>> {
    conn.query_row(
        &format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?1"),
        [id],
        project_from_row,
    )
    .optional()
}

fn select_batch(conn: &Connection, id: &str) -> rusqlite::Result<Option<Batch>> {
    conn.query_row(
        &format!("SELECT {BATCH_COLUMNS} FROM batches WHERE id = ?1"),
        [id],
        batch_from_row,
    )
    .optional()
}
