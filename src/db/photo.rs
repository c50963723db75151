use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePool;

#[derive(Clone)]
pub struct PhotoStore {
    pool: SqlitePool,
}

/// Which stage of the job a site photo documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhotoTag {
    Before,
    During,
    After,
}

impl PhotoTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhotoTag::Before => "before",
            PhotoTag::During => "during",
            PhotoTag::After => "after",
        }
    }

    fn from_db(s: &str) -> Self {
        match s {
            "before" => PhotoTag::Before,
            "after" => PhotoTag::After,
            _ => PhotoTag::During,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Photo {
    pub id: i64,
    pub project_id: i64,
    pub caption: Option<String>,
    pub tag: PhotoTag,
    pub uploaded_by: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
    pub project_ref: String,
    pub project_address: String,
    pub uploader_name: Option<String>,
}

#[derive(sqlx::FromRow)]
struct PhotoRow {
    id: i64,
    project_id: i64,
    caption: Option<String>,
    tag: String,
    uploaded_by: Option<i64>,
    created_at: String,
    updated_at: String,
    project_ref: String,
    project_address: String,
    uploader_name: Option<String>,
}

impl From<PhotoRow> for Photo {
    fn from(row: PhotoRow) -> Self {
        Self {
            id: row.id,
            project_id: row.project_id,
            caption: row.caption,
            tag: PhotoTag::from_db(&row.tag),
            uploaded_by: row.uploaded_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
            project_ref: row.project_ref,
            project_address: row.project_address,
            uploader_name: row.uploader_name,
        }
    }
}

pub struct NewPhoto<'a> {
    pub project_id: i64,
    pub caption: Option<&'a str>,
    pub tag: PhotoTag,
    pub uploaded_by: i64,
}

#[derive(Debug, Default)]
pub struct PhotoFilter {
    pub project_id: Option<i64>,
    pub tag: Option<PhotoTag>,
}

impl PhotoStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, photo: &NewPhoto<'_>) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO photos (project_id, caption, tag, uploaded_by) VALUES (?, ?, ?, ?)",
        )
        .bind(photo.project_id)
        .bind(photo.caption)
        .bind(photo.tag.as_str())
        .bind(photo.uploaded_by)
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn get(&self, id: i64) -> Result<Option<Photo>, sqlx::Error> {
        let row: Option<PhotoRow> = sqlx::query_as(
            "SELECT ph.id, ph.project_id, ph.caption, ph.tag, ph.uploaded_by, ph.created_at, ph.updated_at,
                    p.ref AS project_ref, p.address AS project_address, u.name AS uploader_name
             FROM photos ph
             JOIN projects p ON p.id = ph.project_id
             LEFT JOIN users u ON u.id = ph.uploaded_by
             WHERE ph.id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Photo::from))
    }

    /// List photos matching the filter, newest first.
    pub async fn list(&self, filter: &PhotoFilter) -> Result<Vec<Photo>, sqlx::Error> {
        let tag = filter.tag.map(|t| t.as_str());
        let rows: Vec<PhotoRow> = sqlx::query_as(
            "SELECT ph.id, ph.project_id, ph.caption, ph.tag, ph.uploaded_by, ph.created_at, ph.updated_at,
                    p.ref AS project_ref, p.address AS project_address, u.name AS uploader_name
             FROM photos ph
             JOIN projects p ON p.id = ph.project_id
             LEFT JOIN users u ON u.id = ph.uploaded_by
             WHERE (? IS NULL OR ph.project_id = ?)
               AND (? IS NULL OR ph.tag = ?)
             ORDER BY ph.created_at DESC, ph.id DESC",
        )
        .bind(filter.project_id)
        .bind(filter.project_id)
        .bind(tag)
        .bind(tag)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Photo::from).collect())
    }

    /// Change the caption and/or tag. `None` keeps the current value.
    pub async fn update(
        &self,
        id: i64,
        caption: Option<&str>,
        tag: Option<PhotoTag>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE photos SET caption = COALESCE(?, caption), tag = COALESCE(?, tag), updated_at = datetime('now') WHERE id = ?",
        )
        .bind(caption)
        .bind(tag.map(|t| t.as_str()))
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM photos WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
