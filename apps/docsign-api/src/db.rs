//! sqlite-backed template store

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use docsign_core::{StoreError, TemplateStore};
use shared_types::{
    AnnotationRecord, AnnotationUpsert, FieldKind, NewSignatory, Signatory, Template,
};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use uuid::Uuid;

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

#[derive(Debug, Clone, FromRow)]
struct DbTemplate {
    id: String,
    file_id: String,
    created_at: DateTime<Utc>,
}

impl From<DbTemplate> for Template {
    fn from(row: DbTemplate) -> Self {
        Template {
            id: row.id,
            file_id: row.file_id,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct DbSignatory {
    id: String,
    created_at: DateTime<Utc>,
    name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    template_id: Option<String>,
}

impl From<DbSignatory> for Signatory {
    fn from(row: DbSignatory) -> Self {
        Signatory {
            id: row.id,
            created_at: row.created_at,
            name: row.name,
            email: row.email,
            phone: row.phone,
            template_id: row.template_id,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct DbAnnotation {
    id: String,
    name: Option<String>,
    description: Option<String>,
    required: bool,
    template_id: String,
    signatory_id: Option<String>,
    x: i64,
    y: i64,
    width: i64,
    height: i64,
    #[sqlx(rename = "type")]
    kind: String,
    page_number: i64,
}

impl TryFrom<DbAnnotation> for AnnotationRecord {
    type Error = StoreError;

    fn try_from(row: DbAnnotation) -> Result<Self, StoreError> {
        let kind = FieldKind::from_str(&row.kind).map_err(StoreError::InvalidRow)?;
        let page_number = u32::try_from(row.page_number).map_err(|_| {
            StoreError::InvalidRow(format!("annotation {} has page {}", row.id, row.page_number))
        })?;
        Ok(AnnotationRecord {
            id: row.id,
            name: row.name,
            description: row.description,
            required: row.required,
            template_id: row.template_id,
            signatory_id: row.signatory_id,
            x: row.x,
            y: row.y,
            width: row.width,
            height: row.height,
            kind,
            page_number,
        })
    }
}

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect and bring the schema up to date
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        tracing::info!("Connecting to database: {}", url);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;

        Self::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        tracing::info!("Running database migrations...");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS templates (
                id TEXT PRIMARY KEY,
                file_id TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS signatories (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL DEFAULT (datetime('now')),
                name TEXT,
                email TEXT,
                phone TEXT,
                template_id TEXT REFERENCES templates(id)
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS annotations (
                id TEXT PRIMARY KEY,
                name TEXT,
                description TEXT,
                required INTEGER NOT NULL DEFAULT 0,
                template_id TEXT NOT NULL REFERENCES templates(id),
                signatory_id TEXT REFERENCES signatories(id),
                x INTEGER NOT NULL,
                y INTEGER NOT NULL,
                width INTEGER NOT NULL,
                height INTEGER NOT NULL,
                type TEXT NOT NULL,
                page_number INTEGER NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
            "#,
        )
        .execute(pool)
        .await?;

        // Both child tables are always read by template
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_signatories_template ON signatories(template_id)
            "#,
        )
        .execute(pool)
        .await?;
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_annotations_template ON annotations(template_id)
            "#,
        )
        .execute(pool)
        .await?;

        tracing::info!("Migrations complete");
        Ok(())
    }
}

#[async_trait]
impl TemplateStore for SqliteStore {
    async fn create_template(&self, file_id: &str) -> Result<Template, StoreError> {
        let template = Template {
            id: Uuid::new_v4().to_string(),
            file_id: file_id.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query("INSERT INTO templates (id, file_id, created_at) VALUES (?, ?, ?)")
            .bind(&template.id)
            .bind(&template.file_id)
            .bind(template.created_at.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        tracing::info!("Created template: {}", template.id);
        Ok(template)
    }

    async fn get_template(&self, id: &str) -> Result<Option<Template>, StoreError> {
        let row: Option<DbTemplate> =
            sqlx::query_as("SELECT id, file_id, created_at FROM templates WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .map_err(backend)?;
        Ok(row.map(Template::from))
    }

    async fn insert_signatories(
        &self,
        template_id: &str,
        rows: Vec<NewSignatory>,
    ) -> Result<Vec<Signatory>, StoreError> {
        if self.get_template(template_id).await?.is_none() {
            return Err(StoreError::TemplateNotFound(template_id.to_string()));
        }

        let mut tx = self.pool.begin().await.map_err(backend)?;
        let mut created = Vec::with_capacity(rows.len());
        for row in rows {
            let signatory = Signatory {
                id: Uuid::new_v4().to_string(),
                created_at: Utc::now(),
                name: Some(row.name),
                email: Some(row.email),
                phone: Some(row.phone),
                template_id: Some(template_id.to_string()),
            };
            sqlx::query(
                r#"
                INSERT INTO signatories (id, created_at, name, email, phone, template_id)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&signatory.id)
            .bind(signatory.created_at.to_rfc3339())
            .bind(&signatory.name)
            .bind(&signatory.email)
            .bind(&signatory.phone)
            .bind(&signatory.template_id)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
            created.push(signatory);
        }
        tx.commit().await.map_err(backend)?;

        tracing::info!(
            "Added {} signatories to template {}",
            created.len(),
            template_id
        );
        Ok(created)
    }

    async fn list_signatories(&self, template_id: &str) -> Result<Vec<Signatory>, StoreError> {
        let rows: Vec<DbSignatory> = sqlx::query_as(
            r#"
            SELECT id, created_at, name, email, phone, template_id
            FROM signatories
            WHERE template_id = ?
            ORDER BY created_at, rowid
            "#,
        )
        .bind(template_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        Ok(rows.into_iter().map(Signatory::from).collect())
    }

    async fn list_annotations(
        &self,
        template_id: &str,
    ) -> Result<Vec<AnnotationRecord>, StoreError> {
        let rows: Vec<DbAnnotation> = sqlx::query_as(
            r#"
            SELECT id, name, description, required, template_id, signatory_id,
                   x, y, width, height, type, page_number
            FROM annotations
            WHERE template_id = ?
            ORDER BY rowid
            "#,
        )
        .bind(template_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;
        rows.into_iter().map(AnnotationRecord::try_from).collect()
    }

    async fn upsert_annotations(
        &self,
        rows: Vec<AnnotationUpsert>,
    ) -> Result<Vec<AnnotationRecord>, StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let mut saved = Vec::with_capacity(rows.len());

        for row in rows {
            let id = row
                .id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string());
            let record = row.into_record(id);

            let result = sqlx::query(
                r#"
                INSERT INTO annotations (id, name, description, required, template_id,
                                         signatory_id, x, y, width, height, type, page_number)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    description = excluded.description,
                    required = excluded.required,
                    signatory_id = excluded.signatory_id,
                    x = excluded.x,
                    y = excluded.y,
                    width = excluded.width,
                    height = excluded.height,
                    type = excluded.type,
                    page_number = excluded.page_number
                WHERE annotations.template_id = excluded.template_id
                "#,
            )
            .bind(&record.id)
            .bind(&record.name)
            .bind(&record.description)
            .bind(record.required)
            .bind(&record.template_id)
            .bind(&record.signatory_id)
            .bind(record.x)
            .bind(record.y)
            .bind(record.width)
            .bind(record.height)
            .bind(record.kind.as_str())
            .bind(i64::from(record.page_number))
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

            // The conflict guard skips rows owned by another template
            if result.rows_affected() == 0 {
                return Err(StoreError::ForeignAnnotation {
                    id: record.id,
                    template_id: record.template_id,
                });
            }

            saved.push(record);
        }

        tx.commit().await.map_err(backend)?;
        tracing::debug!("Upserted {} annotations", saved.len());
        Ok(saved)
    }
}
