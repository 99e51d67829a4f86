use anyhow::{Context, Result};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use std::collections::HashMap;

use crate::model::{
    Endpoint, EndpointWithGroup, FieldDescription, Group, Id, Project, QueryParamExample,
    ResponseSet,
};
use crate::store::traits::{EndpointStore, GroupStore, ProjectStore, Store};

/// Idempotent schema setup. Response payloads and the documentation mappings
/// are stored as JSON text, not JSONB: JSONB re-sorts object keys, and the
/// authored order of `responses` is load-bearing for status fallback.
const MIGRATIONS: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS projects (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        created_at TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS groups (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        project_id TEXT NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_groups_project ON groups(project_id)",
    "CREATE TABLE IF NOT EXISTS endpoints (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        description TEXT,
        path TEXT NOT NULL,
        method TEXT NOT NULL,
        group_id TEXT NOT NULL REFERENCES groups(id) ON DELETE CASCADE,
        responses TEXT NOT NULL,
        field_descriptions TEXT NOT NULL,
        request_body TEXT,
        query_params TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_endpoints_group ON endpoints(group_id)",
    "CREATE INDEX IF NOT EXISTS idx_endpoints_path_method ON endpoints(path, method)",
];

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        for statement in MIGRATIONS {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .context("Failed to run database migrations")?;
        }
        Ok(())
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn endpoint_from_row(row: &sqlx::postgres::PgRow) -> Result<Endpoint> {
    let responses: String = row.get("responses");
    let field_descriptions: String = row.get("field_descriptions");
    let query_params: String = row.get("query_params");

    Ok(Endpoint {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        path: row.get("path"),
        method: row.get("method"),
        group_id: row.get("group_id"),
        responses: serde_json::from_str::<ResponseSet>(&responses)
            .context("Failed to decode stored responses mapping")?,
        field_descriptions: serde_json::from_str::<HashMap<u16, Vec<FieldDescription>>>(
            &field_descriptions,
        )
        .context("Failed to decode stored field descriptions")?,
        request_body: row.get("request_body"),
        query_params: serde_json::from_str::<HashMap<String, QueryParamExample>>(&query_params)
            .context("Failed to decode stored query params")?,
        created_at: row.get("created_at"),
    })
}

fn endpoint_with_group_from_row(row: &sqlx::postgres::PgRow) -> Result<EndpointWithGroup> {
    Ok(EndpointWithGroup {
        endpoint: endpoint_from_row(row)?,
        group: row.get("group_name"),
    })
}

const ENDPOINT_WITH_GROUP_SELECT: &str = "SELECT e.id, e.name, e.description, e.path, e.method, \
     e.group_id, e.responses, e.field_descriptions, e.request_body, e.query_params, \
     e.created_at, g.name AS group_name \
     FROM endpoints e JOIN groups g ON g.id = e.group_id";

#[async_trait::async_trait]
impl ProjectStore for PostgresStore {
    async fn get_project(&self, id: &Id) -> Result<Option<Project>> {
        let row = sqlx::query("SELECT id, name, description, created_at FROM projects WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch project")?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Project {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            created_at: row.get("created_at"),
        }))
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        let rows = sqlx::query(
            "SELECT id, name, description, created_at FROM projects ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list projects")?;

        let projects = rows
            .into_iter()
            .map(|row| Project {
                id: row.get("id"),
                name: row.get("name"),
                description: row.get("description"),
                created_at: row.get("created_at"),
            })
            .collect();

        Ok(projects)
    }

    async fn upsert_project(&self, project: Project) -> Result<()> {
        sqlx::query(
            "INSERT INTO projects (id, name, description, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (id) DO UPDATE SET
                 name = EXCLUDED.name,
                 description = EXCLUDED.description",
        )
        .bind(&project.id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(&project.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to upsert project")?;

        Ok(())
    }

    async fn delete_project(&self, id: &Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete project")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl GroupStore for PostgresStore {
    async fn get_group(&self, id: &Id) -> Result<Option<Group>> {
        let row =
            sqlx::query("SELECT id, name, project_id, created_at FROM groups WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await
                .context("Failed to fetch group")?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Group {
            id: row.get("id"),
            name: row.get("name"),
            project_id: row.get("project_id"),
            created_at: row.get("created_at"),
        }))
    }

    async fn list_groups_for_project(&self, project_id: &Id) -> Result<Vec<Group>> {
        let rows = sqlx::query(
            "SELECT id, name, project_id, created_at FROM groups
             WHERE project_id = $1 ORDER BY created_at",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list groups")?;

        let groups = rows
            .into_iter()
            .map(|row| Group {
                id: row.get("id"),
                name: row.get("name"),
                project_id: row.get("project_id"),
                created_at: row.get("created_at"),
            })
            .collect();

        Ok(groups)
    }

    async fn find_group_by_name(&self, project_id: &Id, name: &str) -> Result<Option<Group>> {
        let row = sqlx::query(
            "SELECT id, name, project_id, created_at FROM groups
             WHERE project_id = $1 AND name = $2 LIMIT 1",
        )
        .bind(project_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to find group by name")?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Group {
            id: row.get("id"),
            name: row.get("name"),
            project_id: row.get("project_id"),
            created_at: row.get("created_at"),
        }))
    }

    async fn upsert_group(&self, group: Group) -> Result<()> {
        sqlx::query(
            "INSERT INTO groups (id, name, project_id, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (id) DO UPDATE SET
                 name = EXCLUDED.name,
                 project_id = EXCLUDED.project_id",
        )
        .bind(&group.id)
        .bind(&group.name)
        .bind(&group.project_id)
        .bind(&group.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to upsert group")?;

        Ok(())
    }

    async fn delete_group(&self, id: &Id) -> Result<bool> {
        // Endpoint rows go with the group via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete group")?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl EndpointStore for PostgresStore {
    async fn get_endpoint(&self, id: &Id) -> Result<Option<EndpointWithGroup>> {
        let row = sqlx::query(&format!("{} WHERE e.id = $1", ENDPOINT_WITH_GROUP_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch endpoint")?;

        match row {
            Some(row) => Ok(Some(endpoint_with_group_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_endpoints(&self) -> Result<Vec<EndpointWithGroup>> {
        let rows = sqlx::query(ENDPOINT_WITH_GROUP_SELECT)
            .fetch_all(&self.pool)
            .await
            .context("Failed to list endpoints")?;

        rows.iter().map(endpoint_with_group_from_row).collect()
    }

    async fn list_endpoints_for_project(&self, project_id: &Id) -> Result<Vec<EndpointWithGroup>> {
        let rows = sqlx::query(&format!(
            "{} WHERE g.project_id = $1",
            ENDPOINT_WITH_GROUP_SELECT
        ))
        .bind(project_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list endpoints for project")?;

        rows.iter().map(endpoint_with_group_from_row).collect()
    }

    async fn upsert_endpoint(&self, endpoint: Endpoint) -> Result<()> {
        let responses = serde_json::to_string(&endpoint.responses)
            .context("Failed to encode responses mapping")?;
        let field_descriptions = serde_json::to_string(&endpoint.field_descriptions)
            .context("Failed to encode field descriptions")?;
        let query_params = serde_json::to_string(&endpoint.query_params)
            .context("Failed to encode query params")?;

        sqlx::query(
            "INSERT INTO endpoints (id, name, description, path, method, group_id,
                 responses, field_descriptions, request_body, query_params, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
             ON CONFLICT (id) DO UPDATE SET
                 name = EXCLUDED.name,
                 description = EXCLUDED.description,
                 path = EXCLUDED.path,
                 method = EXCLUDED.method,
                 group_id = EXCLUDED.group_id,
                 responses = EXCLUDED.responses,
                 field_descriptions = EXCLUDED.field_descriptions,
                 request_body = EXCLUDED.request_body,
                 query_params = EXCLUDED.query_params",
        )
        .bind(&endpoint.id)
        .bind(&endpoint.name)
        .bind(&endpoint.description)
        .bind(&endpoint.path)
        .bind(&endpoint.method)
        .bind(&endpoint.group_id)
        .bind(&responses)
        .bind(&field_descriptions)
        .bind(&endpoint.request_body)
        .bind(&query_params)
        .bind(&endpoint.created_at)
        .execute(&self.pool)
        .await
        .context("Failed to upsert endpoint")?;

        Ok(())
    }

    async fn delete_endpoint(&self, id: &Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM endpoints WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete endpoint")?;

        Ok(result.rows_affected() > 0)
    }

    async fn find_by_path_and_method(
        &self,
        path: &str,
        method: &str,
    ) -> Result<Vec<EndpointWithGroup>> {
        // Deliberately no ORDER BY: the tie-break among duplicate
        // (path, method) rows is the store's natural return order.
        let rows = sqlx::query(&format!(
            "{} WHERE e.path = $1 AND e.method = $2",
            ENDPOINT_WITH_GROUP_SELECT
        ))
        .bind(path)
        .bind(method)
        .fetch_all(&self.pool)
        .await
        .context("Failed to find endpoints by path and method")?;

        rows.iter().map(endpoint_with_group_from_row).collect()
    }
}

impl Store for PostgresStore {}
