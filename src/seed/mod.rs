pub mod data;

use crate::model::{MockDefinition, Project};
use crate::store::traits::ProjectStore;
use anyhow::Result;

/// The hard-coded fallback definitions that make a fresh install demoable
/// with zero authored data. Built once at process start and handed to the
/// resolution engine as a read-only dependency; authored data always wins
/// over these entries.
#[derive(Debug, Clone)]
pub struct SeedTable {
    definitions: Vec<MockDefinition>,
}

impl SeedTable {
    pub fn builtin() -> Self {
        Self::from_definitions(data::builtin_definitions())
    }

    pub fn from_definitions(definitions: Vec<MockDefinition>) -> Self {
        Self { definitions }
    }

    pub fn find(&self, method: &str, path: &str) -> Option<&MockDefinition> {
        self.definitions
            .iter()
            .find(|definition| definition.method == method && definition.path == path)
    }
}

/// Create the default project on first start so the authoring surface is
/// never empty. Idempotent: any existing project suppresses it.
pub async fn ensure_default_project<S: ProjectStore>(store: &S) -> Result<Option<Project>> {
    if !store.list_projects().await?.is_empty() {
        return Ok(None);
    }

    let project = Project::new(
        "Default Project".to_string(),
        Some("Default mock API project".to_string()),
    );
    store.upsert_project(project.clone()).await?;
    Ok(Some(project))
}
