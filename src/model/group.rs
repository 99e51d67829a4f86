use crate::model::{generate_id, Id};
use serde::{Deserialize, Serialize};

/// A named bucket of endpoints within a project. Purely organizational:
/// grouping never influences mock resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: Id,
    pub name: String,
    pub project_id: Id,
    pub created_at: String, // ISO 8601 timestamp
}

impl Group {
    pub fn new(name: String, project_id: Id) -> Self {
        Self {
            id: generate_id(),
            name,
            project_id,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewGroup {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GroupRename {
    pub name: String,
}
