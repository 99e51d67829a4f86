use crate::model::{Endpoint, EndpointWithGroup, Group, Id, Project};
use anyhow::Result;

#[async_trait::async_trait]
pub trait ProjectStore: Send + Sync {
    async fn get_project(&self, id: &Id) -> Result<Option<Project>>;
    /// Newest first.
    async fn list_projects(&self) -> Result<Vec<Project>>;
    async fn upsert_project(&self, project: Project) -> Result<()>;
    async fn delete_project(&self, id: &Id) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait GroupStore: Send + Sync {
    async fn get_group(&self, id: &Id) -> Result<Option<Group>>;
    async fn list_groups_for_project(&self, project_id: &Id) -> Result<Vec<Group>>;
    /// `(project_id, name)` is the find-or-create key used by endpoint
    /// authoring; name uniqueness within a project is not enforced by the
    /// schema.
    async fn find_group_by_name(&self, project_id: &Id, name: &str) -> Result<Option<Group>>;
    async fn upsert_group(&self, group: Group) -> Result<()>;
    /// Deleting a group cascades to every endpoint referencing it.
    async fn delete_group(&self, id: &Id) -> Result<bool>;
}

#[async_trait::async_trait]
pub trait EndpointStore: Send + Sync {
    async fn get_endpoint(&self, id: &Id) -> Result<Option<EndpointWithGroup>>;
    async fn list_endpoints(&self) -> Result<Vec<EndpointWithGroup>>;
    async fn list_endpoints_for_project(&self, project_id: &Id) -> Result<Vec<EndpointWithGroup>>;
    async fn upsert_endpoint(&self, endpoint: Endpoint) -> Result<()>;
    async fn delete_endpoint(&self, id: &Id) -> Result<bool>;
    /// All definitions whose stored path and method equal the arguments
    /// exactly, each with its group name. Rows come back in the store's
    /// natural order; duplicates for one `(path, method)` pair have no
    /// defined winner, and resolution simply takes the first row returned.
    async fn find_by_path_and_method(
        &self,
        path: &str,
        method: &str,
    ) -> Result<Vec<EndpointWithGroup>>;
}

pub trait Store: ProjectStore + GroupStore + EndpointStore + Send + Sync {}
