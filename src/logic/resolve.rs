use anyhow::Result;

use crate::model::{normalize_path, MockDefinition, ResponseSet, StatusResponse};
use crate::seed::SeedTable;
use crate::store::traits::EndpointStore;

/// The single capability a resolver source exposes: every definition whose
/// stored path and method equal the arguments exactly, in the source's
/// natural order.
#[async_trait::async_trait]
pub trait EndpointSource: Send + Sync {
    async fn find_definitions(&self, method: &str, path: &str) -> Result<Vec<MockDefinition>>;
}

/// Request-scoped override definitions supplied by the caller. Immutable for
/// the lifetime of the request; an empty snapshot simply yields no matches,
/// deferring to the next source rather than claiming an authoritative miss.
pub struct SnapshotSource {
    definitions: Vec<MockDefinition>,
}

impl SnapshotSource {
    pub fn new(definitions: Vec<MockDefinition>) -> Self {
        Self { definitions }
    }
}

#[async_trait::async_trait]
impl EndpointSource for SnapshotSource {
    async fn find_definitions(&self, method: &str, path: &str) -> Result<Vec<MockDefinition>> {
        Ok(self
            .definitions
            .iter()
            .filter(|definition| definition.method == method && definition.path == path)
            .cloned()
            .collect())
    }
}

/// The durable definition store as a resolver source. The group name the
/// store returns alongside each row is dropped here; it never participates
/// in resolution.
pub struct StoreSource<'a, S: EndpointStore> {
    store: &'a S,
}

impl<'a, S: EndpointStore> StoreSource<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl<'a, S: EndpointStore> EndpointSource for StoreSource<'a, S> {
    async fn find_definitions(&self, method: &str, path: &str) -> Result<Vec<MockDefinition>> {
        let rows = self.store.find_by_path_and_method(path, method).await?;
        Ok(rows
            .into_iter()
            .map(|row| row.endpoint.to_definition())
            .collect())
    }
}

/// How to pick a response when the requested status is not an authored key.
/// Authored definitions fall back to the first listed entry; the seed table
/// falls back to its 200 entry specifically. The two policies are
/// intentionally different and must not be unified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusFallback {
    FirstListed,
    Fixed(u16),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved {
        status: u16,
        body: serde_json::Value,
    },
    NotFound {
        method: String,
        path: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The backing store call failed. Never folded into a not-found result.
    #[error("definition store lookup failed: {0}")]
    Store(anyhow::Error),
    /// A stored response value is not parseable JSON: authoring-side data
    /// corruption, surfaced as an internal error rather than substituted.
    #[error("stored response for status {status} is not valid JSON: {source}")]
    MalformedResponse {
        status: u16,
        source: serde_json::Error,
    },
}

/// The mock-response resolution engine. Pure over its inputs and a read-only
/// view of the sources; a fresh `Resolver` is built per request and nothing
/// is cached across invocations.
pub struct Resolver<'a> {
    authored: Vec<&'a dyn EndpointSource>,
    seed: &'a SeedTable,
}

impl<'a> Resolver<'a> {
    /// `authored` is consulted in order (override snapshot first, then the
    /// durable store); the seed table is always last.
    pub fn new(authored: Vec<&'a dyn EndpointSource>, seed: &'a SeedTable) -> Self {
        Self { authored, seed }
    }

    pub async fn resolve(
        &self,
        method: &str,
        path: &str,
        requested_status: u16,
    ) -> Result<Resolution, ResolveError> {
        let path = normalize_path(path);

        for source in &self.authored {
            let mut matches = source
                .find_definitions(method, &path)
                .await
                .map_err(ResolveError::Store)?;
            if matches.is_empty() {
                continue;
            }

            // First row in the source's natural order wins among duplicates.
            let definition = matches.remove(0);
            if let Some(selected) =
                select_response(&definition.responses, requested_status, StatusFallback::FirstListed)
            {
                return materialize(selected);
            }

            // The winning definition has an empty responses mapping. The
            // matching source won outright, so later authored sources are
            // not consulted; only the seed table remains.
            break;
        }

        if let Some(definition) = self.seed.find(method, &path) {
            if let Some(selected) = select_response(
                &definition.responses,
                requested_status,
                StatusFallback::Fixed(200),
            ) {
                return materialize(selected);
            }
        }

        Ok(Resolution::NotFound {
            method: method.to_string(),
            path,
        })
    }
}

/// Status selection within one definition. An exact key is served verbatim;
/// otherwise the fallback policy picks the entry, and the entry's own key
/// (never the requested one) becomes the reported status.
fn select_response(
    responses: &ResponseSet,
    requested: u16,
    fallback: StatusFallback,
) -> Option<StatusResponse> {
    if let Some(body) = responses.get(requested) {
        return Some(StatusResponse {
            status: requested,
            body: body.to_string(),
        });
    }

    match fallback {
        StatusFallback::FirstListed => responses.first().cloned(),
        StatusFallback::Fixed(status) => responses.get(status).map(|body| StatusResponse {
            status,
            body: body.to_string(),
        }),
    }
}

fn materialize(selected: StatusResponse) -> Result<Resolution, ResolveError> {
    let body = serde_json::from_str(&selected.body).map_err(|source| {
        ResolveError::MalformedResponse {
            status: selected.status,
            source,
        }
    })?;

    Ok(Resolution::Resolved {
        status: selected.status,
        body,
    })
}
