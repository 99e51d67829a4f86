use crate::model::{generate_id, FieldType, Id};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// One authored response: a status code and the raw JSON text served for it.
/// The body is kept pre-serialized so it round-trips byte-for-byte; it is
/// parsed only at the moment of transmission.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusResponse {
    pub status: u16,
    pub body: String,
}

/// Mapping from status code to raw JSON text, in authored order.
///
/// Document order is significant: when a requested status is absent, the
/// first listed entry is served (see `logic::resolve`), so this cannot be a
/// plain `HashMap`. Serializes as a JSON object with stringified status keys.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResponseSet {
    entries: Vec<StatusResponse>,
}

impl ResponseSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries<I, B>(entries: I) -> Self
    where
        I: IntoIterator<Item = (u16, B)>,
        B: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(status, body)| StatusResponse {
                    status,
                    body: body.into(),
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Body for an exact status code, if authored.
    pub fn get(&self, status: u16) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.status == status)
            .map(|entry| entry.body.as_str())
    }

    /// First entry in authored order.
    pub fn first(&self) -> Option<&StatusResponse> {
        self.entries.first()
    }

    /// Replace the body for a status in place, or append a new entry.
    pub fn set(&mut self, status: u16, body: String) {
        match self.entries.iter_mut().find(|entry| entry.status == status) {
            Some(entry) => entry.body = body,
            None => self.entries.push(StatusResponse { status, body }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &StatusResponse> {
        self.entries.iter()
    }
}

impl Serialize for ResponseSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.status.to_string(), &entry.body)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ResponseSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ResponseSetVisitor;

        impl<'de> Visitor<'de> for ResponseSetVisitor {
            type Value = ResponseSet;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of status codes to raw JSON strings")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                while let Some((key, body)) = access.next_entry::<String, String>()? {
                    let status = key.parse::<u16>().map_err(|_| {
                        serde::de::Error::custom(format!("invalid status code key: {}", key))
                    })?;
                    entries.push(StatusResponse { status, body });
                }
                Ok(ResponseSet { entries })
            }
        }

        deserializer.deserialize_map(ResponseSetVisitor)
    }
}

/// Documentation for one field of a response body. `key` may be a dotted or
/// indexed path into the JSON (e.g. `items[0].id`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescription {
    pub key: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub description: String,
}

/// Example value and free-text description for one query parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryParamExample {
    pub value: serde_json::Value,
    pub description: String,
}

/// One row of the query-parameter editor: the raw value text is inferred
/// into a typed example on save (see `logic::fields::infer_param_value`).
#[derive(Debug, Clone, Deserialize)]
pub struct QueryParamRow {
    pub key: String,
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: Id,
    pub name: String,
    pub description: Option<String>,
    pub path: String,
    pub method: String,
    pub group_id: Id,
    pub responses: ResponseSet,
    #[serde(default)]
    pub field_descriptions: HashMap<u16, Vec<FieldDescription>>,
    pub request_body: Option<String>,
    #[serde(default)]
    pub query_params: HashMap<String, QueryParamExample>,
    pub created_at: String, // ISO 8601 timestamp
}

impl Endpoint {
    pub fn to_definition(&self) -> MockDefinition {
        MockDefinition {
            path: self.path.clone(),
            method: self.method.clone(),
            responses: self.responses.clone(),
        }
    }
}

/// Endpoint joined with the name of its group, as returned by store lookups.
/// The group name is carried for documentation and listing only; resolution
/// never consults it.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointWithGroup {
    #[serde(flatten)]
    pub endpoint: Endpoint,
    pub group: String,
}

/// The minimal endpoint-shaped record the resolution engine consumes.
/// Snapshot headers deserialize into this; extra authoring fields (id, name,
/// group, documentation) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MockDefinition {
    pub path: String,
    pub method: String,
    #[serde(default)]
    pub responses: ResponseSet,
}

fn default_group_name() -> String {
    "General".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewEndpoint {
    pub name: Option<String>,
    pub path: String,
    pub method: String,
    #[serde(default = "default_group_name")]
    pub group: String,
    pub description: Option<String>,
}

impl NewEndpoint {
    /// Build the stored endpoint, applying the same conveniences the
    /// authoring UI applied: path normalization, name fallback to
    /// description then path, method-dependent starter responses, and
    /// example query parameters for GET.
    pub fn into_endpoint(self, group_id: Id) -> Endpoint {
        let path = normalize_path(&self.path);
        let name = self
            .name
            .filter(|name| !name.is_empty())
            .or_else(|| self.description.clone().filter(|d| !d.is_empty()))
            .unwrap_or_else(|| path.clone());

        let responses = default_responses(&self.method);
        let query_params = default_query_params(&self.method);

        Endpoint {
            id: generate_id(),
            name,
            description: self.description,
            path,
            method: self.method,
            group_id,
            responses,
            field_descriptions: HashMap::new(),
            request_body: None,
            query_params,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub path: Option<String>,
    pub method: Option<String>,
}

impl EndpointUpdate {
    pub fn apply(self, endpoint: &mut Endpoint) {
        if let Some(name) = self.name {
            endpoint.name = name;
        }
        if let Some(description) = self.description {
            endpoint.description = Some(description);
        }
        if let Some(path) = self.path {
            endpoint.path = normalize_path(&path);
        }
        if let Some(method) = self.method {
            endpoint.method = method;
        }
    }
}

/// Stored paths always carry a leading slash; anything else is kept verbatim.
/// Matching is a literal string comparison, so `/users` and `users/` are
/// distinct definitions.
pub fn normalize_path(path: &str) -> String {
    if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    }
}

fn pretty(value: serde_json::Value) -> String {
    serde_json::to_string_pretty(&value).expect("static JSON literal serializes")
}

/// Starter responses for a newly authored endpoint. Write-style methods get a
/// 201 success entry, everything else a 200; both variants share the common
/// error statuses.
pub fn default_responses(method: &str) -> ResponseSet {
    let success: (u16, String) = if method == "POST" || method == "PUT" {
        (201, pretty(serde_json::json!({"message": "Created successfully"})))
    } else {
        (200, pretty(serde_json::json!({"message": "Success"})))
    };

    ResponseSet::from_entries([
        success,
        (400, pretty(serde_json::json!({"error": "Bad request"}))),
        (401, pretty(serde_json::json!({"error": "Unauthorized"}))),
        (403, pretty(serde_json::json!({"error": "Forbidden"}))),
        (404, pretty(serde_json::json!({"error": "Not found"}))),
        (500, pretty(serde_json::json!({"error": "Internal server error"}))),
    ])
}

fn default_query_params(method: &str) -> HashMap<String, QueryParamExample> {
    let mut params = HashMap::new();
    if method == "GET" {
        params.insert(
            "page".to_string(),
            QueryParamExample {
                value: serde_json::json!(1),
                description: String::new(),
            },
        );
        params.insert(
            "q".to_string(),
            QueryParamExample {
                value: serde_json::json!(""),
                description: String::new(),
            },
        );
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_set_preserves_document_order() {
        let json = r#"{"404": "{\"error\":\"missing\"}", "200": "{\"ok\":true}"}"#;
        let set: ResponseSet = serde_json::from_str(json).unwrap();

        assert_eq!(set.len(), 2);
        assert_eq!(set.first().unwrap().status, 404);
        assert_eq!(set.get(200), Some(r#"{"ok":true}"#));

        // Round-trip keeps the authored order, not numeric order
        let serialized = serde_json::to_string(&set).unwrap();
        let reparsed: ResponseSet = serde_json::from_str(&serialized).unwrap();
        assert_eq!(reparsed.first().unwrap().status, 404);
        assert_eq!(reparsed, set);
    }

    #[test]
    fn response_set_rejects_non_numeric_keys() {
        let result = serde_json::from_str::<ResponseSet>(r#"{"ok": "{}"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn response_set_set_replaces_in_place() {
        let mut set = ResponseSet::from_entries([(200, "{}"), (404, "{}")]);
        set.set(200, r#"{"changed":true}"#.to_string());

        assert_eq!(set.len(), 2);
        assert_eq!(set.first().unwrap().status, 200);
        assert_eq!(set.get(200), Some(r#"{"changed":true}"#));

        set.set(500, "{}".to_string());
        assert_eq!(set.len(), 3);
        assert_eq!(set.iter().last().unwrap().status, 500);
    }

    #[test]
    fn mock_definition_accepts_full_endpoint_records() {
        // A snapshot carries whatever the authoring side serializes; only
        // path, method and responses matter here.
        let json = r#"{
            "id": "ep-1",
            "name": "List users",
            "path": "/api/v1/users",
            "method": "GET",
            "group": "Users",
            "description": "something",
            "responses": {"200": "[]"},
            "fieldDescriptions": {}
        }"#;
        let definition: MockDefinition = serde_json::from_str(json).unwrap();
        assert_eq!(definition.path, "/api/v1/users");
        assert_eq!(definition.responses.get(200), Some("[]"));
    }

    #[test]
    fn mock_definition_defaults_missing_responses_to_empty() {
        let definition: MockDefinition =
            serde_json::from_str(r#"{"path": "/x", "method": "GET"}"#).unwrap();
        assert!(definition.responses.is_empty());
    }

    #[test]
    fn new_endpoint_normalizes_path_and_falls_back_name() {
        let new = NewEndpoint {
            name: None,
            path: "api/v1/orders".to_string(),
            method: "GET".to_string(),
            group: "General".to_string(),
            description: None,
        };
        let endpoint = new.into_endpoint("group-1".to_string());
        assert_eq!(endpoint.path, "/api/v1/orders");
        assert_eq!(endpoint.name, "/api/v1/orders");
        assert_eq!(endpoint.responses.first().unwrap().status, 200);
        assert!(endpoint.query_params.contains_key("page"));
    }

    #[test]
    fn write_methods_start_with_a_201_entry() {
        let responses = default_responses("POST");
        assert_eq!(responses.first().unwrap().status, 201);
        assert!(responses.get(201).unwrap().contains("Created successfully"));
        assert!(responses.get(200).is_none());

        let responses = default_responses("DELETE");
        assert_eq!(responses.first().unwrap().status, 200);
        assert!(default_query_params("DELETE").is_empty());
    }
}
