use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type Id = String;

/// Field types recognized by the response documentation tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Array,
    Object,
    Null,
}

pub fn generate_id() -> Id {
    Uuid::new_v4().to_string()
}
