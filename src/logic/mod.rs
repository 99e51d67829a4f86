pub mod fields;
pub mod resolve;

pub use fields::{detect_field_type, extract_fields, infer_param_value};
pub use resolve::{
    EndpointSource, Resolution, ResolveError, Resolver, SnapshotSource, StoreSource,
};
