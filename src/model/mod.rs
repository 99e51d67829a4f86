pub mod common;
pub mod endpoint;
pub mod group;
pub mod project;

pub use common::*;
pub use endpoint::*;
pub use group::*;
pub use project::*;
