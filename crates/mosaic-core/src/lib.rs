pub mod content;
pub mod file;
pub mod geom;
pub mod id;
pub mod model;
pub mod project;

pub use file::{LoadError, from_json, to_json};
pub use id::{GroupId, NodeId, ProjectId};
pub use model::*;
pub use project::{
    ConnectionRecord, GroupRecord, NodeRecord, Project, ViewTransform, clamp_scale, safe_filename,
};

// Re-export petgraph types so downstream crates don't need a direct dependency
pub use petgraph::stable_graph::{EdgeIndex, NodeIndex};
