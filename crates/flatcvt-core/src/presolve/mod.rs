//! Value presolve: the provenance graph between model levels.
//!
//! - `node`      : value nodes and slot ranges
//! - `link`      : copy and one-to-many links
//! - `presolver` : link store, auto-link scopes, presolve/postsolve
//! - `export`    : JSON-lines link export

mod export;
mod link;
mod node;
mod presolver;

pub use export::LinkExporter;
pub use link::{Aggregation, Link};
pub use node::{NodeId, NodeRange, ValueKind, ValueNode};
pub use presolver::{ModelNodes, ModelValues, ValuePresolver};
