//! Core graph data structures

mod batch;
mod edge;
mod node;

pub use batch::{Batch, BatchId};
pub use edge::{predicate, Edge};
pub use node::{layer, EntityKind, MergeRule, Node, NodeId, Properties, PropertyValue};
