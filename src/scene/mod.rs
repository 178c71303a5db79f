//! Scenegraph.
//!
//! - `node` holds the tree: [`Node`] handles and the [`SceneNode`] capability
//! - `fusion` pairs visuals with nodes ([`SceneVisual`]) and keeps the
//!   [`Registry`] of fused types
//! - `visuals` names the fused type of every shipped visual
//! - `docs` generates the documentation of fused types

pub mod docs;
pub mod fusion;
pub mod node;
pub mod visuals;

pub use docs::{DocError, fused_description, merge_description};
pub use fusion::{
    DynSceneVisual, FusedType, Registry, SceneVisual, VisualVariant, fuse, registry,
    visual_variants,
};
pub use node::{Node, SceneNode, Visit};
