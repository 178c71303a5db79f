//! Scene visual types, one per visual.
//!
//! ```ignore
//! use scene_ngin::scene::{Node, visuals};
//! use scene_ngin::visuals::BoxConfig;
//!
//! let root = Node::with_name("root");
//! let cube = visuals::Box::new(&BoxConfig::default(), Some(&root), Some("cube"))?;
//! ```

use crate::{
    scene::fusion::SceneVisual,
    visuals::{
        BoxVisual, EllipseVisual, ImageVisual, MeshVisual, RectangleVisual, RegularPolygonVisual,
    },
};

pub use crate::scene::fusion::{FusedType, Registry, registry};

pub type Mesh = SceneVisual<MeshVisual>;
pub type Box = SceneVisual<BoxVisual>;
pub type Rectangle = SceneVisual<RectangleVisual>;
pub type Ellipse = SceneVisual<EllipseVisual>;
pub type RegularPolygon = SceneVisual<RegularPolygonVisual>;
pub type Image = SceneVisual<ImageVisual>;
