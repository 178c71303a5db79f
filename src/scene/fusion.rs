//! Scene visuals: a [`Visual`] and a [`Node`] behind one value.

use std::{
    cell::{Ref, RefCell, RefMut},
    collections::BTreeMap,
    fmt,
    rc::Rc,
    sync::OnceLock,
};

use log::{debug, warn};

use crate::{
    error::{Result, SceneError},
    gloo::Gpu,
    scene::{
        docs::fused_description,
        node::{Node, SceneNode, SharedVisual},
    },
    visuals::{
        BoxVisual, EllipseVisual, ImageVisual, MeshVisual, RectangleVisual, RegularPolygonVisual,
        Visual, VisualConfig, VisualType,
    },
};

/// A visual living in the scene tree.
///
/// The node carries the visual, so traversing the tree reaches it, and this
/// value keeps typed access to it.
pub struct SceneVisual<V: Visual + 'static> {
    node: Node,
    visual: Rc<RefCell<V>>,
}

impl<V: Visual + 'static> SceneVisual<V> {
    /// Fixes `name`, runs `construct` with it, then creates the node and
    /// attaches it under `parent`.
    pub fn build(
        parent: Option<&Node>,
        name: Option<&str>,
        construct: impl FnOnce(Option<&str>) -> Result<V>,
    ) -> Result<Self> {
        let visual = Rc::new(RefCell::new(construct(name)?));
        let node = Node::with_optional_name(name.map(str::to_owned));
        let shared: SharedVisual = visual.clone();
        node.set_visual(shared);
        if let Some(parent) = parent {
            node.attach_to(parent)?;
        }
        debug!("created {} as {}", visual.borrow().type_name(), node);
        Ok(Self { node, visual })
    }

    pub fn visual(&self) -> Ref<'_, V> {
        self.visual.borrow()
    }

    pub fn visual_mut(&self) -> RefMut<'_, V> {
        self.visual.borrow_mut()
    }
}

impl<V: VisualType> SceneVisual<V> {
    pub fn new(config: &V::Config, parent: Option<&Node>, name: Option<&str>) -> Result<Self> {
        Self::build(parent, name, |_| V::build(config))
    }
}

impl<V: Visual + 'static> SceneNode for SceneVisual<V> {
    fn node(&self) -> &Node {
        &self.node
    }
}

/// `transform` is the view-projection; the node's world transform is applied
/// on top of it.
impl<V: Visual + 'static> Visual for SceneVisual<V> {
    fn type_name(&self) -> &'static str {
        self.visual.borrow().type_name()
    }

    fn draw(&mut self, gpu: &mut dyn Gpu, transform: &cgmath::Matrix4<f32>) -> Result<()> {
        let full = transform * self.node.world_transform();
        self.visual.borrow_mut().draw(gpu, &full)
    }

    fn release(&mut self, gpu: &mut dyn Gpu) {
        self.visual.borrow_mut().release(gpu)
    }
}

impl<V: Visual + 'static> fmt::Display for SceneVisual<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = self.type_name();
        let kind = kind.strip_suffix("Visual").unwrap_or(kind);
        match self.node.name() {
            Some(name) => write!(f, "<{} '{}'>", kind, name),
            None => write!(f, "<{}>", kind),
        }
    }
}

impl<V: Visual + 'static> fmt::Debug for SceneVisual<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneVisual")
            .field("visual", &self.type_name())
            .field("node", &self.node)
            .finish()
    }
}

pub type DynSceneVisual = SceneVisual<Box<dyn Visual>>;

/// Describes a visual type to the registry.
#[derive(Clone, Copy)]
pub struct VisualVariant {
    pub name: &'static str,
    pub description: &'static str,
    pub build: fn(&VisualConfig) -> Result<Box<dyn Visual>>,
}

impl VisualVariant {
    pub fn of<V: VisualType>() -> Self {
        Self {
            name: V::NAME,
            description: V::DESCRIPTION,
            build: build_variant::<V>,
        }
    }
}

impl fmt::Debug for VisualVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisualVariant")
            .field("name", &self.name)
            .finish()
    }
}

fn build_variant<V: VisualType>(config: &VisualConfig) -> Result<Box<dyn Visual>> {
    let config = V::config_of(config).ok_or(SceneError::TypeMismatch {
        slot: "visual configuration",
        expected: V::NAME,
        actual: config.kind_name(),
    })?;
    Ok(Box::new(V::build(config)?))
}

/// Every visual type shipped with the crate.
pub fn visual_variants() -> Vec<VisualVariant> {
    vec![
        VisualVariant::of::<MeshVisual>(),
        VisualVariant::of::<BoxVisual>(),
        VisualVariant::of::<RectangleVisual>(),
        VisualVariant::of::<EllipseVisual>(),
        VisualVariant::of::<RegularPolygonVisual>(),
        VisualVariant::of::<ImageVisual>(),
    ]
}

/// A visual type paired with the node behavior.
#[derive(Clone, Debug)]
pub struct FusedType {
    name: String,
    variant: VisualVariant,
    description: String,
}

impl FusedType {
    /// `Box` for `BoxVisual`.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn visual_name(&self) -> &'static str {
        self.variant.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn create(
        &self,
        config: &VisualConfig,
        parent: Option<&Node>,
        name: Option<&str>,
    ) -> Result<DynSceneVisual> {
        SceneVisual::build(parent, name, |_| (self.variant.build)(config))
    }
}

/// Fuses `variant` with the node behavior.
///
/// Returns `None` for the `Visual` base name and for names that do not end
/// in `Visual`.
pub fn fuse(variant: VisualVariant) -> Option<FusedType> {
    let name = match variant.name.strip_suffix("Visual") {
        Some("") => {
            debug!("not fusing the {} base", variant.name);
            return None;
        }
        Some(name) => name,
        None => {
            warn!("not fusing {}: name does not end in Visual", variant.name);
            return None;
        }
    };
    Some(FusedType {
        name: name.to_owned(),
        variant,
        description: fused_description(variant.description, variant.name),
    })
}

/// Fused types by name.
#[derive(Debug, Default)]
pub struct Registry {
    types: BTreeMap<String, FusedType>,
}

impl Registry {
    pub fn from_variants(variants: impl IntoIterator<Item = VisualVariant>) -> Self {
        let mut types = BTreeMap::new();
        for fused in variants.into_iter().filter_map(fuse) {
            debug!("registered scene visual {}", fused.name);
            if let Some(previous) = types.insert(fused.name.clone(), fused) {
                warn!("{} registered twice, keeping the last", previous.name);
            }
        }
        Self { types }
    }

    pub fn get(&self, name: &str) -> Option<&FusedType> {
        self.types.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FusedType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Creates a scene visual of the type registered as `type_name`.
    pub fn create(
        &self,
        type_name: &str,
        config: &VisualConfig,
        parent: Option<&Node>,
        name: Option<&str>,
    ) -> Result<DynSceneVisual> {
        self.get(type_name)
            .ok_or_else(|| {
                SceneError::invalid("type_name", format!("no scene visual named {:?}", type_name))
            })?
            .create(config, parent, name)
    }
}

/// The registry of every visual shipped with the crate, built on first use.
pub fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(|| Registry::from_variants(visual_variants()))
}
