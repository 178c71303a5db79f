//! The scene tree.
//!
//! A [`Node`] is a cheap, clonable handle. Parents hold their children
//! strongly and children point back weakly, so dropping the last handle to a
//! root drops the whole subtree.

use std::{
    cell::RefCell,
    fmt,
    rc::{Rc, Weak},
};

use cgmath::Matrix4;
use log::trace;

use crate::{
    error::{Result, SceneError},
    transforms::Transform,
    visuals::Visual,
};

pub(crate) type SharedVisual = Rc<RefCell<dyn Visual>>;

struct NodeData {
    name: Option<String>,
    parent: Weak<RefCell<NodeData>>,
    children: Vec<Node>,
    visible: bool,
    transform: Transform,
    /// Cached world transform. When a node holds a cached value, so does
    /// every ancestor.
    world: Option<Matrix4<f32>>,
    visual: Option<SharedVisual>,
}

#[derive(Clone)]
pub struct Node(Rc<RefCell<NodeData>>);

impl Node {
    pub fn new() -> Self {
        Self::with_optional_name(None)
    }

    pub fn with_name(name: impl Into<String>) -> Self {
        Self::with_optional_name(Some(name.into()))
    }

    pub fn with_optional_name(name: Option<String>) -> Self {
        Self(Rc::new(RefCell::new(NodeData {
            name,
            parent: Weak::new(),
            children: Vec::new(),
            visible: true,
            transform: Transform::Null,
            world: None,
            visual: None,
        })))
    }

    /// Creates a node already attached under `parent`.
    pub fn new_child(parent: &Node, name: Option<&str>) -> Self {
        let node = Self::with_optional_name(name.map(str::to_owned));
        parent.0.borrow_mut().children.push(node.clone());
        node.0.borrow_mut().parent = Rc::downgrade(&parent.0);
        node
    }

    pub fn name(&self) -> Option<String> {
        self.0.borrow().name.clone()
    }

    pub fn set_name(&self, name: Option<&str>) {
        self.0.borrow_mut().name = name.map(str::to_owned);
    }

    pub fn parent(&self) -> Option<Node> {
        self.0.borrow().parent.upgrade().map(Node)
    }

    /// Children in draw order.
    pub fn children(&self) -> Vec<Node> {
        self.0.borrow().children.clone()
    }

    pub fn child_count(&self) -> usize {
        self.0.borrow().children.len()
    }

    pub fn visible(&self) -> bool {
        self.0.borrow().visible
    }

    pub fn set_visible(&self, visible: bool) {
        self.0.borrow_mut().visible = visible;
    }

    pub fn transform(&self) -> Transform {
        self.0.borrow().transform
    }

    pub fn set_transform(&self, transform: impl Into<Transform>) {
        self.0.borrow_mut().transform = transform.into();
        self.invalidate();
    }

    /// Moves this node to the end of `parent`'s children.
    ///
    /// Fails with [`SceneError::Cycle`] when `parent` is this node or one of
    /// its descendants; the tree is left untouched in that case.
    pub fn attach_to(&self, parent: &Node) -> Result<()> {
        if self == parent || self.is_ancestor_of(parent) {
            return Err(SceneError::Cycle {
                child: self.to_string(),
                parent: parent.to_string(),
            });
        }
        self.unlink();
        parent.0.borrow_mut().children.push(self.clone());
        self.0.borrow_mut().parent = Rc::downgrade(&parent.0);
        self.invalidate();
        trace!("attached {} to {}", self, parent);
        Ok(())
    }

    /// Removes this node from its parent. No-op on a root.
    pub fn detach(&self) {
        if self.unlink() {
            self.invalidate();
            trace!("detached {}", self);
        }
    }

    fn unlink(&self) -> bool {
        let parent = std::mem::take(&mut self.0.borrow_mut().parent).upgrade();
        match parent {
            Some(parent) => {
                parent.borrow_mut().children.retain(|c| c != self);
                true
            }
            None => false,
        }
    }

    pub fn is_ancestor_of(&self, other: &Node) -> bool {
        let mut current = other.parent();
        while let Some(node) = current {
            if node == *self {
                return true;
            }
            current = node.parent();
        }
        false
    }

    pub fn root(&self) -> Node {
        let mut node = self.clone();
        while let Some(parent) = node.parent() {
            node = parent;
        }
        node
    }

    /// Product of the local transforms from the root down to this node.
    pub fn world_transform(&self) -> Matrix4<f32> {
        if let Some(world) = self.0.borrow().world {
            return world;
        }
        let local = self.0.borrow().transform.matrix();
        let world = match self.parent() {
            Some(parent) => parent.world_transform() * local,
            None => local,
        };
        self.0.borrow_mut().world = Some(world);
        world
    }

    pub fn has_cached_world_transform(&self) -> bool {
        self.0.borrow().world.is_some()
    }

    fn invalidate(&self) {
        let mut stack = vec![self.clone()];
        while let Some(node) = stack.pop() {
            let mut data = node.0.borrow_mut();
            data.world = None;
            stack.extend(data.children.iter().cloned());
        }
    }

    /// Depth-first pre-order walk starting at this node.
    pub fn visit(&self, visible_only: bool) -> Visit {
        Visit {
            stack: vec![self.clone()],
            visible_only,
        }
    }

    /// First node named `name` in [`Node::visit`] order, this node included.
    pub fn find(&self, name: &str) -> Option<Node> {
        self.visit(false)
            .find(|n| n.0.borrow().name.as_deref() == Some(name))
    }

    pub fn visual(&self) -> Option<SharedVisual> {
        self.0.borrow().visual.clone()
    }

    pub(crate) fn set_visual(&self, visual: SharedVisual) {
        self.0.borrow_mut().visual = Some(visual);
    }
}

impl Default for Node {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Node {}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.borrow().name {
            Some(name) => write!(f, "<Node '{}'>", name),
            None => write!(f, "<Node>"),
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        f.debug_struct("Node")
            .field("name", &data.name)
            .field("visible", &data.visible)
            .field("transform", &data.transform)
            .field("children", &data.children.len())
            .field("has_visual", &data.visual.is_some())
            .finish()
    }
}

/// Iterator returned by [`Node::visit`]. Children are read when their parent
/// is yielded, so changes made while iterating are picked up.
pub struct Visit {
    stack: Vec<Node>,
    visible_only: bool,
}

impl Iterator for Visit {
    type Item = Node;

    fn next(&mut self) -> Option<Node> {
        while let Some(node) = self.stack.pop() {
            if self.visible_only && !node.visible() {
                continue;
            }
            self.stack
                .extend(node.0.borrow().children.iter().rev().cloned());
            return Some(node);
        }
        None
    }
}

/// The tree capability, shared by plain nodes and fused scene visuals.
pub trait SceneNode {
    fn node(&self) -> &Node;

    fn name(&self) -> Option<String> {
        self.node().name()
    }

    fn parent(&self) -> Option<Node> {
        self.node().parent()
    }

    fn children(&self) -> Vec<Node> {
        self.node().children()
    }

    fn visible(&self) -> bool {
        self.node().visible()
    }

    fn set_visible(&self, visible: bool) {
        self.node().set_visible(visible)
    }

    fn transform(&self) -> Transform {
        self.node().transform()
    }

    fn set_transform(&self, transform: Transform) {
        self.node().set_transform(transform)
    }

    fn attach_to(&self, parent: &dyn SceneNode) -> Result<()> {
        self.node().attach_to(parent.node())
    }

    fn detach(&self) {
        self.node().detach()
    }

    fn world_transform(&self) -> Matrix4<f32> {
        self.node().world_transform()
    }

    fn visit(&self, visible_only: bool) -> Visit {
        self.node().visit(visible_only)
    }
}

impl SceneNode for Node {
    fn node(&self) -> &Node {
        self
    }
}
