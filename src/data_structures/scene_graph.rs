//! Scene graph and hierarchical scene organization.
//!
//! Nodes own their children. Each node keeps a local transform relative to
//! its parent and a cached world transform; drawable nodes carry a [`Mesh`]
//! whose geometry and material may be shared with other nodes.

use std::rc::Rc;

use log::warn;

use crate::data_structures::{geometry::Geometry, instance::Instance, material::Material};

/// A drawable: shared geometry plus shared material.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub geometry: Rc<Geometry>,
    pub material: Rc<Material>,
}

impl Mesh {
    pub fn new(geometry: Rc<Geometry>, material: Rc<Material>) -> Self {
        Self { geometry, material }
    }

    /// Whether both meshes point at the very same geometry and material.
    pub fn shares_resources_with(&self, other: &Mesh) -> bool {
        Rc::ptr_eq(&self.geometry, &other.geometry) && Rc::ptr_eq(&self.material, &other.material)
    }
}

pub trait SceneNode {
    fn name(&self) -> &str;

    fn get_local_transform(&self) -> &Instance;

    fn set_local_transform(&mut self, instance: Instance);

    fn get_world_transform(&self) -> &Instance;

    fn get_children(&self) -> &Vec<Box<dyn SceneNode>>;

    fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>>;

    fn add_child(&mut self, child: Box<dyn SceneNode>);

    fn mesh(&self) -> Option<&Mesh> {
        None
    }

    /**
     * Recomputes this node's world transform from its parent's and passes it
     * down to all children.
     */
    fn update_world_transforms(&mut self, parent_world_transform: &Instance);

    fn update_world_transform_all(&mut self) {
        self.update_world_transforms(&Instance::default());
    }
}

/// Shared bookkeeping of every node kind.
struct NodeCore {
    name: String,
    local: Instance,
    world: Instance,
    children: Vec<Box<dyn SceneNode>>,
}

impl NodeCore {
    fn new(name: &str, local: Instance) -> Self {
        Self {
            name: name.to_string(),
            world: local.clone(),
            local,
            children: Vec::new(),
        }
    }

    fn update_world_transforms(&mut self, parent_world_transform: &Instance) {
        self.world = parent_world_transform * &self.local;
        for child in self.children.iter_mut() {
            child.update_world_transforms(&self.world);
        }
    }

    fn add_child(&mut self, child: Box<dyn SceneNode>) {
        if self.children.iter().any(|c| c.name() == child.name()) {
            warn!(
                "node {:?} already has a child called {:?}; lookups by name will find the first",
                self.name,
                child.name()
            );
        }
        self.children.push(child);
    }
}

macro_rules! delegate_core {
    () => {
        fn name(&self) -> &str {
            &self.core.name
        }

        fn get_local_transform(&self) -> &Instance {
            &self.core.local
        }

        fn set_local_transform(&mut self, instance: Instance) {
            self.core.local = instance;
        }

        fn get_world_transform(&self) -> &Instance {
            &self.core.world
        }

        fn get_children(&self) -> &Vec<Box<dyn SceneNode>> {
            &self.core.children
        }

        fn get_children_mut(&mut self) -> &mut Vec<Box<dyn SceneNode>> {
            &mut self.core.children
        }

        fn add_child(&mut self, child: Box<dyn SceneNode>) {
            self.core.add_child(child);
        }

        fn update_world_transforms(&mut self, parent_world_transform: &Instance) {
            self.core.update_world_transforms(parent_world_transform);
        }
    };
}

/// A group: positions its children, draws nothing itself.
pub struct ContainerNode {
    core: NodeCore,
}

impl ContainerNode {
    pub fn new(name: &str) -> Self {
        Self::with_transform(name, Instance::default())
    }

    pub fn with_transform(name: &str, local: Instance) -> Self {
        Self {
            core: NodeCore::new(name, local),
        }
    }

    pub fn with_children(mut self, children: Vec<Box<dyn SceneNode>>) -> Self {
        for child in children {
            self.core.add_child(child);
        }
        self
    }
}

impl SceneNode for ContainerNode {
    delegate_core!();
}

/// A node that draws a mesh at its world transform.
pub struct MeshNode {
    core: NodeCore,
    mesh: Mesh,
}

impl MeshNode {
    pub fn new(name: &str, mesh: Mesh, local: Instance) -> Self {
        Self {
            core: NodeCore::new(name, local),
            mesh,
        }
    }
}

impl SceneNode for MeshNode {
    delegate_core!();

    fn mesh(&self) -> Option<&Mesh> {
        Some(&self.mesh)
    }
}

/// Depth-first search for the first node called `name`, `node` included.
pub fn find<'a>(node: &'a dyn SceneNode, name: &str) -> Option<&'a dyn SceneNode> {
    if node.name() == name {
        return Some(node);
    }
    node.get_children()
        .iter()
        .find_map(|child| find(child.as_ref(), name))
}

/// Visits every node depth-first, parents before children.
pub fn walk<'a>(node: &'a dyn SceneNode, visit: &mut dyn FnMut(&'a dyn SceneNode)) {
    visit(node);
    for child in node.get_children() {
        walk(child.as_ref(), visit);
    }
}
