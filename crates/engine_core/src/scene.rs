//! Scene graph: the boundary between simulation state and whatever draws it.
//!
//! The simulation owns authoritative positions and pushes them here once per
//! tick. [`SceneTree`] is the in-process implementation; nodes are `hecs`
//! entities carrying a local [`Transform`] plus parent/child links.

use crate::transform::{Transform, TransformRaw};
use glam::Mat4;
use hecs::{Entity, World};
use thiserror::Error;

/// Handle to a node in a scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Entity);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("scene node {0:?} does not exist")]
    UnknownNode(NodeId),
    #[error("node {child:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("attaching {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("the root node cannot be removed or reparented")]
    Root,
}

/// What the simulation needs from a renderer's scene graph.
pub trait SceneGraph {
    /// The node everything drawable hangs from.
    fn root(&self) -> NodeId;
    /// Create a detached node.
    fn create_node(&mut self, name: &str) -> NodeId;
    /// Replace a node's local transform.
    fn set_transform(&mut self, node: NodeId, transform: Transform) -> Result<(), SceneError>;
    /// Attach `child` under `parent`, detaching it from any previous parent.
    fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError>;
    /// Detach `child` from `parent`. The child survives as a detached node.
    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError>;
    /// Destroy a node and its whole subtree.
    fn remove_node(&mut self, node: NodeId) -> Result<(), SceneError>;
    /// Show or hide a node (and, for drawing purposes, its subtree).
    fn set_visible(&mut self, node: NodeId, visible: bool) -> Result<(), SceneError>;
}

struct Name(String);
struct Parent(Entity);
struct Children(Vec<Entity>);
struct Visible(bool);

/// In-process scene graph backed by an ECS world.
pub struct SceneTree {
    world: World,
    root: Entity,
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneTree {
    pub fn new() -> Self {
        let mut world = World::new();
        let root = world.spawn((
            Name("root".to_string()),
            Transform::default(),
            Children(Vec::new()),
            Visible(true),
        ));
        Self { world, root }
    }

    /// Total number of live nodes, root included.
    pub fn node_count(&self) -> usize {
        self.world.len() as usize
    }

    pub fn contains(&self, node: NodeId) -> bool {
        self.world.contains(node.0)
    }

    pub fn name(&self, node: NodeId) -> Option<String> {
        self.world.get::<&Name>(node.0).ok().map(|n| n.0.clone())
    }

    pub fn transform(&self, node: NodeId) -> Option<Transform> {
        self.world.get::<&Transform>(node.0).ok().map(|t| *t)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.world.get::<&Parent>(node.0).ok().map(|p| NodeId(p.0))
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.world
            .get::<&Children>(node.0)
            .map(|c| c.0.iter().copied().map(NodeId).collect())
            .unwrap_or_default()
    }

    pub fn is_visible(&self, node: NodeId) -> bool {
        self.world.get::<&Visible>(node.0).map(|v| v.0).unwrap_or(false)
    }

    /// Compose local transforms from the root down to `node`.
    pub fn world_matrix(&self, node: NodeId) -> Result<Mat4, SceneError> {
        let mut matrix = self.local_matrix(node.0)?;
        let mut current = node.0;
        while let Ok(parent) = self.world.get::<&Parent>(current).map(|p| p.0) {
            matrix = self.local_matrix(parent)? * matrix;
            current = parent;
        }
        Ok(matrix)
    }

    /// World matrices of every visible node reachable from the root, in
    /// depth-first order. This is the batch handed to the renderer each frame.
    pub fn instances(&self) -> Vec<TransformRaw> {
        let mut out = Vec::new();
        let mut stack = vec![(self.root, Mat4::IDENTITY)];
        while let Some((entity, parent_matrix)) = stack.pop() {
            if !self.world.get::<&Visible>(entity).map(|v| v.0).unwrap_or(false) {
                continue;
            }
            let Ok(local) = self.local_matrix(entity) else {
                continue;
            };
            let matrix = parent_matrix * local;
            if entity != self.root {
                out.push(TransformRaw::from(matrix));
            }
            if let Ok(children) = self.world.get::<&Children>(entity) {
                for &child in children.0.iter().rev() {
                    stack.push((child, matrix));
                }
            }
        }
        out
    }

    fn local_matrix(&self, entity: Entity) -> Result<Mat4, SceneError> {
        self.world
            .get::<&Transform>(entity)
            .map(|t| t.to_matrix())
            .map_err(|_| SceneError::UnknownNode(NodeId(entity)))
    }

    fn require(&self, node: NodeId) -> Result<(), SceneError> {
        if self.world.contains(node.0) {
            Ok(())
        } else {
            Err(SceneError::UnknownNode(node))
        }
    }

    fn is_ancestor(&self, candidate: Entity, of: Entity) -> bool {
        let mut current = of;
        while let Ok(parent) = self.world.get::<&Parent>(current).map(|p| p.0) {
            if parent == candidate {
                return true;
            }
            current = parent;
        }
        false
    }

    fn detach(&mut self, child: Entity) {
        let Ok(parent) = self.world.remove_one::<Parent>(child) else {
            return;
        };
        if let Ok(mut children) = self.world.get::<&mut Children>(parent.0) {
            children.0.retain(|&c| c != child);
        }
    }
}

impl SceneGraph for SceneTree {
    fn root(&self) -> NodeId {
        NodeId(self.root)
    }

    fn create_node(&mut self, name: &str) -> NodeId {
        NodeId(self.world.spawn((
            Name(name.to_string()),
            Transform::default(),
            Children(Vec::new()),
            Visible(true),
        )))
    }

    fn set_transform(&mut self, node: NodeId, transform: Transform) -> Result<(), SceneError> {
        let mut local = self
            .world
            .get::<&mut Transform>(node.0)
            .map_err(|_| SceneError::UnknownNode(node))?;
        *local = transform;
        Ok(())
    }

    fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.require(parent)?;
        self.require(child)?;
        if child.0 == self.root {
            return Err(SceneError::Root);
        }
        if parent == child || self.is_ancestor(child.0, parent.0) {
            return Err(SceneError::Cycle { parent, child });
        }
        self.detach(child.0);
        if let Ok(mut children) = self.world.get::<&mut Children>(parent.0) {
            children.0.push(child.0);
        }
        self.world
            .insert_one(child.0, Parent(parent.0))
            .map_err(|_| SceneError::UnknownNode(child))
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.require(parent)?;
        self.require(child)?;
        if self.parent(child) != Some(parent) {
            return Err(SceneError::NotAChild { parent, child });
        }
        self.detach(child.0);
        Ok(())
    }

    fn remove_node(&mut self, node: NodeId) -> Result<(), SceneError> {
        self.require(node)?;
        if node.0 == self.root {
            return Err(SceneError::Root);
        }
        self.detach(node.0);
        let mut doomed = vec![node.0];
        while let Some(entity) = doomed.pop() {
            if let Ok(children) = self.world.get::<&Children>(entity) {
                doomed.extend(children.0.iter().copied());
            }
            // Already-despawned entities cannot occur: each node has one parent.
            let _ = self.world.despawn(entity);
        }
        Ok(())
    }

    fn set_visible(&mut self, node: NodeId, visible: bool) -> Result<(), SceneError> {
        let mut flag = self
            .world
            .get::<&mut Visible>(node.0)
            .map_err(|_| SceneError::UnknownNode(node))?;
        flag.0 = visible;
        Ok(())
    }
}
