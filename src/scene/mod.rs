//! Scene graph: an arena of shapes, connectors, groups and composite
//! structures addressed by epoch-tagged handles.
//!
//! Every mutation goes through [`Canvas`]. Node motion is applied instantly;
//! connector geometry is tweened by the transition scheduler in
//! [`transition`], driven by the logical clock [`Canvas::advance`].

mod connector;
mod group;
mod node;
mod pointer;
mod transition;

pub use connector::{
    Anchor, Bind, Connector, ConnectorEnds, ConnectorKind, ConnectorMove, ConnectorSpec, Target,
};
pub use group::Group;
pub use node::{Binding, CircleSpec, Node, RectSpec, ShapeKind, ShapeStyle, TextSpec};
pub use pointer::PointerSpec;
pub use transition::{Channel, Timer, TimerAction, Transition, Tween};

use crate::config::{AnimationConfig, Config};
use crate::error::SceneError;
use crate::structures::Structure;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

macro_rules! handle {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name {
            index: usize,
            epoch: u32,
        }

        impl $name {
            pub(crate) const KIND: &'static str = $kind;

            pub(crate) fn new(index: usize, epoch: u32) -> Self {
                Self { index, epoch }
            }

            pub fn index(self) -> usize {
                self.index
            }

            pub fn epoch(self) -> u32 {
                self.epoch
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}#{}", $kind, self.index)
            }
        }
    };
}

handle!(
    /// Handle to a shape in the node arena.
    NodeId,
    "node"
);
handle!(
    /// Handle to a line, arrow or curved arrow.
    ConnectorId,
    "connector"
);
handle!(GroupId, "group");
handle!(
    /// Handle to an array, list or tree built on the canvas.
    StructureId,
    "structure"
);

/// Anything a group can hold and that fan-out operations accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Member {
    Node(NodeId),
    Connector(ConnectorId),
    Group(GroupId),
}

impl From<NodeId> for Member {
    fn from(id: NodeId) -> Self {
        Member::Node(id)
    }
}

impl From<ConnectorId> for Member {
    fn from(id: ConnectorId) -> Self {
        Member::Connector(id)
    }
}

impl From<GroupId> for Member {
    fn from(id: GroupId) -> Self {
        Member::Group(id)
    }
}

fn resolve(
    kind: &'static str,
    index: usize,
    epoch: u32,
    current: u32,
    len: usize,
) -> Result<usize, SceneError> {
    if epoch != current {
        return Err(SceneError::StaleHandle { kind, index });
    }
    if index >= len {
        return Err(SceneError::UnknownHandle { kind, index });
    }
    Ok(index)
}

/// Arena lengths recorded before a multi-step build.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Checkpoint {
    nodes: usize,
    connectors: usize,
    groups: usize,
    structures: usize,
    roots: usize,
    timers: usize,
}

/// The drawing surface and owner of every scene element.
#[derive(Debug)]
pub struct Canvas {
    width: f32,
    height: f32,
    epoch: u32,
    now: f64,
    pub(crate) animation: AnimationConfig,
    pub(crate) rng: StdRng,
    pub(crate) nodes: Vec<Node>,
    pub(crate) connectors: Vec<Connector>,
    pub(crate) groups: Vec<Group>,
    pub(crate) structures: Vec<Structure>,
    roots: Vec<Member>,
    pub(crate) transitions: BTreeMap<(usize, Channel), Transition>,
    pub(crate) timers: Vec<Timer>,
    pub(crate) timer_seq: u64,
}

impl Canvas {
    pub fn new(width: f32, height: f32) -> Self {
        Self::build(width, height, AnimationConfig::default(), StdRng::from_rng(&mut rand::rng()))
    }

    pub fn with_config(config: &Config) -> Self {
        Self::build(
            config.canvas.width,
            config.canvas.height,
            config.animation.clone(),
            StdRng::from_rng(&mut rand::rng()),
        )
    }

    /// Canvas whose random generation is reproducible.
    pub fn with_seed(config: &Config, seed: u64) -> Self {
        Self::build(
            config.canvas.width,
            config.canvas.height,
            config.animation.clone(),
            StdRng::seed_from_u64(seed),
        )
    }

    fn build(width: f32, height: f32, animation: AnimationConfig, rng: StdRng) -> Self {
        Self {
            width,
            height,
            epoch: 0,
            now: 0.0,
            animation,
            rng,
            nodes: Vec::new(),
            connectors: Vec::new(),
            groups: Vec::new(),
            structures: Vec::new(),
            roots: Vec::new(),
            transitions: BTreeMap::new(),
            timers: Vec::new(),
            timer_seq: 0,
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn resize(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
    }

    /// Current logical time.
    pub fn now(&self) -> f64 {
        self.now
    }

    pub(crate) fn set_now(&mut self, now: f64) {
        self.now = now;
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn animation(&self) -> &AnimationConfig {
        &self.animation
    }

    pub fn roots(&self) -> &[Member] {
        &self.roots
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn connectors(&self) -> &[Connector] {
        &self.connectors
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn structures(&self) -> &[Structure] {
        &self.structures
    }

    pub fn node(&self, id: NodeId) -> Result<&Node, SceneError> {
        let index = resolve(NodeId::KIND, id.index, id.epoch, self.epoch, self.nodes.len())?;
        Ok(&self.nodes[index])
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Result<&mut Node, SceneError> {
        let index = resolve(NodeId::KIND, id.index, id.epoch, self.epoch, self.nodes.len())?;
        Ok(&mut self.nodes[index])
    }

    pub fn connector(&self, id: ConnectorId) -> Result<&Connector, SceneError> {
        let index = resolve(
            ConnectorId::KIND,
            id.index,
            id.epoch,
            self.epoch,
            self.connectors.len(),
        )?;
        Ok(&self.connectors[index])
    }

    pub(crate) fn connector_mut(&mut self, id: ConnectorId) -> Result<&mut Connector, SceneError> {
        let index = resolve(
            ConnectorId::KIND,
            id.index,
            id.epoch,
            self.epoch,
            self.connectors.len(),
        )?;
        Ok(&mut self.connectors[index])
    }

    pub fn group(&self, id: GroupId) -> Result<&Group, SceneError> {
        let index = resolve(GroupId::KIND, id.index, id.epoch, self.epoch, self.groups.len())?;
        Ok(&self.groups[index])
    }

    pub(crate) fn group_mut(&mut self, id: GroupId) -> Result<&mut Group, SceneError> {
        let index = resolve(GroupId::KIND, id.index, id.epoch, self.epoch, self.groups.len())?;
        Ok(&mut self.groups[index])
    }

    pub fn structure(&self, id: StructureId) -> Result<&Structure, SceneError> {
        let index = resolve(
            StructureId::KIND,
            id.index,
            id.epoch,
            self.epoch,
            self.structures.len(),
        )?;
        Ok(&self.structures[index])
    }

    pub(crate) fn structure_mut(&mut self, id: StructureId) -> Result<&mut Structure, SceneError> {
        let index = resolve(
            StructureId::KIND,
            id.index,
            id.epoch,
            self.epoch,
            self.structures.len(),
        )?;
        Ok(&mut self.structures[index])
    }

    pub(crate) fn next_node_id(&self) -> NodeId {
        NodeId::new(self.nodes.len(), self.epoch)
    }

    pub(crate) fn next_connector_id(&self) -> ConnectorId {
        ConnectorId::new(self.connectors.len(), self.epoch)
    }

    pub(crate) fn next_structure_id(&self) -> StructureId {
        StructureId::new(self.structures.len(), self.epoch)
    }

    /// Registers `member` as a top-level visible item.
    pub fn add_root(&mut self, member: impl Into<Member>) -> Result<(), SceneError> {
        let member = member.into();
        self.check_member(member)?;
        if !self.roots.contains(&member) {
            self.roots.push(member);
        }
        Ok(())
    }

    pub(crate) fn check_member(&self, member: Member) -> Result<(), SceneError> {
        match member {
            Member::Node(id) => self.node(id).map(|_| ()),
            Member::Connector(id) => self.connector(id).map(|_| ()),
            Member::Group(id) => self.group(id).map(|_| ()),
        }
    }

    /// Removes everything from the surface.
    ///
    /// Handles issued before the call fail lookup afterwards, and pending
    /// transitions and timers of the previous run are dropped with it.
    pub fn clear(&mut self) {
        log::debug!(
            "clearing canvas: {} nodes, {} connectors, {} pending transitions, {} timers",
            self.nodes.len(),
            self.connectors.len(),
            self.transitions.len(),
            self.timers.len()
        );
        self.epoch = self.epoch.wrapping_add(1);
        self.nodes.clear();
        self.connectors.clear();
        self.groups.clear();
        self.structures.clear();
        self.roots.clear();
        self.transitions.clear();
        self.timers.clear();
    }

    pub(crate) fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            nodes: self.nodes.len(),
            connectors: self.connectors.len(),
            groups: self.groups.len(),
            structures: self.structures.len(),
            roots: self.roots.len(),
            timers: self.timers.len(),
        }
    }

    pub(crate) fn rollback(&mut self, checkpoint: Checkpoint) {
        self.nodes.truncate(checkpoint.nodes);
        self.connectors.truncate(checkpoint.connectors);
        self.groups.truncate(checkpoint.groups);
        self.structures.truncate(checkpoint.structures);
        self.roots.truncate(checkpoint.roots);
        self.timers.truncate(checkpoint.timers);
        self.transitions
            .retain(|(connector, _), _| *connector < checkpoint.connectors);
        for node in &mut self.nodes {
            node.connections
                .retain(|binding| binding.connector.index() < checkpoint.connectors);
        }
        for group in &mut self.groups {
            group.members.retain(|member| match member {
                Member::Node(id) => id.index() < checkpoint.nodes,
                Member::Connector(id) => id.index() < checkpoint.connectors,
                Member::Group(id) => id.index() < checkpoint.groups,
            });
        }
    }

    /// Runs a multi-step build all-or-nothing.
    ///
    /// On error every element created by `build` is discarded. On success the
    /// connectors it created are placed at their final geometry.
    pub fn transaction<T>(
        &mut self,
        build: impl FnOnce(&mut Canvas) -> Result<T, SceneError>,
    ) -> Result<T, SceneError> {
        let checkpoint = self.checkpoint();
        match build(self) {
            Ok(value) => {
                self.transitions
                    .retain(|(connector, _), _| *connector < checkpoint.connectors);
                Ok(value)
            }
            Err(err) => {
                log::warn!("build failed, rolling back: {err}");
                self.rollback(checkpoint);
                Err(err)
            }
        }
    }
}
