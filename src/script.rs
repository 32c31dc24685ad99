//! Scene files: a declarative initial scene plus a list of steps, each a
//! list of operations, replayed by [`ScriptedProcedure`].
//!
//! Files are JSON5, so comments and trailing commas are accepted:
//!
//! ```json5
//! {
//!   structures: [{ name: "a", kind: "array", options: { x: 40, y: 60, radius: 15 }, values: [3, 1, 2] }],
//!   steps: [
//!     [{ op: "highlight", target: "a", index: 0, tag: "compare" }, { op: "mark", line: 3 }],
//!     [{ op: "swap", target: "a", i: 0, j: 1 }],
//!   ],
//! }
//! ```

use crate::error::SceneError;
use crate::geometry::{Motion, Point, Side};
use crate::scene::{
    Bind, Canvas, CircleSpec, ConnectorId, ConnectorKind, ConnectorSpec, Member, NodeId, PointerSpec,
    RectSpec, ShapeStyle, StructureId, Target, TextSpec,
};
use crate::step::{ProcedureFactory, Step, StepContext, StepProcedure};
use crate::structures::{CellValue, PointerSlot, StructureOptions, TreeSpec};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SceneFile {
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub structures: Vec<StructureDecl>,
    pub shapes: Vec<ShapeDecl>,
    pub connectors: Vec<ConnectorDecl>,
    pub steps: Vec<Vec<Op>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StructureKind {
    Array,
    List,
    #[serde(alias = "dlList")]
    DoublyLinkedList,
    Tree,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureDecl {
    pub name: String,
    pub kind: StructureKind,
    #[serde(default)]
    pub options: StructureOptions,
    #[serde(default)]
    pub values: Option<Vec<CellValue>>,
    /// Nested tree description; only read for trees.
    #[serde(default)]
    pub root: Option<TreeSpec>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "shape", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum ShapeDecl {
    Circle {
        name: String,
        x: f32,
        y: f32,
        radius: f32,
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        class: Option<String>,
        #[serde(default)]
        style: ShapeStyle,
    },
    Rect {
        name: String,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        #[serde(default, alias = "borderRadius")]
        corner_radius: f32,
        #[serde(default)]
        label: Option<String>,
        #[serde(default)]
        class: Option<String>,
        #[serde(default)]
        style: ShapeStyle,
    },
    Text {
        name: String,
        x: f32,
        y: f32,
        text: String,
        #[serde(default)]
        class: Option<String>,
    },
    Pointer {
        name: String,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        from: Side,
        #[serde(default)]
        to: Option<NodeRef>,
        #[serde(default)]
        to_side: Option<Side>,
        #[serde(default)]
        straight: bool,
        #[serde(default)]
        class: Option<String>,
    },
}

impl ShapeDecl {
    pub fn name(&self) -> &str {
        match self {
            ShapeDecl::Circle { name, .. }
            | ShapeDecl::Rect { name, .. }
            | ShapeDecl::Text { name, .. }
            | ShapeDecl::Pointer { name, .. } => name,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A connector between two nodes, or between two fixed points.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorDecl {
    pub name: String,
    #[serde(default)]
    pub kind: ConnectorKind,
    #[serde(default)]
    pub from: Option<NodeRef>,
    #[serde(default)]
    pub from_side: Option<Side>,
    #[serde(default)]
    pub to: Option<NodeRef>,
    #[serde(default)]
    pub to_side: Option<Side>,
    #[serde(default)]
    pub start: Option<Point>,
    #[serde(default)]
    pub end: Option<Point>,
    #[serde(default = "default_true")]
    pub bind: bool,
    #[serde(default)]
    pub class: Option<String>,
}

/// A shape by name, or the data node of a structure element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum NodeRef {
    Name(String),
    Element { of: String, index: usize },
}

/// A declared connector or pointer block by name, or a named pointer of a
/// structure element.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ConnectorRef {
    Name(String),
    Pointer {
        of: String,
        index: usize,
        slot: PointerSlot,
    },
}

/// Distinguishes an absent key from an explicit `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Op {
    Swap {
        target: String,
        i: usize,
        j: usize,
    },
    Highlight {
        target: String,
        #[serde(default)]
        index: Option<usize>,
        tag: String,
    },
    Unhighlight {
        target: String,
        #[serde(default)]
        index: Option<usize>,
    },
    /// Moves to `to` when given, otherwise by `(dx, dy)`.
    Move {
        target: String,
        #[serde(default)]
        index: Option<usize>,
        #[serde(default)]
        to: Option<Point>,
        #[serde(default)]
        dx: f32,
        #[serde(default)]
        dy: f32,
    },
    /// `to: null` points the connector at nothing; leaving `to` out keeps
    /// the current target.
    Bind {
        connector: ConnectorRef,
        #[serde(default, deserialize_with = "present")]
        to: Option<Option<NodeRef>>,
        #[serde(default)]
        to_side: Option<Side>,
        #[serde(default)]
        from: Option<NodeRef>,
        #[serde(default)]
        from_side: Option<Side>,
    },
    Unbind {
        connector: ConnectorRef,
    },
    Show {
        target: String,
        #[serde(default)]
        index: Option<usize>,
    },
    Hide {
        target: String,
        #[serde(default)]
        index: Option<usize>,
    },
    Text {
        target: String,
        #[serde(default)]
        index: Option<usize>,
        text: String,
    },
    Mark {
        line: usize,
        #[serde(default)]
        segment: Option<usize>,
    },
    MarkLines {
        lines: Vec<usize>,
    },
    Unmark,
}

pub fn parse_scene(input: &str) -> Result<SceneFile, SceneError> {
    json5::from_str(input).map_err(|err| SceneError::SceneFile(err.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Named {
    Node(NodeId),
    Connector(ConnectorId),
    Structure(StructureId),
}

/// Handles of everything a scene file declared, by name.
#[derive(Debug, Clone, Default)]
pub struct SceneNames {
    names: HashMap<String, Named>,
}

impl SceneNames {
    pub fn get(&self, name: &str) -> Option<Named> {
        self.names.get(name).copied()
    }

    fn insert(&mut self, name: &str, handle: Named) -> Result<(), SceneError> {
        if self.names.insert(name.to_string(), handle).is_some() {
            return Err(SceneError::SceneFile(format!("`{name}` is declared twice")));
        }
        Ok(())
    }

    fn lookup(&self, name: &str) -> Result<Named, SceneError> {
        self.get(name)
            .ok_or_else(|| SceneError::SceneFile(format!("unknown name `{name}`")))
    }

    fn structure(&self, name: &str) -> Result<StructureId, SceneError> {
        match self.lookup(name)? {
            Named::Structure(id) => Ok(id),
            _ => Err(SceneError::SceneFile(format!("`{name}` is not a structure"))),
        }
    }

    fn node(&self, canvas: &Canvas, node: &NodeRef) -> Result<NodeId, SceneError> {
        match node {
            NodeRef::Name(name) => match self.lookup(name)? {
                Named::Node(id) => Ok(id),
                _ => Err(SceneError::SceneFile(format!("`{name}` is not a shape"))),
            },
            NodeRef::Element { of, index } => canvas.element_node(self.structure(of)?, *index),
        }
    }

    fn connector(&self, canvas: &Canvas, connector: &ConnectorRef) -> Result<ConnectorId, SceneError> {
        match connector {
            ConnectorRef::Name(name) => match self.lookup(name)? {
                Named::Connector(id) => Ok(id),
                Named::Node(id) => canvas.pointer_arrow(id),
                Named::Structure(_) => Err(SceneError::SceneFile(format!("`{name}` is not a connector"))),
            },
            ConnectorRef::Pointer { of, index, slot } => {
                canvas.element_pointer(self.structure(of)?, *index, *slot)
            }
        }
    }

    /// The item a step operation addresses.
    fn member(&self, canvas: &Canvas, target: &str, index: Option<usize>) -> Result<Member, SceneError> {
        match (self.lookup(target)?, index) {
            (Named::Structure(id), Some(index)) => canvas.element_member(id, index),
            (Named::Structure(id), None) => Ok(canvas.structure(id)?.group().into()),
            (Named::Node(id), _) => Ok(id.into()),
            (Named::Connector(id), _) => Ok(id.into()),
        }
    }
}

/// Builds every declared structure, shape and connector, in that order.
/// All-or-nothing: a failing declaration leaves the canvas as it was.
pub fn build_scene(canvas: &mut Canvas, scene: &SceneFile) -> Result<SceneNames, SceneError> {
    canvas.transaction(|canvas| {
        let mut names = SceneNames::default();
        for decl in &scene.structures {
            let id = build_structure(canvas, decl)?;
            names.insert(&decl.name, Named::Structure(id))?;
        }
        for decl in &scene.shapes {
            let id = build_shape(canvas, &names, decl)?;
            canvas.add_root(id)?;
            names.insert(decl.name(), Named::Node(id))?;
        }
        for decl in &scene.connectors {
            let id = build_connector(canvas, &names, decl)?;
            canvas.add_root(id)?;
            names.insert(&decl.name, Named::Connector(id))?;
        }
        log::debug!(
            "built scene: {} structures, {} shapes, {} connectors",
            scene.structures.len(),
            scene.shapes.len(),
            scene.connectors.len()
        );
        Ok(names)
    })
}

fn build_structure(canvas: &mut Canvas, decl: &StructureDecl) -> Result<StructureId, SceneError> {
    let values = decl.values.as_deref();
    match decl.kind {
        StructureKind::Array => canvas.add_array(&decl.options, values),
        StructureKind::List => canvas.add_list(&decl.options, values),
        StructureKind::DoublyLinkedList => canvas.add_doubly_linked_list(&decl.options, values),
        StructureKind::Tree => match &decl.root {
            Some(root) => canvas.add_tree_from(&decl.options, root),
            None => canvas.add_tree(&decl.options, values),
        },
    }
}

fn build_shape(canvas: &mut Canvas, names: &SceneNames, decl: &ShapeDecl) -> Result<NodeId, SceneError> {
    match decl {
        ShapeDecl::Circle {
            x,
            y,
            radius,
            label,
            class,
            style,
            ..
        } => canvas.add_circle(CircleSpec {
            center: Point::new(*x, *y),
            radius: *radius,
            label: label.clone(),
            class: class.clone(),
            style: style.clone(),
        }),
        ShapeDecl::Rect {
            x,
            y,
            width,
            height,
            corner_radius,
            label,
            class,
            style,
            ..
        } => canvas.add_rect(RectSpec {
            origin: Point::new(*x, *y),
            width: *width,
            height: *height,
            corner_radius: *corner_radius,
            label: label.clone(),
            class: class.clone(),
            style: style.clone(),
        }),
        ShapeDecl::Text { x, y, text, class, .. } => canvas.add_text(TextSpec {
            origin: Point::new(*x, *y),
            text: text.clone(),
            class: class.clone(),
        }),
        ShapeDecl::Pointer {
            x,
            y,
            width,
            height,
            from,
            to,
            to_side,
            straight,
            class,
            ..
        } => {
            let target = to.as_ref().map(|node| names.node(canvas, node)).transpose()?;
            let mut spec = PointerSpec::new(Point::new(*x, *y), *width, *height, *from)
                .to(target, to_side.unwrap_or(Side::Left));
            if *straight {
                spec = spec.straight();
            }
            spec.class = class.clone();
            canvas.add_pointer(spec)
        }
    }
}

fn build_connector(
    canvas: &mut Canvas,
    names: &SceneNames,
    decl: &ConnectorDecl,
) -> Result<ConnectorId, SceneError> {
    let mut spec = match (&decl.from, decl.start, decl.end) {
        (Some(from), _, _) => {
            let from = names.node(canvas, from)?;
            let to = decl.to.as_ref().map(|node| names.node(canvas, node)).transpose()?;
            ConnectorSpec::between(
                decl.kind,
                from,
                decl.from_side.unwrap_or(Side::Right),
                to,
                decl.to_side.unwrap_or(Side::Left),
            )
        }
        (None, Some(start), Some(end)) => ConnectorSpec::points(decl.kind, start, end),
        (None, _, _) => return Err(SceneError::MissingOption("from")),
    };
    if !decl.bind {
        spec = spec.unbound();
    }
    spec.class = decl.class.clone();
    canvas.add_connector(spec)
}

fn parse_value(text: &str) -> CellValue {
    text.trim()
        .parse()
        .map(CellValue::Number)
        .unwrap_or_else(|_| CellValue::Text(text.to_string()))
}

/// Applies one step operation.
pub fn apply_op(ctx: &mut StepContext<'_>, names: &SceneNames, op: &Op) -> Result<(), SceneError> {
    let canvas = &mut *ctx.canvas;
    match op {
        Op::Swap { target, i, j } => canvas.array_swap(names.structure(target)?, *i, *j),
        Op::Highlight { target, index, tag } => match names.lookup(target)? {
            Named::Structure(id) => canvas.highlight_element(id, *index, tag),
            _ => {
                let member = names.member(canvas, target, *index)?;
                canvas.highlight(member, tag)
            }
        },
        Op::Unhighlight { target, index } => match names.lookup(target)? {
            Named::Structure(id) => canvas.unhighlight_element(id, *index),
            _ => {
                let member = names.member(canvas, target, *index)?;
                canvas.unhighlight(member)
            }
        },
        Op::Move {
            target,
            index,
            to,
            dx,
            dy,
        } => {
            let member = names.member(canvas, target, *index)?;
            let motion = match to {
                Some(point) => Motion::To(*point),
                None => Motion::By { dx: *dx, dy: *dy },
            };
            canvas.move_item(member, motion)
        }
        Op::Bind {
            connector,
            to,
            to_side,
            from,
            from_side,
        } => {
            let id = names.connector(canvas, connector)?;
            let target = match to {
                None => Target::Keep,
                Some(None) => Target::Nothing,
                Some(Some(node)) => Target::Node(names.node(canvas, node)?),
            };
            let from = from.as_ref().map(|node| names.node(canvas, node)).transpose()?;
            canvas.bind(
                id,
                Bind {
                    from,
                    from_side: *from_side,
                    to: target,
                    to_side: *to_side,
                },
            )
        }
        Op::Unbind { connector } => {
            let id = names.connector(canvas, connector)?;
            canvas.unbind(id)
        }
        Op::Show { target, index } => {
            let member = names.member(canvas, target, *index)?;
            canvas.show(member)
        }
        Op::Hide { target, index } => {
            let member = names.member(canvas, target, *index)?;
            canvas.hide(member)
        }
        Op::Text { target, index, text } => match (names.lookup(target)?, index) {
            (Named::Structure(id), Some(index)) => canvas.set_element_value(id, *index, parse_value(text)),
            (Named::Node(id), _) => canvas.set_text(id, text.as_str()),
            _ => Err(SceneError::SceneFile(format!(
                "`{target}` has no text to replace"
            ))),
        },
        Op::Mark { line, segment } => {
            ctx.panel.mark(*line, *segment);
            Ok(())
        }
        Op::MarkLines { lines } => {
            ctx.panel.mark_lines(lines);
            Ok(())
        }
        Op::Unmark => {
            ctx.panel.unmark();
            Ok(())
        }
    }
}

/// Builds the scene on its first resume, then runs one step per resume.
/// Finishes together with the last step.
pub struct ScriptedProcedure {
    scene: Rc<SceneFile>,
    names: Option<SceneNames>,
    cursor: usize,
}

impl ScriptedProcedure {
    pub fn new(scene: Rc<SceneFile>) -> Self {
        Self {
            scene,
            names: None,
            cursor: 0,
        }
    }

    pub fn factory(scene: SceneFile) -> ProcedureFactory {
        let scene = Rc::new(scene);
        Box::new(move || {
            let procedure: Box<dyn StepProcedure> = Box::new(ScriptedProcedure::new(Rc::clone(&scene)));
            procedure
        })
    }
}

impl StepProcedure for ScriptedProcedure {
    fn resume(&mut self, ctx: &mut StepContext<'_>) -> Result<Step, SceneError> {
        match &self.names {
            None => {
                self.names = Some(build_scene(ctx.canvas, &self.scene)?);
            }
            Some(names) => {
                let Some(ops) = self.scene.steps.get(self.cursor) else {
                    return Ok(Step::Done);
                };
                for op in ops {
                    apply_op(ctx, names, op)?;
                }
                self.cursor += 1;
            }
        }
        Ok(if self.cursor >= self.scene.steps.len() {
            Step::Done
        } else {
            Step::Yielded
        })
    }
}
