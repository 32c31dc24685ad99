use crate::geometry::{CubicPath, Point, Segment};
use crate::scene::{Anchor, Canvas, ConnectorKind, Group, ShapeKind, Timer, Transition};
use crate::structures::Structure;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// JSON snapshot of a canvas at its current logical time.
#[derive(Debug, Serialize)]
pub struct SceneDump<'a> {
    pub width: f32,
    pub height: f32,
    pub epoch: u32,
    pub now: f64,
    pub nodes: Vec<NodeDump<'a>>,
    pub connectors: Vec<ConnectorDump<'a>>,
    pub groups: &'a [Group],
    pub structures: &'a [Structure],
    pub transitions: Vec<&'a Transition>,
    pub timers: &'a [Timer],
}

#[derive(Debug, Serialize)]
pub struct NodeDump<'a> {
    pub index: usize,
    pub shape: &'a ShapeKind,
    pub position: Point,
    pub label: Option<&'a str>,
    pub classes: &'a [String],
    pub highlight: Option<&'a str>,
    pub shown: bool,
    pub lift: f32,
    pub raised: bool,
}

#[derive(Debug, Serialize)]
pub struct ConnectorDump<'a> {
    pub index: usize,
    pub kind: ConnectorKind,
    pub start_anchor: Anchor,
    pub end_anchor: Anchor,
    /// Final geometry.
    pub segment: Segment,
    /// Geometry as drawn right now, mid-transition.
    pub drawn: Segment,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drawn_path: Option<CubicPath>,
    pub displayed: bool,
    pub shown: bool,
    pub classes: &'a [String],
    pub highlight: Option<&'a str>,
}

impl<'a> SceneDump<'a> {
    pub fn from_canvas(canvas: &'a Canvas) -> Self {
        let nodes = canvas
            .nodes()
            .iter()
            .map(|node| NodeDump {
                index: node.id().index(),
                shape: node.shape(),
                position: node.position(),
                label: node.label(),
                classes: node.classes(),
                highlight: node.highlight(),
                shown: node.is_shown(),
                lift: node.lift(),
                raised: node.is_raised(),
            })
            .collect();

        let connectors = canvas
            .connectors()
            .iter()
            .map(|connector| ConnectorDump {
                index: connector.id().index(),
                kind: connector.kind(),
                start_anchor: connector.start_anchor(),
                end_anchor: connector.end_anchor(),
                segment: connector.segment(),
                drawn: canvas
                    .drawn_segment(connector.id())
                    .unwrap_or_else(|_| connector.segment()),
                drawn_path: (connector.kind() == ConnectorKind::Curved)
                    .then(|| canvas.drawn_path(connector.id()).ok())
                    .flatten(),
                displayed: connector.is_displayed(),
                shown: connector.is_shown(),
                classes: connector.classes(),
                highlight: connector.highlight(),
            })
            .collect();

        SceneDump {
            width: canvas.width(),
            height: canvas.height(),
            epoch: canvas.epoch(),
            now: canvas.now(),
            nodes,
            connectors,
            groups: canvas.groups(),
            structures: canvas.structures(),
            transitions: canvas.transitions().collect(),
            timers: canvas.timers(),
        }
    }
}

pub fn write_scene_dump(path: Option<&Path>, canvas: &Canvas) -> anyhow::Result<()> {
    let dump = SceneDump::from_canvas(canvas);
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, &dump)?;
        }
        None => println!("{}", serde_json::to_string_pretty(&dump)?),
    }
    Ok(())
}
