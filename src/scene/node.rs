use super::{Canvas, ConnectorId, ConnectorMove, NodeId};
use crate::error::SceneError;
use crate::geometry::{Motion, Point, Role, Side};
use serde::{Deserialize, Serialize};

/// Extra offset between a circle's rim and its connection points.
const CIRCLE_GAP: f32 = 2.0;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ShapeStyle {
    pub stroke: Option<String>,
    pub stroke_width: Option<f32>,
    pub fill: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ShapeKind {
    /// Positioned by its centre.
    Circle { radius: f32 },
    /// Positioned by its top-left corner.
    Rect {
        width: f32,
        height: f32,
        corner_radius: f32,
    },
    /// Box with an outgoing arrow; drawn crossed while the arrow points to
    /// nothing. Positioned by its top-left corner.
    Pointer {
        width: f32,
        height: f32,
        arrow: ConnectorId,
    },
    /// Multi-line label, not connectable.
    Text { lines: Vec<String> },
}

impl ShapeKind {
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Circle { .. } => "circle",
            ShapeKind::Rect { .. } => "rect",
            ShapeKind::Pointer { .. } => "pointer",
            ShapeKind::Text { .. } => "text",
        }
    }
}

/// One `(connector, role)` entry of a node's connection set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Binding {
    pub connector: ConnectorId,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) id: NodeId,
    pub(crate) shape: ShapeKind,
    pub(crate) position: Point,
    pub(crate) label: Option<String>,
    pub(crate) classes: Vec<String>,
    pub(crate) style: ShapeStyle,
    pub(crate) highlight: Option<String>,
    pub(crate) shown: bool,
    pub(crate) lift: f32,
    pub(crate) raised: bool,
    pub(crate) connections: Vec<Binding>,
}

impl Node {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn shape(&self) -> &ShapeKind {
        &self.shape
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn style(&self) -> &ShapeStyle {
        &self.style
    }

    pub fn highlight(&self) -> Option<&str> {
        self.highlight.as_deref()
    }

    pub fn is_shown(&self) -> bool {
        self.shown
    }

    /// Transient vertical offset applied while drawing (array swap arc).
    pub fn lift(&self) -> f32 {
        self.lift
    }

    pub fn is_raised(&self) -> bool {
        self.raised
    }

    pub fn connections(&self) -> &[Binding] {
        &self.connections
    }

    pub fn is_connectable(&self) -> bool {
        !matches!(self.shape, ShapeKind::Text { .. })
    }

    /// Where a connector attached on `side` meets this shape, or `None` for
    /// shapes that cannot anchor connectors.
    pub fn connection_point(&self, side: Side) -> Option<Point> {
        let Point { x, y } = self.position;
        match self.shape {
            ShapeKind::Circle { radius } => {
                let reach = radius + CIRCLE_GAP;
                Some(match side {
                    Side::Left => Point::new(x - reach, y),
                    Side::Right => Point::new(x + reach, y),
                    Side::Up => Point::new(x, y - reach),
                    Side::Down => Point::new(x, y + reach),
                })
            }
            ShapeKind::Rect { width, height, .. } | ShapeKind::Pointer { width, height, .. } => {
                Some(match side {
                    Side::Left => Point::new(x, y + height / 2.0),
                    Side::Right => Point::new(x + width, y + height / 2.0),
                    Side::Up => Point::new(x + width / 2.0, y),
                    Side::Down => Point::new(x + width / 2.0, y + height),
                })
            }
            ShapeKind::Text { .. } => None,
        }
    }

    fn new(id: NodeId, shape: ShapeKind, position: Point) -> Self {
        Self {
            id,
            shape,
            position,
            label: None,
            classes: Vec::new(),
            style: ShapeStyle::default(),
            highlight: None,
            shown: true,
            lift: 0.0,
            raised: false,
            connections: Vec::new(),
        }
    }
}

pub(crate) fn split_classes(class: Option<&str>) -> Vec<String> {
    class
        .map(|class| class.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Default)]
pub struct CircleSpec {
    pub center: Point,
    pub radius: f32,
    pub label: Option<String>,
    pub class: Option<String>,
    pub style: ShapeStyle,
}

impl CircleSpec {
    pub fn new(center: Point, radius: f32) -> Self {
        Self {
            center,
            radius,
            ..Default::default()
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct RectSpec {
    pub origin: Point,
    pub width: f32,
    pub height: f32,
    pub corner_radius: f32,
    pub label: Option<String>,
    pub class: Option<String>,
    pub style: ShapeStyle,
}

impl RectSpec {
    pub fn new(origin: Point, width: f32, height: f32) -> Self {
        Self {
            origin,
            width,
            height,
            ..Default::default()
        }
    }

    pub fn corner_radius(mut self, radius: f32) -> Self {
        self.corner_radius = radius;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    pub fn style(mut self, style: ShapeStyle) -> Self {
        self.style = style;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct TextSpec {
    pub origin: Point,
    pub text: String,
    pub class: Option<String>,
}

impl TextSpec {
    pub fn new(origin: Point, text: impl Into<String>) -> Self {
        Self {
            origin,
            text: text.into(),
            class: None,
        }
    }
}

impl Canvas {
    pub fn add_circle(&mut self, spec: CircleSpec) -> Result<NodeId, SceneError> {
        check_extent("radius", spec.radius)?;
        let id = self.next_node_id();
        let mut node = Node::new(id, ShapeKind::Circle { radius: spec.radius }, spec.center);
        node.label = spec.label;
        node.classes = split_classes(spec.class.as_deref());
        node.style = spec.style;
        self.nodes.push(node);
        Ok(id)
    }

    pub fn add_rect(&mut self, spec: RectSpec) -> Result<NodeId, SceneError> {
        check_extent("width", spec.width)?;
        check_extent("height", spec.height)?;
        let id = self.next_node_id();
        let shape = ShapeKind::Rect {
            width: spec.width,
            height: spec.height,
            corner_radius: spec.corner_radius.max(0.0),
        };
        let mut node = Node::new(id, shape, spec.origin);
        node.label = spec.label;
        node.classes = split_classes(spec.class.as_deref());
        node.style = spec.style;
        self.nodes.push(node);
        Ok(id)
    }

    pub fn add_text(&mut self, spec: TextSpec) -> Result<NodeId, SceneError> {
        let id = self.next_node_id();
        let shape = ShapeKind::Text {
            lines: spec.text.split('\n').map(str::to_string).collect(),
        };
        let mut node = Node::new(id, shape, spec.origin);
        node.classes = split_classes(spec.class.as_deref());
        self.nodes.push(node);
        Ok(id)
    }

    pub(crate) fn push_pointer_node(
        &mut self,
        origin: Point,
        width: f32,
        height: f32,
        arrow: ConnectorId,
        class: Option<&str>,
        style: ShapeStyle,
    ) -> Result<NodeId, SceneError> {
        check_extent("width", width)?;
        check_extent("height", height)?;
        let id = self.next_node_id();
        let mut node = Node::new(id, ShapeKind::Pointer { width, height, arrow }, origin);
        node.classes = split_classes(class);
        node.style = style;
        self.nodes.push(node);
        Ok(id)
    }

    pub fn connection_point(&self, id: NodeId, side: Side) -> Result<Point, SceneError> {
        self.node(id)?
            .connection_point(side)
            .ok_or(SceneError::NotConnectable(id.index()))
    }

    /// Replaces the label of a circle or rectangle, or the lines of a text node.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), SceneError> {
        let text = text.into();
        let node = self.node_mut(id)?;
        match &mut node.shape {
            ShapeKind::Text { lines } => {
                *lines = text.split('\n').map(str::to_string).collect();
            }
            ShapeKind::Circle { .. } | ShapeKind::Rect { .. } => node.label = Some(text),
            ShapeKind::Pointer { .. } => {
                return Err(SceneError::InvalidOption {
                    field: "text",
                    reason: format!("{id} is a pointer block and carries no label"),
                });
            }
        }
        Ok(())
    }

    pub(crate) fn highlight_node(&mut self, id: NodeId, tag: &str) -> Result<(), SceneError> {
        self.node_mut(id)?.highlight = Some(tag.to_string());
        Ok(())
    }

    pub(crate) fn unhighlight_node(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.node_mut(id)?.highlight = None;
        Ok(())
    }

    pub(crate) fn set_node_shown(&mut self, id: NodeId, shown: bool) -> Result<(), SceneError> {
        self.node_mut(id)?.shown = shown;
        Ok(())
    }

    /// Moves a node and re-routes every connector bound to it.
    ///
    /// The node itself snaps to its new position; bound connector endpoints
    /// are tweened to the node's new connection points.
    pub fn move_node(&mut self, id: NodeId, motion: Motion) -> Result<(), SceneError> {
        let node = self.node_mut(id)?;
        node.position = motion.apply(node.position);
        let bindings = node.connections.clone();

        for binding in bindings {
            let target = self.bound_point(binding.connector, binding.role)?;
            let step = match binding.role {
                Role::Start => ConnectorMove::start(Motion::To(target)),
                Role::End => ConnectorMove::end(Motion::To(target)),
            };
            self.move_connector(binding.connector, step)?;
        }
        Ok(())
    }

    pub(crate) fn connect(
        &mut self,
        node: NodeId,
        connector: ConnectorId,
        role: Role,
    ) -> Result<(), SceneError> {
        let node = self.node_mut(node)?;
        let binding = Binding { connector, role };
        if !node.connections.contains(&binding) {
            node.connections.push(binding);
        }
        Ok(())
    }

    pub(crate) fn unconnect(
        &mut self,
        node: NodeId,
        connector: ConnectorId,
        role: Role,
    ) -> Result<(), SceneError> {
        self.node_mut(node)?
            .connections
            .retain(|binding| !(binding.connector == connector && binding.role == role));
        Ok(())
    }
}

fn check_extent(field: &'static str, value: f32) -> Result<(), SceneError> {
    if value > 0.0 {
        Ok(())
    } else {
        Err(SceneError::InvalidOption {
            field,
            reason: format!("must be positive, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_connection_points_clear_the_rim() {
        let mut canvas = Canvas::new(100.0, 100.0);
        let id = canvas
            .add_circle(CircleSpec::new(Point::new(50.0, 40.0), 10.0))
            .unwrap();
        assert_eq!(canvas.connection_point(id, Side::Left).unwrap(), Point::new(38.0, 40.0));
        assert_eq!(canvas.connection_point(id, Side::Right).unwrap(), Point::new(62.0, 40.0));
        assert_eq!(canvas.connection_point(id, Side::Up).unwrap(), Point::new(50.0, 28.0));
        assert_eq!(canvas.connection_point(id, Side::Down).unwrap(), Point::new(50.0, 52.0));
    }

    #[test]
    fn rect_connection_points_are_edge_midpoints() {
        let mut canvas = Canvas::new(100.0, 100.0);
        let id = canvas
            .add_rect(RectSpec::new(Point::new(10.0, 20.0), 40.0, 30.0))
            .unwrap();
        assert_eq!(canvas.connection_point(id, Side::Left).unwrap(), Point::new(10.0, 35.0));
        assert_eq!(canvas.connection_point(id, Side::Right).unwrap(), Point::new(50.0, 35.0));
        assert_eq!(canvas.connection_point(id, Side::Up).unwrap(), Point::new(30.0, 20.0));
        assert_eq!(canvas.connection_point(id, Side::Down).unwrap(), Point::new(30.0, 50.0));
    }

    #[test]
    fn text_is_not_connectable() {
        let mut canvas = Canvas::new(100.0, 100.0);
        let id = canvas
            .add_text(TextSpec::new(Point::new(0.0, 0.0), "i = 0\nj = 1"))
            .unwrap();
        assert_eq!(
            canvas.connection_point(id, Side::Left),
            Err(SceneError::NotConnectable(id.index()))
        );
        assert!(matches!(
            canvas.node(id).unwrap().shape(),
            ShapeKind::Text { lines } if lines.len() == 2
        ));
    }

    #[test]
    fn connect_and_unconnect_match_connector_and_role() {
        let mut canvas = Canvas::new(100.0, 100.0);
        let node = canvas
            .add_rect(RectSpec::new(Point::new(0.0, 0.0), 10.0, 10.0))
            .unwrap();
        let line = ConnectorId::new(0, canvas.epoch());
        canvas.connect(node, line, Role::Start).unwrap();
        canvas.connect(node, line, Role::Start).unwrap();
        canvas.connect(node, line, Role::End).unwrap();
        assert_eq!(canvas.node(node).unwrap().connections().len(), 2);
        canvas.unconnect(node, line, Role::Start).unwrap();
        assert_eq!(
            canvas.node(node).unwrap().connections(),
            &[Binding {
                connector: line,
                role: Role::End
            }]
        );
    }

    #[test]
    fn set_text_replaces_labels() {
        let mut canvas = Canvas::new(100.0, 100.0);
        let id = canvas
            .add_circle(CircleSpec::new(Point::new(0.0, 0.0), 5.0).label("1"))
            .unwrap();
        canvas.set_text(id, "42").unwrap();
        assert_eq!(canvas.node(id).unwrap().label(), Some("42"));
    }

    #[test]
    fn degenerate_sizes_are_rejected() {
        let mut canvas = Canvas::new(100.0, 100.0);
        assert!(matches!(
            canvas.add_circle(CircleSpec::new(Point::new(0.0, 0.0), 0.0)),
            Err(SceneError::InvalidOption { field: "radius", .. })
        ));
        assert!(canvas.nodes().is_empty());
    }
}
