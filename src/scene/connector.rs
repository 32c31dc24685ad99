use super::node::split_classes;
use super::transition::{Channel, Tween};
use super::{Canvas, ConnectorId, NodeId, ShapeStyle};
use crate::error::SceneError;
use crate::geometry::{CubicPath, Motion, Point, Role, Segment, Side};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorKind {
    Line,
    #[default]
    Arrow,
    /// Arrow drawn as a cubic curve leaving each end through its side.
    Curved,
}

impl ConnectorKind {
    pub fn has_head(self) -> bool {
        !matches!(self, ConnectorKind::Line)
    }
}

/// What one end of a connector is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "node", rename_all = "lowercase")]
pub enum Anchor {
    Free,
    Bound(NodeId),
    /// END of a connector pointing to nothing, resting on its own start node.
    Parked(NodeId),
}

impl Anchor {
    pub fn node(self) -> Option<NodeId> {
        match self {
            Anchor::Free => None,
            Anchor::Bound(node) | Anchor::Parked(node) => Some(node),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Connector {
    pub(crate) id: ConnectorId,
    pub(crate) kind: ConnectorKind,
    pub(crate) start: Point,
    pub(crate) end: Point,
    pub(crate) start_anchor: Anchor,
    pub(crate) end_anchor: Anchor,
    pub(crate) start_side: Option<Side>,
    pub(crate) end_side: Option<Side>,
    pub(crate) displayed: bool,
    pub(crate) shown: bool,
    pub(crate) classes: Vec<String>,
    pub(crate) style: ShapeStyle,
    pub(crate) highlight: Option<String>,
    pub(crate) owner: Option<NodeId>,
}

impl Connector {
    pub fn id(&self) -> ConnectorId {
        self.id
    }

    pub fn kind(&self) -> ConnectorKind {
        self.kind
    }

    /// Final geometry, ignoring any transition still in flight.
    pub fn segment(&self) -> Segment {
        Segment {
            start: self.start,
            end: self.end,
        }
    }

    pub fn path(&self) -> CubicPath {
        CubicPath::between(self.start, self.start_side, self.end, self.end_side)
    }

    pub fn start_anchor(&self) -> Anchor {
        self.start_anchor
    }

    pub fn end_anchor(&self) -> Anchor {
        self.end_anchor
    }

    pub fn start_side(&self) -> Option<Side> {
        self.start_side
    }

    pub fn end_side(&self) -> Option<Side> {
        self.end_side
    }

    /// `false` while the connector points to nothing.
    pub fn is_displayed(&self) -> bool {
        self.displayed
    }

    pub fn is_shown(&self) -> bool {
        self.shown
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

    /// Pointer block this connector is drawn as part of.
    pub fn owner(&self) -> Option<NodeId> {
        self.owner
    }

    fn anchor(&self, role: Role) -> Anchor {
        match role {
            Role::Start => self.start_anchor,
            Role::End => self.end_anchor,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConnectorEnds {
    Points {
        start: Point,
        end: Point,
    },
    Nodes {
        from: NodeId,
        from_side: Side,
        to: Option<NodeId>,
        to_side: Side,
    },
}

#[derive(Debug, Clone)]
pub struct ConnectorSpec {
    pub kind: ConnectorKind,
    pub ends: ConnectorEnds,
    /// When false the connector is placed from the nodes but does not follow
    /// them afterwards.
    pub bind: bool,
    pub class: Option<String>,
    pub style: ShapeStyle,
}

impl ConnectorSpec {
    pub fn line(start: Point, end: Point) -> Self {
        Self::points(ConnectorKind::Line, start, end)
    }

    pub fn points(kind: ConnectorKind, start: Point, end: Point) -> Self {
        Self {
            kind,
            ends: ConnectorEnds::Points { start, end },
            bind: true,
            class: None,
            style: ShapeStyle::default(),
        }
    }

    pub fn between(
        kind: ConnectorKind,
        from: NodeId,
        from_side: Side,
        to: Option<NodeId>,
        to_side: Side,
    ) -> Self {
        Self {
            kind,
            ends: ConnectorEnds::Nodes {
                from,
                from_side,
                to,
                to_side,
            },
            bind: true,
            class: None,
            style: ShapeStyle::default(),
        }
    }

    pub fn unbound(mut self) -> Self {
        self.bind = false;
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

/// Endpoint changes for [`Canvas::move_connector`]. Ends left as `None` are
/// not animated.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ConnectorMove {
    pub start: Option<Motion>,
    pub end: Option<Motion>,
}

impl ConnectorMove {
    pub fn start(motion: Motion) -> Self {
        Self {
            start: Some(motion),
            end: None,
        }
    }

    pub fn end(motion: Motion) -> Self {
        Self {
            start: None,
            end: Some(motion),
        }
    }

    pub fn both(start: Motion, end: Motion) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Moves the whole line.
    pub fn shift(dx: f32, dy: f32) -> Self {
        let by = Motion::By { dx, dy };
        Self::both(by, by)
    }
}

/// New END target for [`Canvas::bind`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Target {
    #[default]
    Keep,
    Nothing,
    Node(NodeId),
}

/// Re-targeting request for [`Canvas::bind`]; unset fields keep their
/// current value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bind {
    pub from: Option<NodeId>,
    pub from_side: Option<Side>,
    pub to: Target,
    pub to_side: Option<Side>,
}

impl Bind {
    pub fn to(node: NodeId, side: Side) -> Self {
        Self {
            to: Target::Node(node),
            to_side: Some(side),
            ..Default::default()
        }
    }

    pub fn to_nothing() -> Self {
        Self {
            to: Target::Nothing,
            ..Default::default()
        }
    }

    pub fn from_node(mut self, node: NodeId, side: Side) -> Self {
        self.from = Some(node);
        self.from_side = Some(side);
        self
    }
}

/// Geometry currently on screen, sampled before a change is applied.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Drawn {
    segment: Segment,
    path: CubicPath,
}

impl Canvas {
    pub fn add_connector(&mut self, spec: ConnectorSpec) -> Result<ConnectorId, SceneError> {
        let id = self.next_connector_id();
        let mut connector = Connector {
            id,
            kind: spec.kind,
            start: Point::default(),
            end: Point::default(),
            start_anchor: Anchor::Free,
            end_anchor: Anchor::Free,
            start_side: None,
            end_side: None,
            displayed: true,
            shown: true,
            classes: split_classes(spec.class.as_deref()),
            style: spec.style,
            highlight: None,
            owner: None,
        };

        match spec.ends {
            ConnectorEnds::Points { start, end } => {
                connector.start = start;
                connector.end = end;
            }
            ConnectorEnds::Nodes {
                from,
                from_side,
                to,
                to_side,
            } => {
                let start = self.connection_point(from, from_side)?;
                let end = match to {
                    Some(to) => self.connection_point(to, to_side)?,
                    None => start,
                };
                connector.start = start;
                connector.end = end;
                connector.start_side = Some(from_side);
                connector.end_side = Some(to_side);
                connector.displayed = to.is_some();
                if spec.bind {
                    connector.start_anchor = Anchor::Bound(from);
                    connector.end_anchor = to.map_or(Anchor::Parked(from), Anchor::Bound);
                }
            }
        }

        let (start_anchor, end_anchor) = (connector.start_anchor, connector.end_anchor);
        self.connectors.push(connector);
        if let Some(node) = start_anchor.node() {
            self.connect(node, id, Role::Start)?;
        }
        if let Some(node) = end_anchor.node() {
            self.connect(node, id, Role::End)?;
        }
        Ok(id)
    }

    /// Moves either end, or both, and animates the change from what is
    /// currently drawn to the new geometry.
    pub fn move_connector(&mut self, id: ConnectorId, step: ConnectorMove) -> Result<(), SceneError> {
        let before = self.drawn(id)?;
        self.retarget(id, step, before)
    }

    fn drawn(&self, id: ConnectorId) -> Result<Drawn, SceneError> {
        Ok(Drawn {
            segment: self.drawn_segment(id)?,
            path: self.drawn_path(id)?,
        })
    }

    fn retarget(&mut self, id: ConnectorId, step: ConnectorMove, before: Drawn) -> Result<(), SceneError> {
        let connector = self.connector_mut(id)?;
        if let Some(motion) = step.start {
            connector.start = motion.apply(connector.start);
        }
        if let Some(motion) = step.end {
            connector.end = motion.apply(connector.end);
        }
        let kind = connector.kind;
        let (start, end, path) = (connector.start, connector.end, connector.path());

        match kind {
            ConnectorKind::Curved => {
                self.schedule_tween(id, Channel::Path, Tween::Path { from: before.path, to: path });
            }
            ConnectorKind::Line | ConnectorKind::Arrow => {
                if step.start.is_some() {
                    let from = before.segment.start;
                    self.schedule_tween(id, Channel::Start, Tween::Point { from, to: start });
                }
                if step.end.is_some() {
                    let from = before.segment.end;
                    self.schedule_tween(id, Channel::End, Tween::Point { from, to: end });
                }
            }
        }
        Ok(())
    }

    /// Point the given end of `id` should sit on according to its anchor.
    pub(crate) fn bound_point(&self, id: ConnectorId, role: Role) -> Result<Point, SceneError> {
        let connector = self.connector(id)?;
        match connector.anchor(role) {
            Anchor::Bound(node) => {
                let side = match role {
                    Role::Start => connector.start_side,
                    Role::End => connector.end_side,
                };
                self.connection_point(node, side.unwrap_or(Side::Down))
            }
            Anchor::Parked(node) => {
                self.connection_point(node, connector.start_side.unwrap_or(Side::Down))
            }
            Anchor::Free => Ok(match role {
                Role::Start => connector.start,
                Role::End => connector.end,
            }),
        }
    }

    /// Re-targets either or both ends of a connector.
    ///
    /// The old bindings are released before the new ones are registered, and
    /// the changed ends are animated. Binding to [`Target::Nothing`] parks
    /// the END on the start node and hides the connector.
    pub fn bind(&mut self, id: ConnectorId, bind: Bind) -> Result<(), SceneError> {
        let before = self.drawn(id)?;
        let old = self.connector(id)?.clone();

        let start_anchor = bind.from.map_or(old.start_anchor, Anchor::Bound);
        let start_node = start_anchor.node();
        let start_side = bind.from_side.or(old.start_side);
        let start_changed = bind.from.is_some() || bind.from_side.is_some();
        let new_start = match (start_changed, start_node) {
            (true, Some(node)) => Some(self.connection_point(node, start_side.unwrap_or(Side::Down))?),
            _ => None,
        };
        let start_point = new_start.unwrap_or(old.start);
        let parked = start_node.map_or(Anchor::Free, Anchor::Parked);

        let end_side = bind.to_side.or(old.end_side);
        let (end_anchor, new_end, displayed) = match bind.to {
            Target::Node(node) => {
                let point = self.connection_point(node, end_side.unwrap_or(Side::Down))?;
                (Anchor::Bound(node), Some(point), true)
            }
            Target::Nothing => (parked, Some(start_point), false),
            Target::Keep => match old.end_anchor {
                Anchor::Bound(node) if bind.to_side.is_some() => {
                    let point = self.connection_point(node, end_side.unwrap_or(Side::Down))?;
                    (Anchor::Bound(node), Some(point), old.displayed)
                }
                Anchor::Parked(_) if start_changed => (parked, Some(start_point), false),
                anchor => (anchor, None, old.displayed),
            },
        };

        if let Some(node) = old.start_anchor.node() {
            self.unconnect(node, id, Role::Start)?;
        }
        if let Some(node) = old.end_anchor.node() {
            self.unconnect(node, id, Role::End)?;
        }
        {
            let connector = self.connector_mut(id)?;
            connector.start_anchor = start_anchor;
            connector.end_anchor = end_anchor;
            connector.start_side = start_side;
            connector.end_side = end_side;
            connector.displayed = displayed;
        }
        if let Some(node) = start_anchor.node() {
            self.connect(node, id, Role::Start)?;
        }
        if let Some(node) = end_anchor.node() {
            self.connect(node, id, Role::End)?;
        }

        log::trace!("bound {id}: start {start_anchor:?}, end {end_anchor:?}");
        let step = ConnectorMove {
            start: new_start.map(Motion::To),
            end: new_end.map(Motion::To),
        };
        self.retarget(id, step, before)
    }

    /// Releases both ends; the drawn geometry stays where it is. Calling it
    /// on an already unbound connector does nothing.
    pub fn unbind(&mut self, id: ConnectorId) -> Result<(), SceneError> {
        let (start, end) = {
            let connector = self.connector(id)?;
            (connector.start_anchor, connector.end_anchor)
        };
        if let Some(node) = start.node() {
            self.unconnect(node, id, Role::Start)?;
        }
        if let Some(node) = end.node() {
            self.unconnect(node, id, Role::End)?;
        }
        let connector = self.connector_mut(id)?;
        connector.start_anchor = Anchor::Free;
        connector.end_anchor = Anchor::Free;
        Ok(())
    }

    pub(crate) fn highlight_connector(&mut self, id: ConnectorId, tag: &str) -> Result<(), SceneError> {
        self.connector_mut(id)?.highlight = Some(tag.to_string());
        Ok(())
    }

    pub(crate) fn unhighlight_connector(&mut self, id: ConnectorId) -> Result<(), SceneError> {
        self.connector_mut(id)?.highlight = None;
        Ok(())
    }

    pub(crate) fn set_connector_shown(&mut self, id: ConnectorId, shown: bool) -> Result<(), SceneError> {
        self.connector_mut(id)?.shown = shown;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::RectSpec;

    fn two_boxes(canvas: &mut Canvas) -> (NodeId, NodeId) {
        let a = canvas
            .add_rect(RectSpec::new(Point::new(0.0, 0.0), 20.0, 20.0))
            .unwrap();
        let b = canvas
            .add_rect(RectSpec::new(Point::new(100.0, 0.0), 20.0, 20.0))
            .unwrap();
        (a, b)
    }

    #[test]
    fn node_ends_bind_both_sides() {
        let mut canvas = Canvas::new(200.0, 100.0);
        let (a, b) = two_boxes(&mut canvas);
        let arrow = canvas
            .add_connector(ConnectorSpec::between(
                ConnectorKind::Arrow,
                a,
                Side::Right,
                Some(b),
                Side::Left,
            ))
            .unwrap();
        let connector = canvas.connector(arrow).unwrap();
        assert_eq!(connector.segment().start, Point::new(20.0, 10.0));
        assert_eq!(connector.segment().end, Point::new(100.0, 10.0));
        assert_eq!(connector.start_anchor(), Anchor::Bound(a));
        assert_eq!(connector.end_anchor(), Anchor::Bound(b));
        assert_eq!(canvas.node(a).unwrap().connections().len(), 1);
        assert_eq!(canvas.node(b).unwrap().connections()[0].role, Role::End);
    }

    #[test]
    fn missing_target_parks_on_start_node() {
        let mut canvas = Canvas::new(200.0, 100.0);
        let (a, _) = two_boxes(&mut canvas);
        let arrow = canvas
            .add_connector(ConnectorSpec::between(
                ConnectorKind::Curved,
                a,
                Side::Right,
                None,
                Side::Left,
            ))
            .unwrap();
        let connector = canvas.connector(arrow).unwrap();
        assert!(!connector.is_displayed());
        assert_eq!(connector.end_anchor(), Anchor::Parked(a));
        assert_eq!(connector.segment().end, connector.segment().start);
        assert_eq!(canvas.node(a).unwrap().connections().len(), 2);
    }

    #[test]
    fn unbound_connector_ignores_node_moves() {
        let mut canvas = Canvas::new(200.0, 100.0);
        let (a, b) = two_boxes(&mut canvas);
        let line = canvas
            .add_connector(
                ConnectorSpec::between(ConnectorKind::Line, a, Side::Right, Some(b), Side::Left)
                    .unbound(),
            )
            .unwrap();
        canvas.move_node(a, Motion::By { dx: 0.0, dy: 50.0 }).unwrap();
        assert_eq!(canvas.connector(line).unwrap().segment().start, Point::new(20.0, 10.0));
        assert!(canvas.node(a).unwrap().connections().is_empty());
    }

    #[test]
    fn shift_moves_both_ends() {
        let mut canvas = Canvas::new(200.0, 100.0);
        let line = canvas
            .add_connector(ConnectorSpec::line(Point::new(0.0, 0.0), Point::new(10.0, 0.0)))
            .unwrap();
        canvas.move_connector(line, ConnectorMove::shift(5.0, 5.0)).unwrap();
        let segment = canvas.connector(line).unwrap().segment();
        assert_eq!(segment.start, Point::new(5.0, 5.0));
        assert_eq!(segment.end, Point::new(15.0, 5.0));
    }

    #[test]
    fn only_the_moved_end_is_animated() {
        let mut canvas = Canvas::new(200.0, 100.0);
        let line = canvas
            .add_connector(ConnectorSpec::line(Point::new(0.0, 0.0), Point::new(10.0, 0.0)))
            .unwrap();
        canvas
            .move_connector(line, ConnectorMove::end(Motion::To(Point::new(10.0, 40.0))))
            .unwrap();
        assert!(canvas.pending_transition(line, Channel::End).is_some());
        assert!(canvas.pending_transition(line, Channel::Start).is_none());
    }

    #[test]
    fn rebinding_releases_the_old_target() {
        let mut canvas = Canvas::new(200.0, 100.0);
        let (a, b) = two_boxes(&mut canvas);
        let c = canvas
            .add_rect(RectSpec::new(Point::new(100.0, 60.0), 20.0, 20.0))
            .unwrap();
        let arrow = canvas
            .add_connector(ConnectorSpec::between(
                ConnectorKind::Arrow,
                a,
                Side::Right,
                Some(b),
                Side::Left,
            ))
            .unwrap();
        canvas.bind(arrow, Bind::to(c, Side::Up)).unwrap();
        assert!(canvas.node(b).unwrap().connections().is_empty());
        assert_eq!(canvas.node(c).unwrap().connections().len(), 1);
        assert_eq!(canvas.connector(arrow).unwrap().segment().end, Point::new(110.0, 60.0));
    }

    #[test]
    fn unbind_twice_is_harmless() {
        let mut canvas = Canvas::new(200.0, 100.0);
        let (a, b) = two_boxes(&mut canvas);
        let arrow = canvas
            .add_connector(ConnectorSpec::between(
                ConnectorKind::Arrow,
                a,
                Side::Right,
                Some(b),
                Side::Left,
            ))
            .unwrap();
        canvas.unbind(arrow).unwrap();
        let once = canvas.connector(arrow).unwrap().clone();
        canvas.unbind(arrow).unwrap();
        let twice = canvas.connector(arrow).unwrap();
        assert_eq!(once.start_anchor(), twice.start_anchor());
        assert_eq!(once.end_anchor(), twice.end_anchor());
        assert_eq!(once.segment(), twice.segment());
        assert!(canvas.node(a).unwrap().connections().is_empty());
        assert!(canvas.node(b).unwrap().connections().is_empty());
    }
}
