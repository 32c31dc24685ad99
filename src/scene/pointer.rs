use super::{Canvas, ConnectorId, ConnectorKind, ConnectorSpec, NodeId, ShapeKind, ShapeStyle};
use crate::error::SceneError;
use crate::geometry::{Point, Side};

/// A pointer block: a small box whose arrow leaves through `from_side` and
/// lands on `to` (or nowhere, in which case the box is drawn crossed out).
#[derive(Debug, Clone)]
pub struct PointerSpec {
    pub origin: Point,
    pub width: f32,
    pub height: f32,
    pub from_side: Side,
    pub to: Option<NodeId>,
    pub to_side: Side,
    pub curved: bool,
    pub class: Option<String>,
    pub style: ShapeStyle,
}

impl PointerSpec {
    pub fn new(origin: Point, width: f32, height: f32, from_side: Side) -> Self {
        Self {
            origin,
            width,
            height,
            from_side,
            to: None,
            to_side: Side::Left,
            curved: true,
            class: None,
            style: ShapeStyle::default(),
        }
    }

    pub fn to(mut self, node: Option<NodeId>, side: Side) -> Self {
        self.to = node;
        self.to_side = side;
        self
    }

    pub fn straight(mut self) -> Self {
        self.curved = false;
        self
    }

    pub fn class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }
}

impl Canvas {
    pub fn add_pointer(&mut self, spec: PointerSpec) -> Result<NodeId, SceneError> {
        if let Some(target) = spec.to {
            self.connection_point(target, spec.to_side)?;
        }
        let id = self.next_node_id();
        let arrow = self.next_connector_id();
        self.push_pointer_node(
            spec.origin,
            spec.width,
            spec.height,
            arrow,
            spec.class.as_deref(),
            spec.style.clone(),
        )?;

        let kind = if spec.curved {
            ConnectorKind::Curved
        } else {
            ConnectorKind::Arrow
        };
        let mut arrow_spec = ConnectorSpec::between(kind, id, spec.from_side, spec.to, spec.to_side);
        arrow_spec.class = spec.class;
        match self.add_connector(arrow_spec) {
            Ok(created) => {
                self.connector_mut(created)?.owner = Some(id);
                Ok(id)
            }
            Err(err) => {
                self.nodes.pop();
                Err(err)
            }
        }
    }

    /// The arrow drawn by a pointer block.
    pub fn pointer_arrow(&self, id: NodeId) -> Result<ConnectorId, SceneError> {
        match self.node(id)?.shape {
            ShapeKind::Pointer { arrow, .. } => Ok(arrow),
            _ => Err(SceneError::NotAPointer(id.index())),
        }
    }

    /// Whether the pointer block currently points to nothing.
    pub fn pointer_is_null(&self, id: NodeId) -> Result<bool, SceneError> {
        let arrow = self.pointer_arrow(id)?;
        Ok(!self.connector(arrow)?.displayed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Motion;
    use crate::scene::{Bind, RectSpec};

    #[test]
    fn null_pointer_toggles_with_binding() {
        let mut canvas = Canvas::new(200.0, 100.0);
        let target = canvas
            .add_rect(RectSpec::new(Point::new(100.0, 0.0), 30.0, 30.0))
            .unwrap();
        let pointer = canvas
            .add_pointer(PointerSpec::new(Point::new(0.0, 30.0), 30.0, 10.0, Side::Right))
            .unwrap();
        assert!(canvas.pointer_is_null(pointer).unwrap());

        let arrow = canvas.pointer_arrow(pointer).unwrap();
        canvas.bind(arrow, Bind::to(target, Side::Left)).unwrap();
        assert!(!canvas.pointer_is_null(pointer).unwrap());
        canvas.settle();
        assert_eq!(
            canvas.connector(arrow).unwrap().segment().end,
            Point::new(100.0, 15.0)
        );

        canvas.bind(arrow, Bind::to_nothing()).unwrap();
        assert!(canvas.pointer_is_null(pointer).unwrap());
        assert!(canvas.node(target).unwrap().connections().is_empty());
    }

    #[test]
    fn moving_a_pointer_drags_its_arrow() {
        let mut canvas = Canvas::new(200.0, 100.0);
        let target = canvas
            .add_rect(RectSpec::new(Point::new(100.0, 0.0), 30.0, 30.0))
            .unwrap();
        let pointer = canvas
            .add_pointer(
                PointerSpec::new(Point::new(0.0, 30.0), 30.0, 10.0, Side::Right)
                    .to(Some(target), Side::Left),
            )
            .unwrap();
        let arrow = canvas.pointer_arrow(pointer).unwrap();
        assert_eq!(canvas.connector(arrow).unwrap().owner(), Some(pointer));

        canvas.move_node(pointer, Motion::By { dx: 0.0, dy: 20.0 }).unwrap();
        canvas.settle();
        assert_eq!(
            canvas.connector(arrow).unwrap().segment().start,
            Point::new(30.0, 55.0)
        );
    }

    #[test]
    fn pointer_to_text_is_rejected_without_side_effects() {
        let mut canvas = Canvas::new(200.0, 100.0);
        let label = canvas
            .add_text(crate::scene::TextSpec::new(Point::new(0.0, 0.0), "head"))
            .unwrap();
        let result = canvas.add_pointer(
            PointerSpec::new(Point::new(0.0, 30.0), 30.0, 10.0, Side::Right)
                .to(Some(label), Side::Left),
        );
        assert_eq!(result, Err(SceneError::NotConnectable(label.index())));
        assert_eq!(canvas.nodes().len(), 1);
    }
}
