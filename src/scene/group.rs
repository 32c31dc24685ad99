use super::{Anchor, Canvas, ConnectorMove, GroupId, Member, NodeId};
use crate::error::SceneError;
use crate::geometry::{Motion, Point};
use serde::Serialize;

/// Ordered collection of members; has no position of its own.
#[derive(Debug, Clone, Serialize)]
pub struct Group {
    pub(crate) id: GroupId,
    pub(crate) members: Vec<Member>,
}

impl Group {
    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }
}

impl Canvas {
    pub fn add_group(&mut self, members: Vec<Member>) -> Result<GroupId, SceneError> {
        for member in &members {
            self.check_member(*member)?;
        }
        let id = GroupId::new(self.groups.len(), self.epoch());
        self.groups.push(Group { id, members });
        Ok(id)
    }

    pub fn group_add(&mut self, group: GroupId, member: impl Into<Member>) -> Result<(), SceneError> {
        let member = member.into();
        self.check_member(member)?;
        self.group(group)?;
        if let Member::Group(inner) = member {
            if self.reaches(inner, group)? {
                return Err(SceneError::InvalidOption {
                    field: "member",
                    reason: format!("adding {inner} to {group} would nest {group} inside itself"),
                });
            }
        }
        self.group_mut(group)?.members.push(member);
        Ok(())
    }

    /// Whether `target` is `group` or nested anywhere below it.
    fn reaches(&self, group: GroupId, target: GroupId) -> Result<bool, SceneError> {
        if group == target {
            return Ok(true);
        }
        for member in &self.group(group)?.members {
            if let Member::Group(inner) = *member {
                if self.reaches(inner, target)? {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Hides `member` and drops it from the group. Returns whether it was a
    /// member.
    pub fn group_remove(&mut self, group: GroupId, member: impl Into<Member>) -> Result<bool, SceneError> {
        let member = member.into();
        let members = &mut self.group_mut(group)?.members;
        let Some(position) = members.iter().position(|m| *m == member) else {
            return Ok(false);
        };
        members.remove(position);
        self.hide(member)?;
        Ok(true)
    }

    /// Hides and drops the member at `index`.
    pub fn group_remove_at(&mut self, group: GroupId, index: usize) -> Result<Member, SceneError> {
        let members = &mut self.group_mut(group)?.members;
        if index >= members.len() {
            return Err(SceneError::IndexOutOfRange {
                index,
                len: members.len(),
            });
        }
        let member = members.remove(index);
        self.hide(member)?;
        Ok(member)
    }

    pub fn highlight(&mut self, item: impl Into<Member>, tag: &str) -> Result<(), SceneError> {
        match item.into() {
            Member::Node(id) => self.highlight_node(id, tag),
            Member::Connector(id) => self.highlight_connector(id, tag),
            Member::Group(id) => {
                let members = self.group(id)?.members.clone();
                members
                    .into_iter()
                    .try_for_each(|member| self.highlight(member, tag))
            }
        }
    }

    pub fn unhighlight(&mut self, item: impl Into<Member>) -> Result<(), SceneError> {
        match item.into() {
            Member::Node(id) => self.unhighlight_node(id),
            Member::Connector(id) => self.unhighlight_connector(id),
            Member::Group(id) => {
                let members = self.group(id)?.members.clone();
                members
                    .into_iter()
                    .try_for_each(|member| self.unhighlight(member))
            }
        }
    }

    pub fn show(&mut self, item: impl Into<Member>) -> Result<(), SceneError> {
        self.set_shown(item.into(), true)
    }

    pub fn hide(&mut self, item: impl Into<Member>) -> Result<(), SceneError> {
        self.set_shown(item.into(), false)
    }

    fn set_shown(&mut self, member: Member, shown: bool) -> Result<(), SceneError> {
        match member {
            Member::Node(id) => self.set_node_shown(id, shown),
            Member::Connector(id) => self.set_connector_shown(id, shown),
            Member::Group(id) => {
                let members = self.group(id)?.members.clone();
                members
                    .into_iter()
                    .try_for_each(|member| self.set_shown(member, shown))
            }
        }
    }

    /// Moves a node, a connector or every member of a group.
    ///
    /// An absolute move of a group places its first node at the target and
    /// shifts the other members by the same amount. Connectors inside a
    /// group only move their free ends; bound ends follow their nodes.
    pub fn move_item(&mut self, item: impl Into<Member>, motion: Motion) -> Result<(), SceneError> {
        match item.into() {
            Member::Node(id) => self.move_node(id, motion),
            Member::Connector(id) => {
                let (dx, dy) = match motion {
                    Motion::By { dx, dy } => (dx, dy),
                    Motion::To(target) => {
                        let start = self.connector(id)?.start;
                        (target.x - start.x, target.y - start.y)
                    }
                };
                self.move_connector(id, ConnectorMove::shift(dx, dy))
            }
            Member::Group(id) => {
                let (dx, dy) = match motion {
                    Motion::By { dx, dy } => (dx, dy),
                    Motion::To(target) => match self.first_node(id)? {
                        Some(node) => motion.delta_from(self.node(node)?.position),
                        None => (target.x, target.y),
                    },
                };
                self.shift_group(id, dx, dy)
            }
        }
    }

    fn shift_group(&mut self, group: GroupId, dx: f32, dy: f32) -> Result<(), SceneError> {
        let by = Motion::By { dx, dy };
        for member in self.group(group)?.members.clone() {
            match member {
                Member::Node(id) => self.move_node(id, by)?,
                Member::Group(id) => self.shift_group(id, dx, dy)?,
                Member::Connector(id) => {
                    let connector = self.connector(id)?;
                    let step = ConnectorMove {
                        start: (connector.start_anchor == Anchor::Free).then_some(by),
                        end: (connector.end_anchor == Anchor::Free).then_some(by),
                    };
                    if step.start.is_some() || step.end.is_some() {
                        self.move_connector(id, step)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn first_node(&self, group: GroupId) -> Result<Option<NodeId>, SceneError> {
        for member in &self.group(group)?.members {
            match *member {
                Member::Node(id) => return Ok(Some(id)),
                Member::Group(id) => {
                    if let Some(node) = self.first_node(id)? {
                        return Ok(Some(node));
                    }
                }
                Member::Connector(_) => {}
            }
        }
        Ok(None)
    }

    /// Position of the first node found in `item`, depth first.
    pub fn anchor_position(&self, item: impl Into<Member>) -> Result<Option<Point>, SceneError> {
        match item.into() {
            Member::Node(id) => Ok(Some(self.node(id)?.position)),
            Member::Connector(id) => Ok(Some(self.connector(id)?.start)),
            Member::Group(id) => self
                .first_node(id)?
                .map(|node| self.node(node).map(|n| n.position))
                .transpose(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Side;
    use crate::scene::{CircleSpec, ConnectorKind, ConnectorSpec, RectSpec};

    #[test]
    fn operations_fan_out_to_members() {
        let mut canvas = Canvas::new(200.0, 100.0);
        let a = canvas
            .add_circle(CircleSpec::new(Point::new(10.0, 10.0), 5.0))
            .unwrap();
        let b = canvas
            .add_rect(RectSpec::new(Point::new(40.0, 0.0), 20.0, 20.0))
            .unwrap();
        let group = canvas.add_group(vec![a.into(), b.into()]).unwrap();

        canvas.highlight(group, "active").unwrap();
        assert_eq!(canvas.node(a).unwrap().highlight(), Some("active"));
        canvas.highlight(group, "done").unwrap();
        assert_eq!(canvas.node(b).unwrap().highlight(), Some("done"));
        canvas.unhighlight(group).unwrap();
        assert_eq!(canvas.node(b).unwrap().highlight(), None);

        canvas.hide(group).unwrap();
        assert!(!canvas.node(a).unwrap().is_shown());
        canvas.show(group).unwrap();
        assert!(canvas.node(a).unwrap().is_shown());
    }

    #[test]
    fn absolute_group_move_keeps_relative_layout() {
        let mut canvas = Canvas::new(200.0, 100.0);
        let a = canvas
            .add_rect(RectSpec::new(Point::new(0.0, 0.0), 10.0, 10.0))
            .unwrap();
        let b = canvas
            .add_rect(RectSpec::new(Point::new(30.0, 0.0), 10.0, 10.0))
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
        let group = canvas
            .add_group(vec![a.into(), b.into(), arrow.into()])
            .unwrap();

        canvas.move_item(group, Motion::To(Point::new(100.0, 50.0))).unwrap();
        canvas.settle();
        assert_eq!(canvas.node(a).unwrap().position(), Point::new(100.0, 50.0));
        assert_eq!(canvas.node(b).unwrap().position(), Point::new(130.0, 50.0));
        let segment = canvas.connector(arrow).unwrap().segment();
        assert_eq!(segment.start, Point::new(110.0, 55.0));
        assert_eq!(segment.end, Point::new(130.0, 55.0));
    }

    #[test]
    fn groups_cannot_contain_themselves() {
        let mut canvas = Canvas::new(200.0, 100.0);
        let node = canvas
            .add_circle(CircleSpec::new(Point::new(10.0, 10.0), 5.0))
            .unwrap();
        let group = canvas.add_group(vec![node.into()]).unwrap();
        assert!(matches!(
            canvas.group_add(group, group),
            Err(SceneError::InvalidOption { field: "member", .. })
        ));
        assert_eq!(canvas.group(group).unwrap().members(), &[Member::Node(node)]);
        canvas.highlight(group, "active").unwrap();
        assert_eq!(canvas.node(node).unwrap().highlight(), Some("active"));
    }

    #[test]
    fn nesting_cycles_are_rejected() {
        let mut canvas = Canvas::new(200.0, 100.0);
        let node = canvas
            .add_circle(CircleSpec::new(Point::new(10.0, 10.0), 5.0))
            .unwrap();
        let outer = canvas.add_group(vec![node.into()]).unwrap();
        let middle = canvas.add_group(vec![outer.into()]).unwrap();
        let inner = canvas.add_group(Vec::new()).unwrap();
        canvas.group_add(inner, middle).unwrap();
        assert!(matches!(
            canvas.group_add(outer, middle),
            Err(SceneError::InvalidOption { field: "member", .. })
        ));
        assert!(matches!(
            canvas.group_add(outer, inner),
            Err(SceneError::InvalidOption { field: "member", .. })
        ));

        // sharing a group between two parents is not a cycle
        let sibling = canvas.add_group(Vec::new()).unwrap();
        canvas.group_add(sibling, outer).unwrap();
        canvas.hide(inner).unwrap();
        assert!(!canvas.node(node).unwrap().is_shown());
        canvas.move_item(inner, Motion::By { dx: 5.0, dy: 0.0 }).unwrap();
        assert_eq!(canvas.node(node).unwrap().position(), Point::new(15.0, 10.0));
    }

    #[test]
    fn removing_a_member_hides_it() {
        let mut canvas = Canvas::new(200.0, 100.0);
        let a = canvas
            .add_circle(CircleSpec::new(Point::new(10.0, 10.0), 5.0))
            .unwrap();
        let b = canvas
            .add_circle(CircleSpec::new(Point::new(30.0, 10.0), 5.0))
            .unwrap();
        let group = canvas.add_group(vec![a.into(), b.into()]).unwrap();

        assert!(canvas.group_remove(group, a).unwrap());
        assert!(!canvas.group_remove(group, a).unwrap());
        assert!(!canvas.node(a).unwrap().is_shown());
        assert_eq!(canvas.group_remove_at(group, 0).unwrap(), Member::Node(b));
        assert!(matches!(
            canvas.group_remove_at(group, 0),
            Err(SceneError::IndexOutOfRange { index: 0, len: 0 })
        ));
    }
}
