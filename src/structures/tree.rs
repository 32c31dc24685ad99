use super::Structure;
use super::generate::{CellValue, TreeSpec, array_to_tree, generate_values};
use super::options::{StructureOptions, TreeConfig, TreeShape};
use crate::error::SceneError;
use crate::geometry::{Point, Side};
use crate::scene::{
    Canvas, CircleSpec, ConnectorId, ConnectorKind, ConnectorSpec, GroupId, Member, NodeId, PointerSpec,
    RectSpec, StructureId,
};
use serde::Serialize;
use std::collections::VecDeque;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TreeVisual {
    /// Circle with a straight arrow to each existing child.
    Circle {
        node: NodeId,
        left_arrow: Option<ConnectorId>,
        right_arrow: Option<ConnectorId>,
    },
    /// Data block over two half-width pointer blocks.
    Block {
        group: GroupId,
        data: NodeId,
        left: NodeId,
        right: NodeId,
    },
}

/// One node of a binary tree. `left` and `right` index into the tree's
/// level-ordered node list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeElem {
    pub value: CellValue,
    pub left: Option<usize>,
    pub right: Option<usize>,
    pub level: u32,
    pub position: u32,
    pub visual: TreeVisual,
}

impl TreeElem {
    pub fn data_node(&self) -> NodeId {
        match self.visual {
            TreeVisual::Circle { node, .. } => node,
            TreeVisual::Block { data, .. } => data,
        }
    }

    pub fn member(&self) -> Member {
        match self.visual {
            TreeVisual::Circle { node, .. } => node.into(),
            TreeVisual::Block { group, .. } => group.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BinaryTree {
    pub(crate) group: GroupId,
    pub(crate) nodes: Vec<TreeElem>,
    pub(crate) root: Option<usize>,
}

impl BinaryTree {
    pub fn group(&self) -> GroupId {
        self.group
    }

    /// Nodes in level order; the root, when present, is at index 0.
    pub fn nodes(&self) -> &[TreeElem] {
        &self.nodes
    }

    pub fn root(&self) -> Option<&TreeElem> {
        self.root.map(|index| &self.nodes[index])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn left(&self, index: usize) -> Option<&TreeElem> {
        self.nodes.get(index)?.left.map(|child| &self.nodes[child])
    }

    pub fn right(&self, index: usize) -> Option<&TreeElem> {
        self.nodes.get(index)?.right.map(|child| &self.nodes[child])
    }

    /// Values in left-root-right order.
    pub fn in_order(&self) -> Vec<&CellValue> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = Vec::new();
        let mut current = self.root;
        while current.is_some() || !stack.is_empty() {
            while let Some(index) = current {
                stack.push(index);
                current = self.nodes[index].left;
            }
            if let Some(index) = stack.pop() {
                out.push(&self.nodes[index].value);
                current = self.nodes[index].right;
            }
        }
        out
    }
}

impl Canvas {
    /// Builds a height-balanced tree from generated or supplied values.
    /// The tree is a search tree when the values are sorted.
    pub fn add_tree(
        &mut self,
        options: &StructureOptions,
        values: Option<&[CellValue]>,
    ) -> Result<StructureId, SceneError> {
        let config = TreeConfig::resolve(options, self.width(), true, values.is_some())?;
        let values = match &config.generation {
            Some(generation) => generate_values(generation, values, &mut self.rng)?,
            None => Vec::new(),
        };
        let spec = array_to_tree(&values, 0, values.len());
        self.build_tree(&config, spec.as_deref())
    }

    /// Builds a tree from a nested `{value, left, right}` description.
    pub fn add_tree_from(&mut self, options: &StructureOptions, spec: &TreeSpec) -> Result<StructureId, SceneError> {
        let config = TreeConfig::resolve(options, self.width(), false, false)?;
        self.build_tree(&config, Some(spec))
    }

    fn build_tree(&mut self, config: &TreeConfig, spec: Option<&TreeSpec>) -> Result<StructureId, SceneError> {
        self.transaction(|canvas| {
            let group = canvas.add_group(Vec::new())?;
            let mut built = Vec::with_capacity(spec.map_or(0, TreeSpec::count));
            let root = match spec {
                Some(spec) => Some(canvas.build_subtree(config, group, spec, 0, 0, &mut built)?),
                None => None,
            };
            let (nodes, root) = level_order(built, root);
            canvas.register_structure(Structure::Tree(BinaryTree { group, nodes, root }))
        })
    }

    /// Children first, so the parent's arrows can land on them. Returns the
    /// index of the new element in `built`.
    fn build_subtree(
        &mut self,
        config: &TreeConfig,
        group: GroupId,
        spec: &TreeSpec,
        level: u32,
        position: u32,
        built: &mut Vec<TreeElem>,
    ) -> Result<usize, SceneError> {
        let left = match &spec.left {
            Some(child) => {
                let slot = child_position(level, position, 0)?;
                Some(self.build_subtree(config, group, child, level + 1, slot, built)?)
            }
            None => None,
        };
        let right = match &spec.right {
            Some(child) => {
                let slot = child_position(level, position, 1)?;
                Some(self.build_subtree(config, group, child, level + 1, slot, built)?)
            }
            None => None,
        };
        let left_data = left.map(|index| built[index].data_node());
        let right_data = right.map(|index| built[index].data_node());

        let x = config.slot(level, position);
        let y = config.level_y(level);
        let label = spec.value.to_string();
        let visual = match config.shape {
            TreeShape::Circle { radius } => {
                let node = self.add_circle(
                    CircleSpec::new(Point::new(x, y), radius)
                        .label(label)
                        .class(config.class.clone())
                        .style(config.style.clone()),
                )?;
                self.group_add(group, node)?;
                let mut arrow_to = |child: Option<NodeId>| -> Result<Option<ConnectorId>, SceneError> {
                    let Some(child) = child else {
                        return Ok(None);
                    };
                    let arrow = self.add_connector(
                        ConnectorSpec::between(ConnectorKind::Arrow, node, Side::Down, Some(child), Side::Up)
                            .class(config.class.clone()),
                    )?;
                    self.group_add(group, arrow)?;
                    Ok(Some(arrow))
                };
                let left_arrow = arrow_to(left_data)?;
                let right_arrow = arrow_to(right_data)?;
                TreeVisual::Circle {
                    node,
                    left_arrow,
                    right_arrow,
                }
            }
            TreeShape::Block { size } => {
                let class = format!("{} btElem", config.class);
                let origin = Point::new(x - size / 2.0, y);
                let data = self.add_rect(
                    RectSpec::new(origin, size, size)
                        .label(label)
                        .class(class.clone())
                        .style(config.style.clone()),
                )?;
                let pointer = |offset: f32, from_side: Side, to: Option<NodeId>| {
                    let mut spec = PointerSpec::new(origin.offset(offset, size), size / 2.0, size / 3.0, from_side)
                        .to(to, Side::Up)
                        .class(class.clone());
                    spec.style = config.style.clone();
                    spec
                };
                let left = self.add_pointer(pointer(0.0, Side::Left, left_data))?;
                let right = self.add_pointer(pointer(size / 2.0, Side::Right, right_data))?;
                let elem_group = self.add_group(vec![data.into(), left.into(), right.into()])?;
                self.group_add(group, elem_group)?;
                TreeVisual::Block {
                    group: elem_group,
                    data,
                    left,
                    right,
                }
            }
        };

        built.push(TreeElem {
            value: spec.value.clone(),
            left,
            right,
            level,
            position,
            visual,
        });
        Ok(built.len() - 1)
    }
}

/// Position of a child one level below `position`; fails once the level no
/// longer fits a `u32` slot index.
fn child_position(level: u32, position: u32, side: u32) -> Result<u32, SceneError> {
    position
        .checked_mul(2)
        .and_then(|doubled| doubled.checked_add(side))
        .ok_or_else(|| SceneError::InvalidOption {
            field: "root",
            reason: format!("tree is deeper than {} levels", level + 1),
        })
}

/// Reorders `built` breadth first from `root` and rewrites child indices.
fn level_order(built: Vec<TreeElem>, root: Option<usize>) -> (Vec<TreeElem>, Option<usize>) {
    let Some(root) = root else {
        return (Vec::new(), None);
    };
    let mut order = Vec::with_capacity(built.len());
    let mut queue = VecDeque::from([root]);
    while let Some(index) = queue.pop_front() {
        order.push(index);
        queue.extend(built[index].left);
        queue.extend(built[index].right);
    }
    let mut remap = vec![0; built.len()];
    for (new, old) in order.iter().enumerate() {
        remap[*old] = new;
    }
    let mut slots: Vec<Option<TreeElem>> = built.into_iter().map(Some).collect();
    let nodes = order
        .iter()
        .filter_map(|old| slots[*old].take())
        .map(|mut elem| {
            elem.left = elem.left.map(|child| remap[child]);
            elem.right = elem.right.map(|child| remap[child]);
            elem
        })
        .collect();
    (nodes, Some(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structures::{GenerationKind, PointerSlot, TreeStyle};

    fn circles() -> StructureOptions {
        StructureOptions {
            radius: Some(10.0),
            width: Some(400.0),
            y: Some(20.0),
            ..Default::default()
        }
    }

    fn numbers(values: &[i64]) -> Vec<CellValue> {
        values.iter().copied().map(CellValue::from).collect()
    }

    #[test]
    fn sorted_values_give_a_search_tree() {
        let mut canvas = Canvas::new(640.0, 480.0);
        let id = canvas.add_tree(&circles(), Some(&numbers(&[1, 2, 3, 4, 5]))).unwrap();
        let tree = canvas.tree(id).unwrap();
        assert_eq!(tree.len(), 5);
        assert_eq!(tree.root().unwrap().value, CellValue::Number(3));
        assert_eq!(tree.left(0).unwrap().value, CellValue::Number(2));
        assert_eq!(tree.right(0).unwrap().value, CellValue::Number(5));
        let in_order: Vec<_> = tree.in_order().into_iter().cloned().collect();
        assert_eq!(in_order, numbers(&[1, 2, 3, 4, 5]));
        let levels: Vec<_> = tree.nodes().iter().map(|elem| elem.level).collect();
        assert_eq!(levels, vec![0, 1, 1, 2, 2]);
    }

    #[test]
    fn circle_nodes_sit_in_level_slots() {
        let mut canvas = Canvas::new(640.0, 480.0);
        let id = canvas.add_tree(&circles(), Some(&numbers(&[1, 2, 3]))).unwrap();
        let tree = canvas.tree(id).unwrap();
        let root = canvas.node(tree.nodes()[0].data_node()).unwrap();
        assert_eq!(root.position(), Point::new(200.0, 20.0));
        let left = canvas.node(tree.nodes()[1].data_node()).unwrap();
        assert_eq!(left.position(), Point::new(400.0 / 3.0, 60.0));

        let arrow = canvas.element_pointer(id, 0, PointerSlot::Left).unwrap();
        let segment = canvas.connector(arrow).unwrap().segment();
        assert_eq!(segment.start, Point::new(200.0, 32.0));
        assert_eq!(segment.end, Point::new(400.0 / 3.0, 48.0));
    }

    #[test]
    fn x_option_shifts_every_slot() {
        let mut canvas = Canvas::new(640.0, 480.0);
        let options = StructureOptions {
            x: Some(50.0),
            ..circles()
        };
        let id = canvas.add_tree(&options, Some(&numbers(&[1, 2, 3]))).unwrap();
        let tree = canvas.tree(id).unwrap();
        let root = canvas.node(tree.nodes()[0].data_node()).unwrap();
        assert_eq!(root.position(), Point::new(250.0, 20.0));
        let right = canvas.node(tree.nodes()[2].data_node()).unwrap();
        assert_eq!(right.position(), Point::new(50.0 + 400.0 / 3.0 * 2.0, 60.0));
    }

    #[test]
    fn leaves_have_no_arrows() {
        let mut canvas = Canvas::new(640.0, 480.0);
        let id = canvas.add_tree(&circles(), Some(&numbers(&[1, 2]))).unwrap();
        let tree = canvas.tree(id).unwrap();
        assert_eq!(tree.root().unwrap().value, CellValue::Number(2));
        assert!(tree.right(0).is_none());
        assert!(matches!(
            canvas.element_pointer(id, 0, PointerSlot::Right),
            Err(SceneError::NoSuchPointer { kind: "tree", .. })
        ));
        assert_eq!(canvas.connectors().len(), 1);
    }

    #[test]
    fn nice_tree_uses_pointer_blocks() {
        let mut canvas = Canvas::new(640.0, 480.0);
        let options = StructureOptions {
            tree: Some(TreeStyle::Nice),
            size: Some(30.0),
            width: Some(300.0),
            ..Default::default()
        };
        let spec = TreeSpec {
            value: CellValue::from("root"),
            left: Some(Box::new(TreeSpec::leaf("l"))),
            right: None,
        };
        let id = canvas.add_tree_from(&options, &spec).unwrap();
        let tree = canvas.tree(id).unwrap();
        let TreeVisual::Block { data, left, right, .. } = tree.nodes()[0].visual else {
            panic!("expected a block element");
        };
        assert_eq!(canvas.node(data).unwrap().position(), Point::new(135.0, 0.0));
        assert_eq!(canvas.node(left).unwrap().position(), Point::new(135.0, 30.0));
        assert_eq!(canvas.node(right).unwrap().position(), Point::new(150.0, 30.0));
        assert!(canvas.pointer_is_null(right).unwrap());
        assert!(!canvas.pointer_is_null(left).unwrap());

        let arrow = canvas.element_pointer(id, 0, PointerSlot::Left).unwrap();
        let child = tree.nodes()[1].data_node();
        assert_eq!(canvas.node(child).unwrap().position(), Point::new(85.0, 60.0));
        assert_eq!(canvas.connector(arrow).unwrap().segment().end, Point::new(100.0, 60.0));
    }

    fn right_chain(depth: i64) -> TreeSpec {
        let mut spec = TreeSpec::leaf(depth - 1);
        for value in (0..depth - 1).rev() {
            spec = TreeSpec {
                value: CellValue::from(value),
                left: None,
                right: Some(Box::new(spec)),
            };
        }
        spec
    }

    #[test]
    fn deepest_addressable_chain_builds() {
        let mut canvas = Canvas::new(640.0, 480.0);
        let id = canvas.add_tree_from(&circles(), &right_chain(33)).unwrap();
        let tree = canvas.tree(id).unwrap();
        assert_eq!(tree.len(), 33);
        let last = tree.nodes().last().unwrap();
        assert_eq!(last.level, 32);
        assert_eq!(last.position, u32::MAX);
    }

    #[test]
    fn overly_deep_tree_is_rejected_without_side_effects() {
        let mut canvas = Canvas::new(640.0, 480.0);
        let err = canvas.add_tree_from(&circles(), &right_chain(40)).unwrap_err();
        assert!(matches!(err, SceneError::InvalidOption { field: "root", .. }));
        assert!(canvas.nodes().is_empty());
        assert!(canvas.connectors().is_empty());
        assert!(canvas.roots().is_empty());
    }

    #[test]
    fn empty_generation_builds_an_empty_tree() {
        let mut canvas = Canvas::new(640.0, 480.0);
        let options = StructureOptions {
            kind: Some(GenerationKind::Param),
            ..circles()
        };
        let id = canvas.add_tree(&options, Some(&[])).unwrap();
        let tree = canvas.tree(id).unwrap();
        assert!(tree.is_empty());
        assert!(tree.root().is_none());
    }

    #[test]
    fn highlighting_a_tree_reaches_every_node() {
        let mut canvas = Canvas::new(640.0, 480.0);
        let id = canvas.add_tree(&circles(), Some(&numbers(&[1, 2, 3]))).unwrap();
        canvas.highlight_element(id, None, "done").unwrap();
        let tree = canvas.tree(id).unwrap();
        for elem in tree.nodes() {
            assert_eq!(canvas.node(elem.data_node()).unwrap().highlight(), Some("done"));
        }
    }
}
