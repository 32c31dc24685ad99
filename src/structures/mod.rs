//! Composite structures (arrays, linked lists, binary trees) built from
//! shapes, pointer blocks and connectors, plus the per-element operations
//! they expose.

mod array;
pub mod generate;
mod list;
pub mod options;
mod tree;

pub use array::{Array, ArrayCell};
pub use generate::{CellValue, Generation, Order, TreeSpec, array_to_tree, generate_values, shuffle};
pub use list::{DllElem, DoublyLinkedList, LinkedList, ListElem};
pub use options::{
    ArrayConfig, CellShape, Comparator, GenerationKind, ListConfig, SortMode, StructureOptions,
    TreeConfig, TreeShape, TreeStyle,
};
pub use tree::{BinaryTree, TreeElem, TreeVisual};

use crate::error::SceneError;
use crate::scene::{Canvas, ConnectorId, GroupId, Member, NodeId, StructureId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Structure {
    Array(Array),
    List(LinkedList),
    DoublyLinked(DoublyLinkedList),
    Tree(BinaryTree),
}

/// Named pointer of a list element or tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerSlot {
    Next,
    Prev,
    Left,
    Right,
}

impl Structure {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Structure::Array(_) => "array",
            Structure::List(_) => "list",
            Structure::DoublyLinked(_) => "doubly linked list",
            Structure::Tree(_) => "tree",
        }
    }

    pub fn group(&self) -> GroupId {
        match self {
            Structure::Array(array) => array.group,
            Structure::List(list) => list.group,
            Structure::DoublyLinked(list) => list.group,
            Structure::Tree(tree) => tree.group,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Structure::Array(array) => array.cells.len(),
            Structure::List(list) => list.elements.len(),
            Structure::DoublyLinked(list) => list.elements.len(),
            Structure::Tree(tree) => tree.nodes.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Value at `index`; tree nodes are indexed in level order.
    pub fn value(&self, index: usize) -> Option<&CellValue> {
        match self {
            Structure::Array(array) => array.cells.get(index).map(|cell| &cell.value),
            Structure::List(list) => list.elements.get(index).map(|e| &e.value),
            Structure::DoublyLinked(list) => list.elements.get(index).map(|e| &e.value),
            Structure::Tree(tree) => tree.nodes.get(index).map(|e| &e.value),
        }
    }

    fn value_mut(&mut self, index: usize) -> Option<&mut CellValue> {
        match self {
            Structure::Array(array) => array.cells.get_mut(index).map(|cell| &mut cell.value),
            Structure::List(list) => list.elements.get_mut(index).map(|e| &mut e.value),
            Structure::DoublyLinked(list) => list.elements.get_mut(index).map(|e| &mut e.value),
            Structure::Tree(tree) => tree.nodes.get_mut(index).map(|e| &mut e.value),
        }
    }

    /// The shape that carries the value at `index`.
    pub fn data_node(&self, index: usize) -> Option<NodeId> {
        match self {
            Structure::Array(array) => array.cells.get(index).map(|cell| cell.node),
            Structure::List(list) => list.elements.get(index).map(|e| e.data),
            Structure::DoublyLinked(list) => list.elements.get(index).map(|e| e.data),
            Structure::Tree(tree) => tree.nodes.get(index).map(TreeElem::data_node),
        }
    }

    /// Everything drawn for the element at `index`.
    pub fn element_member(&self, index: usize) -> Option<Member> {
        match self {
            Structure::Array(array) => array.cells.get(index).map(|cell| cell.node.into()),
            Structure::List(list) => list.elements.get(index).map(|e| e.group.into()),
            Structure::DoublyLinked(list) => list.elements.get(index).map(|e| e.group.into()),
            Structure::Tree(tree) => tree.nodes.get(index).map(TreeElem::member),
        }
    }
}

impl Canvas {
    pub(crate) fn register_structure(&mut self, structure: Structure) -> Result<StructureId, SceneError> {
        let id = self.next_structure_id();
        let group = structure.group();
        log::debug!(
            "registered {} {id} with {} elements",
            structure.kind_name(),
            structure.len()
        );
        self.structures.push(structure);
        self.add_root(group)?;
        Ok(id)
    }

    pub fn array(&self, id: StructureId) -> Result<&Array, SceneError> {
        match self.structure(id)? {
            Structure::Array(array) => Ok(array),
            other => Err(wrong_structure(id, "array", other)),
        }
    }

    pub(crate) fn array_mut(&mut self, id: StructureId) -> Result<&mut Array, SceneError> {
        match self.structure_mut(id)? {
            Structure::Array(array) => Ok(array),
            other => Err(wrong_structure(id, "array", other)),
        }
    }

    pub fn list(&self, id: StructureId) -> Result<&LinkedList, SceneError> {
        match self.structure(id)? {
            Structure::List(list) => Ok(list),
            other => Err(wrong_structure(id, "list", other)),
        }
    }

    pub fn doubly_linked_list(&self, id: StructureId) -> Result<&DoublyLinkedList, SceneError> {
        match self.structure(id)? {
            Structure::DoublyLinked(list) => Ok(list),
            other => Err(wrong_structure(id, "doubly linked list", other)),
        }
    }

    pub fn tree(&self, id: StructureId) -> Result<&BinaryTree, SceneError> {
        match self.structure(id)? {
            Structure::Tree(tree) => Ok(tree),
            other => Err(wrong_structure(id, "tree", other)),
        }
    }

    pub fn element_value(&self, id: StructureId, index: usize) -> Result<&CellValue, SceneError> {
        let structure = self.structure(id)?;
        structure.value(index).ok_or(SceneError::IndexOutOfRange {
            index,
            len: structure.len(),
        })
    }

    pub fn element_node(&self, id: StructureId, index: usize) -> Result<NodeId, SceneError> {
        let structure = self.structure(id)?;
        structure.data_node(index).ok_or(SceneError::IndexOutOfRange {
            index,
            len: structure.len(),
        })
    }

    pub fn element_member(&self, id: StructureId, index: usize) -> Result<Member, SceneError> {
        let structure = self.structure(id)?;
        structure.element_member(index).ok_or(SceneError::IndexOutOfRange {
            index,
            len: structure.len(),
        })
    }

    /// Connector drawn for `slot` of the element at `index`.
    pub fn element_pointer(
        &self,
        id: StructureId,
        index: usize,
        slot: PointerSlot,
    ) -> Result<ConnectorId, SceneError> {
        let structure = self.structure(id)?;
        let len = structure.len();
        let out_of_range = SceneError::IndexOutOfRange { index, len };
        let missing = || SceneError::NoSuchPointer {
            kind: structure.kind_name(),
            slot: format!("{slot:?}").to_lowercase(),
        };
        let pointer_node = match (structure, slot) {
            (Structure::List(list), PointerSlot::Next) => list.elements.get(index).ok_or(out_of_range)?.pointer,
            (Structure::DoublyLinked(list), PointerSlot::Next) => {
                list.elements.get(index).ok_or(out_of_range)?.next
            }
            (Structure::DoublyLinked(list), PointerSlot::Prev) => {
                list.elements.get(index).ok_or(out_of_range)?.prev
            }
            (Structure::Tree(tree), PointerSlot::Left | PointerSlot::Right) => {
                let elem = tree.nodes.get(index).ok_or(out_of_range)?;
                match (&elem.visual, slot) {
                    (TreeVisual::Block { left, .. }, PointerSlot::Left) => *left,
                    (TreeVisual::Block { right, .. }, _) => *right,
                    (TreeVisual::Circle { left_arrow, .. }, PointerSlot::Left) => {
                        return left_arrow.ok_or_else(missing);
                    }
                    (TreeVisual::Circle { right_arrow, .. }, _) => {
                        return right_arrow.ok_or_else(missing);
                    }
                }
            }
            _ => return Err(missing()),
        };
        self.pointer_arrow(pointer_node)
    }

    /// Highlights one element, or every element when `index` is `None`.
    ///
    /// Element operations that take `&mut self` first commit array swaps
    /// still in flight, so indices always address the logical order.
    pub fn highlight_element(
        &mut self,
        id: StructureId,
        index: Option<usize>,
        tag: &str,
    ) -> Result<(), SceneError> {
        self.flush_pending_swaps(id)?;
        let member = self.element_or_whole(id, index)?;
        self.highlight(member, tag)
    }

    pub fn unhighlight_element(&mut self, id: StructureId, index: Option<usize>) -> Result<(), SceneError> {
        self.flush_pending_swaps(id)?;
        let member = self.element_or_whole(id, index)?;
        self.unhighlight(member)
    }

    /// Replaces the value at `index` and the label drawn for it.
    pub fn set_element_value(
        &mut self,
        id: StructureId,
        index: usize,
        value: CellValue,
    ) -> Result<(), SceneError> {
        self.flush_pending_swaps(id)?;
        let node = self.element_node(id, index)?;
        self.set_text(node, value.to_string())?;
        if let Some(slot) = self.structure_mut(id)?.value_mut(index) {
            *slot = value;
        }
        Ok(())
    }

    fn element_or_whole(&self, id: StructureId, index: Option<usize>) -> Result<Member, SceneError> {
        match index {
            Some(index) => self.element_member(id, index),
            None => Ok(self.structure(id)?.group().into()),
        }
    }
}

fn wrong_structure(id: StructureId, expected: &'static str, actual: &Structure) -> SceneError {
    SceneError::WrongStructure {
        index: id.index(),
        expected,
        actual: actual.kind_name(),
    }
}
