use super::Structure;
use super::generate::{CellValue, generate_values};
use super::options::{ListConfig, StructureOptions};
use crate::error::SceneError;
use crate::geometry::{Point, Side};
use crate::scene::{Bind, Canvas, GroupId, NodeId, PointerSpec, RectSpec, StructureId};
use serde::Serialize;

/// Data block over a `next` pointer block.
#[derive(Debug, Clone, Serialize)]
pub struct ListElem {
    pub group: GroupId,
    pub data: NodeId,
    pub pointer: NodeId,
    pub value: CellValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkedList {
    pub(crate) group: GroupId,
    pub(crate) elements: Vec<ListElem>,
}

impl LinkedList {
    pub fn group(&self) -> GroupId {
        self.group
    }

    pub fn elements(&self) -> &[ListElem] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

/// `prev` pointer block, data block and `next` pointer block, stacked.
#[derive(Debug, Clone, Serialize)]
pub struct DllElem {
    pub group: GroupId,
    pub prev: NodeId,
    pub data: NodeId,
    pub next: NodeId,
    pub value: CellValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct DoublyLinkedList {
    pub(crate) group: GroupId,
    pub(crate) elements: Vec<DllElem>,
}

impl DoublyLinkedList {
    pub fn group(&self) -> GroupId {
        self.group
    }

    pub fn elements(&self) -> &[DllElem] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl Canvas {
    /// Builds a singly linked list; element `i` sits at `x + 2*size*i` and
    /// its pointer targets the left side of element `i + 1`. The last
    /// pointer is null.
    pub fn add_list(
        &mut self,
        options: &StructureOptions,
        values: Option<&[CellValue]>,
    ) -> Result<StructureId, SceneError> {
        let config = ListConfig::resolve(options, values.is_some(), "list")?;
        let values = generate_values(&config.generation, values, &mut self.rng)?;
        let size = config.size;
        let class = format!("{} listElem", config.class);

        self.transaction(|canvas| {
            let mut elements: Vec<ListElem> = Vec::with_capacity(values.len());
            // Built back to front so each pointer can target its successor.
            for (i, value) in values.into_iter().enumerate().rev() {
                let origin = element_origin(&config, i);
                let data = canvas.add_rect(
                    RectSpec::new(origin, size, size)
                        .label(value.to_string())
                        .class(class.clone())
                        .style(config.style.clone()),
                )?;
                let next = elements.first().map(|elem| elem.data);
                let mut spec = PointerSpec::new(origin.offset(0.0, size), size, size / 3.0, Side::Right)
                    .to(next, Side::Left)
                    .class(class.clone());
                spec.style = config.style.clone();
                let pointer = canvas.add_pointer(spec)?;
                let group = canvas.add_group(vec![data.into(), pointer.into()])?;
                elements.insert(
                    0,
                    ListElem {
                        group,
                        data,
                        pointer,
                        value,
                    },
                );
            }
            let group = canvas.add_group(elements.iter().map(|elem| elem.group.into()).collect())?;
            canvas.register_structure(Structure::List(LinkedList { group, elements }))
        })
    }

    /// Builds a doubly linked list. Each element stacks a `prev` pointer
    /// (leaving on the left, landing on the right of its predecessor), the
    /// data block and a `next` pointer.
    pub fn add_doubly_linked_list(
        &mut self,
        options: &StructureOptions,
        values: Option<&[CellValue]>,
    ) -> Result<StructureId, SceneError> {
        let config = ListConfig::resolve(options, values.is_some(), "dlList")?;
        let values = generate_values(&config.generation, values, &mut self.rng)?;
        let size = config.size;
        let class = format!("{} dllElem", config.class);

        self.transaction(|canvas| {
            let mut elements: Vec<DllElem> = Vec::with_capacity(values.len());
            for (i, value) in values.into_iter().enumerate().rev() {
                let origin = element_origin(&config, i);
                let pointer = |from_side| {
                    let mut spec = PointerSpec::new(origin, size, size / 3.0, from_side).class(class.clone());
                    spec.style = config.style.clone();
                    spec
                };

                let prev = canvas.add_pointer(pointer(Side::Left).to(None, Side::Right))?;
                let data = canvas.add_rect(
                    RectSpec::new(origin.offset(0.0, size / 3.0), size, size)
                        .label(value.to_string())
                        .class(class.clone())
                        .style(config.style.clone()),
                )?;
                let successor = elements.first().map(|elem| (elem.data, elem.prev));
                let mut next_spec = pointer(Side::Right).to(successor.map(|(data, _)| data), Side::Left);
                next_spec.origin = origin.offset(0.0, size * 4.0 / 3.0);
                let next = canvas.add_pointer(next_spec)?;

                if let Some((_, successor_prev)) = successor {
                    let arrow = canvas.pointer_arrow(successor_prev)?;
                    canvas.bind(arrow, Bind::to(data, Side::Right))?;
                }

                let group = canvas.add_group(vec![data.into(), prev.into(), next.into()])?;
                elements.insert(
                    0,
                    DllElem {
                        group,
                        prev,
                        data,
                        next,
                        value,
                    },
                );
            }
            let group = canvas.add_group(elements.iter().map(|elem| elem.group.into()).collect())?;
            canvas.register_structure(Structure::DoublyLinked(DoublyLinkedList { group, elements }))
        })
    }
}

fn element_origin(config: &ListConfig, index: usize) -> Point {
    config.origin.offset(index as f32 * 2.0 * config.size, 0.0)
}
