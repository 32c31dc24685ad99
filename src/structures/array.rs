use super::generate::{CellValue, generate_values};
use super::options::{ArrayConfig, CellShape, StructureOptions};
use super::Structure;
use crate::error::SceneError;
use crate::geometry::{Motion, Point};
use crate::scene::{Canvas, CircleSpec, GroupId, NodeId, RectSpec, StructureId, TimerAction};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArrayCell {
    pub node: NodeId,
    pub value: CellValue,
}

/// Row of value cells, addressed by index.
#[derive(Debug, Clone, Serialize)]
pub struct Array {
    pub(crate) group: GroupId,
    pub(crate) cells: Vec<ArrayCell>,
    pub(crate) lift: f32,
}

impl Array {
    pub fn group(&self) -> GroupId {
        self.group
    }

    pub fn cells(&self) -> &[ArrayCell] {
        &self.cells
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn value(&self, index: usize) -> Option<&CellValue> {
        self.cells.get(index).map(|cell| &cell.value)
    }

    pub fn node(&self, index: usize) -> Option<NodeId> {
        self.cells.get(index).map(|cell| cell.node)
    }

    pub fn values(&self) -> impl Iterator<Item = &CellValue> {
        self.cells.iter().map(|cell| &cell.value)
    }

    fn check_index(&self, index: usize) -> Result<(), SceneError> {
        if index < self.cells.len() {
            Ok(())
        } else {
            Err(SceneError::IndexOutOfRange {
                index,
                len: self.cells.len(),
            })
        }
    }
}

impl Canvas {
    /// Builds an array of circles (when `radius` is given) or rectangles
    /// laid out left to right from `(x, y)`.
    pub fn add_array(
        &mut self,
        options: &StructureOptions,
        values: Option<&[CellValue]>,
    ) -> Result<StructureId, SceneError> {
        let config = ArrayConfig::resolve(options, values.is_some())?;
        let values = generate_values(&config.generation, values, &mut self.rng)?;

        self.transaction(|canvas| {
            let pitch = config.pitch();
            let mut cells = Vec::with_capacity(values.len());
            for (i, value) in values.into_iter().enumerate() {
                let x = config.origin.x + i as f32 * pitch;
                let origin = Point::new(x, config.origin.y);
                let node = match config.cell {
                    CellShape::Circle { radius } => canvas.add_circle(
                        CircleSpec::new(origin, radius)
                            .label(value.to_string())
                            .class(config.class.clone())
                            .style(config.style.clone()),
                    )?,
                    CellShape::Rect { width, height } => canvas.add_rect(
                        RectSpec::new(origin, width, height)
                            .label(value.to_string())
                            .class(config.class.clone())
                            .style(config.style.clone()),
                    )?,
                };
                cells.push(ArrayCell { node, value });
            }
            let group = canvas.add_group(cells.iter().map(|cell| cell.node.into()).collect())?;
            canvas.register_structure(Structure::Array(Array {
                group,
                cells,
                lift: config.lift(),
            }))
        })
    }

    /// Exchanges the cells at `i` and `j`.
    ///
    /// The cells trade positions immediately and are drawn lifted (`i` below
    /// the row, `j` above it) and raised above their neighbours. The lift is
    /// dropped halfway through the transition; the index mapping is
    /// committed once the transition duration has elapsed.
    pub fn array_swap(&mut self, id: StructureId, i: usize, j: usize) -> Result<(), SceneError> {
        self.flush_pending_swaps(id)?;
        let array = self.array(id)?;
        array.check_index(i)?;
        array.check_index(j)?;
        if i == j {
            return Ok(());
        }
        let (a, b, lift) = (array.cells[i].node, array.cells[j].node, array.lift);
        let pa = self.node(a)?.position();
        let pb = self.node(b)?.position();

        self.cancel_visual_timers(&[a, b]);
        for (node, offset) in [(a, lift), (b, -lift)] {
            let node = self.node_mut(node)?;
            node.lift = offset;
            node.raised = true;
        }
        self.move_node(a, Motion::To(pb))?;
        self.move_node(b, Motion::To(pa))?;

        let duration = self.animation.duration;
        self.schedule_timer(duration / 2.0, TimerAction::ResetLift(vec![a, b]));
        self.schedule_timer(duration, TimerAction::LowerNodes(vec![a, b]));
        self.schedule_timer(duration, TimerAction::CommitSwap { structure: id, i, j });
        log::debug!("{id}: swapping {i} and {j}");
        Ok(())
    }

    pub(crate) fn commit_array_swap(&mut self, id: StructureId, i: usize, j: usize) -> Result<(), SceneError> {
        let array = self.array_mut(id)?;
        array.check_index(i)?;
        array.check_index(j)?;
        array.cells.swap(i, j);
        Ok(())
    }

    /// Commits swaps of `id` still waiting on their timer so index lookups
    /// see the up-to-date mapping.
    pub(crate) fn flush_pending_swaps(&mut self, id: StructureId) -> Result<(), SceneError> {
        let mut pending = Vec::new();
        self.timers.retain(|timer| match timer.action {
            TimerAction::CommitSwap { structure, i, j } if structure == id => {
                pending.push((timer.due, timer.seq, i, j));
                false
            }
            _ => true,
        });
        pending.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
        for (_, _, i, j) in pending {
            self.commit_array_swap(id, i, j)?;
        }
        Ok(())
    }
}
