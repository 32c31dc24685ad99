//! Built-in step procedures.

use crate::error::SceneError;
use crate::scene::StructureId;
use crate::step::{ProcedureFactory, Step, StepContext, StepProcedure};
use crate::structures::{CellValue, StructureOptions};
use std::cmp::Ordering;

/// Code listing the bubble sort marks while it runs.
pub const BUBBLE_SORT_LISTING: &[&str] = &[
    "for i in 0..n - 1:",
    "    for j in 0..n - 1 - i:",
    "        if a[j] > a[j + 1]:",
    "            swap(a, j, j + 1)",
    "return a",
];

const LINE_OUTER: usize = 1;
const LINE_INNER: usize = 2;
const LINE_COMPARE: usize = 3;
const LINE_SWAP: usize = 4;
const LINE_RETURN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Build,
    Compare,
    Exchange,
    Finish,
    Finished,
}

/// Bubble sort over an array, one comparison or exchange per step.
///
/// Keeps its own copy of the values so decisions do not depend on when the
/// canvas commits a swap.
#[derive(Debug, Clone)]
pub struct BubbleSortProcedure {
    options: StructureOptions,
    values: Option<Vec<CellValue>>,
    phase: Phase,
    array: Option<StructureId>,
    current: Vec<CellValue>,
    pass: usize,
    j: usize,
}

impl BubbleSortProcedure {
    pub fn new(options: StructureOptions, values: Option<Vec<CellValue>>) -> Self {
        Self {
            options,
            values,
            phase: Phase::Build,
            array: None,
            current: Vec::new(),
            pass: 0,
            j: 0,
        }
    }

    pub fn factory(options: StructureOptions, values: Option<Vec<CellValue>>) -> ProcedureFactory {
        Box::new(move || {
            let procedure: Box<dyn StepProcedure> =
                Box::new(BubbleSortProcedure::new(options.clone(), values.clone()));
            procedure
        })
    }

    fn array(&self) -> Result<StructureId, SceneError> {
        self.array.ok_or(SceneError::MissingOption("array"))
    }

    fn out_of_order(&self, j: usize) -> bool {
        let (a, b) = (&self.current[j], &self.current[j + 1]);
        let ordering = match &self.options.comparator {
            Some(comparator) => comparator.compare(a, b),
            None => match (a.as_number(), b.as_number()) {
                (Some(a), Some(b)) => a.cmp(&b),
                _ => a.to_string().cmp(&b.to_string()),
            },
        };
        ordering == Ordering::Greater
    }

    /// Last index still unsorted in the current pass.
    fn pass_end(&self) -> usize {
        self.current.len().saturating_sub(1 + self.pass)
    }

    fn build(&mut self, ctx: &mut StepContext<'_>) -> Result<Step, SceneError> {
        let id = ctx.canvas.add_array(&self.options, self.values.as_deref())?;
        self.current = ctx.canvas.array(id)?.values().cloned().collect();
        self.array = Some(id);
        ctx.panel.mark(LINE_OUTER, None);
        self.phase = if self.current.len() < 2 {
            Phase::Finish
        } else {
            Phase::Compare
        };
        Ok(Step::Yielded)
    }

    fn compare(&mut self, ctx: &mut StepContext<'_>) -> Result<Step, SceneError> {
        let id = self.array()?;
        if self.j >= self.pass_end() {
            // the largest remaining value has bubbled into place
            ctx.canvas.highlight_element(id, Some(self.pass_end()), "done")?;
            self.pass += 1;
            self.j = 0;
            if self.pass_end() == 0 {
                self.phase = Phase::Finish;
                return self.finish(ctx);
            }
            ctx.panel.mark(LINE_OUTER, None);
            return Ok(Step::Yielded);
        }
        ctx.canvas.highlight_element(id, Some(self.j), "compare")?;
        ctx.canvas.highlight_element(id, Some(self.j + 1), "compare")?;
        ctx.panel.mark(LINE_COMPARE, None);
        self.phase = Phase::Exchange;
        Ok(Step::Yielded)
    }

    fn exchange(&mut self, ctx: &mut StepContext<'_>) -> Result<Step, SceneError> {
        let id = self.array()?;
        let j = self.j;
        if self.out_of_order(j) {
            ctx.canvas.array_swap(id, j, j + 1)?;
            self.current.swap(j, j + 1);
            ctx.canvas.highlight_element(id, Some(j), "swap")?;
            ctx.canvas.highlight_element(id, Some(j + 1), "swap")?;
            ctx.panel.mark(LINE_SWAP, None);
        } else {
            ctx.canvas.unhighlight_element(id, Some(j))?;
            ctx.canvas.unhighlight_element(id, Some(j + 1))?;
            ctx.panel.mark(LINE_INNER, None);
        }
        self.j += 1;
        self.phase = Phase::Compare;
        Ok(Step::Yielded)
    }

    fn finish(&mut self, ctx: &mut StepContext<'_>) -> Result<Step, SceneError> {
        let id = self.array()?;
        ctx.canvas.highlight_element(id, None, "done")?;
        ctx.panel.mark(LINE_RETURN, None);
        log::debug!("bubble sort finished after {} passes", self.pass);
        self.phase = Phase::Finished;
        Ok(Step::Done)
    }

    /// Values in their current sorted-so-far order.
    pub fn values(&self) -> &[CellValue] {
        &self.current
    }
}

impl StepProcedure for BubbleSortProcedure {
    fn resume(&mut self, ctx: &mut StepContext<'_>) -> Result<Step, SceneError> {
        match self.phase {
            Phase::Build => self.build(ctx),
            Phase::Compare => {
                // clear the previous exchange's tags before moving on
                if self.j > 0 {
                    let id = self.array()?;
                    ctx.canvas.unhighlight_element(id, Some(self.j - 1))?;
                    ctx.canvas.unhighlight_element(id, Some(self.j))?;
                }
                self.compare(ctx)
            }
            Phase::Exchange => self.exchange(ctx),
            Phase::Finish => self.finish(ctx),
            Phase::Finished => Ok(Step::Done),
        }
    }
}
