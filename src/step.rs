//! Resumable step procedures and the driver that advances them manually or
//! on a timer against the canvas clock.

use crate::error::SceneError;
use crate::scene::Canvas;

/// Outcome of resuming a procedure once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Yielded,
    Done,
}

impl Step {
    pub fn is_done(self) -> bool {
        self == Step::Done
    }
}

/// The code listing shown next to the diagram. Lines and segments are
/// numbered from 1.
pub trait CodePanel {
    /// Marks `line` (and optionally its `segment`) active, clearing any
    /// previous mark.
    fn mark(&mut self, line: usize, segment: Option<usize>);

    /// Marks several lines at once, clearing any previous mark.
    fn mark_lines(&mut self, lines: &[usize]);

    fn unmark(&mut self);
}

/// In-memory code panel that only records what is marked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActiveLines {
    lines: Vec<usize>,
    segment: Option<usize>,
}

impl ActiveLines {
    pub fn lines(&self) -> &[usize] {
        &self.lines
    }

    pub fn segment(&self) -> Option<usize> {
        self.segment
    }

    pub fn is_marked(&self, line: usize) -> bool {
        self.lines.contains(&line)
    }
}

impl CodePanel for ActiveLines {
    fn mark(&mut self, line: usize, segment: Option<usize>) {
        self.unmark();
        self.lines.push(line);
        self.segment = segment;
    }

    fn mark_lines(&mut self, lines: &[usize]) {
        self.unmark();
        self.lines.extend_from_slice(lines);
    }

    fn unmark(&mut self) {
        self.lines.clear();
        self.segment = None;
    }
}

/// What a procedure may touch while it runs.
pub struct StepContext<'a> {
    pub canvas: &'a mut Canvas,
    pub panel: &'a mut dyn CodePanel,
}

/// A computation that suspends between visual steps.
pub trait StepProcedure {
    fn resume(&mut self, ctx: &mut StepContext<'_>) -> Result<Step, SceneError>;
}

impl<F> StepProcedure for F
where
    F: FnMut(&mut StepContext<'_>) -> Result<Step, SceneError>,
{
    fn resume(&mut self, ctx: &mut StepContext<'_>) -> Result<Step, SceneError> {
        self(ctx)
    }
}

pub type ProcedureFactory = Box<dyn FnMut() -> Box<dyn StepProcedure>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    Normal,
    Quick,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct PendingStep {
    due: f64,
    pace: Pace,
}

/// Owns a canvas, a code panel and the running procedure.
pub struct StepDriver<P: CodePanel = ActiveLines> {
    canvas: Canvas,
    panel: P,
    factory: ProcedureFactory,
    procedure: Option<Box<dyn StepProcedure>>,
    pending: Option<PendingStep>,
    done: bool,
    steps: usize,
}

impl<P: CodePanel> StepDriver<P> {
    pub fn new(canvas: Canvas, panel: P, factory: ProcedureFactory) -> Self {
        Self {
            canvas,
            panel,
            factory,
            procedure: None,
            pending: None,
            done: false,
            steps: 0,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn canvas_mut(&mut self) -> &mut Canvas {
        &mut self.canvas
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Whether a timed step is armed.
    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    /// Steps resumed since the last [`start`](Self::start).
    pub fn steps_taken(&self) -> usize {
        self.steps
    }

    /// Clears the canvas and the code panel, drops any armed step, builds a
    /// fresh procedure and resumes it once.
    pub fn start(&mut self) -> Result<Step, SceneError> {
        log::debug!("starting procedure");
        self.canvas.clear();
        self.panel.unmark();
        self.pending = None;
        self.procedure = Some((self.factory)());
        self.done = false;
        self.steps = 0;
        self.resume()
    }

    /// Resumes the procedure once. Starts it first if it never ran.
    pub fn next(&mut self) -> Result<Step, SceneError> {
        if self.procedure.is_none() {
            return self.start();
        }
        self.resume()
    }

    /// Resumes once and, unless finished, arms the next step after the
    /// normal step delay.
    pub fn continuous(&mut self) -> Result<Step, SceneError> {
        self.run_paced(Pace::Normal)
    }

    pub fn continuous_quick(&mut self) -> Result<Step, SceneError> {
        self.run_paced(Pace::Quick)
    }

    pub fn stop(&mut self) {
        self.pending = None;
    }

    /// Advances the canvas clock by `dt`, taking every armed step that falls
    /// due on the way.
    pub fn tick(&mut self, dt: f64) -> Result<(), SceneError> {
        let target = self.canvas.now() + dt.max(0.0);
        while let Some(pending) = self.pending.filter(|pending| pending.due <= target) {
            self.pending = None;
            let wait = pending.due - self.canvas.now();
            self.canvas.advance(wait.max(0.0));
            self.run_paced(pending.pace)?;
        }
        let rest = target - self.canvas.now();
        self.canvas.advance(rest.max(0.0));
        Ok(())
    }

    fn run_paced(&mut self, pace: Pace) -> Result<Step, SceneError> {
        let step = self.next()?;
        if step == Step::Yielded {
            let delay = match pace {
                Pace::Normal => self.canvas.animation().step,
                Pace::Quick => self.canvas.animation().quick_step,
            };
            let due = self.canvas.now() + delay;
            log::trace!("next {pace:?} step due at {due:.3}");
            self.pending = Some(PendingStep { due, pace });
        }
        Ok(step)
    }

    fn resume(&mut self) -> Result<Step, SceneError> {
        if self.done {
            return Ok(Step::Done);
        }
        let Some(procedure) = self.procedure.as_mut() else {
            return Ok(Step::Done);
        };
        let mut ctx = StepContext {
            canvas: &mut self.canvas,
            panel: &mut self.panel,
        };
        let result = procedure.resume(&mut ctx);
        match result {
            Ok(step) => {
                self.steps += 1;
                self.done = step.is_done();
                log::debug!("step {} -> {step:?}", self.steps);
                Ok(step)
            }
            Err(err) => {
                self.pending = None;
                Err(err)
            }
        }
    }
}
