//! Transition scheduler and deferred actions on the logical clock.
//!
//! A transition interpolates one channel of a connector from the geometry
//! that was on screen when it was requested to the new authoritative
//! geometry. Transitions are keyed by `(connector, channel)`: a later request
//! on the same key replaces the one in flight. Once its duration has elapsed
//! a transition is dropped and the authoritative value is what gets drawn.

use super::{Canvas, ConnectorId, ConnectorKind, NodeId, StructureId};
use crate::error::SceneError;
use crate::geometry::{CubicPath, Point, Segment};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Start,
    End,
    /// All four control points of a curved connector.
    Path,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Tween {
    Point { from: Point, to: Point },
    Path { from: CubicPath, to: CubicPath },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transition {
    pub connector: ConnectorId,
    pub channel: Channel,
    pub tween: Tween,
    pub started_at: f64,
    pub duration: f64,
}

impl Transition {
    pub fn ends_at(&self) -> f64 {
        self.started_at + self.duration
    }

    fn progress(&self, now: f64) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.started_at) / self.duration).clamp(0.0, 1.0) as f32
    }
}

/// Deferred scene mutation fired by [`Canvas::advance`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TimerAction {
    /// Drop the transient vertical offset of the nodes.
    ResetLift(Vec<NodeId>),
    /// Return raised nodes to normal drawing order.
    LowerNodes(Vec<NodeId>),
    /// Exchange two cells of an array in its backing sequence.
    CommitSwap {
        structure: StructureId,
        i: usize,
        j: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timer {
    pub due: f64,
    pub seq: u64,
    pub epoch: u32,
    pub action: TimerAction,
}

impl Canvas {
    pub(crate) fn schedule_tween(&mut self, connector: ConnectorId, channel: Channel, tween: Tween) {
        let key = (connector.index(), channel);
        let unchanged = match tween {
            Tween::Point { from, to } => from == to,
            Tween::Path { from, to } => from == to,
        };
        if unchanged {
            // Already drawn where it should end; nothing left to animate.
            self.transitions.remove(&key);
            return;
        }
        if self.transitions.contains_key(&key) {
            log::trace!("{connector} {channel:?}: replacing transition in flight");
        }
        let transition = Transition {
            connector,
            channel,
            tween,
            started_at: self.now(),
            duration: self.animation.duration,
        };
        self.transitions.insert(key, transition);
    }

    pub(crate) fn schedule_timer(&mut self, delay: f64, action: TimerAction) {
        let timer = Timer {
            due: self.now() + delay.max(0.0),
            seq: self.timer_seq,
            epoch: self.epoch(),
            action,
        };
        log::trace!("timer #{} due at {:.3}: {:?}", timer.seq, timer.due, timer.action);
        self.timer_seq += 1;
        self.timers.push(timer);
    }

    /// Removes `nodes` from pending lift and raise timers so a newer swap
    /// of the same nodes owns their visual state.
    pub(crate) fn cancel_visual_timers(&mut self, nodes: &[NodeId]) {
        self.timers.retain_mut(|timer| match &mut timer.action {
            TimerAction::ResetLift(targets) | TimerAction::LowerNodes(targets) => {
                targets.retain(|node| !nodes.contains(node));
                !targets.is_empty()
            }
            TimerAction::CommitSwap { .. } => true,
        });
    }

    pub fn pending_transition(&self, connector: ConnectorId, channel: Channel) -> Option<&Transition> {
        self.transitions.get(&(connector.index(), channel))
    }

    pub fn transitions(&self) -> impl Iterator<Item = &Transition> {
        self.transitions.values()
    }

    pub fn timers(&self) -> &[Timer] {
        &self.timers
    }

    pub fn is_animating(&self) -> bool {
        !self.transitions.is_empty() || !self.timers.is_empty()
    }

    /// Endpoints as drawn at the current time.
    pub fn drawn_segment(&self, id: ConnectorId) -> Result<Segment, SceneError> {
        let connector = self.connector(id)?;
        if connector.kind == ConnectorKind::Curved {
            let path = self.drawn_path(id)?;
            return Ok(Segment {
                start: path.start,
                end: path.end,
            });
        }
        let start = self
            .sample_point(id, Channel::Start)
            .unwrap_or(connector.start);
        let end = self.sample_point(id, Channel::End).unwrap_or(connector.end);
        Ok(Segment { start, end })
    }

    /// Curve as drawn at the current time.
    pub fn drawn_path(&self, id: ConnectorId) -> Result<CubicPath, SceneError> {
        let connector = self.connector(id)?;
        let sampled = self
            .transitions
            .get(&(id.index(), Channel::Path))
            .and_then(|transition| match transition.tween {
                Tween::Path { from, to } => {
                    let t = self.animation.easing.evaluate(transition.progress(self.now()));
                    Some(from.lerp(&to, t))
                }
                Tween::Point { .. } => None,
            });
        Ok(sampled.unwrap_or_else(|| connector.path()))
    }

    fn sample_point(&self, id: ConnectorId, channel: Channel) -> Option<Point> {
        let transition = self.transitions.get(&(id.index(), channel))?;
        match transition.tween {
            Tween::Point { from, to } => {
                let t = self.animation.easing.evaluate(transition.progress(self.now()));
                Some(from.lerp(to, t))
            }
            Tween::Path { .. } => None,
        }
    }

    /// Advances the clock by `dt`, firing due timers in order and committing
    /// finished transitions.
    pub fn advance(&mut self, dt: f64) {
        let target = self.now() + dt.max(0.0);
        while let Some(index) = self.next_due_timer(target) {
            let timer = self.timers.remove(index);
            if timer.due > self.now() {
                self.set_now(timer.due);
            }
            self.commit_finished();
            self.fire(timer);
        }
        self.set_now(target);
        self.commit_finished();
    }

    /// Fast-forwards until no transition or timer is pending.
    pub fn settle(&mut self) {
        while let Some(horizon) = self.horizon() {
            self.advance((horizon - self.now()).max(0.0));
        }
    }

    fn horizon(&self) -> Option<f64> {
        let transitions = self.transitions.values().map(Transition::ends_at);
        let timers = self.timers.iter().map(|timer| timer.due);
        transitions.chain(timers).reduce(f64::max)
    }

    fn next_due_timer(&self, limit: f64) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, timer)| timer.due <= limit)
            .min_by(|(_, a), (_, b)| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)))
            .map(|(index, _)| index)
    }

    fn commit_finished(&mut self) {
        let now = self.now();
        self.transitions
            .retain(|_, transition| transition.ends_at() > now);
    }

    fn fire(&mut self, timer: Timer) {
        if timer.epoch != self.epoch() {
            log::warn!("dropping timer #{} from a cleared scene", timer.seq);
            return;
        }
        log::trace!("firing timer #{}: {:?}", timer.seq, timer.action);
        let result: Result<(), SceneError> = match timer.action {
            TimerAction::ResetLift(nodes) => nodes.into_iter().try_for_each(|node| {
                self.node_mut(node)?.lift = 0.0;
                Ok(())
            }),
            TimerAction::LowerNodes(nodes) => nodes.into_iter().try_for_each(|node| {
                self.node_mut(node)?.raised = false;
                Ok(())
            }),
            TimerAction::CommitSwap { structure, i, j } => self.commit_array_swap(structure, i, j),
        };
        if let Err(err) = result {
            log::warn!("timer #{} skipped: {err}", timer.seq);
        }
    }
}
