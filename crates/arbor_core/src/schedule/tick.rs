//! # Tick Driver
//!
//! Each pass visits a snapshot count of queue entries, so entities added
//! or disposed by callbacks during the pass never disturb the iteration.

use super::strategy::{TickInput, UpdatePlan};
use super::system::Phase;
use crate::entity::{EntityId, World};
use crate::error::CallbackPhase;

/// What to do with a dequeued entry.
enum Visit {
    /// Stale, disposed, or withdrawn: drop the entry.
    Drop,
    /// Dependencies unmet: drop until re-registered by the registry.
    Gated,
    /// Re-enqueue and invoke.
    Run,
}

impl World {
    /// Runs one update pass.
    ///
    /// # Arguments
    ///
    /// * `delta_time` - Scaled frame time in seconds
    /// * `unscaled_delta_time` - Real frame time in seconds
    ///
    /// Each eligible entity is updated as many times as its own strategy,
    /// else the global strategy, returns. Without any strategy it is updated
    /// once with `unscaled_delta_time`.
    pub fn update(&mut self, delta_time: f32, unscaled_delta_time: f32) {
        self.time.refresh();
        let input = TickInput::new(delta_time, unscaled_delta_time);
        let global = self.system.strategy_mut().map(|strategy| strategy.plan(input));
        let fallback = global.unwrap_or(UpdatePlan::once(unscaled_delta_time));

        let count = self.system.pending(Phase::Update);
        for _ in 0..count {
            let Some(entity) = self.system.pop(Phase::Update) else {
                break;
            };
            if !self.admit(Phase::Update, entity) {
                continue;
            }

            let plan = self.own_plan(entity, input).unwrap_or(fallback);
            for _ in 0..plan.count {
                if self.is_disposed(entity) {
                    break;
                }
                let step = plan.step;
                self.invoke(entity, CallbackPhase::Update, |b, cx| b.update(cx, step));
            }
        }
    }

    /// Runs one late-update pass: one invocation per eligible entity.
    pub fn late_update(&mut self) {
        let count = self.system.pending(Phase::LateUpdate);
        for _ in 0..count {
            let Some(entity) = self.system.pop(Phase::LateUpdate) else {
                break;
            };
            if !self.admit(Phase::LateUpdate, entity) {
                continue;
            }
            self.invoke(entity, CallbackPhase::LateUpdate, |b, cx| b.late_update(cx));
        }
    }

    /// Classifies a popped entry, re-enqueuing it if it should run.
    fn admit(&mut self, phase: Phase, entity: EntityId) -> bool {
        match self.visit(phase, entity) {
            Visit::Drop => {
                self.system.forget(phase, entity);
                tracing::trace!(%entity, ?phase, "dropped stale queue entry");
                false
            }
            Visit::Gated => {
                self.system.forget(phase, entity);
                tracing::trace!(%entity, ?phase, "dependencies unmet, dropped until activated");
                false
            }
            Visit::Run => {
                self.system.push_back(phase, entity);
                true
            }
        }
    }

    fn visit(&self, phase: Phase, entity: EntityId) -> Visit {
        if self.is_disposed(entity) || !self.system.is_registered(phase, entity) {
            return Visit::Drop;
        }
        if !self.registry.is_satisfied(entity) {
            return Visit::Gated;
        }
        Visit::Run
    }

    fn own_plan(&mut self, entity: EntityId, input: TickInput) -> Option<UpdatePlan> {
        let behavior = self.behavior_mut(entity)?;
        let strategy = behavior.update_strategy()?;
        Some(strategy.plan(input))
    }
}
