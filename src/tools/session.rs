// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Tool activation state machine: `Idle -> Active(tool) -> Idle`.
//!
//! Tools talk back through their callbacks, which queue signals tagged with
//! the activation that created them. The map drains the queue after every
//! gesture; a signal from a tool that is no longer active is dropped, so a
//! late `on_disable` can never switch off its successor.

use std::rc::Rc;

use super::{SignalQueue, ToolBox, ToolCallbacks, ToolId, ToolSignal};
use crate::events::{EventRegistry, MapEvent};
use crate::layers::LayerDescriptor;

#[derive(Debug, Default)]
enum ToolState {
    #[default]
    Idle,
    Active { tool: ToolBox, generation: u64 },
}

/// Outcome of draining the signal queue
#[derive(Debug, Default, PartialEq)]
pub struct SignalOutcome {
    /// The active tool asked for a redraw
    pub updated: bool,
    /// Set when the active tool asked to be disabled and was
    pub disabled: Option<MapEvent>,
}

#[derive(Debug, Default)]
pub struct ToolSession {
    state: ToolState,
    queue: SignalQueue,
    generation: u64,
}

impl ToolSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Activate a tool, first disabling the active one. Returns the
    /// lifecycle events in order.
    pub fn enable(&mut self, id: ToolId) -> Vec<MapEvent> {
        self.enable_with(id, |callbacks| ToolBox::for_id(id, callbacks))
    }

    /// Like [`enable`](Self::enable), with a custom constructor
    pub fn enable_with(
        &mut self,
        id: ToolId,
        construct: impl FnOnce(ToolCallbacks) -> ToolBox,
    ) -> Vec<MapEvent> {
        let mut events = Vec::new();

        if let ToolState::Active { tool, .. } = &self.state {
            // The previous tool's own disable path runs before anything new
            // is built
            tool.callbacks().disable();
            events.extend(self.drain().disabled);
            events.extend(self.disable());
        }

        self.generation += 1;
        let tool = construct(ToolCallbacks::queued(&self.queue, self.generation));
        tracing::info!("Tool enabled: {id}");
        self.state = ToolState::Active {
            tool,
            generation: self.generation,
        };
        events.push(MapEvent::ToolEnabled(id));
        events
    }

    /// Deactivate the active tool, if any
    pub fn disable(&mut self) -> Option<MapEvent> {
        match std::mem::take(&mut self.state) {
            ToolState::Idle => None,
            ToolState::Active { tool, .. } => {
                let id = tool.id();
                tracing::info!("Tool disabled: {id}");
                Some(MapEvent::ToolDisabled(id))
            }
        }
    }

    /// Handle queued tool signals
    pub fn drain(&mut self) -> SignalOutcome {
        let signals: Vec<_> = self.queue.borrow_mut().drain(..).collect();
        let mut outcome = SignalOutcome::default();
        let mut disable = false;

        for (generation, signal) in signals {
            if self.active_generation() != Some(generation) {
                tracing::debug!("Dropping {signal:?} from an inactive tool");
                continue;
            }
            match signal {
                ToolSignal::Update => outcome.updated = true,
                ToolSignal::Disable => disable = true,
            }
        }

        if disable {
            outcome.disabled = self.disable();
        }
        outcome
    }

    fn active_generation(&self) -> Option<u64> {
        match self.state {
            ToolState::Idle => None,
            ToolState::Active { generation, .. } => Some(generation),
        }
    }

    pub fn active(&self) -> Option<&ToolBox> {
        match &self.state {
            ToolState::Idle => None,
            ToolState::Active { tool, .. } => Some(tool),
        }
    }

    pub fn active_id(&self) -> Option<ToolId> {
        self.active().map(ToolBox::id)
    }

    pub fn is_active(&self) -> bool {
        self.active().is_some()
    }

    /// The registry pointer events go to: the tool's, else `default`
    pub fn registry(&self, default: &Rc<EventRegistry>) -> Rc<EventRegistry> {
        self.active()
            .map_or_else(|| Rc::clone(default), ToolBox::map_events)
    }

    /// Overlays of the active tool; empty when idle
    pub fn overlays(&self) -> Vec<LayerDescriptor> {
        self.active().map(ToolBox::layers).unwrap_or_default()
    }
}
