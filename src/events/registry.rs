// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! The handler table consulted by the map controller.
//!
//! Descriptors are kept in registration order and indexed into four
//! namespaces (map, layer, select, tooltip) keyed by layer and event name.
//! The registry only looks handlers up and filters them by section; it
//! never runs them.

use std::collections::HashMap;
use std::rc::Rc;

use super::{EventHandlerDescriptor, Handler, MapEventName};
use crate::model::HandlerId;

type Handlers = Vec<Rc<EventHandlerDescriptor>>;
type ByLayer = HashMap<String, HashMap<MapEventName, Handlers>>;

#[derive(Clone, Default, Debug)]
pub struct EventRegistry {
    /// Registration order
    descriptors: Handlers,
    map: HashMap<MapEventName, Handlers>,
    layer: ByLayer,
    select: ByLayer,
    tooltip: HashMap<String, Handlers>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from an ordered list of descriptors
    pub fn from_descriptors(descriptors: impl IntoIterator<Item = EventHandlerDescriptor>) -> Self {
        let mut registry = Self::new();
        for d in descriptors {
            registry.register(d);
        }
        registry
    }

    /// Add a handler after all existing ones. Registering the same
    /// descriptor twice keeps the first registration.
    pub fn register(&mut self, descriptor: EventHandlerDescriptor) -> HandlerId {
        let id = descriptor.id();
        if self.descriptors.iter().any(|d| d.id() == id) {
            tracing::warn!("Handler {id:?} is already registered");
            return id;
        }
        let descriptor = Rc::new(descriptor);
        self.index(&descriptor);
        self.descriptors.push(descriptor);
        id
    }

    /// Remove a handler by identity. Returns false if it was not registered.
    pub fn remove(&mut self, id: HandlerId) -> bool {
        let before = self.descriptors.len();
        self.descriptors.retain(|d| d.id() != id);
        if self.descriptors.len() == before {
            return false;
        }
        self.reindex();
        true
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    fn index(&mut self, descriptor: &Rc<EventHandlerDescriptor>) {
        let event = descriptor.event;
        let entry = Rc::clone(descriptor);
        match &descriptor.handler {
            Handler::Map(_) => self.map.entry(event).or_default().push(entry),
            Handler::Layer { layer, .. } => Self::index_layer(&mut self.layer, layer, event, entry),
            Handler::Select { layer, .. } => {
                Self::index_layer(&mut self.select, layer, event, entry);
            }
            Handler::Tooltip { layer, .. } => {
                self.tooltip.entry(layer.clone()).or_default().push(entry);
            }
        }
    }

    fn index_layer(
        table: &mut ByLayer,
        layer: &str,
        event: MapEventName,
        entry: Rc<EventHandlerDescriptor>,
    ) {
        table
            .entry(layer.to_string())
            .or_default()
            .entry(event)
            .or_default()
            .push(entry);
    }

    fn reindex(&mut self) {
        self.map.clear();
        self.layer.clear();
        self.select.clear();
        self.tooltip.clear();
        for d in self.descriptors.clone() {
            self.index(&d);
        }
    }

    // ===== Queries =====

    pub fn map_handlers(&self, event: MapEventName) -> &[Rc<EventHandlerDescriptor>] {
        self.map.get(&event).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn layer_handlers(
        &self,
        layer: &str,
        event: MapEventName,
    ) -> &[Rc<EventHandlerDescriptor>] {
        Self::lookup(&self.layer, layer, event)
    }

    pub fn select_handlers(
        &self,
        layer: &str,
        event: MapEventName,
    ) -> &[Rc<EventHandlerDescriptor>] {
        Self::lookup(&self.select, layer, event)
    }

    pub fn tooltip_handlers(&self, layer: &str) -> &[Rc<EventHandlerDescriptor>] {
        self.tooltip.get(layer).map(Vec::as_slice).unwrap_or(&[])
    }

    fn lookup<'a>(
        table: &'a ByLayer,
        layer: &str,
        event: MapEventName,
    ) -> &'a [Rc<EventHandlerDescriptor>] {
        table
            .get(layer)
            .and_then(|events| events.get(&event))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The handlers whose condition passes in `section`, in registration order
    pub fn applicable<'a>(
        handlers: &'a [Rc<EventHandlerDescriptor>],
        section: &'a str,
    ) -> impl Iterator<Item = &'a Rc<EventHandlerDescriptor>> + 'a {
        handlers.iter().filter(move |d| d.applies_in(section))
    }

    /// Distinct events bound to a layer, in registration order
    pub fn layer_event_names(&self, layer: &str) -> Vec<MapEventName> {
        let mut names = Vec::new();
        for d in &self.descriptors {
            if d.layer_name() == Some(layer) && !names.contains(&d.event) {
                names.push(d.event);
            }
        }
        names
    }
}
