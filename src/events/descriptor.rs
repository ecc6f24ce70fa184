// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Handler descriptors: what runs, for which gesture, on which layer and
//! in which sections.

use std::fmt;
use std::rc::Rc;

use kurbo::Point;
use serde_json::Value;

use super::{HandlerKind, MapEvent, MapEventName};
use crate::controller::picking::PickedObject;
use crate::layers::LayerStore;
use crate::model::HandlerId;

/// Where a gesture happened, on screen and on the ground
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointInfo {
    /// Canvas pixel
    pub pixel: Point,
    /// Longitude/latitude
    pub coordinate: geo::Point,
}

/// What a handler may touch while it runs
pub struct MapContext<'a> {
    pub layers: &'a mut LayerStore,
    /// The active section
    pub section: &'a str,
    events: &'a mut Vec<MapEvent>,
}

impl<'a> MapContext<'a> {
    pub fn new(
        layers: &'a mut LayerStore,
        section: &'a str,
        events: &'a mut Vec<MapEvent>,
    ) -> Self {
        Self {
            layers,
            section,
            events,
        }
    }

    /// Queue an event for the embedder
    pub fn emit(&mut self, event: MapEvent) {
        self.events.push(event);
    }

    pub fn emit_custom(&mut self, name: impl Into<String>, payload: Value) {
        self.emit(MapEvent::Custom {
            name: name.into(),
            payload,
        });
    }
}

/// Map-level handler. Running at all handles the gesture; the returned
/// flag only matters to callers that invoke it directly
pub type MapHandlerFn = Rc<dyn Fn(&PointInfo, &mut MapContext) -> bool>;
/// Per-layer handler, called with every object picked on its layer
pub type LayerHandlerFn = Rc<dyn Fn(&[PickedObject], &PointInfo, &mut MapContext) -> bool>;
/// Tooltip text for a picked object
pub type TooltipFn = Rc<dyn Fn(&PickedObject) -> Option<String>>;
/// Section predicate guarding a handler
pub type Condition = Rc<dyn Fn(&str) -> bool>;

/// The callable part of a descriptor, one variant per namespace
#[derive(Clone)]
pub enum Handler {
    Map(MapHandlerFn),
    Layer { layer: String, handler: LayerHandlerFn },
    Select { layer: String, handler: LayerHandlerFn },
    Tooltip { layer: String, handler: TooltipFn },
}

impl Handler {
    pub fn kind(&self) -> HandlerKind {
        match self {
            Handler::Map(_) => HandlerKind::Map,
            Handler::Layer { .. } => HandlerKind::Layer,
            Handler::Select { .. } => HandlerKind::Select,
            Handler::Tooltip { .. } => HandlerKind::Tooltip,
        }
    }

    pub fn layer(&self) -> Option<&str> {
        match self {
            Handler::Map(_) => None,
            Handler::Layer { layer, .. }
            | Handler::Select { layer, .. }
            | Handler::Tooltip { layer, .. } => Some(layer),
        }
    }
}

/// One handler registration.
///
/// Tooltip descriptors are bound to [`MapEventName::PointerMove`]: tooltips
/// follow the hovered object.
#[derive(Clone)]
pub struct EventHandlerDescriptor {
    id: HandlerId,
    pub event: MapEventName,
    pub condition: Option<Condition>,
    pub handler: Handler,
}

impl EventHandlerDescriptor {
    fn new(event: MapEventName, handler: Handler) -> Self {
        Self {
            id: HandlerId::next(),
            event,
            condition: None,
            handler,
        }
    }

    pub fn map(
        event: MapEventName,
        f: impl Fn(&PointInfo, &mut MapContext) -> bool + 'static,
    ) -> Self {
        Self::new(event, Handler::Map(Rc::new(f)))
    }

    pub fn select(
        layer: impl Into<String>,
        event: MapEventName,
        f: impl Fn(&[PickedObject], &PointInfo, &mut MapContext) -> bool + 'static,
    ) -> Self {
        Self::new(
            event,
            Handler::Select {
                layer: layer.into(),
                handler: Rc::new(f),
            },
        )
    }

    pub fn layer(
        layer: impl Into<String>,
        event: MapEventName,
        f: impl Fn(&[PickedObject], &PointInfo, &mut MapContext) -> bool + 'static,
    ) -> Self {
        Self::new(
            event,
            Handler::Layer {
                layer: layer.into(),
                handler: Rc::new(f),
            },
        )
    }

    pub fn tooltip(
        layer: impl Into<String>,
        f: impl Fn(&PickedObject) -> Option<String> + 'static,
    ) -> Self {
        Self::new(
            MapEventName::PointerMove,
            Handler::Tooltip {
                layer: layer.into(),
                handler: Rc::new(f),
            },
        )
    }

    /// Guard the handler with a section predicate
    pub fn with_condition(mut self, condition: impl Fn(&str) -> bool + 'static) -> Self {
        self.condition = Some(Rc::new(condition));
        self
    }

    /// Only run in the named section
    pub fn when_section(self, section: impl Into<String>) -> Self {
        let section = section.into();
        self.with_condition(move |active| active == section)
    }

    pub fn id(&self) -> HandlerId {
        self.id
    }

    pub fn kind(&self) -> HandlerKind {
        self.handler.kind()
    }

    pub fn layer_name(&self) -> Option<&str> {
        self.handler.layer()
    }

    /// Whether the condition, if any, passes in `section`
    pub fn applies_in(&self, section: &str) -> bool {
        self.condition.as_ref().is_none_or(|c| c(section))
    }
}

impl fmt::Debug for EventHandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlerDescriptor")
            .field("id", &self.id)
            .field("kind", &self.kind())
            .field("event", &self.event)
            .field("layer", &self.layer_name())
            .field("conditional", &self.condition.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_condition() {
        let d = EventHandlerDescriptor::map(MapEventName::LeftClick, |_, _| true)
            .when_section("nodes");
        assert!(d.applies_in("nodes"));
        assert!(!d.applies_in("agencies"));

        let always = EventHandlerDescriptor::map(MapEventName::LeftClick, |_, _| true);
        assert!(always.applies_in("anything"));
    }

    #[test]
    fn tooltips_follow_pointer_move() {
        let d = EventHandlerDescriptor::tooltip("transitNodes", |_| None);
        assert_eq!(d.event, MapEventName::PointerMove);
        assert_eq!(d.kind(), HandlerKind::Tooltip);
        assert_eq!(d.layer_name(), Some("transitNodes"));
    }

    #[test]
    fn each_registration_gets_its_own_id() {
        let a = EventHandlerDescriptor::map(MapEventName::LeftClick, |_, _| true);
        let b = a.clone();
        let c = EventHandlerDescriptor::map(MapEventName::LeftClick, |_, _| true);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
    }
}
