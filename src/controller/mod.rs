// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! The map controller: routes pointer gestures to handlers.
//!
//! Each gesture is dispatched against exactly one registry, the default one
//! or the private one of the active edit tool. Clicks are resolved by
//! picking: layers with an applicable select handler take the gesture;
//! otherwise map-level handlers get it with the clicked coordinate. A
//! handled gesture is flagged so native pan and zoom leave it alone.

use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use kurbo::Point;

use crate::events::descriptor::Handler;
use crate::events::{
    DragPhase, EventHandlerDescriptor, EventRegistry, MapContext, MapEvent, MapEventName,
    PointInfo, PointerEvent,
};
use crate::layers::LayerStore;
use crate::settings;

pub mod picking;
pub mod viewport;

use picking::{PickedObject, PickingEngine, group_by_layer};
use viewport::Viewport;

/// What a dispatch touches besides the controller itself
pub struct Dispatch<'a> {
    pub picker: &'a dyn PickingEngine,
    pub layers: &'a mut LayerStore,
    pub events: &'a mut Vec<MapEvent>,
}

pub struct MapController {
    registry: Rc<EventRegistry>,
    section: String,
    viewport: Viewport,
    /// Layers drawn in the last frame; the multi-pick is limited to them
    visible_layers: Vec<String>,
    /// Layer whose object is being dragged; native drag-pan is off meanwhile
    dragging_layer: Option<String>,
}

impl MapController {
    pub fn new(
        registry: Rc<EventRegistry>,
        section: impl Into<String>,
        viewport: Viewport,
    ) -> Self {
        Self {
            registry,
            section: section.into(),
            viewport,
            visible_layers: Vec::new(),
            dragging_layer: None,
        }
    }

    /// Swap the active registry
    pub fn set_registry(&mut self, registry: Rc<EventRegistry>) {
        self.registry = registry;
        self.dragging_layer = None;
    }

    pub fn registry(&self) -> &Rc<EventRegistry> {
        &self.registry
    }

    pub fn section(&self) -> &str {
        &self.section
    }

    pub fn set_section(&mut self, section: impl Into<String>) {
        self.section = section.into();
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn set_visible_layers(&mut self, layers: Vec<String>) {
        self.visible_layers = layers;
    }

    pub fn dragging_layer(&self) -> Option<&str> {
        self.dragging_layer.as_deref()
    }

    fn point_info(&self, pixel: Point) -> PointInfo {
        PointInfo {
            pixel,
            coordinate: self.viewport.to_geo(pixel),
        }
    }

    // ===== Pointer Dispatch =====

    /// Route a click, double click or pointer move. Returns whether the
    /// gesture was handled, and flags the event accordingly.
    pub fn handle_pointer(&mut self, event: &mut PointerEvent, dispatch: Dispatch) -> bool {
        if event.is_handled() {
            return false;
        }
        let Some(name) = event.classify() else {
            tracing::debug!("Unrouted pointer action {:?}", event.action);
            return false;
        };

        let handled = if name == MapEventName::PointerMove {
            let info = self.point_info(event.position);
            let Dispatch { layers, events, .. } = dispatch;
            let mut ctx = MapContext::new(layers, &self.section, events);
            run_map_handlers(&self.registry, name, &info, &mut ctx)
        } else {
            self.handle_click(name, event.position, dispatch)
        };

        if handled {
            event.mark_handled();
        }
        handled
    }

    fn handle_click(&self, name: MapEventName, pixel: Point, dispatch: Dispatch) -> bool {
        let Dispatch {
            picker,
            layers,
            events,
        } = dispatch;
        let radius = settings::picking::RADIUS;

        let picked = picker.pick_object(pixel, radius);
        let objects = if picked.is_some() {
            picker.pick_multiple(pixel, radius, &self.visible_layers)
        } else {
            Vec::new()
        };

        let info = PointInfo {
            pixel,
            coordinate: picked
                .as_ref()
                .map_or_else(|| self.viewport.to_geo(pixel), |p| p.coordinate),
        };
        let mut ctx = MapContext::new(layers, &self.section, events);

        let mut handled_by_selection = false;
        for (layer, objects) in group_by_layer(objects) {
            let handlers = self.registry.select_handlers(&layer, name);
            let mut applicable = EventRegistry::applicable(handlers, &self.section).peekable();
            if applicable.peek().is_none() {
                continue;
            }
            handled_by_selection = true;
            for descriptor in applicable {
                run_layer_handler(descriptor, &objects, &info, &mut ctx);
            }
            tracing::debug!("{name} on `{layer}` handled by selection");
        }

        if handled_by_selection {
            return true;
        }
        run_map_handlers(&self.registry, name, &info, &mut ctx)
    }

    // ===== Drag Dispatch =====

    /// Route a drag phase to the layer handlers of the dragged object
    pub fn handle_drag(
        &mut self,
        phase: DragPhase,
        event: &mut PointerEvent,
        dispatch: Dispatch,
    ) -> bool {
        if event.is_handled() {
            return false;
        }
        let name = phase.event_name();
        let radius = settings::picking::RADIUS;
        let Dispatch {
            picker,
            layers,
            events,
        } = dispatch;

        let (layer, objects) = match phase {
            DragPhase::Start => {
                let Some(object) = picker.pick_object(event.position, radius) else {
                    return false;
                };
                (object.layer_id.clone(), vec![object])
            }
            DragPhase::Move | DragPhase::End => {
                let Some(layer) = self.dragging_layer.clone() else {
                    return false;
                };
                let objects = picker.pick_multiple(event.position, radius, &[layer.clone()]);
                (layer, objects)
            }
        };

        let info = self.point_info(event.position);
        let handlers = self.registry.layer_handlers(&layer, name);
        let mut applicable = EventRegistry::applicable(handlers, &self.section).peekable();
        let handled = applicable.peek().is_some();
        {
            let mut ctx = MapContext::new(layers, &self.section, events);
            for descriptor in applicable {
                run_layer_handler(descriptor, &objects, &info, &mut ctx);
            }
        }

        match phase {
            DragPhase::Start if handled => {
                tracing::debug!("Dragging object on `{layer}`");
                self.dragging_layer = Some(layer);
            }
            DragPhase::End => self.dragging_layer = None,
            _ => {}
        }

        let handled = handled || self.dragging_layer.is_some();
        if handled {
            event.mark_handled();
        }
        handled
    }

    // ===== Tooltips =====

    /// Tooltip text for the object under `point`, if its layer has one
    pub fn tooltip(&self, point: Point, picker: &dyn PickingEngine) -> Option<String> {
        let object = picker.pick_object(point, settings::picking::RADIUS)?;
        let handlers = self.registry.tooltip_handlers(&object.layer_id);
        EventRegistry::applicable(handlers, &self.section).find_map(|d| match &d.handler {
            Handler::Tooltip { handler, .. } => guarded(d, || handler(&object)).flatten(),
            _ => None,
        })
    }
}

fn run_map_handlers(
    registry: &EventRegistry,
    name: MapEventName,
    info: &PointInfo,
    ctx: &mut MapContext,
) -> bool {
    // Any handler that ran handles the gesture, whatever it returned
    let mut handled = false;
    for descriptor in EventRegistry::applicable(registry.map_handlers(name), ctx.section) {
        if let Handler::Map(handler) = &descriptor.handler {
            handled |= guarded(descriptor, || handler(info, ctx)).is_some();
        }
    }
    if handled {
        tracing::debug!("{name} handled by map handlers");
    }
    handled
}

fn run_layer_handler(
    descriptor: &EventHandlerDescriptor,
    objects: &[PickedObject],
    info: &PointInfo,
    ctx: &mut MapContext,
) -> bool {
    match &descriptor.handler {
        Handler::Layer { handler, .. } | Handler::Select { handler, .. } => {
            guarded(descriptor, || handler(objects, info, ctx)).unwrap_or(false)
        }
        _ => false,
    }
}

/// Run a handler, turning a panic into `None`
fn guarded<R>(descriptor: &EventHandlerDescriptor, f: impl FnOnce() -> R) -> Option<R> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::error!(
                "Handler {:?} for {} panicked; gesture continues",
                descriptor.id(),
                descriptor.event
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{EventHandlerDescriptor as D, PointerButton};
    use crate::layers::DrawableLayer;
    use crate::model::features::point_feature;
    use kurbo::Size;
    use std::cell::RefCell;

    /// Returns its objects for any point
    #[derive(Default)]
    struct StubPicker {
        objects: Vec<PickedObject>,
    }

    impl PickingEngine for StubPicker {
        fn pick_object(&self, _: Point, _: f64) -> Option<PickedObject> {
            self.objects.first().cloned()
        }

        fn pick_multiple(&self, _: Point, _: f64, layer_ids: &[String]) -> Vec<PickedObject> {
            self.objects
                .iter()
                .filter(|o| layer_ids.is_empty() || layer_ids.contains(&o.layer_id))
                .cloned()
                .collect()
        }

        fn sync(&mut self, _: &[DrawableLayer], _: &Viewport) {}
    }

    fn object(layer: &str) -> PickedObject {
        PickedObject {
            layer_id: layer.to_string(),
            feature: point_feature(geo::Point::new(-73.6, 45.5)),
            pixel: Point::new(100.0, 100.0),
            coordinate: geo::Point::new(-73.6, 45.5),
        }
    }

    type Log = Rc<RefCell<Vec<String>>>;

    fn log_map(log: &Log, tag: &str, result: bool) -> D {
        let (log, tag) = (Rc::clone(log), tag.to_string());
        D::map(MapEventName::LeftClick, move |info, _| {
            log.borrow_mut().push(format!("{tag} {:.4}", info.coordinate.x()));
            result
        })
    }

    fn log_select(log: &Log, layer: &str, tag: &str, result: bool) -> D {
        let (log, tag) = (Rc::clone(log), tag.to_string());
        D::select(layer, MapEventName::LeftClick, move |objects, _, _| {
            log.borrow_mut().push(format!("{tag} {}", objects.len()));
            result
        })
    }

    fn controller(descriptors: Vec<D>) -> MapController {
        let viewport = Viewport::new(
            geo::Point::new(-73.6, 45.5),
            14.0,
            Size::new(800.0, 600.0),
        );
        MapController::new(
            Rc::new(EventRegistry::from_descriptors(descriptors)),
            "nodes",
            viewport,
        )
    }

    fn click(c: &mut MapController, picker: &StubPicker) -> (bool, PointerEvent) {
        let mut store = LayerStore::default();
        let mut events = Vec::new();
        let mut event = PointerEvent::click(Point::new(100.0, 100.0), PointerButton::Left);
        let handled = c.handle_pointer(
            &mut event,
            Dispatch {
                picker,
                layers: &mut store,
                events: &mut events,
            },
        );
        (handled, event)
    }

    #[test]
    fn all_matching_handlers_fire_in_order() {
        let log = Log::default();
        let mut c = controller(vec![
            log_select(&log, "transitNodes", "first", false),
            log_select(&log, "transitNodes", "second", false),
        ]);
        let picker = StubPicker {
            objects: vec![object("transitNodes"), object("transitNodes")],
        };
        let (handled, event) = click(&mut c, &picker);
        assert!(handled);
        assert!(event.is_handled());
        assert_eq!(*log.borrow(), ["first 2", "second 2"]);
    }

    #[test]
    fn selection_precedes_map_fallback() {
        let log = Log::default();
        let mut c = controller(vec![
            log_map(&log, "map", true),
            log_select(&log, "transitNodes", "select", false),
        ]);
        let picker = StubPicker {
            objects: vec![object("transitNodes")],
        };
        let (handled, _) = click(&mut c, &picker);
        // The select handler returned false, but its existence handles the click
        assert!(handled);
        assert_eq!(*log.borrow(), ["select 1"]);
    }

    #[test]
    fn empty_pick_falls_back_to_map_handlers() {
        let log = Log::default();
        let mut c = controller(vec![
            log_map(&log, "map", true),
            log_select(&log, "transitNodes", "select", true),
        ]);
        let (handled, _) = click(&mut c, &StubPicker::default());
        assert!(handled);

        let expected = c.viewport().to_geo(Point::new(100.0, 100.0));
        assert_eq!(*log.borrow(), [format!("map {:.4}", expected.x())]);
    }

    #[test]
    fn pick_without_select_handler_falls_back() {
        let log = Log::default();
        let mut c = controller(vec![
            log_map(&log, "map", false),
            log_select(&log, "transitNodes", "select", true),
        ]);
        let picker = StubPicker {
            objects: vec![object("transitPaths")],
        };
        let (handled, event) = click(&mut c, &picker);
        assert!(handled);
        assert!(event.is_handled());
        assert_eq!(*log.borrow(), ["map -73.6000"]);
    }

    #[test]
    fn map_handler_returning_false_still_handles() {
        let log = Log::default();
        let mut c = controller(vec![log_map(&log, "map", false)]);
        let (handled, event) = click(&mut c, &StubPicker::default());
        assert!(handled);
        assert!(event.is_handled());
        assert_eq!(log.borrow().len(), 1);
    }

    #[test]
    fn no_map_handler_leaves_gesture_to_native() {
        let mut c = controller(Vec::new());
        let (handled, event) = click(&mut c, &StubPicker::default());
        assert!(!handled);
        assert!(!event.is_handled());
    }

    #[test]
    fn conditions_filter_by_section() {
        let log = Log::default();
        let mut c = controller(vec![
            log_select(&log, "transitNodes", "agencies", true).when_section("agencies"),
            log_map(&log, "map", true),
        ]);
        let picker = StubPicker {
            objects: vec![object("transitNodes")],
        };
        click(&mut c, &picker);
        assert_eq!(*log.borrow(), ["map -73.6000"]);

        log.borrow_mut().clear();
        c.set_section("agencies");
        click(&mut c, &picker);
        assert_eq!(*log.borrow(), ["agencies 1"]);
    }

    #[test]
    fn panicking_handler_does_not_abort_dispatch() {
        let log = Log::default();
        let mut c = controller(vec![
            D::map(MapEventName::LeftClick, |_, _| panic!("broken handler")),
            log_map(&log, "map", false),
        ]);
        let (handled, _) = click(&mut c, &StubPicker::default());
        assert!(handled);
        assert_eq!(log.borrow().len(), 1);

        // A panic alone does not handle the gesture
        let mut c = controller(vec![D::map(MapEventName::LeftClick, |_, _| {
            panic!("broken handler")
        })]);
        let (handled, event) = click(&mut c, &StubPicker::default());
        assert!(!handled);
        assert!(!event.is_handled());
    }

    #[test]
    fn handled_event_is_skipped() {
        let log = Log::default();
        let mut c = controller(vec![log_map(&log, "map", true)]);
        let mut store = LayerStore::default();
        let mut events = Vec::new();
        let mut event = PointerEvent::click(Point::ZERO, PointerButton::Left);
        event.mark_handled();
        let handled = c.handle_pointer(
            &mut event,
            Dispatch {
                picker: &StubPicker::default(),
                layers: &mut store,
                events: &mut events,
            },
        );
        assert!(!handled);
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn pointer_move_skips_picking() {
        let moves = Rc::new(RefCell::new(0));
        let counter = Rc::clone(&moves);
        let mut c = controller(vec![
            D::map(MapEventName::PointerMove, move |_, _| {
                *counter.borrow_mut() += 1;
                false
            }),
            D::select("transitNodes", MapEventName::PointerMove, |_, _, _| {
                panic!("select handlers never see pointer moves")
            }),
        ]);
        let picker = StubPicker {
            objects: vec![object("transitNodes")],
        };
        let mut store = LayerStore::default();
        let mut events = Vec::new();
        let mut event = PointerEvent::moved(Point::new(5.0, 5.0));
        let handled = c.handle_pointer(
            &mut event,
            Dispatch {
                picker: &picker,
                layers: &mut store,
                events: &mut events,
            },
        );
        assert!(handled);
        assert_eq!(*moves.borrow(), 1);
    }

    #[test]
    fn drag_follows_the_picked_layer() {
        let log = Log::default();
        let handler = |tag: &'static str, name| {
            let log = Rc::clone(&log);
            D::layer("transitNodes", name, move |_, _, _| {
                log.borrow_mut().push(tag.to_string());
                true
            })
        };
        let mut c = controller(vec![
            handler("start", MapEventName::DragStart),
            handler("drag", MapEventName::Drag),
            handler("end", MapEventName::DragEnd),
        ]);
        let picker = StubPicker {
            objects: vec![object("transitNodes")],
        };
        let mut store = LayerStore::default();
        let mut events = Vec::new();

        for phase in [DragPhase::Start, DragPhase::Move, DragPhase::End] {
            let mut event = PointerEvent::moved(Point::new(100.0, 100.0));
            let dispatch = Dispatch {
                picker: &picker,
                layers: &mut store,
                events: &mut events,
            };
            assert!(c.handle_drag(phase, &mut event, dispatch));
            if phase == DragPhase::Move {
                assert_eq!(c.dragging_layer(), Some("transitNodes"));
            }
        }
        assert_eq!(c.dragging_layer(), None);
        assert_eq!(*log.borrow(), ["start", "drag", "end"]);
    }

    #[test]
    fn drag_without_handler_is_native() {
        let mut c = controller(Vec::new());
        let picker = StubPicker {
            objects: vec![object("transitNodes")],
        };
        let mut store = LayerStore::default();
        let mut events = Vec::new();
        let mut event = PointerEvent::moved(Point::ZERO);
        let dispatch = Dispatch {
            picker: &picker,
            layers: &mut store,
            events: &mut events,
        };
        assert!(!c.handle_drag(DragPhase::Start, &mut event, dispatch));
        assert_eq!(c.dragging_layer(), None);
    }

    #[test]
    fn tooltip_from_picked_layer() {
        let c = controller(vec![
            D::tooltip("transitNodes", |_| None),
            D::tooltip("transitNodes", |o| Some(format!("node on {}", o.layer_id))),
        ]);
        let picker = StubPicker {
            objects: vec![object("transitNodes")],
        };
        assert_eq!(
            c.tooltip(Point::ZERO, &picker).as_deref(),
            Some("node on transitNodes")
        );
        assert_eq!(c.tooltip(Point::ZERO, &StubPicker::default()), None);
    }

    #[test]
    fn registry_swap_replaces_handlers() {
        let log = Log::default();
        let mut c = controller(vec![log_map(&log, "default", true)]);
        c.set_registry(Rc::new(EventRegistry::from_descriptors([log_map(
            &log, "tool", true,
        )])));
        click(&mut c, &StubPicker::default());
        assert_eq!(log.borrow().len(), 1);
        assert!(log.borrow()[0].starts_with("tool"));
    }
}
