// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! The transit map component
//!
//! [`TransitMap`] ties the pieces together: it owns the layer store, the
//! controller with its active registry, the edit tool session, the buffer
//! cache, the picking engine and the preferences. Collaborators drive it
//! through the inbound layer API and feed it pointer gestures; it answers
//! with frames to draw and with [`MapEvent`]s.

use std::collections::HashSet;
use std::rc::Rc;

use geojson::Feature;
use kurbo::{Point, Size, Vec2};
use serde_json::json;

use crate::controller::picking::{HitTester, PickingEngine};
use crate::controller::viewport::Viewport;
use crate::controller::{Dispatch, MapController};
use crate::error::ConfigError;
use crate::events::{DragPhase, EventHandlerDescriptor, EventRegistry, MapEvent, PointerEvent};
use crate::layers::render::{DrawableLayer, RenderContext, render};
use crate::layers::{BufferCache, LayerStore, LayerUpdate, MapConfig, SyncReport};
use crate::model::{HandlerId, bounds};
use crate::preferences::PreferencesStore;
use crate::settings;
use crate::tools::{ToolId, ToolPanel, ToolSession};

/// One drawn frame
#[derive(Debug, Clone)]
pub struct Frame {
    /// Drawables in z-order, tool overlays last
    pub layers: Vec<DrawableLayer>,
    pub report: SyncReport,
}

impl Frame {
    pub fn layer(&self, id: &str) -> Option<&DrawableLayer> {
        self.layers.iter().find(|l| l.id == id)
    }
}

pub struct TransitMap {
    config: MapConfig,
    store: LayerStore,
    default_registry: Rc<EventRegistry>,
    controller: MapController,
    tools: ToolSession,
    cache: BufferCache,
    picker: Box<dyn PickingEngine>,
    prefs: Box<dyn PreferencesStore>,
    events: Vec<MapEvent>,
    /// Overlay drawables of the last frame
    overlay_ids: Vec<String>,
    needs_redraw: bool,
}

impl TransitMap {
    /// Build the map from its configuration, restoring the view and the
    /// hidden layers from `prefs`
    pub fn new(
        config: MapConfig,
        prefs: Box<dyn PreferencesStore>,
        size: Size,
    ) -> Result<Self, ConfigError> {
        let mut store = LayerStore::new(config.definitions()?);
        if let Some(hidden) = prefs.get(settings::prefs::HIDDEN_LAYERS)
            && let Some(hidden) = hidden.as_array()
        {
            for id in hidden.iter().filter_map(|v| v.as_str()) {
                store.hide(id);
            }
        }

        let viewport = Viewport::new(
            stored_center(prefs.as_ref()),
            stored_zoom(prefs.as_ref()),
            size,
        );
        let default_registry = Rc::new(EventRegistry::new());

        Ok(Self {
            config,
            store,
            controller: MapController::new(Rc::clone(&default_registry), "", viewport),
            default_registry,
            tools: ToolSession::new(),
            cache: BufferCache::new(),
            picker: Box::new(HitTester::new()),
            prefs,
            events: Vec::new(),
            overlay_ids: Vec::new(),
            needs_redraw: true,
        })
    }

    /// Replace the software picker with the rendering engine's
    pub fn with_picker(mut self, picker: Box<dyn PickingEngine>) -> Self {
        self.picker = picker;
        self
    }

    // ===== Accessors =====

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn store(&self) -> &LayerStore {
        &self.store
    }

    pub fn viewport(&self) -> &Viewport {
        self.controller.viewport()
    }

    pub fn section(&self) -> &str {
        self.controller.section()
    }

    pub fn preferences(&self) -> &dyn PreferencesStore {
        self.prefs.as_ref()
    }

    pub fn preferences_mut(&mut self) -> &mut dyn PreferencesStore {
        self.prefs.as_mut()
    }

    pub fn needs_redraw(&self) -> bool {
        self.needs_redraw
    }

    /// Drain the events raised since the last call
    pub fn take_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }

    fn animations_enabled(&self) -> bool {
        self.prefs.get_bool(settings::prefs::ENABLE_ANIMATIONS, true)
    }

    /// Whether a visible animated layer needs continuous frames
    pub fn needs_animation(&self) -> bool {
        let zoom = self.viewport().zoom();
        self.animations_enabled()
            && self.store.enabled().any(|entry| {
                let style = &entry.descriptor().style;
                style.is_animated() && style.visible_at(zoom)
            })
    }

    // ===== Handlers =====

    /// Add a default handler after the existing ones
    pub fn register_handler(&mut self, descriptor: EventHandlerDescriptor) -> HandlerId {
        let id = Rc::make_mut(&mut self.default_registry).register(descriptor);
        self.sync_registry();
        id
    }

    pub fn remove_handler(&mut self, id: HandlerId) -> bool {
        let removed = Rc::make_mut(&mut self.default_registry).remove(id);
        self.sync_registry();
        removed
    }

    /// Replace all default handlers
    pub fn set_handlers(&mut self, registry: EventRegistry) {
        self.default_registry = Rc::new(registry);
        self.sync_registry();
    }

    /// Point the controller at the tool's registry, or the default one
    fn sync_registry(&mut self) {
        let active = self.tools.registry(&self.default_registry);
        if !Rc::ptr_eq(&active, self.controller.registry()) {
            self.controller.set_registry(active);
        }
    }

    // ===== Layers =====

    pub fn update_layer(&mut self, name: &str, update: impl Into<LayerUpdate>) {
        self.store.set_data(name, update.into());
        if self.store.get(name).is_some() {
            self.events.push(MapEvent::LayerUpdated(name.to_string()));
            self.needs_redraw = true;
        }
    }

    pub fn update_layers(&mut self, updates: impl IntoIterator<Item = (String, LayerUpdate)>) {
        let updates: Vec<_> = updates.into_iter().collect();
        let names: Vec<String> = updates
            .iter()
            .map(|(name, _)| name.clone())
            .filter(|name| self.store.get(name).is_some())
            .collect();
        self.store.set_data_many(updates);
        if !names.is_empty() {
            self.events.push(MapEvent::LayersUpdated(names));
            self.needs_redraw = true;
        }
    }

    pub fn show_layer(&mut self, name: &str) {
        self.store.show(name);
        self.persist_hidden_layers();
    }

    pub fn hide_layer(&mut self, name: &str) {
        self.store.hide(name);
        self.persist_hidden_layers();
    }

    fn persist_hidden_layers(&mut self) {
        let hidden = self.store.hidden_layers();
        self.prefs.set(settings::prefs::HIDDEN_LAYERS, json!(hidden));
        self.needs_redraw = true;
    }

    pub fn update_filter(&mut self, name: &str, filter: impl Fn(&Feature) -> bool + 'static) {
        self.store.set_filter(name, Some(Rc::new(filter)));
        self.needs_redraw = true;
    }

    pub fn clear_filter(&mut self, name: &str) {
        self.store.clear_filter(name);
        self.needs_redraw = true;
    }

    /// Switch section: enable its layers and re-scope handler conditions
    pub fn set_section(&mut self, section: &str) {
        let layers = self.config.section_layers(section);
        if layers.is_empty() {
            tracing::warn!("Section `{section}` enables no layers");
        }
        self.store.set_enabled_layers(layers);
        self.controller.set_section(section);
        tracing::info!("Section changed to `{section}`");
        self.events.push(MapEvent::EnabledLayersUpdated(section.to_string()));
        self.needs_redraw = true;
    }

    // ===== Gestures =====

    /// Route a click, double click or pointer move
    pub fn handle_pointer(&mut self, event: &mut PointerEvent) -> bool {
        let dispatch = Dispatch {
            picker: self.picker.as_ref(),
            layers: &mut self.store,
            events: &mut self.events,
        };
        let handled = self.controller.handle_pointer(event, dispatch);
        self.after_gesture();
        handled
    }

    /// Route a drag phase. While an object is dragged the native drag-pan
    /// must stay off.
    pub fn handle_drag(&mut self, phase: DragPhase, event: &mut PointerEvent) -> bool {
        let dispatch = Dispatch {
            picker: self.picker.as_ref(),
            layers: &mut self.store,
            events: &mut self.events,
        };
        let handled = self.controller.handle_drag(phase, event, dispatch);
        self.after_gesture();
        handled
    }

    pub fn is_dragging_object(&self) -> bool {
        self.controller.dragging_layer().is_some()
    }

    pub fn tooltip(&self, point: Point) -> Option<String> {
        self.controller.tooltip(point, self.picker.as_ref())
    }

    /// Apply what handlers and tools asked for during a gesture
    fn after_gesture(&mut self) {
        let outcome = self.tools.drain();
        if outcome.updated {
            self.needs_redraw = true;
        }
        if let Some(event) = outcome.disabled {
            self.events.push(event);
            self.tool_changed();
        }
    }

    // ===== Tools =====

    pub fn enable_tool(&mut self, id: ToolId) {
        let events = self.tools.enable(id);
        self.events.extend(events);
        self.tool_changed();
    }

    pub fn disable_tool(&mut self) {
        if let Some(event) = self.tools.disable() {
            self.events.push(event);
            self.tool_changed();
        }
    }

    pub fn active_tool(&self) -> Option<ToolId> {
        self.tools.active_id()
    }

    pub fn tool_panel(&self) -> Option<ToolPanel> {
        self.tools.active().and_then(|tool| tool.map_component())
    }

    fn tool_changed(&mut self) {
        self.sync_registry();
        // A new tool restarts its revisions; drop the old overlay buffers
        self.cache.forget(&self.overlay_ids);
        self.needs_redraw = true;
    }

    // ===== Drawing =====

    /// Render the visible enabled layers, then the tool overlays on top
    pub fn draw(&mut self) -> Frame {
        let ctx = RenderContext {
            zoom: self.viewport().zoom(),
            animations_enabled: self.animations_enabled(),
        };
        let tool = self.tools.active();

        let mut layers = Vec::new();
        for entry in self.store.enabled() {
            let events = if tool.is_some() {
                Vec::new()
            } else {
                self.default_registry.layer_event_names(entry.id())
            };
            let filter = entry.filter();
            layers.extend(render(
                entry.descriptor(),
                entry.revision(),
                filter.as_ref(),
                &ctx,
                &events,
            ));
        }

        let first_overlay = layers.len();
        if let Some(tool) = tool {
            let revision = tool.revision();
            for overlay in tool.layers() {
                layers.extend(render(&overlay, revision, None, &ctx, &[]));
            }
        }
        self.overlay_ids = layers[first_overlay..].iter().map(|l| l.id.clone()).collect();

        let report = self.cache.sync(&layers);
        self.picker.sync(&layers, self.controller.viewport());

        let mut seen = HashSet::new();
        let visible = layers
            .iter()
            .filter(|l| seen.insert(l.source.as_str()))
            .map(|l| l.source.clone())
            .collect();
        self.controller.set_visible_layers(visible);

        self.needs_redraw = false;
        Frame { layers, report }
    }

    // ===== View =====

    pub fn set_view(&mut self, center: geo::Point, zoom: f64) {
        let viewport = self.controller.viewport_mut();
        viewport.set_center(center);
        viewport.set_zoom(zoom);
        self.view_changed();
    }

    pub fn resize(&mut self, size: Size) {
        self.controller.viewport_mut().set_size(size);
        self.needs_redraw = true;
    }

    pub fn pan_by(&mut self, delta: Vec2) {
        self.controller.viewport_mut().pan_by(delta);
        self.view_changed();
    }

    pub fn zoom_by(&mut self, delta: f64) {
        self.controller.viewport_mut().zoom_by(delta);
        self.view_changed();
    }

    /// Fit the view to a layer's data. Returns false when the layer is
    /// unknown or empty.
    pub fn fit_layer(&mut self, name: &str, padding: f64) -> bool {
        let Some(rect) = self
            .store
            .get(name)
            .and_then(|entry| bounds::safe_bounds(&entry.descriptor().data))
        else {
            tracing::debug!("Nothing to fit in `{name}`");
            return false;
        };
        self.controller.viewport_mut().fit_bounds(rect, padding);
        self.view_changed();
        true
    }

    /// Fit to a layer only when none of its data shows in the view, minus a
    /// small margin. Returns whether the view moved.
    pub fn fit_layer_if_not_visible(&mut self, name: &str, padding: f64) -> bool {
        let Some(entry) = self.store.get(name) else {
            return false;
        };
        let area = bounds::inset(
            self.viewport().bounds(),
            settings::bounds::VIEWPORT_MARGIN_RATIO,
        );
        if bounds::intersects(&entry.descriptor().data, area) {
            return false;
        }
        self.fit_layer(name, padding)
    }

    fn view_changed(&mut self) {
        let viewport = *self.controller.viewport();
        self.prefs.set(settings::prefs::ZOOM, json!(viewport.zoom()));
        self.prefs.set(
            settings::prefs::CENTER,
            json!([viewport.center().x(), viewport.center().y()]),
        );
        self.needs_redraw = true;
    }
}

fn stored_zoom(prefs: &dyn PreferencesStore) -> f64 {
    prefs
        .get_f64(settings::prefs::ZOOM)
        .unwrap_or(settings::map::DEFAULT_ZOOM)
}

fn stored_center(prefs: &dyn PreferencesStore) -> geo::Point {
    let stored = prefs.get(settings::prefs::CENTER).and_then(|v| {
        let pair = v.as_array()?;
        match pair.as_slice() {
            [lon, lat] => Some(geo::Point::new(lon.as_f64()?, lat.as_f64()?)),
            _ => None,
        }
    });
    stored.unwrap_or_else(|| {
        let (lon, lat) = settings::map::DEFAULT_CENTER;
        geo::Point::new(lon, lat)
    })
}
