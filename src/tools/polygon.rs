// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Polygon draw tool
//!
//! Left click adds a vertex and pointer moves preview the next edge. A
//! double click closes the ring from the clicked vertices, reports the
//! polygon as [`MapEvent::PolygonDrawn`] and ends the tool; with fewer than
//! three vertices it ends the tool without a polygon. Right click cancels.

use std::cell::RefCell;
use std::rc::Rc;

use super::{EditTool, ToolCallbacks, ToolId, overlay_common, push_vertex};
use crate::events::{EventHandlerDescriptor, EventRegistry, MapEvent, MapEventName};
use crate::layers::style::{Channel, CircleStyle, FillStyle, LayerCommon, LineStyle};
use crate::layers::{LayerDescriptor, LayerStyle, Revision};
use crate::model::features::{
    collection, empty_collection, line_feature, point_feature, polygon_feature,
};
use crate::theme;

// ===== Overlay Layer Ids =====

pub const POLYGON_LAYER: &str = "polygonBuilderPolygon";
pub const LINE_LAYER: &str = "polygonBuilderLine";
pub const POINTS_LAYER: &str = "polygonBuilderPoints";

/// Fewest vertices of a closable ring
const MIN_VERTICES: usize = 3;

// ===== Gesture State =====

/// State of the drawing gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum GestureState {
    /// No vertex yet
    #[default]
    Ready,
    /// At least one vertex placed
    Drawing,
    /// Ring closed and reported
    Closed,
}

// ===== Polygon Builder =====

#[derive(Debug, Default)]
struct PolygonBuilder {
    gesture: GestureState,
    vertices: Vec<geo::Point>,
    /// Pointer position, previewing the next vertex
    preview: Option<geo::Point>,
    revision: Revision,
}

impl PolygonBuilder {
    fn touch(&mut self) {
        self.revision = self.revision.next();
    }

    fn add(&mut self, point: geo::Point) -> bool {
        if self.gesture == GestureState::Closed || !push_vertex(&mut self.vertices, point) {
            return false;
        }
        self.gesture = GestureState::Drawing;
        self.touch();
        true
    }

    fn hover(&mut self, point: geo::Point) -> bool {
        if self.gesture != GestureState::Drawing {
            return false;
        }
        self.preview = Some(point);
        self.touch();
        true
    }

    /// Close the ring from the committed vertices; the preview is ignored
    fn close(&mut self) -> Option<geojson::Feature> {
        if self.gesture != GestureState::Drawing || self.vertices.len() < MIN_VERTICES {
            return None;
        }
        self.gesture = GestureState::Closed;
        self.preview = None;
        self.touch();
        Some(polygon_feature(&self.vertices))
    }

    /// Vertices followed by the preview point
    fn outline(&self) -> Vec<geo::Point> {
        let mut points = self.vertices.clone();
        if self.gesture == GestureState::Drawing {
            points.extend(self.preview);
        }
        points
    }
}

// ===== PolygonTool Struct =====

/// The polygon draw tool
#[derive(Debug)]
pub struct PolygonTool {
    builder: Rc<RefCell<PolygonBuilder>>,
    registry: Rc<EventRegistry>,
    callbacks: ToolCallbacks,
}

impl PolygonTool {
    pub fn new(callbacks: ToolCallbacks) -> Self {
        let builder = Rc::new(RefCell::new(PolygonBuilder::default()));

        let add = {
            let builder = Rc::clone(&builder);
            let callbacks = callbacks.clone();
            EventHandlerDescriptor::map(MapEventName::LeftClick, move |info, _| {
                if builder.borrow_mut().add(info.coordinate) {
                    callbacks.update();
                }
                true
            })
        };
        let preview = {
            let builder = Rc::clone(&builder);
            let callbacks = callbacks.clone();
            EventHandlerDescriptor::map(MapEventName::PointerMove, move |info, _| {
                if builder.borrow_mut().hover(info.coordinate) {
                    callbacks.update();
                }
                true
            })
        };
        let close = {
            let builder = Rc::clone(&builder);
            let callbacks = callbacks.clone();
            EventHandlerDescriptor::map(MapEventName::LeftDblClick, move |_, ctx| {
                let polygon = builder.borrow_mut().close();
                match polygon {
                    Some(polygon) => {
                        tracing::debug!("Polygon tool: ring closed");
                        ctx.emit(MapEvent::PolygonDrawn(collection(vec![polygon])));
                        callbacks.update();
                    }
                    None => tracing::debug!("Polygon tool: not enough vertices, nothing drawn"),
                }
                callbacks.disable();
                true
            })
        };
        let cancel = {
            let callbacks = callbacks.clone();
            EventHandlerDescriptor::map(MapEventName::RightClick, move |_, _| {
                tracing::debug!("Polygon tool: cancelled");
                callbacks.disable();
                true
            })
        };

        Self {
            builder,
            registry: Rc::new(EventRegistry::from_descriptors([add, preview, close, cancel])),
            callbacks,
        }
    }
}

// ===== Tool Implementation =====

impl EditTool for PolygonTool {
    fn id(&self) -> ToolId {
        ToolId::PolygonDraw
    }

    fn map_events(&self) -> Rc<EventRegistry> {
        Rc::clone(&self.registry)
    }

    fn layers(&self) -> Vec<LayerDescriptor> {
        let b = self.builder.borrow();
        let outline = b.outline();

        let polygon = if outline.len() >= MIN_VERTICES {
            collection(vec![polygon_feature(&outline)])
        } else {
            empty_collection()
        };
        let line = if outline.len() >= 2 {
            collection(vec![line_feature(&outline)])
        } else {
            empty_collection()
        };
        let points = collection(b.vertices.iter().copied().map(point_feature).collect());

        vec![
            LayerDescriptor::overlay(POLYGON_LAYER, polygon_style(), polygon),
            LayerDescriptor::overlay(LINE_LAYER, line_style(), line),
            LayerDescriptor::overlay(POINTS_LAYER, point_style(), points),
        ]
    }

    fn revision(&self) -> Revision {
        self.builder.borrow().revision
    }

    fn callbacks(&self) -> &ToolCallbacks {
        &self.callbacks
    }
}

// ===== Overlay Styles =====

fn polygon_style() -> LayerStyle {
    LayerStyle::Fill(FillStyle {
        common: LayerCommon {
            opacity: 0.05,
            ..overlay_common()
        },
        color: Channel::constant(theme::polygon_tool::ACCENT),
        line_color: Some(Channel::constant(theme::polygon_tool::ACCENT)),
        line_width: Channel::constant(4.0),
    })
}

fn line_style() -> LayerStyle {
    LayerStyle::Line(LineStyle {
        common: overlay_common(),
        color: Channel::constant(theme::polygon_tool::ACCENT),
        width: Channel::constant(2.0),
        ..LineStyle::default()
    })
}

fn point_style() -> LayerStyle {
    LayerStyle::Circle(CircleStyle {
        common: overlay_common(),
        color: Channel::constant(theme::polygon_tool::ACCENT),
        radius: Channel::constant(4.0),
        stroke_color: Some(Channel::constant(theme::polygon_tool::POINT_STROKE)),
        stroke_width: Channel::constant(2.0),
        ..CircleStyle::default()
    })
}
