// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Measure tool for measuring distances along a polyline
//!
//! Left click adds a vertex, right click ends the measurement. The overlay
//! shows the polyline, one distance label per segment and the vertices.

use std::cell::RefCell;
use std::rc::Rc;

use geo::{Distance, Haversine};

use super::{EditTool, ToolCallbacks, ToolId, ToolPanel, overlay_common, push_vertex};
use crate::events::{EventHandlerDescriptor, EventRegistry, MapEventName};
use crate::layers::style::{Channel, CircleStyle, LineStyle, TextStyle};
use crate::layers::{LayerDescriptor, LayerStyle, Revision};
use crate::model::features::{
    collection, empty_collection, line_feature, point_feature, with_property,
};
use crate::{settings, theme};

// ===== Overlay Layer Ids =====

pub const LINE_LAYER: &str = "measureToolLine";
pub const LABELS_LAYER: &str = "measureToolLabels";
pub const POINTS_LAYER: &str = "measureToolPoints";

// ===== Measurement =====

/// Vertices clicked so far
#[derive(Debug, Default)]
struct Measurement {
    vertices: Vec<geo::Point>,
    revision: Revision,
}

impl Measurement {
    fn segments(&self) -> impl Iterator<Item = (geo::Point, geo::Point)> + '_ {
        self.vertices.windows(2).map(|w| (w[0], w[1]))
    }

    /// Total length in meters
    fn total(&self) -> f64 {
        self.segments().map(|(a, b)| Haversine.distance(a, b)).sum()
    }
}

// ===== MeasureTool Struct =====

/// The measure tool
#[derive(Debug)]
pub struct MeasureTool {
    state: Rc<RefCell<Measurement>>,
    registry: Rc<EventRegistry>,
    callbacks: ToolCallbacks,
}

impl MeasureTool {
    pub fn new(callbacks: ToolCallbacks) -> Self {
        let state = Rc::new(RefCell::new(Measurement::default()));

        let add = {
            let state = Rc::clone(&state);
            let callbacks = callbacks.clone();
            EventHandlerDescriptor::map(MapEventName::LeftClick, move |info, _| {
                let mut m = state.borrow_mut();
                if push_vertex(&mut m.vertices, info.coordinate) {
                    m.revision = m.revision.next();
                    tracing::debug!("Measure tool: {} vertices", m.vertices.len());
                    drop(m);
                    callbacks.update();
                }
                true
            })
        };
        let finish = {
            let callbacks = callbacks.clone();
            EventHandlerDescriptor::map(MapEventName::RightClick, move |_, _| {
                tracing::debug!("Measure tool: finished");
                callbacks.disable();
                true
            })
        };

        Self {
            state,
            registry: Rc::new(EventRegistry::from_descriptors([add, finish])),
            callbacks,
        }
    }

    /// Total measured length in meters
    pub fn total_distance(&self) -> f64 {
        self.state.borrow().total()
    }
}

// ===== Tool Implementation =====

impl EditTool for MeasureTool {
    fn id(&self) -> ToolId {
        ToolId::Measure
    }

    fn map_events(&self) -> Rc<EventRegistry> {
        Rc::clone(&self.registry)
    }

    fn layers(&self) -> Vec<LayerDescriptor> {
        let m = self.state.borrow();

        let line = if m.vertices.len() >= 2 {
            collection(vec![line_feature(&m.vertices)])
        } else {
            empty_collection()
        };

        let labels = collection(
            m.segments()
                .map(|(a, b)| {
                    let meters = Haversine.distance(a, b);
                    let middle = geo::Point::new((a.x() + b.x()) / 2.0, (a.y() + b.y()) / 2.0);
                    let f = with_property(point_feature(middle), "label", format_distance(meters));
                    with_property(f, "distance", meters)
                })
                .collect(),
        );

        let points = collection(m.vertices.iter().copied().map(point_feature).collect());

        vec![
            LayerDescriptor::overlay(LINE_LAYER, line_style(), line),
            LayerDescriptor::overlay(LABELS_LAYER, label_style(), labels),
            LayerDescriptor::overlay(POINTS_LAYER, point_style(), points),
        ]
    }

    fn revision(&self) -> Revision {
        self.state.borrow().revision
    }

    fn map_component(&self) -> Option<ToolPanel> {
        let m = self.state.borrow();
        Some(ToolPanel {
            title: "Measure".to_string(),
            lines: vec![
                format!("Total distance: {}", format_distance(m.total())),
                format!("Segments: {}", m.vertices.len().saturating_sub(1)),
            ],
        })
    }

    fn callbacks(&self) -> &ToolCallbacks {
        &self.callbacks
    }
}

// ===== Helper Methods =====

/// Meters below one kilometer, kilometers with two decimals above
pub fn format_distance(meters: f64) -> String {
    if meters < settings::tools::KILOMETER_THRESHOLD {
        format!("{meters:.0} m")
    } else {
        format!("{:.2} km", meters / 1000.0)
    }
}

fn line_style() -> LayerStyle {
    LayerStyle::Line(LineStyle {
        common: overlay_common(),
        color: Channel::constant(theme::measure_tool::LINE),
        width: Channel::constant(3.0),
        ..LineStyle::default()
    })
}

fn label_style() -> LayerStyle {
    LayerStyle::Text(TextStyle {
        common: overlay_common(),
        color: Channel::constant(theme::measure_tool::LABEL),
        size: Channel::constant(14.0),
        ..TextStyle::default()
    })
}

fn point_style() -> LayerStyle {
    LayerStyle::Circle(CircleStyle {
        common: overlay_common(),
        color: Channel::constant(theme::measure_tool::POINT),
        radius: Channel::constant(4.0),
        stroke_color: Some(Channel::constant(theme::measure_tool::POINT_STROKE)),
        stroke_width: Channel::constant(2.0),
        ..CircleStyle::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{MapContext, PointInfo};
    use crate::layers::LayerStore;
    use crate::model::features::property;
    use crate::tools::ToolSignal;
    use kurbo::Point;
    use std::cell::Cell;

    fn fire(tool: &MeasureTool, name: MapEventName, coordinate: geo::Point) {
        let registry = tool.map_events();
        let mut layers = LayerStore::default();
        let mut events = Vec::new();
        let mut ctx = MapContext::new(&mut layers, "nodes", &mut events);
        let info = PointInfo {
            pixel: Point::ZERO,
            coordinate,
        };
        for d in registry.map_handlers(name) {
            if let crate::events::Handler::Map(f) = &d.handler {
                assert!(f(&info, &mut ctx));
            }
        }
    }

    fn tool() -> (MeasureTool, Rc<RefCell<Vec<ToolSignal>>>) {
        let signals = Rc::new(RefCell::new(Vec::new()));
        let (u, d) = (Rc::clone(&signals), Rc::clone(&signals));
        let callbacks = ToolCallbacks::new(
            move || u.borrow_mut().push(ToolSignal::Update),
            move || d.borrow_mut().push(ToolSignal::Disable),
        );
        (MeasureTool::new(callbacks), signals)
    }

    fn layer<'a>(layers: &'a [LayerDescriptor], id: &str) -> &'a LayerDescriptor {
        layers.iter().find(|l| l.id == id).unwrap()
    }

    #[test]
    fn two_clicks_give_line_and_label() {
        let (tool, signals) = tool();
        fire(&tool, MapEventName::LeftClick, geo::Point::new(-73.60, 45.50));
        fire(&tool, MapEventName::LeftClick, geo::Point::new(-73.59, 45.50));

        let layers = tool.layers();
        let line = layer(&layers, LINE_LAYER);
        assert_eq!(line.data.features.len(), 1);

        let labels = layer(&layers, LABELS_LAYER);
        assert_eq!(labels.data.features.len(), 1);
        let label = property(&labels.data.features[0], "label")
            .and_then(|v| v.as_str())
            .unwrap();
        // About 780 m at this latitude
        assert!(label.ends_with(" m"), "{label}");
        let meters: f64 = label.trim_end_matches(" m").parse().unwrap();
        assert!((770.0..790.0).contains(&meters), "{meters}");

        assert_eq!(layer(&layers, POINTS_LAYER).data.features.len(), 2);
        assert_eq!(*signals.borrow(), [ToolSignal::Update, ToolSignal::Update]);
        assert!(layers.iter().all(|l| !l.style.common().pickable));
    }

    #[test]
    fn repeated_click_is_ignored() {
        let (tool, signals) = tool();
        let p = geo::Point::new(-73.60, 45.50);
        fire(&tool, MapEventName::LeftClick, p);
        let rev = tool.revision();
        fire(&tool, MapEventName::LeftClick, p);
        assert_eq!(tool.revision(), rev);
        assert_eq!(signals.borrow().len(), 1);
    }

    #[test]
    fn right_click_requests_disable() {
        let (tool, signals) = tool();
        fire(&tool, MapEventName::RightClick, geo::Point::new(0.0, 0.0));
        assert_eq!(*signals.borrow(), [ToolSignal::Disable]);
    }

    #[test]
    fn panel_shows_total() {
        let (tool, _) = tool();
        fire(&tool, MapEventName::LeftClick, geo::Point::new(0.0, 0.0));
        fire(&tool, MapEventName::LeftClick, geo::Point::new(0.0, 1.0));
        fire(&tool, MapEventName::LeftClick, geo::Point::new(0.0, 2.0));
        let panel = tool.map_component().unwrap();
        // Two degrees of latitude, about 222 km
        assert!(panel.lines[0].starts_with("Total distance: 222."), "{:?}", panel.lines);
        assert_eq!(panel.lines[1], "Segments: 2");
        assert!(tool.total_distance() > 222_000.0);
    }

    #[test]
    fn distance_formatting() {
        assert_eq!(format_distance(12.4), "12 m");
        assert_eq!(format_distance(999.0), "999 m");
        assert_eq!(format_distance(1000.0), "1.00 km");
        assert_eq!(format_distance(15_250.0), "15.25 km");
    }

    #[test]
    fn callbacks_are_kept() {
        let fired = Rc::new(Cell::new(false));
        let flag = Rc::clone(&fired);
        let tool = MeasureTool::new(ToolCallbacks::new(|| {}, move || flag.set(true)));
        tool.callbacks().disable();
        assert!(fired.get());
    }
}
