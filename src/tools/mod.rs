// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Exclusive edit tools for the map
//!
//! While a tool is active its private registry replaces the default
//! handlers and its overlay layers are drawn above every map layer.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::events::EventRegistry;
use crate::layers::style::LayerCommon;
use crate::layers::{LayerDescriptor, Revision};

// ===== Tool Identifier =====

/// Tool identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolId {
    /// Measure distances along a polyline
    Measure,
    /// Draw a polygon, e.g. to select the nodes inside it
    PolygonDraw,
}

impl ToolId {
    /// Edit mode name reported to the embedder
    pub fn edit_mode(self) -> &'static str {
        match self {
            ToolId::Measure => "measure",
            ToolId::PolygonDraw => "polygonDraw",
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.edit_mode())
    }
}

// ===== Callbacks =====

/// Requests a tool sends to the map
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSignal {
    /// Overlays changed, redraw
    Update,
    /// The tool is done and wants to be deactivated
    Disable,
}

/// The two callbacks injected into every tool on construction
#[derive(Clone)]
pub struct ToolCallbacks {
    on_update: Rc<dyn Fn()>,
    on_disable: Rc<dyn Fn()>,
}

impl ToolCallbacks {
    pub fn new(on_update: impl Fn() + 'static, on_disable: impl Fn() + 'static) -> Self {
        Self {
            on_update: Rc::new(on_update),
            on_disable: Rc::new(on_disable),
        }
    }

    /// Callbacks that push signals onto `queue`, tagged with `generation`
    pub(crate) fn queued(queue: &SignalQueue, generation: u64) -> Self {
        let update = Rc::clone(queue);
        let disable = Rc::clone(queue);
        Self::new(
            move || update.borrow_mut().push((generation, ToolSignal::Update)),
            move || disable.borrow_mut().push((generation, ToolSignal::Disable)),
        )
    }

    pub fn update(&self) {
        (self.on_update)();
    }

    pub fn disable(&self) {
        (self.on_disable)();
    }
}

impl fmt::Debug for ToolCallbacks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ToolCallbacks")
    }
}

/// Signals waiting to be handled, tagged with the activation they came from
pub(crate) type SignalQueue = Rc<RefCell<Vec<(u64, ToolSignal)>>>;

/// Status panel a tool shows next to the map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPanel {
    pub title: String,
    pub lines: Vec<String>,
}

// ===== Tool Trait =====

/// An exclusive map edit tool
pub trait EditTool {
    /// Get the tool identifier
    fn id(&self) -> ToolId;

    fn edit_mode(&self) -> &'static str {
        self.id().edit_mode()
    }

    /// The tool's private handlers
    fn map_events(&self) -> Rc<EventRegistry>;

    /// Overlay layers, drawn on top of the map
    fn layers(&self) -> Vec<LayerDescriptor>;

    /// Changes whenever the overlays change
    fn revision(&self) -> Revision;

    /// Optional status panel
    fn map_component(&self) -> Option<ToolPanel> {
        None
    }

    /// The callbacks the tool was built with
    fn callbacks(&self) -> &ToolCallbacks;
}

// ===== ToolBox Enum =====

/// Enum wrapping all tool types
#[derive(Debug)]
pub enum ToolBox {
    Measure(measure::MeasureTool),
    PolygonDraw(polygon::PolygonTool),
}

impl ToolBox {
    /// Create a tool by ID
    pub fn for_id(id: ToolId, callbacks: ToolCallbacks) -> Self {
        match id {
            ToolId::Measure => ToolBox::Measure(measure::MeasureTool::new(callbacks)),
            ToolId::PolygonDraw => ToolBox::PolygonDraw(polygon::PolygonTool::new(callbacks)),
        }
    }

    fn tool(&self) -> &dyn EditTool {
        match self {
            ToolBox::Measure(tool) => tool,
            ToolBox::PolygonDraw(tool) => tool,
        }
    }

    pub fn id(&self) -> ToolId {
        self.tool().id()
    }

    pub fn edit_mode(&self) -> &'static str {
        self.tool().edit_mode()
    }

    pub fn map_events(&self) -> Rc<EventRegistry> {
        self.tool().map_events()
    }

    pub fn layers(&self) -> Vec<LayerDescriptor> {
        self.tool().layers()
    }

    pub fn revision(&self) -> Revision {
        self.tool().revision()
    }

    pub fn map_component(&self) -> Option<ToolPanel> {
        self.tool().map_component()
    }

    pub fn callbacks(&self) -> &ToolCallbacks {
        self.tool().callbacks()
    }
}

/// Append a clicked vertex unless it repeats the last one, as the clicks
/// of a double click do. Returns whether it was added.
pub(crate) fn push_vertex(vertices: &mut Vec<geo::Point>, point: geo::Point) -> bool {
    let epsilon = crate::settings::tools::VERTEX_EPSILON;
    let repeated = vertices.last().is_some_and(|last| {
        (last.x() - point.x()).abs() <= epsilon && (last.y() - point.y()).abs() <= epsilon
    });
    if !repeated {
        vertices.push(point);
    }
    !repeated
}

/// Overlay styles never take part in picking
pub(crate) fn overlay_common() -> LayerCommon {
    LayerCommon {
        pickable: false,
        ..LayerCommon::default()
    }
}

// ===== Tool Modules =====

pub mod measure;
pub mod polygon;
pub mod session;

pub use session::ToolSession;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toolbox_builds_requested_tool() {
        let queue = SignalQueue::default();
        for id in [ToolId::Measure, ToolId::PolygonDraw] {
            let tool = ToolBox::for_id(id, ToolCallbacks::queued(&queue, 1));
            assert_eq!(tool.id(), id);
            assert!(tool.layers().iter().all(|l| l.data.features.is_empty()));
        }
        assert_eq!(ToolId::PolygonDraw.edit_mode(), "polygonDraw");
    }

    #[test]
    fn queued_callbacks_tag_signals() {
        let queue = SignalQueue::default();
        let callbacks = ToolCallbacks::queued(&queue, 7);
        callbacks.update();
        callbacks.disable();
        assert_eq!(
            *queue.borrow(),
            [(7, ToolSignal::Update), (7, ToolSignal::Disable)]
        );
    }
}
