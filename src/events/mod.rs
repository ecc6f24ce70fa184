// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Map events: inbound pointer gestures, handler registration and the
//! events the map reports back to its embedder.

use std::fmt;

use geojson::FeatureCollection;
use serde_json::Value;

use crate::tools::ToolId;

pub mod descriptor;
pub mod pointer;
pub mod registry;

pub use descriptor::{EventHandlerDescriptor, Handler, MapContext, PointInfo};
pub use pointer::{DragPhase, PointerAction, PointerButton, PointerEvent};
pub use registry::EventRegistry;

// ===== Event Names =====

/// The gestures a handler can be bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapEventName {
    LeftClick,
    RightClick,
    LeftDblClick,
    RightDblClick,
    PointerMove,
    DragStart,
    Drag,
    DragEnd,
}

impl MapEventName {
    pub fn as_str(self) -> &'static str {
        match self {
            MapEventName::LeftClick => "onLeftClick",
            MapEventName::RightClick => "onRightClick",
            MapEventName::LeftDblClick => "onLeftDblClick",
            MapEventName::RightDblClick => "onRightDblClick",
            MapEventName::PointerMove => "onPointerMove",
            MapEventName::DragStart => "onDragStart",
            MapEventName::Drag => "onDrag",
            MapEventName::DragEnd => "onDragEnd",
        }
    }
}

impl fmt::Display for MapEventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handler namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    /// Map-level, no picking involved
    Map,
    /// Generic per-layer pointer handler (drag gestures)
    Layer,
    /// Per-layer tooltip text
    Tooltip,
    /// Per-layer object selection
    Select,
}

// ===== Outbound Events =====

/// Events the map reports to its embedder, drained with
/// [`TransitMap::take_events`](crate::map::TransitMap::take_events)
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// The polygon tool closed a ring; holds one polygon feature
    PolygonDrawn(FeatureCollection),
    ToolEnabled(ToolId),
    ToolDisabled(ToolId),
    /// A single layer's data changed
    LayerUpdated(String),
    /// Several layers' data changed in one call
    LayersUpdated(Vec<String>),
    /// The enabled layer set changed for the named section
    EnabledLayersUpdated(String),
    /// Emitted by a handler
    Custom { name: String, payload: Value },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_names_use_handler_keys() {
        assert_eq!(MapEventName::LeftClick.as_str(), "onLeftClick");
        assert_eq!(MapEventName::RightDblClick.to_string(), "onRightDblClick");
        assert_eq!(MapEventName::PointerMove.as_str(), "onPointerMove");
    }
}
