// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Pointer gestures as delivered by the canvas

use kurbo::Point;

use super::MapEventName;

/// Mouse button of a click
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Left,
    Middle,
    Right,
}

/// What the pointer did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerAction {
    Move,
    /// A click; `count` is 2 for a double click
    Click { button: PointerButton, count: u8 },
}

/// Phase of a drag gesture
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Start,
    Move,
    End,
}

impl DragPhase {
    pub fn event_name(self) -> MapEventName {
        match self {
            DragPhase::Start => MapEventName::DragStart,
            DragPhase::Move => MapEventName::Drag,
            DragPhase::End => MapEventName::DragEnd,
        }
    }
}

/// A pointer event on the map canvas.
///
/// The `handled` flag is shared with the native pan/zoom handling: once the
/// map marks an event handled, the native action must be skipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    /// Position in canvas pixels
    pub position: Point,
    pub action: PointerAction,
    handled: bool,
}

impl PointerEvent {
    pub fn new(position: Point, action: PointerAction) -> Self {
        Self {
            position,
            action,
            handled: false,
        }
    }

    pub fn moved(position: Point) -> Self {
        Self::new(position, PointerAction::Move)
    }

    pub fn click(position: Point, button: PointerButton) -> Self {
        Self::new(position, PointerAction::Click { button, count: 1 })
    }

    pub fn double_click(position: Point, button: PointerButton) -> Self {
        Self::new(position, PointerAction::Click { button, count: 2 })
    }

    pub fn is_handled(&self) -> bool {
        self.handled
    }

    pub fn mark_handled(&mut self) {
        self.handled = true;
    }

    /// The handler event this gesture dispatches to, if any
    pub fn classify(&self) -> Option<MapEventName> {
        match self.action {
            PointerAction::Move => Some(MapEventName::PointerMove),
            PointerAction::Click { button, count } => match (button, count) {
                (PointerButton::Left, 1) => Some(MapEventName::LeftClick),
                (PointerButton::Right, 1) => Some(MapEventName::RightClick),
                (PointerButton::Left, 2) => Some(MapEventName::LeftDblClick),
                (PointerButton::Right, 2) => Some(MapEventName::RightDblClick),
                _ => None,
            },
        }
    }
}
