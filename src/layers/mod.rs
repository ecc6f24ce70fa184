// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Map layers: storage, styling, rendering and configuration

use std::rc::Rc;

use geojson::FeatureCollection;

pub mod cache;
pub mod color;
pub mod config;
pub mod render;
pub mod store;
pub mod style;

pub use cache::{BufferCache, SyncReport};
pub use config::MapConfig;
pub use render::{DrawableKind, DrawableLayer, RenderContext, ResolvedStyle, render};
pub use store::{FeatureFilter, LayerDefinition, LayerStore, LayerUpdate};
pub use style::{Channel, LayerStyle};

/// Per-layer change counter, used as the cache key of drawn buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Revision(u64);

impl Revision {
    pub fn get(self) -> u64 {
        self.0
    }

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// A layer as handed to the renderer
#[derive(Debug, Clone)]
pub struct LayerDescriptor {
    pub id: String,
    pub visible: bool,
    pub style: Rc<LayerStyle>,
    pub data: Rc<FeatureCollection>,
}

impl LayerDescriptor {
    /// A visible layer, used for tool overlays
    pub fn overlay(id: impl Into<String>, style: LayerStyle, data: FeatureCollection) -> Self {
        Self {
            id: id.into(),
            visible: true,
            style: Rc::new(style),
            data: Rc::new(data),
        }
    }
}
