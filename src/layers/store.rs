// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! The layer store: the single source of truth for what the map draws.
//!
//! Each layer has a feature collection, a visibility flag, an optional
//! per-feature filter and a revision counter. The enabled set is scoped to
//! the active section and is orthogonal to visibility: a layer is drawn
//! only when it is both enabled and visible.
//!
//! Every mutating call bumps the touched layer's revision exactly once,
//! even when the new state equals the old one. Calls naming an unknown
//! layer are silent no-ops.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use geojson::{Feature, FeatureCollection};

use super::{LayerDescriptor, Revision};
use crate::layers::style::LayerStyle;
use crate::model::features;

/// Per-feature predicate; features it rejects are not drawn
pub type FeatureFilter = Rc<dyn Fn(&Feature) -> bool>;

/// New data for a layer
pub enum LayerUpdate {
    /// Replace the whole collection
    Replace(FeatureCollection),
    /// Derive the new collection from the current one
    Patch(Box<dyn FnOnce(&FeatureCollection) -> FeatureCollection>),
}

impl LayerUpdate {
    pub fn patch(f: impl FnOnce(&FeatureCollection) -> FeatureCollection + 'static) -> Self {
        LayerUpdate::Patch(Box::new(f))
    }
}

impl fmt::Debug for LayerUpdate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayerUpdate::Replace(data) => write!(f, "Replace({} features)", data.features.len()),
            LayerUpdate::Patch(_) => f.write_str("Patch(..)"),
        }
    }
}

impl From<FeatureCollection> for LayerUpdate {
    fn from(data: FeatureCollection) -> Self {
        LayerUpdate::Replace(data)
    }
}

/// Static definition of a layer, used to build the store
#[derive(Clone)]
pub struct LayerDefinition {
    pub id: String,
    pub style: LayerStyle,
    /// Always applied, combined with any filter set later
    pub default_filter: Option<FeatureFilter>,
    pub visible: bool,
}

impl LayerDefinition {
    pub fn new(id: impl Into<String>, style: LayerStyle) -> Self {
        Self {
            id: id.into(),
            style,
            default_filter: None,
            visible: true,
        }
    }
}

/// One layer as held by the store
pub struct LayerEntry {
    descriptor: LayerDescriptor,
    default_filter: Option<FeatureFilter>,
    filter: Option<FeatureFilter>,
    revision: Revision,
}

impl LayerEntry {
    pub fn descriptor(&self) -> &LayerDescriptor {
        &self.descriptor
    }

    pub fn id(&self) -> &str {
        &self.descriptor.id
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    /// The effective filter: the default filter AND the user filter
    pub fn filter(&self) -> Option<FeatureFilter> {
        match (&self.default_filter, &self.filter) {
            (None, None) => None,
            (Some(f), None) | (None, Some(f)) => Some(Rc::clone(f)),
            (Some(default), Some(user)) => {
                let default = Rc::clone(default);
                let user = Rc::clone(user);
                Some(Rc::new(move |feature: &Feature| {
                    default(feature) && user(feature)
                }))
            }
        }
    }

    fn touch(&mut self) {
        self.revision = self.revision.next();
    }
}

impl fmt::Debug for LayerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerEntry")
            .field("id", &self.descriptor.id)
            .field("visible", &self.descriptor.visible)
            .field("features", &self.descriptor.data.features.len())
            .field("filtered", &self.filter.is_some())
            .field("revision", &self.revision)
            .finish()
    }
}

/// All layers known to the map
#[derive(Debug, Default)]
pub struct LayerStore {
    layers: HashMap<String, LayerEntry>,
    /// Definition order
    order: Vec<String>,
    /// Section-scoped subset, in draw order
    enabled: Vec<String>,
}

impl LayerStore {
    pub fn new(definitions: impl IntoIterator<Item = LayerDefinition>) -> Self {
        let mut store = Self::default();
        for def in definitions {
            if store.layers.contains_key(&def.id) {
                tracing::warn!("Duplicate layer definition `{}` ignored", def.id);
                continue;
            }
            store.order.push(def.id.clone());
            store.layers.insert(
                def.id.clone(),
                LayerEntry {
                    descriptor: LayerDescriptor {
                        id: def.id,
                        visible: def.visible,
                        style: Rc::new(def.style),
                        data: Rc::new(features::empty_collection()),
                    },
                    default_filter: def.default_filter,
                    filter: None,
                    revision: Revision::default(),
                },
            );
        }
        store
    }

    // ===== Mutations =====

    pub fn show(&mut self, id: &str) {
        self.mutate(id, |entry| entry.descriptor.visible = true);
    }

    pub fn hide(&mut self, id: &str) {
        self.mutate(id, |entry| entry.descriptor.visible = false);
    }

    /// Set or remove the user filter. The default filter stays in effect.
    pub fn set_filter(&mut self, id: &str, filter: Option<FeatureFilter>) {
        self.mutate(id, |entry| entry.filter = filter);
    }

    /// Remove the user filter, leaving only the default filter
    pub fn clear_filter(&mut self, id: &str) {
        self.mutate(id, |entry| entry.filter = None);
    }

    pub fn set_data(&mut self, id: &str, update: LayerUpdate) {
        self.mutate(id, |entry| {
            let data = match update {
                LayerUpdate::Replace(data) => data,
                LayerUpdate::Patch(f) => f(&entry.descriptor.data),
            };
            entry.descriptor.data = Rc::new(data);
        });
    }

    /// Apply several updates; each named layer is bumped once per update
    pub fn set_data_many(&mut self, updates: impl IntoIterator<Item = (String, LayerUpdate)>) {
        for (id, update) in updates {
            self.set_data(&id, update);
        }
    }

    /// Define the section-scoped subset. Unknown ids and duplicates are
    /// dropped; the first occurrence fixes the draw order.
    pub fn set_enabled_layers<S: AsRef<str>>(&mut self, ids: &[S]) {
        self.enabled.clear();
        for id in ids.iter().map(AsRef::as_ref) {
            if !self.layers.contains_key(id) {
                tracing::debug!("Enabling unknown layer `{id}` ignored");
                continue;
            }
            if !self.enabled.iter().any(|e| e == id) {
                self.enabled.push(id.to_string());
            }
        }
    }

    fn mutate(&mut self, id: &str, f: impl FnOnce(&mut LayerEntry)) {
        match self.layers.get_mut(id) {
            Some(entry) => {
                f(entry);
                entry.touch();
                tracing::trace!("Layer `{id}` now at revision {:?}", entry.revision);
            }
            None => tracing::debug!("Update of unknown layer `{id}` ignored"),
        }
    }

    // ===== Queries =====

    /// Layers to draw: enabled AND visible, in enabled order
    pub fn enabled(&self) -> impl Iterator<Item = &LayerEntry> {
        self.enabled
            .iter()
            .filter_map(|id| self.layers.get(id))
            .filter(|entry| entry.descriptor.visible)
    }

    pub fn get(&self, id: &str) -> Option<&LayerEntry> {
        self.layers.get(id)
    }

    pub fn revision(&self, id: &str) -> Option<Revision> {
        self.layers.get(id).map(LayerEntry::revision)
    }

    pub fn filter(&self, id: &str) -> Option<FeatureFilter> {
        self.layers.get(id).and_then(LayerEntry::filter)
    }

    pub fn is_enabled(&self, id: &str) -> bool {
        self.enabled.iter().any(|e| e == id)
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.layers.get(id).is_some_and(|e| e.descriptor.visible)
    }

    /// All layer names in definition order
    pub fn layer_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Names of hidden layers, in definition order
    pub fn hidden_layers(&self) -> Vec<String> {
        self.order
            .iter()
            .filter(|id| !self.is_visible(id))
            .cloned()
            .collect()
    }
}
