// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Buffer reuse bookkeeping, keyed by drawable id and revision.
//!
//! A drawable's buffers are rebuilt only when its revision differs from the
//! one last drawn, or when it was not drawn last frame (newly enabled, or
//! back in zoom range). Everything else is reused as is.

use std::collections::HashMap;

use super::Revision;
use super::render::DrawableLayer;

/// What a frame rebuilt and what it reused
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub rebuilt: Vec<String>,
    pub reused: Vec<String>,
}

impl SyncReport {
    pub fn was_rebuilt(&self, id: &str) -> bool {
        self.rebuilt.iter().any(|r| r == id)
    }
}

#[derive(Debug, Default)]
pub struct BufferCache {
    drawn: HashMap<String, Revision>,
}

impl BufferCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a frame. Drawables missing from `layers` are forgotten, so
    /// they rebuild when they come back.
    pub fn sync(&mut self, layers: &[DrawableLayer]) -> SyncReport {
        let mut report = SyncReport::default();
        let mut next = HashMap::with_capacity(layers.len());

        for layer in layers {
            if self.drawn.get(&layer.id) == Some(&layer.cache_key) {
                report.reused.push(layer.id.clone());
            } else {
                report.rebuilt.push(layer.id.clone());
            }
            next.insert(layer.id.clone(), layer.cache_key);
        }

        self.drawn = next;
        if !report.rebuilt.is_empty() {
            tracing::debug!("Rebuilding buffers for {:?}", report.rebuilt);
        }
        report
    }

    /// Forget some drawables, so they rebuild on the next frame
    pub fn forget<S: AsRef<str>>(&mut self, ids: &[S]) {
        for id in ids {
            self.drawn.remove(id.as_ref());
        }
    }

    /// Forget everything, forcing a full rebuild on the next frame
    pub fn clear(&mut self) {
        self.drawn.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::render::DrawableKind;
    use crate::model::features::empty_collection;
    use std::rc::Rc;

    fn drawable(id: &str, rev: Revision) -> DrawableLayer {
        DrawableLayer {
            id: id.to_string(),
            source: id.to_string(),
            kind: DrawableKind::Line,
            data: Rc::new(empty_collection()),
            features: Vec::new(),
            cache_key: rev,
            pickable: true,
            opacity: 1.0,
            events: Vec::new(),
        }
    }

    #[test]
    fn unchanged_revision_is_reused() {
        let mut cache = BufferCache::new();
        let r0 = Revision::default();
        let first = cache.sync(&[drawable("a", r0), drawable("b", r0)]);
        assert_eq!(first.rebuilt, ["a", "b"]);

        let second = cache.sync(&[drawable("a", r0), drawable("b", r0.next())]);
        assert_eq!(second.reused, ["a"]);
        assert_eq!(second.rebuilt, ["b"]);
    }

    #[test]
    fn re_enabled_layer_is_rebuilt() {
        let mut cache = BufferCache::new();
        let r = Revision::default();
        cache.sync(&[drawable("a", r), drawable("b", r)]);
        cache.sync(&[drawable("a", r)]);
        let report = cache.sync(&[drawable("a", r), drawable("b", r)]);
        assert!(report.was_rebuilt("b"));
        assert!(!report.was_rebuilt("a"));
    }

    #[test]
    fn forgotten_layer_is_rebuilt() {
        let mut cache = BufferCache::new();
        let r = Revision::default();
        cache.sync(&[drawable("a", r), drawable("b", r)]);
        cache.forget(&["b"]);
        let report = cache.sync(&[drawable("a", r), drawable("b", r)]);
        assert_eq!(report.rebuilt, ["b"]);

        cache.clear();
        let report = cache.sync(&[drawable("a", r)]);
        assert_eq!(report.rebuilt, ["a"]);
    }
}
