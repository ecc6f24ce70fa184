// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Unique identifiers for registered event handlers.
//!
//! Each `HandlerId` is a monotonically increasing `u64` generated from a
//! global atomic counter. Handlers are removed from a registry by id, so two
//! registrations of the same closure stay distinguishable. Ids are never
//! reused within a process.

use std::sync::atomic::{AtomicU64, Ordering};

/// A unique identifier for one handler registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HandlerId(u64);

static HANDLER_COUNTER: AtomicU64 = AtomicU64::new(1);

impl HandlerId {
    /// Create a new unique handler ID
    pub fn next() -> Self {
        Self(HANDLER_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for HandlerId {
    fn default() -> Self {
        Self::next()
    }
}
