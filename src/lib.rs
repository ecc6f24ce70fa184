// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Transit Map: event routing, picking and layer rendering for a transit
//! network map editor

pub mod controller;
pub mod error;
pub mod events;
pub mod layers;
pub mod map;
pub mod model;
pub mod preferences;
pub mod settings;
pub mod theme;
pub mod tools;

pub use error::ConfigError;
pub use map::{Frame, TransitMap};

/// Directive applied on top of `RUST_LOG`
const DEFAULT_LOG_DIRECTIVE: &str = "transit_map=info";

/// Initialize the tracing subscriber (can be controlled via RUST_LOG env var)
pub fn init_logging() {
    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    match DEFAULT_LOG_DIRECTIVE.parse() {
        Ok(directive) => filter = filter.add_directive(directive),
        Err(e) => eprintln!("Ignoring log directive `{DEFAULT_LOG_DIRECTIVE}`: {e}"),
    }
    if tracing_subscriber::fmt().with_env_filter(filter).try_init().is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}
