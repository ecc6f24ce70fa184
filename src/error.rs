// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Error types for layer configuration

use thiserror::Error;

/// Errors raised while loading layer and section configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid color literal `{0}` (expected #RRGGBB or #RRGGBBAA)")]
    InvalidColor(String),

    #[error("layer `{layer}`: {reason}")]
    InvalidLayer { layer: String, reason: String },

    #[error("section `{section}` references unknown layer `{layer}`")]
    UnknownSectionLayer { section: String, layer: String },

    #[error("failed to parse map configuration")]
    Parse(#[from] toml::de::Error),
}
