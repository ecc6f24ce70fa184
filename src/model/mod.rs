// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Map data model: handler identity and GeoJSON helpers

pub mod bounds;
pub mod features;
pub mod handler_id;

pub use handler_id::HandlerId;
