// Copyright 2025 the Transit Map Authors
// SPDX-License-Identifier: Apache-2.0

//! Transit Map: headless demo
//!
//! Loads a layer configuration (the built-in transit one by default), puts a
//! few stops on the map and replays a scripted session: a stop selection, a
//! measurement and a drawn polygon. Every map event is logged.
//!
//! Usage: `transit-map [layers.toml] [preferences.toml]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use kurbo::{Point, Size, Vec2};
use transit_map::events::{EventHandlerDescriptor, MapEventName, PointerButton, PointerEvent};
use transit_map::layers::MapConfig;
use transit_map::model::features::{
    collection, line_feature, point_feature, property, with_property,
};
use transit_map::preferences::TomlPreferences;
use transit_map::tools::ToolId;
use transit_map::{TransitMap, settings};

const NODES_LAYER: &str = "transitNodes";
const PATHS_LAYER: &str = "transitPaths";

fn main() -> Result<()> {
    transit_map::init_logging();

    let mut args = std::env::args().skip(1);
    let config = match args.next().map(PathBuf::from) {
        Some(path) => {
            tracing::info!("Loading layers from: {}", path.display());
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            MapConfig::from_toml(&text)?
        }
        None => MapConfig::transit_default()?,
    };
    let prefs_path = args
        .next()
        .map_or_else(|| std::env::temp_dir().join("transit-map-demo.toml"), PathBuf::from);
    let prefs = TomlPreferences::load(&prefs_path)?;

    let mut map = TransitMap::new(config, Box::new(prefs), Size::new(1280.0, 800.0))?;
    map.set_section("nodes");
    load_network(&mut map);
    register_handlers(&mut map);
    map.fit_layer(NODES_LAYER, settings::bounds::FIT_PADDING);
    map.draw();
    log_events(&mut map);

    select_stop(&mut map);
    measure(&mut map);
    draw_polygon(&mut map);

    map.preferences_mut().flush()?;
    tracing::info!("Preferences saved to {}", prefs_path.display());
    Ok(())
}

fn stops() -> Vec<(&'static str, geo::Point)> {
    vec![
        ("Jean-Talon", geo::Point::new(-73.6139, 45.5393)),
        ("Laurier", geo::Point::new(-73.5866, 45.5271)),
        ("Mont-Royal", geo::Point::new(-73.5818, 45.5245)),
        ("Berri-UQAM", geo::Point::new(-73.5634, 45.5152)),
    ]
}

fn load_network(map: &mut TransitMap) {
    let nodes = stops()
        .into_iter()
        .map(|(name, p)| with_property(point_feature(p), "name", name))
        .collect();
    map.update_layer(NODES_LAYER, collection(nodes));

    let line: Vec<_> = stops().into_iter().map(|(_, p)| p).collect();
    map.update_layer(
        PATHS_LAYER,
        collection(vec![with_property(line_feature(&line), "color", "#ff8c00")]),
    );
}

fn register_handlers(map: &mut TransitMap) {
    map.register_handler(EventHandlerDescriptor::select(
        NODES_LAYER,
        MapEventName::LeftClick,
        |objects, _, ctx| {
            let names: Vec<_> = objects
                .iter()
                .filter_map(|o| property(&o.feature, "name").cloned())
                .collect();
            ctx.emit_custom("stopsSelected", serde_json::Value::Array(names));
            true
        },
    ));
    map.register_handler(
        EventHandlerDescriptor::map(MapEventName::LeftClick, |info, ctx| {
            ctx.emit_custom(
                "mapClicked",
                serde_json::json!([info.coordinate.x(), info.coordinate.y()]),
            );
            true
        })
        .when_section("nodes"),
    );
    map.register_handler(EventHandlerDescriptor::tooltip(NODES_LAYER, |o| {
        property(&o.feature, "name")
            .and_then(|v| v.as_str())
            .map(str::to_string)
    }));
}

fn click(map: &mut TransitMap, at: Point, button: PointerButton) {
    map.handle_pointer(&mut PointerEvent::click(at, button));
}

fn select_stop(map: &mut TransitMap) {
    let (_, stop) = stops()[1];
    let at = map.viewport().to_screen(stop);
    if let Some(tip) = map.tooltip(at) {
        tracing::info!("Tooltip: {tip}");
    }
    click(map, at, PointerButton::Left);
    click(map, at + Vec2::new(0.0, 200.0), PointerButton::Left);
    log_events(map);
}

fn measure(map: &mut TransitMap) {
    map.enable_tool(ToolId::Measure);
    map.draw();
    for (_, stop) in stops() {
        let at = map.viewport().to_screen(stop);
        click(map, at, PointerButton::Left);
    }
    map.draw();
    if let Some(panel) = map.tool_panel() {
        tracing::info!("{}: {}", panel.title, panel.lines.join(", "));
    }
    click(map, Point::ZERO, PointerButton::Right);
    log_events(map);
}

fn draw_polygon(map: &mut TransitMap) {
    map.enable_tool(ToolId::PolygonDraw);
    map.draw();
    let corners = [
        Point::new(400.0, 300.0),
        Point::new(800.0, 300.0),
        Point::new(600.0, 600.0),
    ];
    for at in corners {
        click(map, at, PointerButton::Left);
        map.draw();
    }
    map.handle_pointer(&mut PointerEvent::double_click(corners[2], PointerButton::Left));
    map.draw();
    log_events(map);
}

fn log_events(map: &mut TransitMap) {
    for event in map.take_events() {
        tracing::info!("Event: {event:?}");
    }
}
