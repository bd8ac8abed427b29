//! Link report for a buildings scene.
//!
//! Usage: `buildings-propagation <scene.json> [config.toml]`
//!
//! Loads the scene, the model configuration (the given TOML file, else
//! `propagation.toml` next to the scene, else defaults) and prints the
//! received power and loss terms for every ordered pair of nodes.

use anyhow::Context;
use env_logger::Builder;
use log::{LevelFilter, info, warn};
use std::path::PathBuf;

use buildings_propagation::common::load_scene;
use buildings_propagation::propagation::{BuildingMap, BuildingsPropagationLossModel, ModelConfig};

fn load_config(scene_path: &str, explicit: Option<&str>) -> anyhow::Result<ModelConfig> {
    let path = match explicit {
        Some(path) => PathBuf::from(path),
        None => {
            let path = ModelConfig::config_path_from_scene(scene_path);
            if !path.exists() {
                info!("No {} next to the scene, using default model parameters", path.display());
                return Ok(ModelConfig::default());
            }
            path
        }
    };
    info!("Loading model configuration: {}", path.display());
    ModelConfig::load(&path).with_context(|| format!("Invalid model configuration {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    // Logging setup
    Builder::new()
        .filter_level(LevelFilter::Info)
        .filter(Some("buildings_propagation"), LevelFilter::Debug)
        .parse_default_env()
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(scene_path) = args.first() else {
        anyhow::bail!("usage: buildings-propagation <scene.json> [config.toml]");
    };

    let scene = load_scene(scene_path).with_context(|| format!("Could not load scene {}", scene_path))?;
    info!("Loaded scene {}: {} nodes, {} buildings", scene_path, scene.nodes.len(), scene.buildings.len());
    if scene.buildings.is_empty() {
        warn!("Scene has no buildings; every node is outdoors");
    }

    let config = load_config(scene_path, args.get(1).map(String::as_str))?;
    let model = BuildingsPropagationLossModel::new(config, scene.path_loss_model.clone(), BuildingMap::new(scene.buildings.clone())?)?;

    println!(
        "{:>6} {:>6} {:>10} {:>10} {:>9} {:>9} {:>8} {:>10} {:>10}",
        "tx", "rx", "rx_dBm", "distance", "ext_wall", "int_wall", "height", "shadowing", "total"
    );
    for tx in &scene.nodes {
        for rx in &scene.nodes {
            if tx.node_id == rx.node_id {
                continue;
            }
            let (a, b) = (tx.endpoint(), rx.endpoint());
            let breakdown = model.loss_breakdown(&a, &b);
            let rx_power = tx.tx_power_dbm - breakdown.total();
            println!(
                "{:>6} {:>6} {:>10.2} {:>10.2} {:>9.2} {:>9.2} {:>8.2} {:>10.2} {:>10.2}",
                tx.node_id,
                rx.node_id,
                rx_power,
                breakdown.distance,
                breakdown.external_walls,
                breakdown.internal_walls,
                breakdown.height,
                breakdown.shadowing,
                breakdown.total()
            );
        }
    }
    info!("Realized shadowing for {} links", model.shadowing_sample_count());
    Ok(())
}
