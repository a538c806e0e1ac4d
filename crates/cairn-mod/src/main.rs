//! # Cairn
//!
//! Boots a host with vanilla structures, runs mod setup, and loads the
//! standard dimensions so the resulting structure tables can be inspected
//! in the logs.
//!
//! Usage: `cairn [path/to/cairn.toml]`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::{Context, Result};
use cairn_common::Identity;
use cairn_host::{DimensionKind, HostEngine, HostRegistries};
use cairn_mod::{setup, CairnConfig, ModStructures};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("cairn=info".parse()?))
        .init();

    info!("Cairn starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args().nth(1) {
        Some(path) => CairnConfig::try_load_from(&path)
            .with_context(|| format!("loading config from {path}"))?,
        None => CairnConfig::load(),
    };

    let mut engine = HostEngine::new(HostRegistries::vanilla()?);

    // Datapack dimensions exist before mods register anything.
    engine.create_dimension(Identity::parse("cairn:catacombs")?, DimensionKind::Custom, false);

    let mut structures = ModStructures::declare()?;
    let report = setup(&mut engine, &mut structures, &config).context("structure setup failed")?;
    engine.finish_registration();

    engine.create_dimension(Identity::parse("overworld")?, DimensionKind::Overworld, false);
    engine.create_dimension(Identity::parse("the_nether")?, DimensionKind::Nether, false);

    let ids: Vec<Identity> = engine.dimensions().map(|d| d.id().clone()).collect();
    for id in &ids {
        let Some(dimension) = engine.load_dimension(id) else {
            warn!("Dimension {id} not found");
            continue;
        };
        for (identity, handle) in &report.registered {
            match dimension.structures().get(*handle) {
                Some(settings) => info!(
                    "{id}: {identity} spacing {}..{} salt {}",
                    settings.min_spacing(),
                    settings.max_spacing(),
                    settings.salt
                ),
                None => warn!("{id}: {identity} will not generate"),
            }
        }
    }

    info!("Cairn shutdown complete");
    Ok(())
}
