use anyhow::{bail, Context, Result};
use paperdoll::avatar::configuration::AvatarConfiguration;
use paperdoll::config::settings::ComposerSettings;
use paperdoll::manager::SpriteManager;
use paperdoll::utils::logging::init_logging;
use std::path::Path;
use tracing::info;

/// Demo compositor: reads an avatar configuration, composes its sheet
/// against the configured asset tree and writes the sheet plus a JSON clip
/// manifest next to it.
#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    let mut args = std::env::args().skip(1);
    let Some(config_path) = args.next() else {
        bail!("usage: paperdoll <avatar.toml> [output.png] [composer.toml]");
    };
    let output_path = args.next().unwrap_or_else(|| "composed.png".to_string());
    let settings = match args.next() {
        Some(path) => ComposerSettings::load_from(Path::new(&path))?,
        None => ComposerSettings::default(),
    };

    let raw = std::fs::read_to_string(&config_path)
        .with_context(|| format!("reading avatar configuration {config_path}"))?;
    let config: AvatarConfiguration = toml::from_str(&raw)
        .with_context(|| format!("parsing avatar configuration {config_path}"))?;

    info!(version = paperdoll::VERSION, "starting demo compositor");

    let manager = SpriteManager::with_settings(&settings);
    let texture = manager.compose(&config).await?;

    texture
        .sheet
        .save(&output_path)
        .with_context(|| format!("writing composed sheet {output_path}"))?;

    let clips = manager.create_animations(&texture).await;
    let manifest_path = Path::new(&output_path).with_extension("clips.json");
    let manifest = serde_json::to_string_pretty(&clips).context("rendering clip manifest")?;
    std::fs::write(&manifest_path, manifest)
        .with_context(|| format!("writing clip manifest {}", manifest_path.display()))?;

    let stats = manager.resource_stats().await;
    info!(
        handle = %texture.handle,
        sheet = %output_path,
        clips = clips.len(),
        assets_loaded = stats.loads_started,
        "demo composition complete"
    );
    Ok(())
}
