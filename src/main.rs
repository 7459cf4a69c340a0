use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use scene_viewer::{config::ViewerConfig, flow, importer::TextureFailurePolicy};

/// Free-fly viewer for OBJ and glTF scenes.
///
/// Drag with the left mouse button to look around; W/S/A/D move forward, back
/// and sideways, Q/Z up and down, one step per key release. Escape quits.
#[derive(Parser, Debug, Clone)]
#[command(name = "scene-viewer", version)]
struct Args {
    /// Scene file (.obj, .gltf or .glb).
    scene: PathBuf,

    #[arg(long, default_value_t = 1280)]
    width: u32,

    #[arg(long, default_value_t = 720)]
    height: u32,

    #[arg(long, default_value = "Scene Viewer")]
    title: String,

    /// Draw materials whose texture cannot be loaded in their flat colour
    /// instead of aborting.
    #[arg(long)]
    texture_fallback: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ViewerConfig::new(args.scene);
    config.window.width = args.width;
    config.window.height = args.height;
    config.window.title = args.title;
    if args.texture_fallback {
        config.texture_failure = TextureFailurePolicy::FlatFallback;
    }

    flow::run(config)
}
