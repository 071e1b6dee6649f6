use anyhow::{Context, Result};
use fs_extra::copy_items;
use fs_extra::dir::CopyOptions;
use std::env;
use std::path::PathBuf;

/// Must match `context::MODEL_PATH`.
const MODEL: &str = "models/blenderfile.glb";

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    let assets_src = manifest_dir.join("assets");
    if !assets_src.exists() {
        // tests build their scenes in memory
        return Ok(());
    }
    if !assets_src.join(MODEL).exists() {
        println!("cargo:warning=assets/{} is missing, the configurator will start without a scene", MODEL);
    }

    let out_dir = env::var("OUT_DIR")?;
    let mut copy_options = CopyOptions::new();
    copy_options.overwrite = true;
    copy_items(&[assets_src], &out_dir, &copy_options)
        .with_context(|| format!("could not copy assets into {}", out_dir))?;

    Ok(())
}
