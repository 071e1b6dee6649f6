use std::{
    collections::{HashMap, HashSet},
    io::{BufReader, Cursor},
};

use crate::{
    data_structures::scene_graph::{
        to_scene_node, AnimationClip, Channel, EmbeddedCamera, SceneAsset, SceneGraph,
    },
    resources::animation::Keyframes,
};

/**
 * This module contains all logic for loading the scene asset from external files.
 */
pub mod animation;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|e| anyhow::anyhow!("no origin: {:?}", e))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

/// Reads `file_name` below `./assets` natively, or fetches it relative to `<origin>/assets/` on the web.
pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.error_for_status()?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        // TODO: pass env for absolute path from lib caller
        let path = std::path::Path::new("./").join("assets").join(file_name);
        tokio::fs::read(path).await?
    };

    Ok(data)
}

/// Loads a glTF/GLB file and its external buffers.
pub async fn load_scene_gltf(file_name: &str) -> anyhow::Result<SceneAsset> {
    log::info!("Loading scene {}", file_name);
    let gltf_bytes = load_binary(file_name).await?;
    let gltf = gltf::Gltf::from_reader(BufReader::new(Cursor::new(gltf_bytes)))?;

    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("{} declares a binary chunk but has none", file_name))?;
                buffer_data.push(blob.to_vec());
            }
            gltf::buffer::Source::Uri(uri) => {
                buffer_data.push(load_binary(uri).await?);
            }
        }
    }
    build_scene(&gltf, &buffer_data)
}

/// Parses a self-contained GLB (all buffers embedded) from memory.
pub fn parse_scene_gltf(bytes: &[u8]) -> anyhow::Result<SceneAsset> {
    let gltf = gltf::Gltf::from_slice(bytes)?;
    let mut buffer_data = Vec::new();
    for buffer in gltf.buffers() {
        match buffer.source() {
            gltf::buffer::Source::Bin => {
                let blob = gltf
                    .blob
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("binary chunk missing"))?;
                buffer_data.push(blob.to_vec());
            }
            gltf::buffer::Source::Uri(uri) => {
                anyhow::bail!("external buffer {} cannot be resolved from memory", uri);
            }
        }
    }
    build_scene(&gltf, &buffer_data)
}

fn build_scene(gltf: &gltf::Gltf, buffer_data: &[Vec<u8>]) -> anyhow::Result<SceneAsset> {
    let scene = gltf
        .default_scene()
        .or_else(|| gltf.scenes().next())
        .ok_or_else(|| anyhow::anyhow!("asset contains no scene"))?;

    let joints: HashSet<usize> = gltf
        .skins()
        .flat_map(|skin| skin.joints().map(|joint| joint.index()).collect::<Vec<_>>())
        .collect();

    let mut graph = SceneGraph::new();
    let mut cameras: Vec<EmbeddedCamera> = Vec::new();
    let mut handles = HashMap::new();
    let mut ancestors = Vec::new();
    for node in scene.nodes() {
        to_scene_node(
            node,
            None,
            &mut graph,
            &joints,
            &mut cameras,
            &mut handles,
            &mut ancestors,
        )?;
    }

    let mut clips = Vec::new();
    for animation in gltf.animations() {
        let name = animation
            .name()
            .map(str::to_string)
            .unwrap_or_else(|| format!("animation_{}", animation.index()));
        let mut channels = Vec::new();
        for channel in animation.channels() {
            let target = channel.target().node().index();
            let Some(&target) = handles.get(&target) else {
                log::warn!(
                    "Channel {} of {} targets a node outside the scene",
                    channel.index(),
                    name
                );
                continue;
            };
            let reader = channel.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));
            let timestamps: Vec<f32> = match reader.read_inputs() {
                Some(times) => times.collect(),
                None => {
                    log::warn!("No timestamps found in channel {} of {}", channel.index(), name);
                    continue;
                }
            };
            let keyframes = match reader.read_outputs() {
                Some(gltf::animation::util::ReadOutputs::Translations(translations)) => {
                    Keyframes::Translation(translations.map(Into::into).collect())
                }
                Some(gltf::animation::util::ReadOutputs::Rotations(rotations)) => {
                    Keyframes::Rotation(
                        rotations
                            .into_f32()
                            .map(|[x, y, z, w]| cgmath::Quaternion::new(w, x, y, z))
                            .collect(),
                    )
                }
                Some(gltf::animation::util::ReadOutputs::Scales(scales)) => {
                    Keyframes::Scale(scales.map(Into::into).collect())
                }
                // TODO: implement morphing
                Some(gltf::animation::util::ReadOutputs::MorphTargetWeights(_)) => {
                    log::warn!("Morph target animation in {} is not supported", name);
                    Keyframes::Other
                }
                None => {
                    log::warn!("No keyframes found in channel {} of {}", channel.index(), name);
                    Keyframes::Other
                }
            };
            channels.push(Channel {
                target,
                keyframes,
                timestamps,
                interpolation: channel.sampler().interpolation().into(),
            });
        }
        log::debug!("Found animation: {} ({} channels)", name, channels.len());
        clips.push(AnimationClip { name, channels });
    }

    Ok(SceneAsset::new(graph, clips, cameras))
}
