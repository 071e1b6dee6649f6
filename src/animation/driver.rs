//! Scroll-synchronised playback of the body and camera tracks.
//!
//! The driver is a two-state machine. While scroll progress is below one it
//! *scrubs*: both tracks are paused and their cursors are forced to
//! `progress * SCRUB_DURATION` every frame. Once progress reaches one it
//! *loops*: the camera stays where the scrub left it and the body cycles
//! slowly through `[LOOP_START, LOOP_END)` on the wall clock.

use instant::Duration;

use crate::{
    animation::track::LoopMode,
    data_structures::scene_graph::{SceneAsset, TrackHandle},
};

/// Track time reached at progress 1 in scrub mode.
pub const SCRUB_DURATION: f32 = 2.9;
pub const LOOP_START: f32 = 3.0;
pub const LOOP_END: f32 = 4.0;
pub const LOOP_DURATION: f32 = LOOP_END - LOOP_START;
/// The clock (in milliseconds) is divided by this before wrapping, one loop cycle takes 4 s.
pub const LOOP_SLOWDOWN: f64 = 4000.0;

pub const BODY_TRACK: &str = "Action";
pub const CAMERA_TRACK: &str = "CameraAction";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverMode {
    Scrub,
    Loop,
}

impl DriverMode {
    pub fn for_progress(progress: f32) -> Self {
        if progress >= 1.0 {
            DriverMode::Loop
        } else {
            DriverMode::Scrub
        }
    }
}

/// Body track time in loop mode for a given clock reading.
pub fn loop_time(clock: Duration) -> f32 {
    let millis = clock.as_secs_f64() * 1000.0;
    let phase = (millis / LOOP_SLOWDOWN).rem_euclid(LOOP_DURATION as f64);
    let time = (phase + LOOP_START as f64) as f32;
    // f32 rounding can land exactly on the end of the window; that is the start of the next cycle
    if time >= LOOP_END { LOOP_START } else { time }
}

#[derive(Debug)]
pub struct AnimationDriver {
    mode: DriverMode,
    progress: f32,
    body: Option<TrackHandle>,
    camera: Option<TrackHandle>,
}

impl AnimationDriver {
    pub fn new() -> Self {
        Self {
            mode: DriverMode::Scrub,
            progress: 0.0,
            body: None,
            camera: None,
        }
    }

    pub fn mode(&self) -> DriverMode {
        self.mode
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn is_bound(&self) -> bool {
        self.body.is_some() && self.camera.is_some()
    }

    /// Resolve both tracks in a freshly mounted asset and prime them for manual scrubbing.
    pub fn bind(&mut self, asset: &mut SceneAsset) {
        self.body = asset.index().track(BODY_TRACK);
        self.camera = asset.index().track(CAMERA_TRACK);
        for (name, handle) in [(BODY_TRACK, self.body), (CAMERA_TRACK, self.camera)] {
            match handle.and_then(|h| asset.track_mut(h)) {
                Some(track) => {
                    track
                        .reset()
                        .play()
                        .set_paused(true)
                        .set_enabled(true)
                        .set_loop(LoopMode::Once)
                        .set_clamp_when_finished(true)
                        .set_time(0.0);
                }
                None => log::warn!("Animation track '{}' is missing, scroll scrubbing is off", name),
            }
        }
    }

    pub fn unbind(&mut self) {
        self.body = None;
        self.camera = None;
    }

    /// Feed a new scroll progress value. Returns the new mode if this caused a transition.
    pub fn observe_progress(&mut self, progress: f32) -> Option<DriverMode> {
        self.progress = progress;
        let mode = DriverMode::for_progress(progress);
        if mode == self.mode {
            return None;
        }
        log::debug!("Animation driver {:?} -> {:?} at progress {}", self.mode, mode, progress);
        self.mode = mode;
        Some(mode)
    }

    /// Per-frame update: move both cursors and pose the scene.
    ///
    /// `clock` is the monotonic frame clock. Without a scene or without both tracks this is a
    /// no-op.
    pub fn update(&mut self, asset: Option<&mut SceneAsset>, clock: Duration) {
        let (Some(asset), Some(body), Some(camera)) = (asset, self.body, self.camera) else {
            return;
        };
        if asset.track(body).is_none() || asset.track(camera).is_none() {
            return;
        }
        match self.mode {
            DriverMode::Scrub => {
                let time = self.progress * SCRUB_DURATION;
                if let Some(track) = asset.track_mut(body) {
                    track
                        .set_paused(true)
                        .set_loop(LoopMode::Once)
                        .set_clamp_when_finished(true)
                        .set_time(time);
                }
                if let Some(track) = asset.track_mut(camera) {
                    track.set_time(time);
                }
            }
            DriverMode::Loop => {
                if let Some(track) = asset.track_mut(body) {
                    track.set_time(loop_time(clock));
                }
            }
        }
        asset.apply_track(camera);
        asset.apply_track(body);
    }
}

impl Default for AnimationDriver {
    fn default() -> Self {
        Self::new()
    }
}
