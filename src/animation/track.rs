use crate::{
    data_structures::scene_graph::{AnimationClip, SceneGraph},
    resources::animation::Sample,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopMode {
    Once,
    Repeat,
}

/// Playback state of one animation clip.
///
/// The time cursor never leaves `[0, duration]`: `Once` clamps, `Repeat` wraps.
#[derive(Clone, Debug)]
pub struct AnimationTrack {
    clip: AnimationClip,
    duration: f32,
    time: f32,
    paused: bool,
    enabled: bool,
    loop_mode: LoopMode,
    clamp_when_finished: bool,
    finished: bool,
}

impl AnimationTrack {
    pub fn new(clip: AnimationClip) -> Self {
        let duration = clip.duration();
        Self {
            clip,
            duration,
            time: 0.0,
            paused: true,
            enabled: true,
            loop_mode: LoopMode::Repeat,
            clamp_when_finished: false,
            finished: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.clip.name
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.loop_mode
    }

    pub fn clamp_when_finished(&self) -> bool {
        self.clamp_when_finished
    }

    /// Rewind to the start and clear the finished state.
    pub fn reset(&mut self) -> &mut Self {
        self.time = 0.0;
        self.finished = false;
        self.enabled = true;
        self
    }

    pub fn play(&mut self) -> &mut Self {
        self.paused = false;
        self.enabled = true;
        self
    }

    pub fn set_paused(&mut self, paused: bool) -> &mut Self {
        self.paused = paused;
        self
    }

    pub fn set_enabled(&mut self, enabled: bool) -> &mut Self {
        self.enabled = enabled;
        self
    }

    pub fn set_loop(&mut self, loop_mode: LoopMode) -> &mut Self {
        self.loop_mode = loop_mode;
        self
    }

    pub fn set_clamp_when_finished(&mut self, clamp: bool) -> &mut Self {
        self.clamp_when_finished = clamp;
        self
    }

    /// Move the cursor to `time`, folded into the play range according to the loop mode.
    pub fn set_time(&mut self, time: f32) -> &mut Self {
        let time = if time.is_finite() { time } else { 0.0 };
        self.time = match self.loop_mode {
            LoopMode::Once => {
                self.finished = time >= self.duration;
                time.clamp(0.0, self.duration)
            }
            LoopMode::Repeat if self.duration > 0.0 => time.rem_euclid(self.duration),
            LoopMode::Repeat => 0.0,
        };
        self
    }

    /// Advance by `dt` seconds unless paused.
    pub fn advance(&mut self, dt: f32) -> &mut Self {
        if !self.paused && self.enabled {
            let time = self.time + dt;
            self.set_time(time);
            if self.finished && !self.clamp_when_finished {
                self.enabled = false;
            }
        }
        self
    }

    /// Write the pose at the current time into the targeted nodes of `graph`.
    ///
    /// A disabled track leaves the graph untouched.
    pub fn apply(&self, graph: &mut SceneGraph) {
        if !self.enabled {
            return;
        }
        for channel in &self.clip.channels {
            let sample =
                channel
                    .keyframes
                    .sample(&channel.timestamps, channel.interpolation, self.time);
            let Some(node) = graph.node_mut(channel.target) else {
                continue;
            };
            match sample {
                Some(Sample::Translation(position)) => node.local.position = position,
                Some(Sample::Rotation(rotation)) => node.local.rotation = rotation,
                Some(Sample::Scale(scale)) => node.local.scale = scale,
                None => {}
            }
        }
    }
}
