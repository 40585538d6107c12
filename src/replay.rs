//! The replay engine: a frame-synchronized pose-application state machine.
//!
//! One trial replays a loaded motion table from frame 0 to completion,
//! applying one row of muscle values per scheduling tick and asking the
//! target probe whether the resulting pose refers to the target. When the
//! last frame has played, the avatar is restored to its startup state and
//! the trial yields a [`TrialResult`].
//!
//! Exactly one trial can be in progress at a time; starting another while
//! one is active is rejected.

use glam::{Quat, Vec3};

use crate::error::ReplayError;
use crate::motion::FrameMatrix;
use crate::probe::{self, TargetObject};
use crate::recording::Recording;
use crate::rig::{Pose, PoseRig, RigSnapshot};

/// World-space scale factor applied to the recorded target-to-human offset.
/// A unit-conversion contract with the recording pipeline, not a tunable.
const TARGET_DISTANCE_SCALE: f32 = 10.0;

/// Engine configuration.
#[derive(Debug, Clone, Copy)]
pub struct ReplayConfig {
    /// Nominal trial length in frames. The accuracy denominator is always
    /// this value, never the loaded frame count: trials shorter than the
    /// nominal length score below 1.0 by design.
    pub sequence_length: usize,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            sequence_length: 100,
        }
    }
}

/// Outcome of one completed trial.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialResult {
    /// Frames on which the probe classified the pose as target-referring.
    pub valid_frames: usize,
    /// Frames actually played back.
    pub frame_count: usize,
    /// `valid_frames / sequence_length`.
    pub accuracy: f32,
}

impl TrialResult {
    /// The accuracy as the bare decimal string sent over the wire
    /// (`"0"`, `"1"`, `"0.25"`, ...).
    pub fn accuracy_text(&self) -> String {
        format!("{}", self.accuracy)
    }
}

/// The frame-stepping trial state machine.
pub struct ReplayEngine {
    config: ReplayConfig,
    /// Rig state captured once at engine construction, restored after every
    /// trial.
    default_state: RigSnapshot,
    /// Body placement captured from the rig, re-captured during each
    /// trial's setup. World-space.
    initial_pos: Vec3,
    initial_rot: Quat,
    frames: Option<FrameMatrix>,
    recording: Option<Recording>,
    current_frame: usize,
    valid_frames: usize,
    replaying: bool,
    /// Baseline body placement (root-local) that every frame of the current
    /// trial is applied against; only the muscle vector varies per frame.
    trial_pose: Pose,
}

impl ReplayEngine {
    /// Create an engine bound to a rig's startup state.
    ///
    /// The rig's current pose and root transform become the default
    /// snapshot that [`ReplayEngine::reset_to_default`] restores.
    pub fn new<R: PoseRig + ?Sized>(rig: &R, config: ReplayConfig) -> Self {
        let default_state = rig.snapshot();
        let pose = rig.pose();
        let muscle_count = rig.muscle_count();
        Self {
            config,
            initial_pos: pose.body_position,
            initial_rot: pose.body_rotation,
            default_state,
            frames: None,
            recording: None,
            current_frame: 0,
            valid_frames: 0,
            replaying: false,
            trial_pose: Pose::rest(muscle_count),
        }
    }

    /// Whether a trial is currently in progress.
    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    /// Valid-frame count of the trial in progress.
    pub fn valid_frames(&self) -> usize {
        self.valid_frames
    }

    /// Begin a trial over `frames`, optionally placed by `recording`.
    ///
    /// Fails with [`ReplayError::TrialInProgress`] while a trial is active
    /// and with [`ReplayError::EmptyMotion`] for a zero-frame table; in
    /// both cases the engine state is untouched and no replay starts.
    pub fn start(
        &mut self,
        frames: FrameMatrix,
        recording: Option<Recording>,
    ) -> Result<(), ReplayError> {
        if self.replaying {
            return Err(ReplayError::TrialInProgress);
        }
        if frames.frame_count() == 0 {
            return Err(ReplayError::EmptyMotion);
        }

        log::debug!("starting trial over {} frames", frames.frame_count());
        self.frames = Some(frames);
        self.recording = recording;
        self.current_frame = 0;
        self.valid_frames = 0;
        self.replaying = true;
        Ok(())
    }

    /// Advance the trial by exactly one frame.
    ///
    /// Returns `Some(result)` on the terminal tick, `None` otherwise
    /// (including when no trial is in progress). Call once per fixed
    /// scheduling tick.
    pub fn tick<R: PoseRig + ?Sized>(
        &mut self,
        rig: &mut R,
        target: &mut TargetObject,
    ) -> Option<TrialResult> {
        if !self.replaying {
            return None;
        }

        if self.current_frame == 0 {
            self.begin_trial(rig, target);
        }

        let frame_count;
        {
            let frames = self.frames.as_ref()?;
            frame_count = frames.frame_count();
            let row = frames.row(self.current_frame);
            self.trial_pose.muscles.clear();
            self.trial_pose.muscles.extend_from_slice(row);
        }

        rig.set_pose(&self.trial_pose);
        if probe::refers_to_target(rig, target) {
            self.valid_frames += 1;
        }
        self.current_frame += 1;

        if self.current_frame == frame_count {
            Some(self.finish_trial(rig, frame_count))
        } else {
            None
        }
    }

    /// Apply a single muscle vector against the captured baseline and
    /// return the probe verdict, without entering the trial state machine.
    pub fn apply_single_frame<R: PoseRig + ?Sized>(
        &mut self,
        rig: &mut R,
        muscles: &[f32],
        target: &TargetObject,
    ) -> bool {
        let mut root = rig.root_transform();
        root.position = Vec3::ZERO;
        rig.set_root_transform(root);
        let local = root.inverse_transform_point(self.initial_pos);

        self.trial_pose.body_position = local;
        self.trial_pose.body_rotation = Quat::IDENTITY;
        self.trial_pose.muscles.clear();
        self.trial_pose.muscles.extend_from_slice(muscles);
        rig.set_pose(&self.trial_pose);

        probe::refers_to_target(rig, target)
    }

    /// Restore the rig to the snapshot captured at engine construction.
    /// Safe to call repeatedly; the result is identical either way.
    pub fn reset_to_default<R: PoseRig + ?Sized>(&self, rig: &mut R) {
        rig.restore(&self.default_state);
    }

    /// First-tick setup: move the avatar and target into the recorded
    /// spatial relationship and capture the local-frame baseline.
    fn begin_trial<R: PoseRig + ?Sized>(&mut self, rig: &mut R, target: &mut TargetObject) {
        // Reset the body to a vertical-only offset: keep height, zero
        // horizontal drift, identity rotation.
        let mut pose = rig.pose();
        pose.body_position = Vec3::new(0.0, self.initial_pos.y, 0.0);
        pose.body_rotation = Quat::IDENTITY;
        rig.set_pose(&pose);

        if let Some(recording) = &self.recording {
            target.position = Vec3::from(recording.target_to_human) * TARGET_DISTANCE_SCALE;
            let mut root = rig.root_transform();
            root.rotation = Quat::from_rotation_y(recording.human_rot * std::f32::consts::TAU);
            rig.set_root_transform(root);
        }

        // Reposition, then re-read: the rig reports body placement after
        // its own solver settles, so the baseline must come from this
        // second read, not from the values written above.
        let settled = rig.pose();
        self.initial_pos = settled.body_position;
        self.initial_rot = settled.body_rotation;
        log::trace!(
            "trial baseline: position {:?}, rotation {:?}",
            self.initial_pos,
            self.initial_rot
        );

        // Zero the world position and express the captured placement in
        // the avatar's local frame; frames are applied against this.
        let mut root = rig.root_transform();
        root.position = Vec3::ZERO;
        rig.set_root_transform(root);
        let local = root.inverse_transform_point(self.initial_pos);

        self.trial_pose.body_position = local;
        self.trial_pose.body_rotation = Quat::IDENTITY;
    }

    /// Terminal tick: clear trial state, restore the rig, score the trial.
    fn finish_trial<R: PoseRig + ?Sized>(&mut self, rig: &mut R, frame_count: usize) -> TrialResult {
        self.current_frame = 0;
        self.frames = None;
        self.replaying = false;

        self.reset_to_default(rig);

        let accuracy = self.valid_frames as f32 / self.config.sequence_length as f32;
        let result = TrialResult {
            valid_frames: self.valid_frames,
            frame_count,
            accuracy,
        };
        log::info!(
            "trial complete: {}/{} valid frames, accuracy {}",
            result.valid_frames,
            result.frame_count,
            result.accuracy
        );

        self.valid_frames = 0;
        self.recording = None;
        result
    }
}
