//! Session controller: glue between transport, loaders, and the engine.
//!
//! One `update` call per scheduling tick: take at most one pending command,
//! load its files, run the replay state machine one step, and route a
//! finished trial's accuracy to the remote peer and the operator display.
//! Every error is converted to a display message; none stops the loop.

use std::sync::mpsc::{Receiver, TryRecvError};

use crate::control::{ControlChannel, InboundEvent, ReplayCommand};
use crate::error::ReplayError;
use crate::motion;
use crate::probe::TargetObject;
use crate::recording;
use crate::replay::ReplayEngine;
use crate::rig::PoseRig;

/// Operator-facing status surface.
///
/// The original system wrote to an on-screen panel; headless deployments
/// log instead. Hosts can route these anywhere.
pub trait DisplaySink {
    fn show_result(&mut self, message: &str);
    fn show_error(&mut self, message: &str);
}

/// Default display: structured log output.
#[derive(Debug, Default)]
pub struct LogDisplay;

impl DisplaySink for LogDisplay {
    fn show_result(&mut self, message: &str) {
        log::info!("{message}");
    }

    fn show_error(&mut self, message: &str) {
        log::error!("{message}");
    }
}

/// Orchestrates one replay session around a rig.
pub struct SessionController<D: DisplaySink> {
    engine: ReplayEngine,
    channel: ControlChannel,
    inbox: Receiver<InboundEvent>,
    display: D,
    target: TargetObject,
}

impl<D: DisplaySink> SessionController<D> {
    pub fn new(
        engine: ReplayEngine,
        channel: ControlChannel,
        inbox: Receiver<InboundEvent>,
        display: D,
        target: TargetObject,
    ) -> Self {
        Self {
            engine,
            channel,
            inbox,
            display,
            target,
        }
    }

    /// Send a free-text operator message to the remote peer.
    pub fn send_message(&mut self, text: &str) {
        if let Err(err) = self.channel.send(text) {
            self.report_error(&err);
        }
    }

    /// Whether a trial is currently in progress.
    pub fn is_replaying(&self) -> bool {
        self.engine.is_replaying()
    }

    /// One scheduling tick: command intake, then one engine step.
    pub fn update<R: PoseRig + ?Sized>(&mut self, rig: &mut R) {
        match self.inbox.try_recv() {
            Ok(Ok(command)) => self.handle_command(command, rig),
            Ok(Err(err)) => self.report_error(&err),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => {}
        }

        if let Some(result) = self.engine.tick(rig, &mut self.target) {
            let accuracy = result.accuracy_text();
            if let Err(err) = self.channel.send(&accuracy) {
                self.report_error(&err);
            }
            self.display
                .show_result(&format!("The accuracy for this gesture is: {accuracy}"));
        }
    }

    /// Load both trial files and start the engine; reject commands that
    /// arrive while a trial is still running.
    fn handle_command<R: PoseRig + ?Sized>(&mut self, command: ReplayCommand, rig: &mut R) {
        if self.engine.is_replaying() {
            self.report_error(&ReplayError::TrialInProgress);
            return;
        }

        log::info!(
            "replay command: metadata '{}', motion '{}'",
            command.metadata_path,
            command.motion_path
        );

        let outcome = recording::load(&command.metadata_path).and_then(|recording| {
            let frames = motion::load(&command.motion_path, rig.muscle_count())?;
            self.engine.start(frames, Some(recording))
        });

        if let Err(err) = outcome {
            self.report_error(&err);
        }
    }

    fn report_error(&mut self, err: &ReplayError) {
        log::warn!("trial attempt failed: {err}");
        self.display.show_error(&err.to_string());
    }
}
