//! End-to-end replay scenarios: files on disk, UDP command in, accuracy out.

use std::io::Write;
use std::net::UdpSocket;
use std::time::{Duration, Instant};

use glam::Vec3;

use gesture_replay::control::{parse_command, ControlChannel};
use gesture_replay::headless::HeadlessRig;
use gesture_replay::motion;
use gesture_replay::probe::TargetObject;
use gesture_replay::recording;
use gesture_replay::replay::{ReplayConfig, ReplayEngine};
use gesture_replay::rig::PoseRig;
use gesture_replay::session::{LogDisplay, SessionController};

const MUSCLES: usize = 3;

/// Header plus three data rows; the trailing field of each row is ignored.
const MOTION_CONTENTS: &str = "h1;h2;h3\n0.1;0.2;0.3;ignored\n0.1;0.2;0.3;ignored\n0.1;0.2;0.3;ignored\n";

/// Write `trial.json` and `trial_motion.csv` into `dir`, returning both
/// paths *without* their extensions.
fn write_trial_files(dir: &tempfile::TempDir, target_to_human: Vec3) -> (String, String) {
    let meta = dir.path().join("trial");
    std::fs::write(
        meta.with_extension("json"),
        format!(
            r#"{{"humanRot": 0.0, "targetToHuman": {{"x": {}, "y": {}, "z": {}}}}}"#,
            target_to_human.x, target_to_human.y, target_to_human.z
        ),
    )
    .unwrap();

    let motion = dir.path().join("trial_motion");
    let mut file = std::fs::File::create(motion.with_extension("csv")).unwrap();
    file.write_all(MOTION_CONTENTS.as_bytes()).unwrap();

    (
        meta.to_str().unwrap().to_string(),
        motion.to_str().unwrap().to_string(),
    )
}

fn run_to_completion(engine: &mut ReplayEngine, rig: &mut HeadlessRig, target: &mut TargetObject) -> gesture_replay::replay::TrialResult {
    let mut ticks = 0;
    loop {
        ticks += 1;
        assert!(ticks < 1000, "trial never completed");
        if let Some(result) = engine.tick(rig, target) {
            return result;
        }
    }
}

#[test]
fn motion_file_yields_one_frame_per_data_line() {
    let dir = tempfile::tempdir().unwrap();
    let (_, motion_path) = write_trial_files(&dir, Vec3::ZERO);

    let matrix = motion::load(&motion_path, MUSCLES).unwrap();
    assert_eq!(matrix.frame_count(), 3);
    assert_eq!(matrix.row(0), &[0.1, 0.2, 0.3]);
}

#[test]
fn trial_with_no_intersections_reports_zero() {
    let dir = tempfile::tempdir().unwrap();
    // Target ends up 50 meters underground: no skeletal ray reaches it.
    let (meta_path, motion_path) = write_trial_files(&dir, Vec3::new(0.0, -5.0, 0.0));

    let mut rig = HeadlessRig::new(MUSCLES);
    let mut engine = ReplayEngine::new(&rig, ReplayConfig { sequence_length: 3 });
    let mut target = TargetObject::new(Vec3::ZERO, 1.0);

    let rec = recording::load(&meta_path).unwrap();
    let frames = motion::load(&motion_path, rig.muscle_count()).unwrap();
    engine.start(frames, Some(rec)).unwrap();

    let result = run_to_completion(&mut engine, &mut rig, &mut target);
    assert_eq!(result.accuracy_text(), "0");
}

#[test]
fn trial_with_all_intersections_reports_one() {
    let dir = tempfile::tempdir().unwrap();
    // Target ends up straight ahead of the head at its height.
    let (meta_path, motion_path) = write_trial_files(&dir, Vec3::new(0.0, 0.165, 0.4));

    let mut rig = HeadlessRig::new(MUSCLES);
    let mut engine = ReplayEngine::new(&rig, ReplayConfig { sequence_length: 3 });
    let mut target = TargetObject::new(Vec3::ZERO, 1.0);

    let rec = recording::load(&meta_path).unwrap();
    let frames = motion::load(&motion_path, rig.muscle_count()).unwrap();
    engine.start(frames, Some(rec)).unwrap();

    let result = run_to_completion(&mut engine, &mut rig, &mut target);
    assert_eq!(result.valid_frames, 3);
    assert_eq!(result.accuracy_text(), "1");
}

#[test]
fn command_paths_resolve_with_appended_extensions() {
    let command = parse_command(b"meta meta_motion").unwrap();
    assert_eq!(
        recording::normalize_metadata_path(&command.metadata_path),
        "meta.json"
    );
    assert_eq!(
        motion::normalize_motion_path(&command.motion_path),
        "meta_motion.csv"
    );
}

#[test]
fn nonexistent_motion_path_leaves_engine_idle() {
    let rig = HeadlessRig::new(MUSCLES);
    let mut engine = ReplayEngine::new(&rig, ReplayConfig { sequence_length: 3 });

    // The load itself fails, so nothing ever reaches the engine and the
    // replaying flag never flips.
    assert!(motion::load("/nonexistent/trial_motion", MUSCLES).is_err());
    assert!(!engine.is_replaying());

    // A header-only file loads as zero frames, which the engine refuses.
    let dir = tempfile::tempdir().unwrap();
    let empty = dir.path().join("empty_motion.csv");
    std::fs::write(&empty, "h1;h2;h3\n").unwrap();
    let frames = motion::load(empty.to_str().unwrap(), MUSCLES).unwrap();
    assert_eq!(frames.frame_count(), 0);
    assert!(engine.start(frames, None).is_err());
    assert!(!engine.is_replaying());
}

#[test]
fn udp_round_trip_delivers_accuracy_string() {
    let dir = tempfile::tempdir().unwrap();
    let (meta_path, motion_path) = write_trial_files(&dir, Vec3::new(0.0, 0.165, 0.4));

    let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
    let channel = ControlChannel::bind(
        "127.0.0.1:0".parse().unwrap(),
        peer.local_addr().unwrap(),
    )
    .unwrap();
    let engine_addr = channel.local_addr().unwrap();
    let (listener, inbox) = channel.spawn_listener().unwrap();

    let mut rig = HeadlessRig::new(MUSCLES);
    let engine = ReplayEngine::new(&rig, ReplayConfig { sequence_length: 3 });
    let target = TargetObject::new(Vec3::ZERO, 1.0);
    let mut controller = SessionController::new(engine, channel, inbox, LogDisplay, target);

    // Paths travel without extensions, as the remote peer sends them.
    peer.send_to(
        format!("{meta_path} {motion_path}").as_bytes(),
        engine_addr,
    )
    .unwrap();

    peer.set_read_timeout(Some(Duration::from_millis(20))).unwrap();
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut buf = [0u8; 64];
    let reply = loop {
        controller.update(&mut rig);
        match peer.recv_from(&mut buf) {
            Ok((len, _)) => break String::from_utf8(buf[..len].to_vec()).unwrap(),
            Err(_) if Instant::now() < deadline => continue,
            Err(err) => panic!("no accuracy datagram arrived: {err}"),
        }
    };

    assert_eq!(reply, "1");
    listener.shutdown();
}

#[test]
fn malformed_datagram_never_starts_a_trial() {
    let peer = UdpSocket::bind("127.0.0.1:0").unwrap();
    let channel = ControlChannel::bind(
        "127.0.0.1:0".parse().unwrap(),
        peer.local_addr().unwrap(),
    )
    .unwrap();
    let engine_addr = channel.local_addr().unwrap();
    let (listener, inbox) = channel.spawn_listener().unwrap();

    let mut rig = HeadlessRig::new(MUSCLES);
    let engine = ReplayEngine::new(&rig, ReplayConfig { sequence_length: 3 });
    let target = TargetObject::new(Vec3::ZERO, 1.0);
    let mut controller = SessionController::new(engine, channel, inbox, LogDisplay, target);

    peer.send_to(b"meta motion extra_token", engine_addr).unwrap();

    // Give the listener ample time to deliver while driving the tick loop;
    // the protocol error is reported and no trial ever starts.
    for _ in 0..30 {
        controller.update(&mut rig);
        std::thread::sleep(Duration::from_millis(10));
    }

    assert!(!controller.is_replaying());
    listener.shutdown();
}
