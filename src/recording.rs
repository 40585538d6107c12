//! Recording metadata: the per-trial descriptor parsed from JSON.
//!
//! One descriptor accompanies each recorded gesture and carries the scene
//! identity, the target object, and the spatial relationship between the
//! human and the target at recording time. It is read-only for the
//! duration of one replay and dropped when the trial completes.

use std::fs;
use std::path::Path;

use glam::Vec3;
use serde::Deserialize;

use crate::error::ReplayError;

/// File extension appended to metadata paths that lack one.
pub const METADATA_EXTENSION: &str = ".json";

/// A 3-component vector as serialized in the descriptor.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct Vec3Data {
    #[serde(default)]
    pub x: f32,
    #[serde(default)]
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl From<Vec3Data> for Vec3 {
    fn from(v: Vec3Data) -> Self {
        Vec3::new(v.x, v.y, v.z)
    }
}

/// Descriptor of one recorded gesture trial.
///
/// Every field is optional on the wire; missing fields take the defaults
/// below. `human_rot` is a normalized turn fraction (0..1 for 0..360
/// degrees); `target_to_human` is expressed in the human's reference frame
/// and scaled by a fixed factor of 10 when applied to world space.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Recording {
    pub instruction: String,

    pub scene_type: String,
    pub scene_num: i32,
    pub scene_name: String,

    pub target_type: String,
    pub target_sim_obj_type: String,
    #[serde(rename = "targetID")]
    pub target_id: String,

    pub human_pos: Vec3Data,
    pub human_rot: f32,
    pub target_pos: Vec3Data,
    pub target_to_human: Vec3Data,

    pub image: String,
    pub motion: String,
    pub audio: String,
}

impl Default for Recording {
    fn default() -> Self {
        Self {
            instruction: String::new(),
            scene_type: "Kitchen".to_string(),
            scene_num: 0,
            scene_name: "FloorPlan1_physics".to_string(),
            target_type: String::new(),
            target_sim_obj_type: String::new(),
            target_id: String::new(),
            human_pos: Vec3Data::default(),
            human_rot: 0.0,
            target_pos: Vec3Data::default(),
            target_to_human: Vec3Data::default(),
            image: "images/".to_string(),
            motion: "motions/".to_string(),
            audio: "audios/".to_string(),
        }
    }
}

/// Append the metadata extension when the path lacks it.
pub fn normalize_metadata_path(path: &str) -> String {
    if path.ends_with(METADATA_EXTENSION) {
        path.to_string()
    } else {
        format!("{path}{METADATA_EXTENSION}")
    }
}

/// Load and parse a trial descriptor.
pub fn load(path: &str) -> Result<Recording, ReplayError> {
    let resolved = normalize_metadata_path(path);

    let contents = fs::read_to_string(Path::new(&resolved))
        .map_err(|err| ReplayError::metadata_parse(&resolved, err.to_string()))?;

    serde_json::from_str(&contents)
        .map_err(|err| ReplayError::metadata_parse(&resolved, err.to_string()))
}
