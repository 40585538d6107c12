//! Motion file loading.
//!
//! A motion file is `;`-delimited text: one line per frame, the first line
//! being a header that is never played back. Every field except the
//! trailing one is a muscle value for that frame. The matrix width is the
//! rig's parameter count, not the file's field count; frames with fewer
//! fields leave the remaining parameters at zero.

use std::fs;
use std::path::Path;

use crate::error::ReplayError;

/// File extension appended to motion paths that lack one.
pub const MOTION_EXTENSION: &str = ".csv";

/// Field delimiter inside a motion file line.
const FIELD_DELIMITER: char = ';';

/// A frame-indexed table of muscle values, one row per playable frame.
#[derive(Debug, Clone)]
pub struct FrameMatrix {
    frames: Vec<Vec<f32>>,
    muscle_count: usize,
}

impl FrameMatrix {
    /// Number of playable frames (header excluded).
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Width of every row.
    pub fn muscle_count(&self) -> usize {
        self.muscle_count
    }

    /// Muscle values for one frame.
    ///
    /// # Panics
    /// Panics if `frame` is out of range; the replay engine only indexes
    /// frames below `frame_count()`.
    pub fn row(&self, frame: usize) -> &[f32] {
        &self.frames[frame]
    }

    /// Build a matrix directly from rows; rows are padded or truncated to
    /// `muscle_count` columns.
    #[cfg(test)]
    pub(crate) fn from_rows(rows: Vec<Vec<f32>>, muscle_count: usize) -> Self {
        let frames = rows
            .into_iter()
            .map(|mut row| {
                row.resize(muscle_count, 0.0);
                row
            })
            .collect();
        Self {
            frames,
            muscle_count,
        }
    }
}

/// Append the motion extension when the path lacks it.
pub fn normalize_motion_path(path: &str) -> String {
    if path.ends_with(MOTION_EXTENSION) {
        path.to_string()
    } else {
        format!("{path}{MOTION_EXTENSION}")
    }
}

/// Load a motion file into a [`FrameMatrix`] with `muscle_count` columns.
///
/// Fails with [`ReplayError::MotionLoad`] if the file is unreadable, a
/// frame carries more muscle fields than the rig has parameters, or a
/// muscle field is not numeric. On failure no partial matrix is returned.
pub fn load(path: &str, muscle_count: usize) -> Result<FrameMatrix, ReplayError> {
    let resolved = normalize_motion_path(path);

    let contents = fs::read_to_string(Path::new(&resolved))
        .map_err(|err| ReplayError::motion_load(&resolved, err.to_string()))?;

    let mut frames = Vec::new();
    for (line_index, line) in contents.lines().enumerate() {
        // Line 0 is the header row; it is never stored.
        if line_index == 0 {
            continue;
        }

        let fields: Vec<&str> = line.split(FIELD_DELIMITER).collect();
        let value_count = fields.len().saturating_sub(1);
        if value_count > muscle_count {
            return Err(ReplayError::motion_load(
                &resolved,
                format!(
                    "line {}: {} muscle fields exceed the rig's {} parameters",
                    line_index + 1,
                    value_count,
                    muscle_count
                ),
            ));
        }

        let mut row = vec![0.0f32; muscle_count];
        for (field_index, field) in fields[..value_count].iter().enumerate() {
            row[field_index] = field.trim().parse::<f32>().map_err(|_| {
                ReplayError::motion_load(
                    &resolved,
                    format!(
                        "line {}: field {} is not a number: '{}'",
                        line_index + 1,
                        field_index + 1,
                        field
                    ),
                )
            })?;
        }
        frames.push(row);
    }

    Ok(FrameMatrix {
        frames,
        muscle_count,
    })
}
