use std::process::Command;

use serde::Deserialize;
use thiserror::Error;

use crate::time::IdealTime;

/// A failed probe is localized to one item: the caller keeps the item's
/// placeholder span and moves on.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("could not run ffprobe: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("unreadable ffprobe output: {0}")]
    Output(#[from] serde_json::Error),
    #[error("no duration reported for '{0}'")]
    NoDuration(String),
}

#[derive(Debug, Deserialize)]
struct ProbeInfo {
    format: FormatInfo,
}

#[derive(Debug, Deserialize)]
struct FormatInfo {
    duration: Option<String>,
}

/// True playable duration of a media file, via ffprobe.
pub fn media_duration(payload: &str) -> Result<IdealTime, ProbeError> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "quiet",
            "-print_format",
            "json",
            "-show_format",
            payload,
        ])
        .output()?;
    let info: ProbeInfo = serde_json::from_slice(&output.stdout)?;

    let seconds: f64 = info
        .format
        .duration
        .as_deref()
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| ProbeError::NoDuration(payload.to_string()))?;
    Ok(IdealTime::MICROSECOND.times((seconds * 1_000_000.0).round() as i64))
}
