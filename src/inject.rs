use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::config::get_config;
use crate::probe::ProbeError;
use crate::schedule::{Item, Schedule};
use crate::time::IdealTime;

/// Non-hidden files in `dir` with the configured media extension,
/// lexicographically sorted so injection order is stable across runs.
pub fn list_candidates(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %dir.display(), %err, "cannot list event directory");
            return Vec::new();
        }
    };

    let ext = get_config().media_ext.as_str();
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension() == Some(OsStr::new(ext)))
        .filter(|path| {
            !path
                .file_name()
                .and_then(OsStr::to_str)
                .is_some_and(|name| name.starts_with('.'))
        })
        .collect();
    files.sort();
    files
}

/// Default payloads from up to four enclosing directory levels of `leaf`
/// (block, day, month, year), nearest level first so the broadest default
/// plays last.
pub fn cascading_defaults(leaf: &Path) -> Vec<PathBuf> {
    let name = get_config().default_name.as_str();
    leaf.ancestors()
        .skip(1)
        .take(4)
        .map(|dir| dir.join(name))
        .filter(|path| path.exists())
        .collect()
}

/// Directory-fed injection: append one tagged item per payload at `now`.
/// Each item gets a strictly increasing one-microsecond placeholder span, so
/// sorting by start reproduces the injection order even before true
/// durations are known.
pub fn inject_payloads(schedule: &mut Schedule, trigger: &str, now: IdealTime, payloads: &[PathBuf]) {
    let mut bias = IdealTime::ZERO;
    for payload in payloads {
        let start = now.add(bias);
        bias = bias.add(IdealTime::MICROSECOND);
        let mut item = Item::new(payload.to_string_lossy().into_owned(), start, now.add(bias));
        item.set_trigger(trigger);
        schedule.items.push(item);
    }
}

/// In-place correction: relocate items pre-tagged with `trigger` from the
/// block's start to `now`, keeping their spans and relative order. No items
/// are created.
pub fn shift_pending(schedule: &mut Schedule, trigger: &str, block_start: IdealTime, now: IdealTime) {
    let delta = now.subtract(block_start);
    for item in &mut schedule.items {
        if item.has_pending(trigger) {
            item.start = item.start.add(delta);
            item.end = item.end.add(delta);
        }
    }
}

/// Rewrite each tagged item's end from its probed duration. A failed probe
/// leaves that item's placeholder span untouched; the pass never aborts for
/// one bad payload.
pub fn correct_durations(
    schedule: &mut Schedule,
    trigger: &str,
    probe: impl Fn(&str) -> Result<IdealTime, ProbeError>,
) {
    for item in &mut schedule.items {
        if !item.is_valid() || !item.has_pending(trigger) {
            continue;
        }
        match probe(&item.payload) {
            Ok(duration) => item.end = item.start.add(duration),
            Err(err) => {
                warn!(payload = %item.payload, %err, "duration probe failed, keeping placeholder");
            }
        }
    }
}
