use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::error::FilterError;
use crate::schedule::{Block, Item, PeriodKind, Schedule};
use crate::time::IdealTime;

/// Schedule files are line-based text: a `channel type=` header, `trigger`
/// and `interval` registry lines, then `block { .. }` / `item { .. }`
/// sections of `key=value` lines. Offsets use the `D.HH:MM:SS.UUUUUU` form
/// from [`crate::time`].
pub fn read_schedule(path: &Path) -> Result<Schedule, FilterError> {
    let text = fs::read_to_string(path).map_err(|source| FilterError::Load {
        path: path.to_path_buf(),
        source,
    })?;
    parse_schedule(&text).map_err(|(line, message)| FilterError::Parse {
        path: path.to_path_buf(),
        line,
        message,
    })
}

/// Serialize and persist `schedule`, re-sorting blocks and items by start
/// time first so the file is always in chronological order.
pub fn write_schedule(schedule: &mut Schedule, path: &Path) -> io::Result<()> {
    schedule.sort_blocks();
    schedule.sort_items();

    let mut out = String::with_capacity(4096);
    out.push_str(&format!("channel type={}\n", schedule.kind));
    for (name, program) in &schedule.triggers {
        out.push_str(&format!("trigger {name}={program}\n"));
    }
    for (spec, program) in &schedule.intervals {
        out.push_str(&format!("interval {spec}={program}\n"));
    }
    for block in &schedule.blocks {
        out.push_str("block {\n");
        out.push_str(&format!("name={}\n", block.name));
        out.push_str(&format!("start={}\n", block.start));
        out.push_str(&format!("end={}\n", block.end));
        for (key, value) in &block.attributes {
            out.push_str(&format!("{key}={value}\n"));
        }
        out.push_str("}\n");
    }
    for item in &schedule.items {
        out.push_str("item {\n");
        out.push_str(&format!("item={}\n", item.payload));
        out.push_str(&format!("start={}\n", item.start));
        out.push_str(&format!("end={}\n", item.end));
        for (key, value) in &item.attributes {
            out.push_str(&format!("{key}={value}\n"));
        }
        out.push_str("}\n");
    }
    fs::write(path, out)
}

enum Section {
    Block,
    Item,
}

type ParseFailure = (usize, String);

fn parse_schedule(text: &str) -> Result<Schedule, ParseFailure> {
    let mut meaningful = text
        .lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'));

    let (line_no, header) = meaningful
        .next()
        .ok_or((0, "empty schedule".to_string()))?;
    let kind = header
        .strip_prefix("channel type=")
        .ok_or((line_no, "expected 'channel type=' header".to_string()))?;
    let kind = match kind {
        "daily" => PeriodKind::Daily,
        "yearly" => PeriodKind::Yearly,
        other => return Err((line_no, format!("unknown schedule type '{other}'"))),
    };
    let mut schedule = Schedule::new(kind);

    let mut open: Option<(Section, BTreeMap<String, String>)> = None;
    let mut last_line = line_no;

    for (line_no, line) in meaningful {
        last_line = line_no;
        match open.take() {
            None => {
                if line == "block {" {
                    open = Some((Section::Block, BTreeMap::new()));
                } else if line == "item {" {
                    open = Some((Section::Item, BTreeMap::new()));
                } else if let Some(rest) = line.strip_prefix("trigger ") {
                    let (name, program) = split_kv(rest, line_no)?;
                    schedule.triggers.insert(name.to_string(), program.to_string());
                } else if let Some(rest) = line.strip_prefix("interval ") {
                    let (spec, program) = split_kv(rest, line_no)?;
                    schedule.intervals.insert(spec.to_string(), program.to_string());
                } else {
                    return Err((line_no, format!("unexpected line '{line}'")));
                }
            }
            Some((section, mut fields)) => {
                if line == "}" {
                    close_section(&mut schedule, section, fields, line_no)?;
                } else {
                    let (key, value) = split_kv(line, line_no)?;
                    fields.insert(key.to_string(), value.to_string());
                    open = Some((section, fields));
                }
            }
        }
    }
    if open.is_some() {
        return Err((last_line, "unterminated section".to_string()));
    }
    Ok(schedule)
}

fn close_section(
    schedule: &mut Schedule,
    section: Section,
    mut fields: BTreeMap<String, String>,
    line_no: usize,
) -> Result<(), ParseFailure> {
    let start = take_offset(&mut fields, "start", line_no)?;
    let end = take_offset(&mut fields, "end", line_no)?;
    match section {
        Section::Block => {
            let name = fields.remove("name").unwrap_or_default();
            schedule.blocks.push(Block {
                name,
                start,
                end,
                attributes: fields,
            });
        }
        Section::Item => {
            let payload = fields.remove("item").unwrap_or_default();
            schedule.items.push(Item {
                payload,
                start,
                end,
                attributes: fields,
            });
        }
    }
    Ok(())
}

fn take_offset(
    fields: &mut BTreeMap<String, String>,
    key: &str,
    line_no: usize,
) -> Result<IdealTime, ParseFailure> {
    let raw = fields
        .remove(key)
        .ok_or_else(|| (line_no, format!("section is missing '{key}'")))?;
    raw.parse()
        .map_err(|_| (line_no, format!("invalid {key} '{raw}'")))
}

fn split_kv(s: &str, line_no: usize) -> Result<(&str, &str), ParseFailure> {
    s.split_once('=')
        .ok_or_else(|| (line_no, format!("expected key=value, got '{s}'")))
}
