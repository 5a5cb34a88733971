use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use jiff::Zoned;
use tracing::{error, info};

use airsched::error::FilterError;
use airsched::schedule::{EVENT_TRIGGER, PeriodKind};
use airsched::time::{self, IdealTime};
use airsched::{format, inject, probe, ripple};

/// Event filter: run by the playout system while a triggered block is on
/// air. Fills the block with the media staged in its directory, starting at
/// the moment the trigger fired, and keeps the result inside a five-minute
/// window.
#[derive(Parser)]
struct Args {
    /// Path to the schedule being filtered.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Relocate pre-placed placeholder items instead of injecting from the
    /// block's directory.
    #[arg(long)]
    in_place: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match &err {
                // the trigger fired with nothing to do; the nonzero code
                // just stops the schedule from reloading
                FilterError::NoActiveBlock { .. } => info!("{err}"),
                _ => error!("{err}"),
            }
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(args: Args) -> Result<(), FilterError> {
    let path = args.file.ok_or(FilterError::MissingPath)?;
    let mut schedule = format::read_schedule(&path)?;

    if schedule.kind != PeriodKind::Daily {
        return Err(FilterError::UnsupportedPeriod {
            expected: PeriodKind::Daily,
            found: schedule.kind,
        });
    }

    let now = time::daily_offset(&Zoned::now());

    let block = schedule
        .find_active_block(now, EVENT_TRIGGER)
        .ok_or_else(|| FilterError::NoActiveBlock {
            trigger: EVENT_TRIGGER.to_string(),
            offset: now,
        })?;
    let block_name = block.name.clone();
    let block_end = block.end;
    let block_start = block.start;
    info!(block = %block_name, offset = %now, "active block matched");

    if args.in_place {
        inject::shift_pending(&mut schedule, EVENT_TRIGGER, block_start, now);
    } else {
        // the event's media sits beside the schedule file, in a directory
        // named after the block
        let dir = path.with_file_name(&block_name);
        let mut payloads = inject::list_candidates(&dir);
        payloads.extend(inject::cascading_defaults(&dir));
        info!(count = payloads.len(), dir = %dir.display(), "injecting payloads");
        inject::inject_payloads(&mut schedule, EVENT_TRIGGER, now, &payloads);
    }

    inject::correct_durations(&mut schedule, EVENT_TRIGGER, probe::media_duration);

    let deadline = now.add(IdealTime::MINUTE.times(5)).min(block_end);
    ripple::ripple_and_truncate(&mut schedule, deadline, |item| {
        item.is_valid() && item.has_pending(EVENT_TRIGGER)
    });
    ripple::clear_triggers(&mut schedule);

    if let Err(err) = format::write_schedule(&mut schedule, &path) {
        // the automation only reloads on success, so a failed write already
        // leaves the on-air schedule alone; see DESIGN.md on the exit code
        error!(path = %path.display(), %err, "could not write schedule back");
    }
    Ok(())
}
