use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use jiff::Zoned;
use tracing::{error, info};

use airsched::error::FilterError;
use airsched::schedule::PeriodKind;
use airsched::{format, rolling, time};

/// Yearly filter: keeps a year-long schedule pointing at the year ahead.
/// The first run lays down one item per calendar day; the weekly interval
/// tick then rolls days that have receded into the past one year forward.
#[derive(Parser)]
struct Args {
    /// Path to the yearly schedule being filtered.
    #[arg(long)]
    file: Option<PathBuf>,
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
            error!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}

fn run(args: Args) -> Result<(), FilterError> {
    let path = args.file.ok_or(FilterError::MissingPath)?;
    let mut schedule = format::read_schedule(&path)?;

    if schedule.kind != PeriodKind::Yearly {
        return Err(FilterError::UnsupportedPeriod {
            expected: PeriodKind::Yearly,
            found: schedule.kind,
        });
    }

    let now_cal = Zoned::now();
    let now = time::yearly_offset(&now_cal);
    let current_year = now_cal.year() as i64;

    let days_base = days_base_for(&path);

    rolling::register_interval(&mut schedule);

    if schedule.items.is_empty() {
        info!(base = %days_base.display(), "empty yearly schedule, bootstrapping day grid");
        rolling::bootstrap(&mut schedule, &days_base, now, current_year);
    }
    rolling::advance_receded_days(&mut schedule, &days_base, now, current_year);

    if let Err(err) = format::write_schedule(&mut schedule, &path) {
        error!(path = %path.display(), %err, "could not write schedule back");
    }
    Ok(())
}

/// The daily schedules live beside the yearly file, in a directory named
/// after it with a " Days" suffix.
fn days_base_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!("{name} Days"))
}
