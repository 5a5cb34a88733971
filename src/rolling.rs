use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::config::get_config;
use crate::format;
use crate::schedule::{Block, EVENT_TRIGGER, Item, PeriodKind, Schedule};
use crate::time::{self, IdealTime};

/// Recurrence spec the yearly filter re-registers itself under.
pub const WEEKLY_INTERVAL: &str = "P1W";

const HOUR_NAMES: [&str; 24] = [
    "12am", "1am", "2am", "3am", "4am", "5am", "6am", "7am", "8am", "9am", "10am", "11am", "12pm",
    "1pm", "2pm", "3pm", "4pm", "5pm", "6pm", "7pm", "8pm", "9pm", "10pm", "11pm",
];

/// Create (or refresh) the daily schedule for one calendar day: the day
/// directory, a directory and triggered block per clock hour, the event
/// filter registration, and the `Schedule` file itself. Safe to run over an
/// existing day.
pub fn create_daily_schedule(day_dir: &Path) -> io::Result<PathBuf> {
    fs::create_dir_all(day_dir)?;

    let mut schedule = Schedule::new(PeriodKind::Daily);
    for name in HOUR_NAMES {
        let start = schedule.blocks.last().map_or(IdealTime::ZERO, |b| b.end);
        let mut block = Block::new(name, start, start.add(IdealTime::HOUR));
        block.set_trigger(EVENT_TRIGGER);
        schedule.blocks.push(block);

        fs::create_dir_all(day_dir.join(name))?;
    }
    schedule
        .triggers
        .insert(EVENT_TRIGGER.to_string(), get_config().event_filter.clone());

    let path = day_dir.join("Schedule");
    format::write_schedule(&mut schedule, &path)?;
    Ok(path)
}

/// First-run self-registration of the weekly tick.
pub fn register_interval(schedule: &mut Schedule) {
    if schedule.intervals.is_empty() {
        schedule
            .intervals
            .insert(WEEKLY_INTERVAL.to_string(), get_config().yearly_filter.clone());
    }
}

fn day_dir(base: &Path, year: i64, month: i64, day: i64) -> PathBuf {
    base.join(year.to_string())
        .join((month + 1).to_string())
        .join((day + 1).to_string())
}

/// First run: lay down one item per cell of the fixed 12x31 day grid, each
/// spanning exactly its day and pointing at a freshly created daily
/// schedule. Cells the calendar never produces are harmless; the clock never
/// lands on them. Days already more than a week behind `now` are targeted at
/// next year straight away.
pub fn bootstrap(schedule: &mut Schedule, base: &Path, now: IdealTime, current_year: i64) {
    for month in 0..12 {
        for day in 0..31 {
            let start = IdealTime::MONTH.times(month).add(IdealTime::DAY.times(day));
            let year = if start.add(IdealTime::WEEK) <= now {
                current_year + 1
            } else {
                current_year
            };

            let dir = day_dir(base, year, month, day);
            let daily = match create_daily_schedule(&dir) {
                Ok(path) => path,
                Err(err) => {
                    warn!(dir = %dir.display(), %err, "skipping day, could not create its schedule");
                    continue;
                }
            };

            let mut item = Item::new(
                daily.to_string_lossy().into_owned(),
                start,
                start.add(IdealTime::DAY),
            );
            item.set_target_year(year);
            schedule.items.push(item);
        }
    }
    info!(items = schedule.items.len(), "bootstrapped yearly day grid");
}

/// Weekly tick: re-point every item whose day has receded more than a week
/// into the past at the year ahead, regenerating its daily schedule there.
/// Items whose marker is already past the current year are left untouched,
/// so a second tick in the same week is a no-op.
pub fn advance_receded_days(schedule: &mut Schedule, base: &Path, now: IdealTime, current_year: i64) {
    let mut advanced = 0usize;
    for item in &mut schedule.items {
        if item.start.add(IdealTime::WEEK) > now {
            continue;
        }
        if item.target_year().is_some_and(|year| year > current_year) {
            continue;
        }

        let (month, day) = time::month_day(item.start);
        let year = current_year + 1;
        let dir = day_dir(base, year, month, day);
        match create_daily_schedule(&dir) {
            Ok(path) => {
                item.payload = path.to_string_lossy().into_owned();
                item.set_target_year(year);
                advanced += 1;
            }
            Err(err) => {
                warn!(dir = %dir.display(), %err, "leaving day item on its current year");
            }
        }
    }
    if advanced > 0 {
        info!(advanced, "rolled receded days one year forward");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yearly() -> Schedule {
        Schedule::new(PeriodKind::Yearly)
    }

    fn grid_offset(month: i64, day: i64) -> IdealTime {
        IdealTime::MONTH.times(month).add(IdealTime::DAY.times(day))
    }

    #[test]
    fn daily_schedule_has_24_triggered_hour_blocks() {
        let dir = tempfile::tempdir().unwrap();
        let path = create_daily_schedule(&dir.path().join("1")).unwrap();

        let daily = format::read_schedule(&path).unwrap();
        assert_eq!(daily.kind, PeriodKind::Daily);
        assert_eq!(daily.blocks.len(), 24);
        assert_eq!(daily.blocks[0].name, "12am");
        assert_eq!(daily.blocks[23].name, "11pm");
        assert_eq!(daily.blocks[23].end, IdealTime::DAY);
        assert!(daily.blocks.iter().all(|b| b.trigger() == Some(EVENT_TRIGGER)));
        assert!(daily.triggers.contains_key(EVENT_TRIGGER));

        // hour directories exist alongside the schedule file
        assert!(dir.path().join("1").join("3pm").is_dir());

        // refreshing an existing day is safe
        create_daily_schedule(&dir.path().join("1")).unwrap();
    }

    #[test]
    fn bootstrap_covers_the_full_grid() {
        let base = tempfile::tempdir().unwrap();
        let mut schedule = yearly();
        // mid-March: nothing before March 7 still counts as "this week"
        let now = grid_offset(2, 13);
        bootstrap(&mut schedule, base.path(), now, 2026);

        assert_eq!(schedule.items.len(), 12 * 31);

        // Jan 1 receded long ago: targeted at next year
        let jan1 = &schedule.items[0];
        assert_eq!(jan1.start, IdealTime::ZERO);
        assert_eq!(jan1.end, IdealTime::DAY);
        assert_eq!(jan1.target_year(), Some(2027));
        assert!(jan1.payload.contains("2027"));

        // tomorrow is still this year's
        let tomorrow = schedule
            .items
            .iter()
            .find(|item| item.start == grid_offset(2, 14))
            .unwrap();
        assert_eq!(tomorrow.target_year(), Some(2026));
    }

    #[test]
    fn bootstrap_near_year_end_targets_first_week_days_at_next_year() {
        let base = tempfile::tempdir().unwrap();
        let mut schedule = yearly();
        // Dec 30 (layout day 359)
        let now = grid_offset(11, 29);
        bootstrap(&mut schedule, base.path(), now, 2026);

        // Jan 1 lies ~359 days behind now measured from period start
        let jan1 = &schedule.items[0];
        assert_eq!(jan1.target_year(), Some(2027));

        // Dec 29 itself is within the trailing week and stays current
        let dec29 = schedule
            .items
            .iter()
            .find(|item| item.start == grid_offset(11, 28))
            .unwrap();
        assert_eq!(dec29.target_year(), Some(2026));
    }

    #[test]
    fn tick_advances_receded_days_and_rewrites_payloads() {
        let base = tempfile::tempdir().unwrap();
        let mut schedule = yearly();
        let bootstrap_now = grid_offset(0, 2);
        bootstrap(&mut schedule, base.path(), bootstrap_now, 2026);

        // five weeks later, January days have receded
        let now = grid_offset(1, 7);
        advance_receded_days(&mut schedule, base.path(), now, 2026);

        let jan1 = &schedule.items[0];
        assert_eq!(jan1.target_year(), Some(2027));
        assert!(jan1.payload.contains("2027"));

        let feb5 = schedule
            .items
            .iter()
            .find(|item| item.start == grid_offset(1, 4))
            .unwrap();
        assert_eq!(feb5.target_year(), Some(2026));
    }

    #[test]
    fn tick_is_idempotent_within_a_week() {
        let base = tempfile::tempdir().unwrap();
        let mut schedule = yearly();
        bootstrap(&mut schedule, base.path(), grid_offset(0, 2), 2026);

        let now = grid_offset(1, 7);
        advance_receded_days(&mut schedule, base.path(), now, 2026);
        let first: Vec<_> = schedule
            .items
            .iter()
            .map(|item| (item.payload.clone(), item.target_year()))
            .collect();

        advance_receded_days(&mut schedule, base.path(), now, 2026);
        let second: Vec<_> = schedule
            .items
            .iter()
            .map(|item| (item.payload.clone(), item.target_year()))
            .collect();

        assert_eq!(first, second);
    }

    #[test]
    fn interval_registration_only_happens_once() {
        let mut schedule = yearly();
        register_interval(&mut schedule);
        assert!(schedule.intervals.contains_key(WEEKLY_INTERVAL));

        schedule
            .intervals
            .insert(WEEKLY_INTERVAL.to_string(), "elsewhere".to_string());
        register_interval(&mut schedule);
        assert_eq!(schedule.intervals[WEEKLY_INTERVAL], "elsewhere");
    }
}
