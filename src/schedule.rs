use std::collections::BTreeMap;
use std::fmt;

use crate::time::IdealTime;

/// Trigger name carried by blocks that want the event filter run while they
/// are on air.
pub const EVENT_TRIGGER: &str = "charter_event";

const TRIGGER_ATTR: &str = "trigger";
const TARGET_YEAR_ATTR: &str = "Infinite Year";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodKind {
    Daily,
    Yearly,
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodKind::Daily => write!(f, "daily"),
            PeriodKind::Yearly => write!(f, "yearly"),
        }
    }
}

/// One loaded schedule: the unit of load/mutate/save. A filter invocation
/// owns it exclusively from read to write-back.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub kind: PeriodKind,
    pub blocks: Vec<Block>,
    pub items: Vec<Item>,
    /// trigger name -> program run when a block carrying that trigger is on air
    pub triggers: BTreeMap<String, String>,
    /// recurrence spec -> program run on that cadence
    pub intervals: BTreeMap<String, String>,
}

impl Schedule {
    pub fn new(kind: PeriodKind) -> Self {
        Self {
            kind,
            blocks: Vec::new(),
            items: Vec::new(),
            triggers: BTreeMap::new(),
            intervals: BTreeMap::new(),
        }
    }

    pub fn sort_blocks(&mut self) {
        self.blocks.sort_by_key(|block| block.start);
    }

    pub fn sort_items(&mut self) {
        self.items.sort_by_key(|item| item.start);
    }

    /// First block whose half-open span `[start, end)` contains `offset` and
    /// whose trigger attribute matches. An offset landing exactly on a
    /// boundary belongs to the later block.
    ///
    /// `None` is a normal outcome, not corruption: the trigger fired but no
    /// block currently wants it.
    pub fn find_active_block(&self, offset: IdealTime, trigger: &str) -> Option<&Block> {
        self.blocks.iter().find(|block| {
            block.start <= offset && offset < block.end && block.trigger() == Some(trigger)
        })
    }

    /// Plain containment lookup with an inclusive end; a boundary offset
    /// matches the earlier block here, unlike [`Schedule::find_active_block`].
    pub fn block_at(&self, offset: IdealTime) -> Option<&Block> {
        self.blocks
            .iter()
            .find(|block| block.start <= offset && offset <= block.end)
    }
}

/// A named, time-bounded region of the schedule's period. Created once at
/// bootstrap and read-only afterwards; spans of distinct blocks never
/// overlap.
#[derive(Debug, Clone)]
pub struct Block {
    pub name: String,
    pub start: IdealTime,
    pub end: IdealTime,
    pub attributes: BTreeMap<String, String>,
}

impl Block {
    pub fn new(name: impl Into<String>, start: IdealTime, end: IdealTime) -> Self {
        Self {
            name: name.into(),
            start,
            end,
            attributes: BTreeMap::new(),
        }
    }

    pub fn trigger(&self) -> Option<&str> {
        self.attributes.get(TRIGGER_ATTR).map(String::as_str)
    }

    pub fn set_trigger(&mut self, name: &str) {
        self.attributes
            .insert(TRIGGER_ATTR.to_string(), name.to_string());
    }
}

/// A placeable payload reference: a media path, or the path of a day's
/// sub-schedule in yearly mode.
#[derive(Debug, Clone)]
pub struct Item {
    pub payload: String,
    pub start: IdealTime,
    pub end: IdealTime,
    pub attributes: BTreeMap<String, String>,
}

impl Item {
    pub fn new(payload: impl Into<String>, start: IdealTime, end: IdealTime) -> Self {
        Self {
            payload: payload.into(),
            start,
            end,
            attributes: BTreeMap::new(),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end && !self.payload.is_empty()
    }

    /// Trigger tag marking this item as part of the current injection pass.
    pub fn pending_trigger(&self) -> Option<&str> {
        self.attributes.get(TRIGGER_ATTR).map(String::as_str)
    }

    pub fn has_pending(&self, trigger: &str) -> bool {
        self.pending_trigger() == Some(trigger)
    }

    pub fn set_trigger(&mut self, name: &str) {
        self.attributes
            .insert(TRIGGER_ATTR.to_string(), name.to_string());
    }

    pub fn clear_trigger(&mut self) {
        self.attributes.remove(TRIGGER_ATTR);
    }

    /// Calendar year this item's payload currently targets (yearly mode).
    /// `None` when the marker is absent or unreadable, which the regenerator
    /// treats as "not yet advanced".
    pub fn target_year(&self) -> Option<i64> {
        self.attributes.get(TARGET_YEAR_ATTR)?.parse().ok()
    }

    pub fn set_target_year(&mut self, year: i64) {
        self.attributes
            .insert(TARGET_YEAR_ATTR.to_string(), year.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hour(n: i64) -> IdealTime {
        IdealTime::HOUR.times(n)
    }

    fn triggered_block(name: &str, start: IdealTime, end: IdealTime) -> Block {
        let mut block = Block::new(name, start, end);
        block.set_trigger(EVENT_TRIGGER);
        block
    }

    #[test]
    fn matcher_uses_half_open_spans() {
        let mut schedule = Schedule::new(PeriodKind::Daily);
        schedule.blocks.push(triggered_block("8am", hour(8), hour(9)));
        schedule.blocks.push(triggered_block("9am", hour(9), hour(10)));

        let at_boundary = schedule.find_active_block(hour(9), EVENT_TRIGGER).unwrap();
        assert_eq!(at_boundary.name, "9am");

        assert!(schedule.find_active_block(hour(10), EVENT_TRIGGER).is_none());
    }

    #[test]
    fn matcher_requires_the_trigger_attribute() {
        let mut schedule = Schedule::new(PeriodKind::Daily);
        schedule.blocks.push(Block::new("untagged", hour(8), hour(9)));
        assert!(
            schedule
                .find_active_block(hour(8).add(IdealTime::MINUTE), EVENT_TRIGGER)
                .is_none()
        );
    }

    #[test]
    fn block_at_includes_the_end_boundary() {
        let mut schedule = Schedule::new(PeriodKind::Daily);
        schedule.blocks.push(Block::new("8am", hour(8), hour(9)));
        schedule.blocks.push(Block::new("9am", hour(9), hour(10)));

        // inclusive variant: the earlier block claims the shared boundary
        assert_eq!(schedule.block_at(hour(9)).unwrap().name, "8am");
    }

    #[test]
    fn target_year_view_survives_garbage() {
        let mut item = Item::new("x", IdealTime::ZERO, IdealTime::DAY);
        assert_eq!(item.target_year(), None);

        item.attributes
            .insert("Infinite Year".to_string(), "soon".to_string());
        assert_eq!(item.target_year(), None);

        item.set_target_year(2027);
        assert_eq!(item.target_year(), Some(2027));
    }

    #[test]
    fn zero_length_items_are_valid() {
        let item = Item::new("x", hour(8), hour(8));
        assert!(item.is_valid());
        assert!(!Item::new("", hour(8), hour(9)).is_valid());
    }
}
