use std::path::PathBuf;

use thiserror::Error;

use crate::schedule::PeriodKind;
use crate::time::IdealTime;

/// Failure modes of one filter invocation.
///
/// There is no structured error channel to the playout automation: every
/// outcome is reported purely through the process exit code, and the
/// automation reloads the schedule only on 0. "Nothing to do" and "succeeded"
/// are therefore deliberately indistinguishable to the user.
#[derive(Debug, Error)]
pub enum FilterError {
    /// The loaded schedule's period kind is not the one this filter handles.
    /// Fatal before any mutation.
    #[error("schedule is {found}, this filter only handles {expected} schedules")]
    UnsupportedPeriod {
        expected: PeriodKind,
        found: PeriodKind,
    },

    /// The trigger fired but no block currently qualifies. The schedule is
    /// left exactly as loaded.
    #[error("no block carrying trigger '{trigger}' is active at {offset}")]
    NoActiveBlock { trigger: String, offset: IdealTime },

    /// `--file` was not supplied.
    #[error("missing required --file argument")]
    MissingPath,

    #[error("failed to read schedule {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("schedule {path}, line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

impl FilterError {
    /// Exit code contract of the filters (see DESIGN.md for the write-failure
    /// and missing-path notes).
    pub fn exit_code(&self) -> u8 {
        match self {
            FilterError::UnsupportedPeriod { .. }
            | FilterError::Load { .. }
            | FilterError::Parse { .. } => 1,
            FilterError::NoActiveBlock { .. } => 2,
            FilterError::MissingPath => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_match_the_automation_contract() {
        let unsupported = FilterError::UnsupportedPeriod {
            expected: PeriodKind::Daily,
            found: PeriodKind::Yearly,
        };
        let no_block = FilterError::NoActiveBlock {
            trigger: "charter_event".to_string(),
            offset: IdealTime::ZERO,
        };
        assert_eq!(unsupported.exit_code(), 1);
        assert_eq!(no_block.exit_code(), 2);
        assert_eq!(FilterError::MissingPath.exit_code(), 3);
    }
}
