//! Exit code constants for the tandem CLI.
//!
//! Loop-level failures (agent invocation errors, ambiguous verdicts,
//! exhausted iteration budgets) terminate the run gracefully and still exit
//! 0. Nonzero is reserved for errors the operator must fix before a run can
//! start at all.

/// Successful execution, including Exhausted and Aborted run outcomes.
pub const SUCCESS: i32 = 0;

/// User error: missing task file, bad arguments, or invalid configuration.
pub const USER_ERROR: i32 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        assert_ne!(SUCCESS, USER_ERROR);
    }

    #[test]
    fn exit_codes_match_contract() {
        assert_eq!(SUCCESS, 0);
        assert_eq!(USER_ERROR, 1);
    }
}
