#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

/// Top of the grading scale; every score is clamped into `0..=MAX_SCORE`.
pub const MAX_SCORE: u8 = 5;

/// Passing boundary for the whole system. A score strictly below this value
/// triggers remediation, and a remediation attempt at or above it succeeds.
pub const PASSING_SCORE: u8 = 3;

/// Maximum number of entries kept in a tutoring transcript.
pub const TRANSCRIPT_CAP: usize = 15;

/// Number of most recent transcript entries sent as context when continuing a
/// guided dialogue.
pub const CONTEXT_WINDOW: usize = 10;

/// Extracted guiding questions shorter than this are ignored.
pub const MIN_QUESTION_LEN: usize = 6;

/// Student dialogue messages shorter than this (after trimming) are rejected.
pub const MIN_MESSAGE_LEN: usize = 3;

/// Default length of the free trial, in hours.
pub const DEFAULT_TRIAL_HOURS: i64 = 48;

/// Default lifetime of a remediation access grant, in hours.
pub const DEFAULT_GRANT_TTL_HOURS: i64 = 24;

/// Longest trial or grant a deployment may configure, about a century.
pub const MAX_CONFIGURED_HOURS: i64 = 24 * 365 * 100;

/// Default bound imposed on a single completion call, in seconds.
pub const DEFAULT_COMPLETION_TIMEOUT_SECS: u64 = 60;

/// Sampling temperature used for grading calls.
pub const GRADING_TEMPERATURE: f32 = 0.2;

/// Token budget for grading calls.
pub const GRADING_MAX_TOKENS: u32 = 1200;

/// Sampling temperature used for remediation generation.
pub const REMEDIATION_TEMPERATURE: f32 = 0.7;

/// Token budget for remediation generation.
pub const REMEDIATION_MAX_TOKENS: u32 = 600;

/// Sampling temperature used for tutor turns.
pub const DIALOGUE_TEMPERATURE: f32 = 0.7;

/// Token budget for the opening tutor turn.
pub const DIALOGUE_START_MAX_TOKENS: u32 = 400;

/// Token budget for follow-up tutor turns.
pub const DIALOGUE_CONTINUE_MAX_TOKENS: u32 = 450;
