//! Tournament configuration loading.
//!
//! The expected YAML structure is:
//! ```yaml
//! tournament:
//!   start: "now"          # "now", "HH:MM" or "YYYY-MM-DDTHH:MM[:SS]"
//!   rounds: 7
//!   round_minutes: 30
//!   change_minutes: 5
//!   breaks:
//!     - after_round: 3
//!       kind: lunch       # lunch | dinner | coffee | custom
//!       minutes: 60
//!     - after_round: 5
//!       kind: custom
//!       label: "Prize giving"
//!       minutes: 15
//! ```
//!
//! Every field is optional.  Missing values fall back to 13 rounds of 15
//! minutes with 2-minute changes, starting now.  Lengths are read as signed
//! minutes so that a negative value reaches the schedule builder and is
//! reported as an invalid parameter rather than a YAML type error.

use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::{Duration, NaiveDateTime, NaiveTime, Timelike};
use serde::Deserialize;
use tracing::{debug, info};

use crate::schedule::{BreakKind, BreakRequest, TournamentParams};

pub const DEFAULT_ROUNDS: u32 = 13;
pub const DEFAULT_ROUND_MINUTES: i64 = 15;
pub const DEFAULT_CHANGE_MINUTES: i64 = 2;

// ── Private YAML deserialization types ────────────────────────────────────────

/// Top-level wrapper that maps directly onto the YAML file layout.
#[derive(Debug, Deserialize)]
struct TournamentConfigFile {
    #[serde(default)]
    tournament: TournamentEntry,
}

#[derive(Debug, Deserialize)]
struct TournamentEntry {
    #[serde(default = "default_start")]
    start: String,
    #[serde(default = "default_rounds")]
    rounds: u32,
    #[serde(default = "default_round_minutes")]
    round_minutes: i64,
    #[serde(default = "default_change_minutes")]
    change_minutes: i64,
    #[serde(default)]
    breaks: Vec<BreakEntry>,
}

impl Default for TournamentEntry {
    fn default() -> Self {
        Self {
            start: default_start(),
            rounds: DEFAULT_ROUNDS,
            round_minutes: DEFAULT_ROUND_MINUTES,
            change_minutes: DEFAULT_CHANGE_MINUTES,
            breaks: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BreakEntry {
    after_round: u32,
    kind: BreakKind,
    minutes: i64,
    label: Option<String>,
}

fn default_start() -> String {
    "now".to_string()
}

fn default_rounds() -> u32 {
    DEFAULT_ROUNDS
}

fn default_round_minutes() -> i64 {
    DEFAULT_ROUND_MINUTES
}

fn default_change_minutes() -> i64 {
    DEFAULT_CHANGE_MINUTES
}

// ── StartTime ─────────────────────────────────────────────────────────────────

/// When the first round begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartTime {
    /// The moment the timeline is built, truncated to the whole minute.
    Now,
    /// A time of day on the date the timeline is built.
    Today(NaiveTime),
    At(NaiveDateTime),
}

impl StartTime {
    /// Parse `"now"`, `"HH:MM"` or an ISO date-time (`T` or space separated,
    /// seconds optional).
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("now") {
            return Ok(StartTime::Now);
        }
        if let Ok(t) = NaiveTime::parse_from_str(s, "%H:%M") {
            return Ok(StartTime::Today(t));
        }
        for fmt in [
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%dT%H:%M",
            "%Y-%m-%d %H:%M:%S",
            "%Y-%m-%d %H:%M",
        ] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
                return Ok(StartTime::At(dt));
            }
        }
        bail!("unrecognised start time '{s}' (expected \"now\", \"HH:MM\" or \"YYYY-MM-DDTHH:MM\")")
    }

    /// Resolve against the current wall-clock time.
    pub fn resolve(self, now: NaiveDateTime) -> NaiveDateTime {
        match self {
            StartTime::Now => now
                .with_second(0)
                .and_then(|t| t.with_nanosecond(0))
                .unwrap_or(now),
            StartTime::Today(time) => now.date().and_time(time),
            StartTime::At(dt) => dt,
        }
    }
}

// ── Public data structures ────────────────────────────────────────────────────

/// Tournament parameters as supplied by the configuration surface, before
/// the start time is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TournamentConfig {
    pub start: StartTime,
    pub rounds: u32,
    pub round_minutes: i64,
    pub change_minutes: i64,
    pub breaks: Vec<BreakRequest>,
}

impl Default for TournamentConfig {
    fn default() -> Self {
        Self {
            start: StartTime::Now,
            rounds: DEFAULT_ROUNDS,
            round_minutes: DEFAULT_ROUND_MINUTES,
            change_minutes: DEFAULT_CHANGE_MINUTES,
            breaks: Vec::new(),
        }
    }
}

impl TournamentConfig {
    /// Parses the YAML file at `path`.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read, the YAML is malformed, or
    /// the start time is not in a recognised format.  Parameter ranges are
    /// not checked here; that is the schedule builder's job.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        info!("Loading tournament configuration from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot open configuration file: {}", path.display()))?;

        Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse YAML file: {}", path.display()))
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: TournamentConfigFile = serde_yaml::from_str(content)?;
        let entry = file.tournament;

        let config = Self {
            start: StartTime::parse(&entry.start)?,
            rounds: entry.rounds,
            round_minutes: entry.round_minutes,
            change_minutes: entry.change_minutes,
            breaks: entry
                .breaks
                .into_iter()
                .map(|b| BreakRequest {
                    after_round: b.after_round,
                    kind: b.kind,
                    length: Duration::minutes(b.minutes),
                    label: b.label,
                })
                .collect(),
        };

        debug!(
            start = ?config.start,
            rounds = config.rounds,
            round_minutes = config.round_minutes,
            change_minutes = config.change_minutes,
            breaks = config.breaks.len(),
            "tournament configuration"
        );
        Ok(config)
    }

    /// Resolve the start time against `now` and produce builder input.
    pub fn to_params(&self, now: NaiveDateTime) -> TournamentParams {
        TournamentParams {
            start: self.start.resolve(now),
            round_count: self.rounds,
            round_length: Duration::minutes(self.round_minutes),
            change_length: Duration::minutes(self.change_minutes),
            breaks: self.breaks.clone(),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
