/*
SPDX-FileCopyrightText: Copyright 2026 LG Electronics Inc.
SPDX-License-Identifier: MIT
*/

//! Bridge clock – tournament timing engine
//!
//! Module layout:
//!
//! ```text
//! lib.rs
//! ├── segment        – segment kinds, segments, display names
//! ├── schedule/      – tournament parameters → timeline builder
//! │   └── error      – parameter validation errors
//! ├── timeline/      – contiguous segment sequence, lookup, cascading shift
//! │   └── lookup     – binary search and invariant helpers
//! ├── clock/         – countdown state machine and published state
//! │   └── driver     – tokio tick task + command channel
//! └── config/        – YAML tournament configuration
//! ```
//!
//! Data flow:
//!
//! ```text
//! config ──► ScheduleBuilder ──► Timeline ──► ClockEngine ◄── driver ticks / commands
//!                                                  │
//!                                                  └──► ClockState (presentation)
//! ```

pub mod clock;
pub mod config;
pub mod schedule;
pub mod segment;
pub mod timeline;
