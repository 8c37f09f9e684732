//! jobrunner library
//!
//! In-process job scheduling: registered job types are instantiated once,
//! one-shot jobs run immediately and repeatable jobs run on a fixed interval.
//! Long-running jobs get their own lane so they never occupy the workers that
//! drive standard jobs and timers. Failures go to an injected error sink and
//! never stop the remaining jobs.

pub mod cli;
pub mod config;
pub mod error;
pub mod jobs;
pub mod logger;
