//! Workspace-level acceptance tests.
//!
//! Every test uses a [`ManualTimeSource`](cycle_common::ManualTimeSource)
//! so boundaries are hit exactly and results are reproducible.

mod common;
mod restart_test;
mod schedule_test;
mod ticker_test;
