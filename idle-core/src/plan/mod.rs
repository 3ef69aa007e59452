//! Planning: candidate enumeration, decision deltas, segmented best-first
//! search, and plan execution against the real engine.
//!
//! Data flow: goal -> candidates (watch set + competitive options) ->
//! next-decision delta (how long a wait is safe) -> segment search
//! (interleave 0-tick interactions with projected waits) -> executor
//! (replay against the stochastic engine, report divergence for replan).

pub mod boundary;
pub mod candidates;
pub mod delta;
pub mod executor;
pub mod project;
pub mod segment;

pub use boundary::{ReplanBoundary, SegmentBoundary};
pub use candidates::{Candidates, WatchSet, enumerate_candidates, intended_action};
pub use delta::{NextDecision, next_decision_delta};
pub use executor::{ExecuteOutcome, execute_plan};
pub use project::project;
pub use segment::{Plan, SegmentConfig, SegmentContext, Step, plan_segment};
