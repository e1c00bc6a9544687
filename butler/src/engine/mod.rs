//! Dependency-gated activation engine

pub mod decider;
pub mod evaluator;
pub mod fsm;
pub mod manager;
pub mod probe;
