//! Lane Simulation Library
//!
//! A discrete traffic automaton for multi-lane roads, runnable headless from
//! the command line or embedded behind another front end.

pub mod simulation;
