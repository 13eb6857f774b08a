//! `redlight` - stop-on-red elimination rule engine
//!
//! Runs the "Red Light, Green Light" minigame against any host world that
//! implements [`host::Host`]: alternating phases on a 50 ms clock, motion
//! sampling inside a marked region, and deferred elimination of anyone who
//! moves while the light is red.

pub mod admin;
pub mod cli;
pub mod config;
pub mod driver;
pub mod engine;
pub mod error;
pub mod host;
pub mod observability;
pub mod region;
pub mod sim;
