// Configuration and reporting surface
//
// Loading planner configuration and rendering plans for humans or for the
// signer that consumes them.

mod config;
mod report;

pub use config::*;
pub use report::*;
