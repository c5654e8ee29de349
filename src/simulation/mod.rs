//! Project runner.
//!
//! Loads a project configuration and ties together:
//! - Granulometries and the profile read from files
//! - The hydrogram and the upstream sedimentogram
//! - The event loop and optional performance collection
//!
//! # Example
//! ```ignore
//! use evofond::simulation::Project;
//!
//! let mut project = Project::load("torrent/config.json")?;
//! let result = project.run()?;
//! println!("{} recorded times", result.len());
//! ```

mod runner;

pub use runner::{Project, RunError};
