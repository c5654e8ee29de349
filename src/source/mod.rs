//! Source terms of the gradually-varied flow equation.
//!
//! # Submodules
//!
//! - [`friction`]: Friction slope closures (Manning-Strickler, Ferguson)

pub mod friction;

pub use friction::{FERGUSON_A1, FERGUSON_A2, FrictionLaw, UnknownFrictionLaw, ferguson_resistance};
