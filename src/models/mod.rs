//! Data models for the Harmony Sermon Notes application.
//!
//! These models match the frontend TypeScript interfaces exactly for seamless interoperability.

mod annotations;
mod library;
mod sermon;

pub use annotations::*;
pub use library::*;
pub use sermon::*;
