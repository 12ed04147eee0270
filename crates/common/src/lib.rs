//! Common types shared across IdeaForge crates.
//!
//! This crate holds the error taxonomy and the report types that flow
//! between the agents, the orchestrator and the HTTP layer.

pub mod error;
pub mod idea;
pub mod report;
pub mod text;

pub use error::{IdeaForgeError, Result};
pub use idea::{SimilarIdea, StoredIdea};
pub use report::{FeasibilityReport, ReportSections, clamp_probability};
pub use text::truncate;
