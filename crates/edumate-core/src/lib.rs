//! edumate-core: Data model, rules engine, and curriculum logic.
//!
//! This crate defines the records, the store and AI seams, and the business
//! logic (points, question import, rewards, links, mastery, assessments)
//! that the rest of edumate builds on.

pub mod assessment;
pub mod curriculum;
pub mod error;
pub mod generator;
pub mod importer;
pub mod links;
pub mod mastery;
pub mod model;
pub mod points;
pub mod rewards;
pub mod state;
pub mod traits;
