//! Spoken-query correction.

pub mod corrector;
pub mod similarity;
pub mod tables;

pub use corrector::{Correction, QueryCorrector};
