pub mod config;
pub mod curve;
pub mod engine;
pub mod validation;

pub use config::*;
pub use curve::{erf, erfinv, qualification_points};
pub use engine::{score, Category, CategoryPoints, PointBreakdown};
pub use validation::validate_rules;
