//! Feature comparison matrix: our capabilities against each competitor's.

mod repository;
mod types;

pub use repository::FeatureRepository;
pub use types::{
    Capability, CompetitorCapability, DifferentiationLevel, FeatureComparison, FeatureMatrix,
    FeatureUpdate, MatrixCompetitor, MatrixFeature, NewFeature, DEFAULT_IMPORTANCE,
};
