pub mod comps;
pub mod estimators;
pub mod metrics;
