//! External service clients

pub mod classifier;

pub use classifier::{Classification, ClassifierError, HttpClassifier, TumorClassifier};
