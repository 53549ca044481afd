pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{AnalysisError, AnalysisResult, AttemptError, ValidationError};
pub use types::*;
