//! Data preprocessing
//!
//! Turns a raw employee table into a numeric feature matrix in four fixed
//! steps:
//! - missing value imputation (mean, median or zero; mode for strings)
//! - date parsing to days since 1970-01-01
//! - categorical encoding (one-hot or ordinal)
//! - numeric scaling (standard or min-max)
//!
//! The fitted state is serialisable so a trained model can score new tables
//! with exactly the layout it was trained on.

mod config;
pub mod dates;
mod encoder;
mod imputer;
mod pipeline;
mod scaler;

pub use config::{PreprocessingConfig, PreprocessingStep};
pub use dates::DateConverter;
pub use encoder::{Encoder, EncoderType};
pub use imputer::{FillValue, ImputeStrategy, Imputer};
pub(crate) use imputer::numeric_values;
pub use pipeline::{columns_to_array2, FeatureMatrix, Preprocessor, PreprocessorState};
pub use scaler::{Scaler, ScalerParams, ScalerType};
