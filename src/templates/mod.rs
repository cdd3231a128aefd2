//! Template input and output
//!
//! Crawler JSON in, canonical [`Template`](crate::models::Template)s out, and
//! the reverse trip once predictions are merged back in.

pub mod merge;
pub mod normalize;

pub use merge::{merge, write_output, EnrichedOutput, OutputMeta};
pub use normalize::{
    detect_shape, load_templates, normalize, normalize_str, InputFormat, InputShape,
    NormalizedInput,
};
