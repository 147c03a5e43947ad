//! Rooftop core: pure content model and the field normalizer.
mod content_type;
mod context;
mod error;
mod normalize;

pub use content_type::{
    ContentTypeSpec, CustomTransform, OutputFn, OutputPath, TemplateSpec, Transform,
    RESERVED_OPTION_KEYS,
};
pub use context::{ResultMap, SharedContext, RESULT_KEY};
pub use error::TransformError;
pub use normalize::{is_falsy, normalize, normalize_in_place, MAX_RELATIONSHIP_DEPTH};
