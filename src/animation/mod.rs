pub mod values;
pub mod keys;
pub mod clip;
pub mod binding;

pub use keys::{AnimationKeyArray, Key, KeyCursor};
pub use clip::{Animation, AnimationTransformTrack};
pub use binding::AnimationBinding;
pub use values::Interpolatable;
