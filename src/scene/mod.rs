//! Scene composition
//!
//! Layer kinds, prompt templates and the `Studio` session that generates
//! layers and records them in the layer history.

mod kind;
mod prompt;
mod studio;

pub use kind::LayerKind;
pub use prompt::{
    decompose_prompt, edit_prompt, improve_prompt, layer_prompt, merge_prompt,
    parse_decomposition, Decomposition, ScenePrompts, KEEP_UNCHANGED, STYLE_GUARD,
    TRANSPARENT_BACKDROP,
};
pub use studio::{SceneGeneration, Studio};
