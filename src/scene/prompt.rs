//! Prompt construction for layer generation, editing and merging.

use serde::{Deserialize, Serialize};

use super::kind::LayerKind;

/// Appended to edits so the model changes only what was asked.
pub const KEEP_UNCHANGED: &str =
    "Keep everything else in the image exactly unchanged — same composition, same subjects.";

/// Appended to every generated layer.
pub const STYLE_GUARD: &str = "No watermarks, no text overlays, no logos. High quality output.";

/// Asks for a transparent backdrop on layers meant to be stacked.
pub const TRANSPARENT_BACKDROP: &str =
    "Render on a transparent/checkerboard background (like Photoshop) — no solid color bg.";

/// User-facing prompts for a scene. Empty fields mean "let the model infer".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenePrompts {
    pub main: String,
    pub object: String,
    pub background: String,
    pub light: String,
    pub mood: String,
    pub custom: String,
}

impl ScenePrompts {
    pub fn new(main: impl Into<String>) -> Self {
        Self {
            main: main.into(),
            ..Default::default()
        }
    }

    /// True when neither the object nor the background was described.
    pub fn needs_decomposition(&self) -> bool {
        self.object.trim().is_empty() && self.background.trim().is_empty()
    }

    /// Sub-prompts taken from a decomposition, keeping the main prompt.
    pub fn with_decomposition(&self, decomposition: &Decomposition) -> Self {
        Self {
            main: self.main.clone(),
            object: decomposition.object.clone(),
            background: decomposition.background.clone(),
            light: decomposition.light.clone(),
            mood: decomposition.mood.clone(),
            custom: self.custom.clone(),
        }
    }

    /// The sub-prompts as a decomposition.
    pub fn decomposition(&self) -> Decomposition {
        Decomposition {
            object: self.object.clone(),
            background: self.background.clone(),
            light: self.light.clone(),
            mood: self.mood.clone(),
        }
    }
}

/// A scene prompt split into per-layer descriptions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decomposition {
    pub object: String,
    pub background: String,
    pub light: String,
    pub mood: String,
}

fn or_default<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

/// Prompt for generating one layer of a scene.
pub fn layer_prompt(kind: LayerKind, prompts: &ScenePrompts) -> String {
    let base = format!(
        "Scene: {}\nMood: {}\n",
        prompts.main,
        or_default(&prompts.mood, "neutral")
    );

    match kind {
        LayerKind::Object => format!(
            "{base}Generate ONLY the isolated main subject/object.\n\
             Object: {}\n\
             Lighting: {}\n\
             {TRANSPARENT_BACKDROP}\n{STYLE_GUARD}",
            or_default(&prompts.object, "infer from scene"),
            or_default(&prompts.light, "neutral studio"),
        ),
        LayerKind::Light => format!(
            "{base}Generate ONLY a lighting/glow/atmosphere effects layer.\n\
             Lighting: {}\n\
             Minimal geometry — light effects only.\n{TRANSPARENT_BACKDROP}\n{STYLE_GUARD}",
            or_default(&prompts.light, "cinematic volumetric light, soft bloom"),
        ),
        LayerKind::Background => format!(
            "{base}Generate ONLY the background environment. No main subject in it.\n\
             Background: {}\n\
             Lighting: {}\n{STYLE_GUARD}",
            or_default(&prompts.background, "infer fitting background from scene"),
            or_default(&prompts.light, "match the mood"),
        ),
        LayerKind::Combo => format!(
            "Render the full scene as one unified image:\n\
             Scene: {}\nMain object: {}\n\
             Background: {}\nLighting: {}\nMood: {}\n{STYLE_GUARD}",
            prompts.main,
            or_default(&prompts.object, "infer"),
            or_default(&prompts.background, "infer"),
            or_default(&prompts.light, "infer"),
            prompts.mood,
        ),
        LayerKind::Custom => or_default(&prompts.custom, &prompts.main).to_string(),
    }
}

/// Instruction for editing an existing image.
pub fn edit_prompt(instruction: &str) -> String {
    format!("{}\n{}", instruction, KEEP_UNCHANGED)
}

/// Instruction for compositing a foreground layer over a background layer.
///
/// The model receives the foreground image first and the background second.
pub fn merge_prompt(fg_name: &str, bg_name: &str, hint: &str) -> String {
    let extra = if hint.trim().is_empty() {
        String::new()
    } else {
        format!("\nExtra blending note: {}", hint)
    };

    format!(
        "Composite these two layers into one cohesive image:\n\
         \x20 • Image 1 = FOREGROUND (top layer): {fg_name}\n\
         \x20 • Image 2 = BACKGROUND (bottom layer): {bg_name}\n\n\
         Place foreground elements naturally in front of the background. \
         Match lighting, blend edges seamlessly. One unified final image. \
         No new objects added. No watermarks.{extra}"
    )
}

/// Request to rewrite a prompt so it is more specific.
pub fn improve_prompt(text: &str, target: &str) -> String {
    format!(
        "Improve this image editing/generation prompt for target '{target}'. \
         Keep the intent, make it more specific and visually descriptive. \
         Output ONLY the improved prompt text, nothing else.\n\nPROMPT: {text}"
    )
}

/// Request to split a scene prompt into per-layer descriptions.
pub fn decompose_prompt(main: &str) -> String {
    format!(
        "Decompose this scene prompt into JSON with keys: object, background, light, mood. \
         Short concrete values. No markdown, no code fences.\n\nPROMPT: {main}"
    )
}

/// Parse a model's decomposition answer.
///
/// Code fences are stripped; anything that is not a JSON object yields an
/// empty decomposition.
pub fn parse_decomposition(text: &str) -> Decomposition {
    let cleaned = strip_code_fences(text);
    let value: serde_json::Value = match serde_json::from_str(&cleaned) {
        Ok(value) => value,
        Err(_) => return Decomposition::default(),
    };
    let Some(object) = value.as_object() else {
        return Decomposition::default();
    };

    let field = |key: &str| match object.get(key) {
        None | Some(serde_json::Value::Null) => String::new(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };

    Decomposition {
        object: field("object"),
        background: field("background"),
        light: field("light"),
        mood: field("mood"),
    }
}

/// Remove ``` fences along with any language tag right after them.
fn strip_code_fences(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(idx) = rest.find("```") {
        out.push_str(&rest[..idx]);
        rest = rest[idx + 3..].trim_start_matches(|c: char| c.is_ascii_lowercase());
    }
    out.push_str(rest);
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn prompts() -> ScenePrompts {
        ScenePrompts {
            main: "a fox in a snowy forest".to_string(),
            object: "red fox".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_object_prompt() {
        let prompt = layer_prompt(LayerKind::Object, &prompts());
        assert_eq!(
            prompt,
            "Scene: a fox in a snowy forest\nMood: neutral\n\
             Generate ONLY the isolated main subject/object.\n\
             Object: red fox\n\
             Lighting: neutral studio\n\
             Render on a transparent/checkerboard background (like Photoshop) — no solid color bg.\n\
             No watermarks, no text overlays, no logos. High quality output."
        );
    }

    #[test]
    fn test_background_prompt_infers_missing_fields() {
        let prompt = layer_prompt(LayerKind::Background, &prompts());
        assert!(prompt.contains("Background: infer fitting background from scene"));
        assert!(prompt.contains("Lighting: match the mood"));
        assert!(!prompt.contains("transparent"));
    }

    #[test]
    fn test_light_prompt_default() {
        let prompt = layer_prompt(LayerKind::Light, &prompts());
        assert!(prompt.contains("Lighting: cinematic volumetric light, soft bloom"));
    }

    #[test]
    fn test_combo_prompt_keeps_raw_mood() {
        let prompt = layer_prompt(LayerKind::Combo, &prompts());
        assert!(prompt.starts_with("Render the full scene as one unified image:"));
        assert!(prompt.contains("Main object: red fox"));
        assert!(prompt.contains("Mood: \n"));
    }

    #[test]
    fn test_custom_prompt_falls_back_to_main() {
        let mut p = prompts();
        assert_eq!(layer_prompt(LayerKind::Custom, &p), "a fox in a snowy forest");
        p.custom = "just the moon".to_string();
        assert_eq!(layer_prompt(LayerKind::Custom, &p), "just the moon");
    }

    #[test]
    fn test_merge_prompt_hint() {
        let without = merge_prompt("object", "background", "  ");
        assert!(without.contains("Image 1 = FOREGROUND (top layer): object"));
        assert!(without.ends_with("No watermarks."));

        let with = merge_prompt("object", "background", "soft shadows");
        assert!(with.ends_with("\nExtra blending note: soft shadows"));
    }

    #[test]
    fn test_edit_prompt() {
        assert_eq!(
            edit_prompt("make it blue"),
            format!("make it blue\n{}", KEEP_UNCHANGED)
        );
    }

    #[test]
    fn test_parse_decomposition_fenced() {
        let text = "```json\n{\"object\": \"fox\", \"background\": \"forest\", \"light\": \"dawn\", \"mood\": \"calm\"}\n```";
        let d = parse_decomposition(text);
        assert_eq!(d.object, "fox");
        assert_eq!(d.background, "forest");
        assert_eq!(d.light, "dawn");
        assert_eq!(d.mood, "calm");
    }

    #[test]
    fn test_parse_decomposition_non_string_and_missing() {
        let d = parse_decomposition("{\"object\": 3, \"mood\": null}");
        assert_eq!(d.object, "3");
        assert_eq!(d.background, "");
        assert_eq!(d.mood, "");
    }

    #[test]
    fn test_parse_decomposition_invalid() {
        assert_eq!(parse_decomposition("sure! here it is"), Decomposition::default());
        assert_eq!(parse_decomposition("[1, 2]"), Decomposition::default());
    }

    #[test]
    fn test_needs_decomposition() {
        assert!(ScenePrompts::new("x").needs_decomposition());
        assert!(!prompts().needs_decomposition());
    }
}
