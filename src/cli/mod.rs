//! CLI Module
//!
//! Command-line interface for Scene Studio.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Scene Studio - AI layer compositor with per-layer undo history
#[derive(Parser, Debug)]
#[command(name = "scene-studio")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Scene session file (overrides the configured one)
    #[arg(short, long, global = true)]
    pub session: Option<PathBuf>,

    /// Use the offline mock generator
    #[arg(long, global = true)]
    pub mock: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Prompts shared by the generation commands
#[derive(Args, Debug, Clone, Default)]
pub struct PromptArgs {
    /// Main scene description
    #[arg(short, long)]
    pub prompt: String,

    /// Object description
    #[arg(long, default_value = "")]
    pub object: String,

    /// Background description
    #[arg(long, default_value = "")]
    pub background: String,

    /// Lighting description
    #[arg(long, default_value = "")]
    pub light: String,

    /// Mood description
    #[arg(long, default_value = "")]
    pub mood: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check the backend and pick models
    #[command(name = "connect")]
    Connect,

    /// Generate one layer
    #[command(name = "generate")]
    Generate {
        /// Layer kind: object, background, light, combo or custom
        kind: String,

        #[command(flatten)]
        prompts: PromptArgs,

        /// Prompt used verbatim for custom layers
        #[arg(long, default_value = "")]
        custom: String,
    },

    /// Generate object, background, light and combo layers
    #[command(name = "generate-all")]
    GenerateAll {
        #[command(flatten)]
        prompts: PromptArgs,
    },

    /// Edit a layer's current image
    #[command(name = "edit")]
    Edit {
        /// Layer to edit
        layer: String,

        /// What to change
        #[arg(short, long)]
        instruction: String,
    },

    /// Composite one layer over another
    #[command(name = "merge")]
    Merge {
        /// Foreground (top) layer
        foreground: String,

        /// Background (bottom) layer
        background: String,

        /// Extra blending note
        #[arg(long, default_value = "")]
        hint: String,

        /// Layer receiving the result
        #[arg(short, long, default_value = "combo")]
        target: String,
    },

    /// Undo the last version of a layer
    #[command(name = "undo")]
    Undo {
        /// Layer to step back
        layer: String,
    },

    /// Redo an undone version of a layer
    #[command(name = "redo")]
    Redo {
        /// Layer to step forward
        layer: String,
    },

    /// Print a layer's current version
    #[command(name = "current")]
    Current {
        /// Layer to show
        layer: String,

        /// Print the full content reference
        #[arg(long)]
        full: bool,
    },

    /// Show version history
    #[command(name = "history")]
    History {
        /// Layer to show (all layers when omitted)
        layer: Option<String>,
    },

    /// Split a scene prompt into layer descriptions
    #[command(name = "decompose")]
    Decompose {
        /// Main scene description
        #[arg(short, long)]
        prompt: String,
    },

    /// Rewrite a prompt to be more specific
    #[command(name = "improve")]
    Improve {
        /// Prompt to improve
        #[arg(long)]
        text: String,

        /// What the prompt is for (e.g. a layer kind)
        #[arg(long, default_value = "scene")]
        target: String,
    },

    /// List preferred models
    #[command(name = "models")]
    Models,

    /// List saved sessions under a directory
    #[command(name = "sessions")]
    Sessions {
        /// Directory to search
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}
