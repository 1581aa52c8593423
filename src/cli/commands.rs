//! CLI Command Implementations
//!
//! Every command opens the scene session, runs one studio operation and
//! saves the session back if the operation changed it.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use walkdir::WalkDir;

use super::{Cli, Commands, PromptArgs};
use crate::config::StudioConfig;
use crate::error::Result;
use crate::generation::{
    detect_with, Artifact, GeminiService, GenerationService, MockGenerator, ModelSelection, IMAGE_MODELS,
    TEXT_MODELS,
};
use crate::history::{LayerHistoryStore, SceneSnapshot, Version};
use crate::scene::{LayerKind, ScenePrompts, Studio};

type DynStudio = Studio<Box<dyn GenerationService>>;

/// Resolved settings for one CLI invocation.
#[derive(Debug, Clone)]
pub struct Session {
    pub config: StudioConfig,
    pub path: PathBuf,
    pub mock: bool,
}

impl Session {
    pub fn new(config: StudioConfig, session: Option<PathBuf>, mock: bool) -> Self {
        let path = session.unwrap_or_else(|| config.session_path.clone());
        Self { config, path, mock }
    }

    /// Load the scene and attach the configured backend.
    pub fn open(&self) -> Result<DynStudio> {
        self.open_with(self.service())
    }

    /// Load the scene and attach `service`.
    ///
    /// Models not pinned in the config are picked from what the backend
    /// lists.
    pub fn open_with(&self, service: Box<dyn GenerationService>) -> Result<DynStudio> {
        let store = LayerHistoryStore::load_or_default(&self.path, self.config.max_history)?;
        let models = if self.config.image_model.is_some() && self.config.text_model.is_some() {
            self.config.models_over(ModelSelection::default())
        } else {
            self.config.models_over(detect_with(service.as_ref()))
        };
        Ok(Studio::with_store(service, store, models))
    }

    /// Persist the scene held by `studio`.
    pub fn save(&self, studio: &DynStudio) -> Result<()> {
        studio.store().save(&self.path)
    }

    fn service(&self) -> Box<dyn GenerationService> {
        if self.mock {
            return Box::new(MockGenerator::new());
        }
        match &self.config.api_key {
            Some(key) if self.config.has_api_key() => {
                if !cfg!(feature = "gemini") {
                    warn!("API key configured but HTTP support is not compiled in; using mock");
                    return Box::new(MockGenerator::new());
                }
                Box::new(GeminiService::with_config(
                    key.clone(),
                    self.config.api_base_url.clone(),
                    self.config.request_timeout_ms,
                ))
            }
            _ => {
                info!("No API key configured; using mock generator");
                Box::new(MockGenerator::new())
            }
        }
    }
}

/// Dispatch a parsed command line.
pub fn run(cli: Cli, config: StudioConfig) -> Result<()> {
    let session = Session::new(config, cli.session, cli.mock);

    let Some(command) = cli.command else {
        println!("Scene Studio v{}", env!("CARGO_PKG_VERSION"));
        println!("Use --help for available commands");
        return Ok(());
    };

    match command {
        Commands::Connect => connect(&session),
        Commands::Generate {
            kind,
            prompts,
            custom,
        } => generate(&session, &kind, &prompts, &custom),
        Commands::GenerateAll { prompts } => generate_all(&session, &prompts),
        Commands::Edit { layer, instruction } => edit(&session, &layer, &instruction),
        Commands::Merge {
            foreground,
            background,
            hint,
            target,
        } => merge(&session, &foreground, &background, &hint, &target),
        Commands::Undo { layer } => undo(&session, &layer),
        Commands::Redo { layer } => redo(&session, &layer),
        Commands::Current { layer, full } => current(&session, &layer, full),
        Commands::History { layer } => show_history(&session, layer.as_deref()),
        Commands::Decompose { prompt } => decompose(&session, &prompt),
        Commands::Improve { text, target } => improve(&session, &text, &target),
        Commands::Models => {
            list_models();
            Ok(())
        }
        Commands::Sessions { dir } => list_sessions(&dir),
    }
}

fn scene_prompts(args: &PromptArgs, custom: &str) -> ScenePrompts {
    ScenePrompts {
        main: args.prompt.clone(),
        object: args.object.clone(),
        background: args.background.clone(),
        light: args.light.clone(),
        mood: args.mood.clone(),
        custom: custom.to_string(),
    }
}

fn print_version(layer: &str, version: &Version) {
    println!(
        "{}: version #{} ({})",
        layer,
        version.sequence,
        version.describe()
    );
}

/// Check the backend answers and report the models it would use.
pub fn connect(session: &Session) -> Result<()> {
    let mut studio = session.open()?;
    let detected = studio.connect()?;
    let models = session.config.models_over(detected);

    println!("Backend: {}", studio.service().info().name);
    println!("Image model: {}", models.image_model);
    println!("Text model: {}", models.text_model);
    Ok(())
}

/// Generate one layer.
pub fn generate(session: &Session, kind: &str, args: &PromptArgs, custom: &str) -> Result<()> {
    let kind: LayerKind = kind.parse()?;
    info!("Generating {} layer", kind);

    let studio = session.open()?;
    let version = studio.generate_layer(kind, &scene_prompts(args, custom))?;
    session.save(&studio)?;

    print_version(kind.as_str(), &version);
    Ok(())
}

/// Generate every scene layer.
pub fn generate_all(session: &Session, args: &PromptArgs) -> Result<()> {
    info!("Generating all layers");

    let studio = session.open()?;
    let generation = studio.generate_all(&scene_prompts(args, ""))?;
    session.save(&studio)?;

    let d = &generation.decomposition;
    println!("Object: {}", d.object);
    println!("Background: {}", d.background);
    println!("Light: {}", d.light);
    println!("Mood: {}", d.mood);
    for (kind, version) in &generation.versions {
        print_version(kind.as_str(), version);
    }
    Ok(())
}

/// Edit a layer's current image.
pub fn edit(session: &Session, layer: &str, instruction: &str) -> Result<()> {
    info!("Editing layer '{}'", layer);

    let studio = session.open()?;
    let version = studio.edit(layer, instruction)?;
    session.save(&studio)?;

    print_version(layer, &version);
    Ok(())
}

/// Merge two layers into a target layer.
pub fn merge(session: &Session, fg: &str, bg: &str, hint: &str, target: &str) -> Result<()> {
    info!("Merging '{}' over '{}' into '{}'", fg, bg, target);

    let studio = session.open()?;
    let version = studio.merge(fg, bg, hint, target)?;
    session.save(&studio)?;

    print_version(target, &version);
    Ok(())
}

/// Step a layer back one version.
pub fn undo(session: &Session, layer: &str) -> Result<()> {
    info!("Undoing last version of '{}'", layer);

    let studio = session.open()?;
    let version = studio.undo(layer)?;
    session.save(&studio)?;

    println!("Undone. Now at:");
    print_version(layer, &version);
    Ok(())
}

/// Step a layer forward one version.
pub fn redo(session: &Session, layer: &str) -> Result<()> {
    info!("Redoing next version of '{}'", layer);

    let studio = session.open()?;
    let version = studio.redo(layer)?;
    session.save(&studio)?;

    println!("Redone. Now at:");
    print_version(layer, &version);
    Ok(())
}

/// Print the current version of a layer.
pub fn current(session: &Session, layer: &str, full: bool) -> Result<()> {
    let studio = session.open()?;
    let version = studio.current(layer)?;

    print_version(layer, &version);
    let artifact = Artifact::from_content_ref(&version.content_ref)?;
    println!(
        "{}, {} bytes, sha256 {}",
        artifact.mime_type,
        artifact.data.len(),
        artifact.digest()
    );
    if full {
        println!("{}", version.content_ref.as_str());
    }
    Ok(())
}

/// Show the history of one layer or of every layer.
pub fn show_history(session: &Session, layer: Option<&str>) -> Result<()> {
    let studio = session.open()?;
    let store = studio.store();

    let layers: Vec<String> = match layer {
        Some(id) => vec![id.to_string()],
        None => store
            .layer_ids()
            .into_iter()
            .map(|id| id.as_str().to_string())
            .collect(),
    };

    if layers.is_empty() {
        println!("No layers in this scene.");
        return Ok(());
    }

    for id in layers {
        let versions = store.history(&id);
        println!("Layer '{}' ({} versions):", id, versions.len());
        println!("{:-<60}", "");
        if versions.is_empty() {
            println!("  (empty)");
        }
        let cursor = store.cursor(&id);
        for (i, version) in versions.iter().enumerate() {
            let marker = if Some(i) == cursor { "→" } else { " " };
            println!(
                "{} #{:<4} {} {}",
                marker,
                version.sequence,
                version.timestamp.format("%Y-%m-%d %H:%M:%S"),
                version.describe()
            );
        }
        println!();
    }
    Ok(())
}

/// Split a prompt into layer descriptions.
pub fn decompose(session: &Session, prompt: &str) -> Result<()> {
    let studio = session.open()?;
    let decomposition = studio.decompose(prompt)?;
    println!("{}", serde_json::to_string_pretty(&decomposition)?);
    Ok(())
}

/// Rewrite a prompt.
pub fn improve(session: &Session, text: &str, target: &str) -> Result<()> {
    let studio = session.open()?;
    println!("{}", studio.improve(text, target)?);
    Ok(())
}

/// Print the model preference lists.
pub fn list_models() {
    println!("Image models (preferred first):");
    for model in IMAGE_MODELS {
        println!("  {}", model);
    }
    println!("Text models (preferred first):");
    for model in TEXT_MODELS {
        println!("  {}", model);
    }
}

/// Saved scene sessions found under `dir`.
pub fn find_sessions(dir: &Path) -> Vec<(PathBuf, SceneSnapshot)> {
    WalkDir::new(dir)
        .max_depth(3)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "json"))
        .filter_map(|entry| {
            let content = fs::read_to_string(entry.path()).ok()?;
            match serde_json::from_str::<SceneSnapshot>(&content) {
                Ok(snapshot) => Some((entry.path().to_path_buf(), snapshot)),
                Err(e) => {
                    debug!("Skipping {}: {}", entry.path().display(), e);
                    None
                }
            }
        })
        .collect()
}

/// List saved scene sessions.
pub fn list_sessions(dir: &Path) -> Result<()> {
    let sessions = find_sessions(dir);
    if sessions.is_empty() {
        println!("No sessions under {}", dir.display());
        return Ok(());
    }

    for (path, snapshot) in sessions {
        let versions: usize = snapshot.layers.values().map(|l| l.versions.len()).sum();
        println!(
            "{}  saved {}  {} layers, {} versions",
            path.display(),
            snapshot.saved_at.format("%Y-%m-%d %H:%M:%S"),
            snapshot.layers.len(),
            versions
        );
    }
    Ok(())
}
