//! Levelkit CLI
//!
//! Command-line interface for creating, editing and checking level files.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use levelkit_core::path_utils::save_display_name;
use levelkit_core::types::CONFIG_FILE;
use levelkit_core::{
    path_to_string, BuiltinContent, DirectoryContent, LayeredContent, Level, ObjectInstance, ObjectTemplate, OverrideResolver,
    ParameterSchema, ProjectConfig, SaveStore, TemplateRegistry, Transform, Value, ValueCodec, ValueType,
};

#[derive(Parser)]
#[command(name = "levelkit")]
#[command(about = "Level editor toolkit: templates, overrides and race validation")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new Levelkit project
    Init {
        /// Project name
        #[arg(short, long)]
        name: Option<String>,

        /// Directory to initialize (default: current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Create an empty level
    New {
        /// Level name
        name: String,

        /// Overwrite an existing save with the same name
        #[arg(long)]
        force: bool,
    },

    /// List saved levels
    List,

    /// List available templates and their editable fields
    Templates,

    /// Place a template in a level
    Place {
        /// Level name
        level: String,

        /// Logic key of the template to place
        logic_key: String,

        /// Position as x,y,z
        #[arg(long, default_value = "0,0,0")]
        at: String,

        /// Parameter override as name=value (repeatable)
        #[arg(long = "set", value_name = "NAME=VALUE")]
        overrides: Vec<String>,
    },

    /// Show every object of a level with its resolved parameters
    Inspect {
        /// Level name
        level: String,
    },

    /// Check that a level has exactly one start and one finish area
    Validate {
        /// Level name
        level: String,
    },

    /// Order checkpoints by distance from the start area
    Checkpoints {
        /// Level name
        level: String,

        /// Store the computed indices in the save file
        #[arg(long)]
        write: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("levelkit=info".parse().context("Invalid log directive")?),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init { name, path } => cmd_init(name, path)?,
        Commands::New { name, force } => cmd_new(&name, force)?,
        Commands::List => cmd_list()?,
        Commands::Templates => cmd_templates()?,
        Commands::Place {
            level,
            logic_key,
            at,
            overrides,
        } => cmd_place(&level, &logic_key, &at, &overrides)?,
        Commands::Inspect { level } => cmd_inspect(&level)?,
        Commands::Validate { level } => cmd_validate(&level)?,
        Commands::Checkpoints { level, write } => cmd_checkpoints(&level, write)?,
    }

    Ok(())
}

/// Configuration, templates and saves of the project in the working directory
struct Project {
    registry: TemplateRegistry,
    store: SaveStore,
}

impl Project {
    fn open() -> Result<Self> {
        let dir = std::env::current_dir().context("Failed to read current directory")?;
        let config = match ProjectConfig::find(&dir) {
            Some(path) => ProjectConfig::load(&path)
                .with_context(|| format!("Failed to load {}", path_to_string(&path)))?,
            None => ProjectConfig::default(),
        };

        let mut content = LayeredContent::new();
        for content_dir in config.content_dirs(&dir) {
            if content_dir.is_dir() {
                content.push(DirectoryContent::new(content_dir));
            } else {
                tracing::warn!("Content directory {} does not exist", path_to_string(&content_dir));
            }
        }
        if config.content.builtin {
            content.push(BuiltinContent);
        }

        let registry = TemplateRegistry::new(content);
        registry.initialize().context("Failed to load templates")?;

        let saves_dir = match &config.saves.dir {
            Some(saves) if saves.is_absolute() => saves.clone(),
            Some(saves) => dir.join(saves),
            None => SaveStore::default_dir(),
        };

        Ok(Self {
            registry,
            store: SaveStore::new(saves_dir),
        })
    }

    fn load(&self, name: &str) -> Result<Level> {
        let loaded = self
            .store
            .load_level(name, &self.registry)
            .with_context(|| format!("Failed to load level '{}'", name))?;
        for error in &loaded.unresolved {
            println!("warning: {}", error);
        }
        Ok(loaded.level)
    }

    fn save(&self, name: &str, level: &Level) -> Result<PathBuf> {
        self.store
            .save(name, level)
            .with_context(|| format!("Failed to save level '{}'", name))
    }
}

/// Initialize a new project
fn cmd_init(name: Option<String>, path: Option<PathBuf>) -> Result<()> {
    let project_dir = match path {
        Some(path) => path,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };
    let project_name = name.unwrap_or_else(|| {
        project_dir
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "MyLevels".to_string())
    });

    tracing::info!("Initializing Levelkit project: {}", project_name);

    let config_path = project_dir.join(CONFIG_FILE);
    if config_path.exists() {
        bail!("{} already exists", path_to_string(&config_path));
    }

    let saves_dir = project_dir.join("saves");
    let templates_dir = project_dir.join("templates");
    std::fs::create_dir_all(&saves_dir).context("Failed to create saves directory")?;
    std::fs::create_dir_all(templates_dir.join("assets")).context("Failed to create templates directory")?;

    let mut config = ProjectConfig {
        name: project_name.clone(),
        ..Default::default()
    };
    config.saves.dir = Some(PathBuf::from("saves"));
    config.content.dirs = vec![PathBuf::from("templates")];

    let config_json = serde_json::to_string_pretty(&config)?;
    std::fs::write(&config_path, config_json).context("Failed to write levelkit.json")?;

    println!("Initialized Levelkit project '{}' at {}", project_name, path_to_string(&project_dir));
    println!("\nProject structure:");
    println!("  levelkit.json       - Project configuration");
    println!("  saves/              - Level documents");
    println!("  templates/          - Custom templates (*.yaml, *.toml)");
    println!("  templates/assets/   - Asset names available to templates");
    println!("\nNext steps:");
    println!("  1. Run: levelkit new MyLevel");
    println!("  2. Run: levelkit place MyLevel StartArea --at 0,0,0");

    Ok(())
}

/// Create an empty level
fn cmd_new(name: &str, force: bool) -> Result<()> {
    let project = Project::open()?;
    if !force && project.store.load(name).is_ok() {
        bail!("Level '{}' already exists (use --force to overwrite)", name);
    }

    let path = project.save(name, &Level::new(name))?;
    println!("Created level '{}' at {}", name, path_to_string(&path));
    Ok(())
}

/// List saved levels
fn cmd_list() -> Result<()> {
    let project = Project::open()?;
    let saves = project.store.list_saves().context("Failed to list saves")?;

    if saves.is_empty() {
        println!("No saved levels in {}", path_to_string(project.store.dir()));
        return Ok(());
    }
    for file in &saves {
        println!("{}", save_display_name(file));
    }
    Ok(())
}

/// List templates
fn cmd_templates() -> Result<()> {
    let project = Project::open()?;
    let schema = ParameterSchema::global();

    for template in project.registry.templates() {
        println!("{} ({}) - {}", template.logic_key, template.template_type(), template.name);
        for field in schema.editable_fields(template.template_type()).iter() {
            let default = template
                .default_value(field.name)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string());
            let hidden = if field.show_in_inspector { "" } else { " (hidden)" };
            println!("    {:<20} {:<12} {}{}", field.name, field.value_type, default, hidden);
        }
    }

    for warning in project.registry.duplicate_warnings() {
        println!("warning: {}", warning);
    }
    for skipped in project.registry.skipped_templates() {
        println!("warning: {}", skipped);
    }
    Ok(())
}

/// Parse `name=value` into an override value for `template`'s field
fn parse_override(
    text: &str,
    schema: &ParameterSchema,
    codec: &ValueCodec<'_>,
    template: &ObjectTemplate,
) -> Result<(String, Value)> {
    let (name, raw) = text
        .split_once('=')
        .with_context(|| format!("Expected NAME=VALUE, got '{}'", text))?;
    let name = name.trim();
    let name = if name.starts_with('_') {
        name.to_string()
    } else {
        format!("_{}", name)
    };

    let Some(field) = schema.field(template.template_type(), &name) else {
        bail!("'{}' is not an editable field of {}", name, template.logic_key);
    };

    let value = codec
        .decode(raw, field.value_type)
        .with_context(|| format!("Invalid value for {}", name))?
        .with_context(|| format!("Missing value for {}", name))?;
    Ok((name, value))
}

/// Place a template
fn cmd_place(level_name: &str, logic_key: &str, at: &str, overrides: &[String]) -> Result<()> {
    let project = Project::open()?;
    let mut level = project.load(level_name)?;

    let template = project
        .registry
        .resolve(logic_key)
        .with_context(|| format!("Unknown template '{}'", logic_key))?;

    let codec = ValueCodec::with_assets(&project.registry);
    let position = match codec.decode(at, ValueType::Vector3).context("Invalid --at position")? {
        Some(Value::Vector3(v)) => v,
        _ => bail!("Invalid --at position '{}'", at),
    };

    let schema = ParameterSchema::global();
    let mut instance = ObjectInstance::new(template.clone(), Transform::at(position));
    for text in overrides {
        let (name, value) = parse_override(text, schema, &codec, &template)?;
        instance.set_override_value(&name, &value);
    }

    let id = instance.id;
    level.add_object(instance);
    project.save(level_name, &level)?;

    println!("Placed {} ({}) in '{}'", logic_key, id, level.name);
    Ok(())
}

/// Show objects and resolved parameters
fn cmd_inspect(level_name: &str) -> Result<()> {
    let project = Project::open()?;
    let level = project.load(level_name)?;
    let resolver = OverrideResolver::new(ParameterSchema::global()).with_assets(&project.registry);

    println!("Level '{}' ({} objects)", level.name, level.objects.len());
    for instance in &level.objects {
        let p = instance.position;
        println!("\n{} {} at ({}, {}, {})", instance.logic_key, instance.id, p.x, p.y, p.z);

        let Some(template) = instance.template() else {
            println!("    unresolved template; {} stored overrides", instance.overrides.len());
            continue;
        };

        for param in resolver.resolve_all(instance, template) {
            let marker = if param.overridden { "*" } else { " " };
            println!("  {} {:<20} {}", marker, param.field.name, param.value);
        }
    }
    Ok(())
}

/// Validate a level
fn cmd_validate(level_name: &str) -> Result<()> {
    let project = Project::open()?;
    let level = project.load(level_name)?;

    match level.validate() {
        Ok(()) => {
            println!("Level '{}' is valid", level.name);
            Ok(())
        }
        Err(e) => bail!("Level '{}' is invalid: {}", level.name, e),
    }
}

/// Compute checkpoint order
fn cmd_checkpoints(level_name: &str, write: bool) -> Result<()> {
    let project = Project::open()?;
    let mut level = project.load(level_name)?;

    let count = level.calculate_checkpoint_indices();
    let origin = level.start_position().unwrap_or_default();
    for (index, id) in level.checkpoint_order().iter().enumerate() {
        if let Some(instance) = level.find(*id) {
            println!(
                "{:>3}  {}  distance {:.2}",
                index,
                instance.id,
                instance.position.distance(origin)
            );
        }
    }
    println!("{} checkpoints", count);

    if write {
        let path = project.save(level_name, &level)?;
        println!("Wrote checkpoint indices to {}", path_to_string(&path));
    }
    Ok(())
}
