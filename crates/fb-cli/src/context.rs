//! Runtime context for CLI commands

use anyhow::{Context, Result};
use fb_core::{Project, Series, SeriesName};
use fb_db::{DuckDbBackend, SeriesStore};
use std::path::Path;
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Runtime context containing the loaded project and store connection
pub(crate) struct RuntimeContext {
    /// The loaded project
    pub project: Project,

    /// Series store
    pub store: Arc<dyn SeriesStore>,

    /// Resolved database path, for messages
    pub db_path: String,

    /// Verbose output enabled
    pub verbose: bool,
}

impl RuntimeContext {
    /// Create a new runtime context from global arguments
    pub async fn new(args: &GlobalArgs) -> Result<Self> {
        let project_path = Path::new(&args.project_dir);

        let project = match &args.config {
            Some(config_path) => Project::load_with_config_file(project_path, Path::new(config_path))
                .context("Failed to load project with configuration file")?,
            None => Project::load(project_path).context("Failed to load project")?,
        };

        let db_path = resolve_db_path(
            &project.root,
            args.database.as_deref(),
            &project.config.resolve_database_path(None),
        );
        let store: Arc<dyn SeriesStore> = Arc::new(
            DuckDbBackend::new(&db_path)
                .with_context(|| format!("Failed to connect to database at {db_path}"))?,
        );

        let ctx = Self {
            project,
            store,
            db_path,
            verbose: args.verbose,
        };
        ctx.verbose(&format!(
            "Project '{}' at {} ({} store at {})",
            ctx.project.config.name,
            ctx.project.root.display(),
            ctx.store.db_type(),
            ctx.db_path
        ));
        Ok(ctx)
    }

    /// Print verbose output if enabled
    pub fn verbose(&self, msg: &str) {
        if self.verbose {
            eprintln!("[verbose] {}", msg);
        }
    }

    /// Read a stored series, naming it in the error
    pub async fn read_series(&self, name: &SeriesName) -> Result<Series> {
        self.store
            .read_series(name)
            .await
            .with_context(|| format!("Failed to read series '{name}'"))
    }
}

/// A `--database` value is used as given, so relative paths follow the
/// working directory. Paths from the environment or `farebox.yml` are taken
/// relative to the project root.
fn resolve_db_path(root: &Path, cli_override: Option<&str>, configured: &str) -> String {
    if let Some(path) = cli_override {
        return path.to_string();
    }
    if configured == ":memory:" || Path::new(configured).is_absolute() {
        configured.to_string()
    } else {
        root.join(configured).display().to_string()
    }
}
