//! `codesync sync`: pull generated code into the working tree.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use inquire::{Confirm, InquireError};

use codesync_core::{config, Scheme};
use codesync_sync::{
    run, Collaborators, Confirmer, ExtensionConverter, MarkerImportResolver, ProjectSpec,
    RegionMerger, SyncError, SyncOptions, SyncReport, WriteResult,
};

use crate::auth;
use crate::remote::HttpRemote;

#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Path to codesync.json (default: search upwards from the current directory).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Projects to sync, as `<id>` or `<id>@<range>` (default: every stored project).
    #[arg(long = "projects", short = 'p', value_name = "ID[@RANGE]", num_args = 1..)]
    pub projects: Vec<ProjectSpec>,

    /// Restrict generation to these component ids or names.
    #[arg(long = "components", value_name = "ID|NAME", num_args = 1..)]
    pub components: Vec<String>,

    /// Only sync components that already exist locally.
    #[arg(long)]
    pub only_existing: bool,

    /// Overwrite files that cannot be merged or that carry managed-edit markers.
    #[arg(long)]
    pub force_overwrite: bool,

    /// Scheme for components synced for the first time.
    #[arg(long, value_name = "SCHEME")]
    pub new_component_scheme: Option<Scheme>,

    /// Append generated regions that have no place in the edited file.
    #[arg(long)]
    pub append_jsx_on_missing_base: bool,

    /// Also sync components and projects the requested ones depend on.
    #[arg(long)]
    pub recursive: bool,

    /// Also sync project dependencies.
    #[arg(long)]
    pub include_dependencies: bool,

    /// Fail instead of prompting.
    #[arg(long)]
    pub non_interactive: bool,

    /// Show what would be written without writing anything.
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        let config_path = match &self.config {
            Some(path) => path.clone(),
            None => {
                let cwd = std::env::current_dir().context("cannot read current directory")?;
                config::find_config_at(&cwd)?
            }
        };

        let auth = auth::load_from(&auth::auth_path()?)?;
        if !auth.is_complete() {
            log::warn!(
                "no credentials found; set CODESYNC_USER and CODESYNC_TOKEN or write {}",
                auth::AUTH_FILE_NAME
            );
        }
        let remote = HttpRemote::new(&auth);
        let collab = Collaborators {
            remote: &remote,
            merger: &RegionMerger,
            imports: &MarkerImportResolver,
            converter: &ExtensionConverter,
            confirmer: &InquireConfirmer,
        };

        let opts = self.options();
        let report = run(&config_path, &opts, &collab)
            .with_context(|| format!("sync failed for {}", config_path.display()))?;
        print_report(&report, config::base_dir(&config_path).as_path());
        Ok(())
    }

    fn options(&self) -> SyncOptions {
        SyncOptions {
            projects: self.projects.clone(),
            components: self.components.clone(),
            only_existing: self.only_existing,
            force_overwrite: self.force_overwrite,
            new_component_scheme: self.new_component_scheme,
            append_jsx_on_missing_base: self.append_jsx_on_missing_base,
            recursive: self.recursive,
            include_dependencies: self.include_dependencies,
            non_interactive: self.non_interactive,
            dry_run: self.dry_run,
        }
    }
}

struct InquireConfirmer;

impl Confirmer for InquireConfirmer {
    fn confirm(&self, message: &str) -> Result<bool, SyncError> {
        match Confirm::new(message).with_default(false).prompt() {
            Ok(answer) => Ok(answer),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(false),
            Err(e) => Err(SyncError::Prompt(e.to_string())),
        }
    }
}

fn print_report(report: &SyncReport, root: &Path) {
    let prefix = if report.dry_run { "[dry-run] " } else { "" };
    for project in &report.projects {
        println!(
            "{prefix}{} {} ({}) @ {}",
            "✓".green(),
            project.project_name.bold(),
            project.project_id,
            project.version
        );
    }

    let changed = report
        .writes
        .iter()
        .filter(|w| !matches!(w, WriteResult::Unchanged { .. }))
        .count();
    println!(
        "{prefix}{} file(s) changed, {} unchanged, {} merged",
        changed,
        report.writes.len() - changed,
        report.merged
    );

    for write in &report.writes {
        let shown = write.path().strip_prefix(root).unwrap_or(write.path()).display();
        match write {
            WriteResult::Written { .. } => println!("  {}  {shown}", "✎".yellow()),
            WriteResult::Unchanged { .. } => println!("  {}  {shown}", "·".dimmed()),
            WriteResult::WouldWrite { diff, .. } => {
                println!("  {}  {shown}", "~".cyan());
                print!("{diff}");
            }
        }
    }
}
