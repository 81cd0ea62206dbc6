//! `codesync init [--dir <path>] [--src-dir <path>] [--lang ts|js] [--scheme blackbox|direct]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use codesync_core::{config, Lang, Scheme};

/// Create a `codesync.json` with default settings.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Directory that will hold codesync.json.
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,

    /// Root of the component sources, relative to --dir.
    #[arg(long, value_name = "PATH")]
    pub src_dir: Option<String>,

    /// Script flavour of generated modules: ts | js.
    #[arg(long)]
    pub lang: Option<Lang>,

    /// Default scheme for new components: blackbox | direct.
    #[arg(long)]
    pub scheme: Option<Scheme>,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let dir = self
            .dir
            .canonicalize()
            .with_context(|| format!("cannot resolve path '{}'", self.dir.display()))?;
        let existed = dir.join(config::CONFIG_FILE_NAME).exists();

        let opts = config::InitOptions {
            src_dir: self.src_dir,
            lang: self.lang,
            scheme: self.scheme,
        };
        let (path, cfg) = config::init_at(&dir, opts)
            .with_context(|| format!("failed to init {}", dir.display()))?;

        if existed {
            println!(
                "{} {} already exists ({} project(s)); left unchanged",
                "·".dimmed(),
                path.display(),
                cfg.projects.len()
            );
        } else {
            println!("{} Created {}", "✓".green(), path.display());
            println!("  srcDir: {}  lang: {}  scheme: {}", cfg.src_dir, cfg.code.lang, cfg.code.scheme);
        }
        Ok(())
    }
}
