//! Build command implementation

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::resolve_project_path;
use crate::build::driver::{Driver, TargetOutput};
use crate::build::generate::write_generate_files;
use crate::build::targets::{select_targets, Target, TargetRegistry};
use crate::build::BuildContext;
use crate::config::Config;
use crate::exec::subprocess::SystemRunner;
use crate::utils::git::commit_id;
use crate::utils::paths::{absolutize, ensure_dir};
use crate::utils::terminal::{print_field, print_info, print_success};

/// Cross-compile the selected targets
#[derive(Debug, Clone)]
pub struct BuildCommand {
    pub conf: PathBuf,
    /// Comma-separated target names; `None` builds every registered target
    pub targets: Option<String>,
    pub minify: bool,
    /// Skip rewriting the go:generate files
    pub nomisc: bool,
    pub output_dir: Option<PathBuf>,
}

impl BuildCommand {
    pub fn execute(self, verbose: bool) -> Result<()> {
        let config = Config::load_from_path(&self.conf)?;

        // resolve targets before touching the project
        let registry = TargetRegistry::from_config(&config);
        let targets = select_targets(&registry, self.targets.as_deref())?;

        let project_path = resolve_project_path(&config)?;
        if !self.nomisc {
            write_generate_files(&config, &project_path)?;
        }

        let dist_dir = match &self.output_dir {
            Some(dir) => absolutize(dir)?,
            None => project_path.join("dist"),
        };

        print_field("ConfFile", self.conf.display());
        print_field("WorkDir", project_path.display());
        print_field("DistPath", dist_dir.display());
        ensure_dir(&dist_dir)?;

        let commit = commit_id(&project_path)?;
        let ctx = BuildContext::new(config, project_path, dist_dir, commit, self.minify);

        print_info(&format!(
            "Building {} for [{}]",
            ctx.executor(),
            target_names(&registry, &targets).join(", ")
        ));
        if verbose {
            print_field("Commit", &ctx.commit_id);
            print_field("BuildTime", &ctx.build_time);
            print_field("Mode", if ctx.single_file { "single file" } else { "archive" });
        }

        let mut runner = SystemRunner::new(verbose);
        let outputs = Driver::new(&ctx, &mut runner).run(&targets)?;

        print_summary(&ctx.dist_dir, &outputs);
        Ok(())
    }
}

/// Short names where registered, canonical form otherwise
fn target_names(registry: &TargetRegistry, targets: &[Target]) -> Vec<String> {
    targets
        .iter()
        .map(|t| {
            registry
                .name_of(t)
                .map(str::to_string)
                .unwrap_or_else(|| t.to_string())
        })
        .collect()
}

fn print_summary(dist_dir: &Path, outputs: &[TargetOutput]) {
    println!();
    for output in outputs {
        let artifact = output.archive.as_ref().unwrap_or(&output.binary);
        let name = artifact.strip_prefix(dist_dir).unwrap_or(artifact);
        println!(
            "  {:<16} {} ({:.1}s)",
            output.target.to_string(),
            name.display(),
            output.duration.as_secs_f64()
        );
    }
    print_success(&format!(
        "Built {} target(s) into {}",
        outputs.len(),
        dist_dir.display()
    ));
}
