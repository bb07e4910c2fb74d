//! Sequential per-target build driver
//!
//! For each target: `go generate` → compile → optional startup compile →
//! normalize → package (multi-file mode). The first failing step aborts the
//! whole run; nothing is retried or cleaned up.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use super::archive::{normalize_output, package, remove_previous_output};
use super::params::BuildParam;
use super::targets::Target;
use super::toolchain::{generate_invocation, startup_invocation, toolchain_for};
use super::BuildContext;
use crate::config::Compiler;
use crate::error::{hints, BuilderError, Step};
use crate::exec::subprocess::{CommandRunner, Invocation};
use crate::utils::paths::ensure_dir;
use crate::utils::terminal::{create_spinner, print_success, print_target_header};

/// What one target produced
#[derive(Debug, Clone)]
pub struct TargetOutput {
    pub target: Target,
    /// Normalized binary; inside the archive once packaged
    pub binary: PathBuf,
    pub archive: Option<PathBuf>,
    pub duration: Duration,
}

pub struct Driver<'a> {
    ctx: &'a BuildContext,
    runner: &'a mut dyn CommandRunner,
}

impl<'a> Driver<'a> {
    pub fn new(ctx: &'a BuildContext, runner: &'a mut dyn CommandRunner) -> Self {
        Self { ctx, runner }
    }

    /// Fail early when a required program is not on PATH
    pub fn preflight(&self, params: &[BuildParam]) -> Result<()> {
        if !self.runner.has_program("go") {
            return Err(BuilderError::missing_tool("go", "go generate", hints::go()).into());
        }
        if params.iter().any(|p| p.compiler == Compiler::Xgo) && !self.runner.has_program("xgo")
        {
            return Err(BuilderError::missing_tool("xgo", "cross compiling", hints::xgo()).into());
        }
        Ok(())
    }

    /// Build every target in order
    pub fn run(&mut self, targets: &[Target]) -> Result<Vec<TargetOutput>> {
        let ctx = self.ctx;
        let params: Vec<BuildParam<'a>> = targets
            .iter()
            .map(|target| BuildParam::derive(ctx, target))
            .collect();
        self.preflight(&params)?;

        let total = params.len();
        let mut outputs = Vec::with_capacity(total);
        for (index, param) in params.iter().enumerate() {
            print_target_header(
                index + 1,
                total,
                &format!("{} with {}", param.target, param.compiler),
            );
            let output = self.build_target(param)?;
            print_success(&format!(
                "{} done in {:.1}s",
                param.target,
                output.duration.as_secs_f64()
            ));
            outputs.push(output);
        }

        Ok(outputs)
    }

    fn build_target(&mut self, param: &BuildParam) -> Result<TargetOutput> {
        let start = Instant::now();
        if !self.ctx.single_file {
            ensure_dir(&param.release_dir)?;
        }
        remove_previous_output(param)?;

        self.run_step(param, Step::Generate, &generate_invocation(param))?;

        let toolchain = toolchain_for(param.compiler);
        self.run_step(param, Step::Compile, &toolchain.build_invocation(param))?;

        if let Some(startup) = startup_invocation(param) {
            self.run_step(param, Step::Startup, &startup)?;
        }

        let binary = normalize_output(param)?;

        let archive = if self.ctx.single_file {
            None
        } else {
            let spinner = create_spinner(&format!(
                "Packaging {}",
                param.archive_path().display()
            ));
            let archive = package(param);
            spinner.finish_and_clear();
            let archive = archive
                .with_context(|| format!("{} failed for {}", Step::Package, param.target))?;
            Some(archive)
        };

        Ok(TargetOutput {
            target: param.target.clone(),
            binary,
            archive,
            duration: start.elapsed(),
        })
    }

    fn run_step(&mut self, param: &BuildParam, step: Step, invocation: &Invocation) -> Result<()> {
        let result = self
            .runner
            .run(invocation)
            .with_context(|| format!("{} failed for {}", step, param.target))?;

        if !result.success {
            return Err(BuilderError::step_failed(
                param.target.to_string(),
                step,
                format!("{} exited with status {}", invocation.program, result.exit_code),
            )
            .into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::config::Config;
    use crate::exec::subprocess::CommandResult;

    /// Records invocations and fakes compiler output
    struct RecordingRunner {
        calls: Vec<Invocation>,
        programs: Vec<&'static str>,
        fail_program: Option<&'static str>,
    }

    impl RecordingRunner {
        fn new() -> Self {
            Self {
                calls: Vec::new(),
                programs: vec!["go", "xgo"],
                fail_program: None,
            }
        }

        fn steps(&self) -> Vec<String> {
            self.calls
                .iter()
                .map(|c| format!("{} {}", c.program, c.args.first().cloned().unwrap_or_default()))
                .collect()
        }

        fn fake_output(invocation: &Invocation) {
            let path = match invocation.program.as_str() {
                "xgo" => {
                    let dest = Path::new(invocation.flag_value("-dest").unwrap());
                    let out = invocation.flag_value("-out").unwrap();
                    let target = invocation.flag_value("-targets").unwrap().replace('/', "-");
                    dest.join(format!("{}-{}", out, target))
                }
                _ => match invocation.flag_value("-o") {
                    Some(output) => PathBuf::from(output),
                    None => return,
                },
            };
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, b"binary").unwrap();
        }
    }

    impl CommandRunner for RecordingRunner {
        fn run(&mut self, invocation: &Invocation) -> Result<CommandResult> {
            self.calls.push(invocation.clone());
            let success = self.fail_program != Some(invocation.program.as_str());
            if success {
                Self::fake_output(invocation);
            }
            Ok(CommandResult {
                success,
                exit_code: if success { 0 } else { 2 },
                duration: Duration::ZERO,
            })
        }

        fn has_program(&self, program: &str) -> bool {
            self.programs.contains(&program)
        }
    }

    fn packaged_config(project: &Path) -> Config {
        std::fs::create_dir_all(project.join("config")).unwrap();
        std::fs::write(project.join("config/ua.txt"), "ua").unwrap();

        let mut config = Config::default();
        config.copy_files = vec!["config/ua.txt".to_string()];
        config.make_dirs = vec!["public/upload".to_string()];
        config
    }

    fn single_file_config() -> Config {
        let mut config = Config::default();
        config.copy_files.clear();
        config.make_dirs.clear();
        config.vendor_misc_dirs.clear();
        config
    }

    fn context(config: Config, project: &Path, dist: &Path) -> BuildContext {
        BuildContext::new(
            config,
            project.to_path_buf(),
            dist.to_path_buf(),
            "0123abcd".to_string(),
            true,
        )
    }

    #[test]
    fn test_multi_file_step_order() {
        let project = tempfile::tempdir().unwrap();
        let dist = tempfile::tempdir().unwrap();
        let mut config = packaged_config(project.path());
        config.startup_package = "startup@v1.0.0".to_string();
        let ctx = context(config, project.path(), dist.path());

        let mut runner = RecordingRunner::new();
        let outputs = Driver::new(&ctx, &mut runner)
            .run(&[Target::new("linux", "arm-7")])
            .unwrap();

        assert_eq!(
            runner.steps(),
            vec!["go generate", "xgo -go", "go build"]
        );
        assert_eq!(outputs.len(), 1);
        let archive = outputs[0].archive.as_ref().unwrap();
        assert_eq!(archive, &dist.path().join("nging_linux_arm-7.tar.gz"));
        assert!(archive.is_file());
        assert!(dist.path().join("nging_linux_arm-7.tar.gz.sha256").is_file());
        assert!(!dist.path().join("nging_linux_arm-7").exists());
    }

    #[test]
    fn test_single_file_builds_each_target() {
        let dist = tempfile::tempdir().unwrap();
        let mut config = single_file_config();
        config.compiler = Compiler::Go;
        let ctx = context(config, dist.path(), dist.path());

        let mut runner = RecordingRunner::new();
        runner.programs = vec!["go"];
        let outputs = Driver::new(&ctx, &mut runner)
            .run(&[Target::new("linux", "amd64"), Target::new("windows", "386")])
            .unwrap();

        assert_eq!(outputs.len(), 2);
        assert!(outputs.iter().all(|o| o.archive.is_none()));
        assert!(dist.path().join("nging-linux-amd64").is_file());
        assert!(dist.path().join("nging-linux-amd64.sha256").is_file());
        assert!(dist.path().join("nging-windows-386.exe").is_file());
        assert_eq!(runner.calls.len(), 4);
    }

    #[test]
    fn test_failing_compile_aborts_run() {
        let dist = tempfile::tempdir().unwrap();
        let ctx = context(single_file_config(), dist.path(), dist.path());

        let mut runner = RecordingRunner::new();
        runner.fail_program = Some("xgo");
        let err = Driver::new(&ctx, &mut runner)
            .run(&[Target::new("linux", "amd64"), Target::new("linux", "386")])
            .unwrap_err();

        match err.downcast_ref::<BuilderError>() {
            Some(BuilderError::StepFailed { target, step, .. }) => {
                assert_eq!(target, "linux/amd64");
                assert_eq!(*step, Step::Compile);
            }
            other => panic!("unexpected error: {:?}", other),
        }
        // second target never started
        assert_eq!(runner.steps(), vec!["go generate", "xgo -go"]);
    }

    #[test]
    fn test_stale_single_file_output_removed_before_compile() {
        let dist = tempfile::tempdir().unwrap();
        let ctx = context(single_file_config(), dist.path(), dist.path());
        let stale = dist.path().join("nging-darwin-amd64");
        std::fs::write(&stale, b"OLD").unwrap();
        std::fs::write(dist.path().join("nging-darwin-amd64.sha256"), "old").unwrap();

        let mut runner = RecordingRunner::new();
        runner.fail_program = Some("xgo");
        Driver::new(&ctx, &mut runner)
            .run(&[Target::new("darwin", "amd64")])
            .unwrap_err();

        assert!(!stale.exists());
        assert!(!dist.path().join("nging-darwin-amd64.sha256").exists());
    }

    #[test]
    fn test_preflight_requires_xgo() {
        let dist = tempfile::tempdir().unwrap();
        let ctx = context(single_file_config(), dist.path(), dist.path());

        let mut runner = RecordingRunner::new();
        runner.programs = vec!["go"];
        let err = Driver::new(&ctx, &mut runner)
            .run(&[Target::new("linux", "amd64")])
            .unwrap_err();

        match err.downcast_ref::<BuilderError>() {
            Some(BuilderError::MissingTool { tool, .. }) => assert_eq!(tool, "xgo"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(runner.calls.is_empty());
    }

    #[test]
    fn test_fallback_targets_skip_xgo_check() {
        let dist = tempfile::tempdir().unwrap();
        let ctx = context(single_file_config(), dist.path(), dist.path());

        let mut runner = RecordingRunner::new();
        runner.programs = vec!["go"];
        Driver::new(&ctx, &mut runner)
            .run(&[Target::new("freebsd", "amd64")])
            .unwrap();

        assert_eq!(runner.steps(), vec!["go generate", "go build"]);
        assert!(dist.path().join("nging-freebsd-amd64").is_file());
    }
}
