//! Analyze command implementation
//!
//! 1. Load configuration (defaults, user file, codesight.toml, environment)
//! 2. Walk the inputs and read every supported source file
//! 3. Run the detectors, plus the model when `--ai` is set
//! 4. Combine per-file results and render the report

use crate::ai::{AiClient, AugmentationCoordinator};
use crate::config::CodesightConfig;
use crate::detectors::ScanProfile;
use crate::models::{Language, Severity, SourceUnit};
use crate::pipeline::{load_unit, Analyzer};
use crate::reporters::{self, OutputFormat};

use anyhow::{Context, Result};
use console::style;
use ignore::WalkBuilder;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

pub(super) struct AnalyzeOptions {
    pub paths: Vec<PathBuf>,
    pub format: Option<String>,
    pub output: Option<PathBuf>,
    pub ai: bool,
    pub profile: Option<String>,
    pub min_severity: Option<String>,
    pub fail_under: Option<u32>,
    pub skip_detectors: Vec<String>,
}

pub(super) fn run(options: AnalyzeOptions) -> Result<()> {
    let start = Instant::now();
    let root = config_root(&options.paths);
    let mut config = CodesightConfig::load(&root);

    if let Some(profile) = &options.profile {
        config.detectors.profile = profile
            .parse::<ScanProfile>()
            .map_err(anyhow::Error::msg)?;
    }
    for name in &options.skip_detectors {
        if !config.detectors.disabled.contains(name) {
            config.detectors.disabled.push(name.clone());
        }
    }
    let min_severity = options
        .min_severity
        .as_deref()
        .map(str::parse::<Severity>)
        .transpose()
        .map_err(anyhow::Error::msg)?;
    let format = resolve_format(options.format.as_deref(), options.output.as_deref())?;

    let units = collect_units(&options.paths)?;
    if units.is_empty() {
        anyhow::bail!("No supported source files found");
    }

    let analyzer = build_analyzer(&config, options.ai || config.ai.enabled)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(spinner_style());
    spinner.set_message(format!("Analyzing {} files...", units.len()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(analyzer.analyze_all(&units));

    spinner.finish_and_clear();
    debug!("Analysis finished in {:.2?}", start.elapsed());

    let shown = match min_severity {
        Some(min) => result.filtered(min),
        None => result.clone(),
    };
    let rendered = reporters::report_with_format(&shown, format)?;

    match &options.output {
        Some(path) => {
            std::fs::write(path, &rendered)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{} Report written to: {}",
                style("✓").green(),
                style(path.display()).cyan()
            );
        }
        None => println!("{}", rendered),
    }

    check_fail_threshold(options.fail_under, result.overall_score);
    Ok(())
}

/// Analyzer for a configuration, with model augmentation when `ai` is set
pub(super) fn build_analyzer(config: &CodesightConfig, ai: bool) -> Result<Analyzer> {
    let analyzer = Analyzer::from_config(config);
    if !ai {
        return Ok(analyzer);
    }

    let client_config = config
        .ai
        .client_config()
        .context("Invalid [ai] configuration")?;
    let client = AiClient::from_env(client_config)?;
    eprintln!(
        "{} AI review with {} ({:?})",
        style("→").dim(),
        client.model(),
        client.backend()
    );
    let coordinator = AugmentationCoordinator::new()
        .with_sample_chars(config.ai.sample_chars)
        .with_timeout(config.ai.timeout());
    Ok(analyzer.with_augmentation(coordinator, Arc::new(client)))
}

/// Directory whose codesight.toml applies to this run
fn config_root(paths: &[PathBuf]) -> PathBuf {
    match paths.first() {
        Some(p) if p.is_dir() => p.clone(),
        Some(p) => p
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(".")),
        None => PathBuf::from("."),
    }
}

/// Explicit format wins, then the output file's extension, then text
fn resolve_format(format: Option<&str>, output: Option<&Path>) -> Result<OutputFormat> {
    if let Some(name) = format {
        return name.parse();
    }
    Ok(output
        .and_then(reporters::format_for_path)
        .unwrap_or_default())
}

pub(super) fn is_supported(path: &Path) -> bool {
    Language::from_path(&path.to_string_lossy()) != Language::Other
}

/// Read every supported file under the inputs. Directory walks honour
/// .gitignore and skip hidden entries; unreadable files are skipped.
fn collect_units(paths: &[PathBuf]) -> Result<Vec<SourceUnit>> {
    let mut units = Vec::new();

    for input in paths {
        if input.is_file() {
            units.push(load_unit(input, None)?);
            continue;
        }
        if !input.is_dir() {
            anyhow::bail!("Path does not exist: {}", input.display());
        }

        let walker = WalkBuilder::new(input)
            .hidden(true)
            .git_ignore(true)
            .git_global(false)
            .git_exclude(true)
            .build();

        let mut files: Vec<PathBuf> = walker
            .filter_map(|e| e.ok())
            .map(|e| e.into_path())
            .filter(|p| p.is_file() && is_supported(p))
            .collect();
        files.sort();

        for file in files {
            match load_unit(&file, Some(input)) {
                Ok(unit) => units.push(unit),
                Err(e) => warn!("Skipping {}: {:#}", file.display(), e),
            }
        }
    }

    Ok(units)
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Exit with code 1 when the score is below `--fail-under`
fn check_fail_threshold(fail_under: Option<u32>, score: u32) {
    if let Some(threshold) = fail_under {
        if score < threshold {
            eprintln!(
                "Failing: score {} is below --fail-under={}",
                score, threshold
            );
            std::process::exit(1);
        }
    }
}
