//! Compose every scene of a bunker from a TOML config.

use std::path::{Path, PathBuf};

use anyhow::Context;
use bunkermap::output::{self, ManifestEntry};
use bunkermap::{AssetSet, BunkerConfig, ProgressCallback, ProgressEvent, pipeline, scene};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG: &str = "bunkermap.toml";

struct Args {
    config: PathBuf,
    out: Option<PathBuf>,
}

fn parse_args() -> anyhow::Result<Option<Args>> {
    let mut config = None;
    let mut out = None;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out" | "-o" => {
                let dir = args.next().context("--out requires a directory")?;
                out = Some(PathBuf::from(dir));
            }
            "help" | "--help" | "-h" => return Ok(None),
            flag if flag.starts_with('-') => anyhow::bail!("unknown flag `{flag}`"),
            path => {
                if config.replace(PathBuf::from(path)).is_some() {
                    anyhow::bail!("only one config file may be given");
                }
            }
        }
    }
    Ok(Some(Args {
        config: config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG)),
        out,
    }))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bunkermap=info")),
        )
        .init();

    let Some(args) = parse_args()? else {
        print_usage();
        return Ok(());
    };

    let config = BunkerConfig::from_file(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    config.validate()?;

    let base_dir = args.config.parent().unwrap_or(Path::new("."));
    let out_dir = args
        .out
        .unwrap_or_else(|| base_dir.join(&config.output.directory));

    run(&config, base_dir, &out_dir)
}

fn run(config: &BunkerConfig, base_dir: &Path, out_dir: &Path) -> anyhow::Result<()> {
    let assets = AssetSet::load(&config.assets, base_dir)?;
    let prepared = pipeline::prepare(&assets, config)?;
    let plans = scene::plan_scenes(config, &prepared.dims())?;

    let pb = ProgressBar::new(plans.len() as u64);
    if let Ok(style) = ProgressStyle::with_template("  {msg} [{bar:30}] {pos}/{len} scenes") {
        pb.set_style(style);
    }
    pb.set_message("compositing");

    let bar = pb.clone();
    let callback: ProgressCallback = Box::new(move |event| match event {
        ProgressEvent::SceneFinished { skipped, .. } if skipped > 0 => {
            bar.inc(1);
            bar.println(format!("  {skipped} placement(s) skipped for missing sprites"));
        }
        ProgressEvent::SceneFinished { .. } => bar.inc(1),
        ProgressEvent::SceneFailed { index, message } => {
            bar.inc(1);
            bar.println(format!("  scene {} failed: {message}", index + 1));
        }
        _ => {}
    });

    let prefix = config.output.file_prefix.as_str();
    let report = pipeline::render_all(&plans, &prepared, config, Some(&callback), |rendered| {
        output::write_scene(&rendered, out_dir, prefix)?;
        Ok(ManifestEntry::from_scene(&rendered, prefix))
    })?;
    pb.finish_and_clear();

    if config.output.manifest {
        let entries: Vec<ManifestEntry> = report.succeeded().map(|(_, e)| e.clone()).collect();
        let path = output::write_manifest(out_dir, entries)?;
        info!(path = %path.display(), "manifest written");
    }

    let failures: Vec<_> = report.failures().collect();
    for (index, err) in &failures {
        error!(scene = index, error = %err, "scene failed");
    }
    let written = report.outcomes.len() - failures.len();
    println!("wrote {written} scene(s) to {}", out_dir.display());

    if !failures.is_empty() {
        anyhow::bail!("{} of {} scenes failed", failures.len(), report.outcomes.len());
    }
    Ok(())
}

fn print_usage() {
    println!("usage: bunkermap [config.toml] [--out DIR]");
    println!();
    println!("  config.toml   bunker description (default: {DEFAULT_CONFIG})");
    println!("  --out DIR     output directory (default: [output].directory)");
    println!();
    println!("Set RUST_LOG=bunkermap=debug for per-placement detail.");
}
