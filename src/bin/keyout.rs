//! Developer tool: remove the backdrop from a single sprite file.
//!
//! Handy for previewing a threshold before committing it to the config.
//! This is feature-gated behind `tools` so it doesn't affect normal builds.

#![cfg(feature = "tools")]

use std::path::{Path, PathBuf};

use anyhow::Context;
use bunkermap::asset::{AssetKind, load_image};
use bunkermap::config::SegmentationConfig;
use bunkermap::segment::{self, SegmentMethod, content_padding};

const USAGE: &str = "usage: bunkermap-keyout <input.png> [output.png] [--kind NAME] [--threshold N] [--flood]

  --kind NAME   background, room, entrance, garden, water_purifier or scrap_machine
                (default room); picks the default method when no override is given";

fn main() -> anyhow::Result<()> {
    let mut input = None;
    let mut output = None;
    let mut kind = AssetKind::Room;
    let mut threshold: Option<u8> = None;
    let mut flood = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--kind" | "-k" => {
                let raw = args.next().context("--kind requires a value")?;
                kind = raw.parse()?;
            }
            "--threshold" | "-t" => {
                let raw = args.next().context("--threshold requires a value")?;
                threshold = Some(
                    raw.parse()
                        .with_context(|| format!("threshold must be 0-255, got `{raw}`"))?,
                );
            }
            "--flood" => flood = true,
            "--help" | "-h" => {
                println!("{USAGE}");
                return Ok(());
            }
            path if input.is_none() => input = Some(PathBuf::from(path)),
            path if output.is_none() => output = Some(PathBuf::from(path)),
            other => anyhow::bail!("unexpected argument `{other}`\n{USAGE}"),
        }
    }

    let input = input.context(USAGE)?;
    let output = output.unwrap_or_else(|| keyed_path(&input));
    let method = match (flood, threshold) {
        (true, threshold) => SegmentMethod::FloodFill {
            threshold: threshold.unwrap_or(230),
            fringe_threshold: None,
        },
        (false, Some(threshold)) => SegmentMethod::ChromaKey {
            threshold,
            soft_band: 0,
            dark_threshold: None,
        },
        (false, None) => SegmentationConfig::default().method(kind),
    };

    let image = load_image(&input, kind)?;
    let keyed = segment::segment(&image, method);
    keyed
        .save(&output)
        .with_context(|| format!("failed to save {}", output.display()))?;

    let (w, h) = keyed.dimensions();
    eprintln!("Wrote {} {kind} ({w}x{h}, {method:?})", output.display());
    match content_padding(&keyed) {
        Some(pad) => eprintln!(
            "  content {}x{} @ {},{}; padding h={:.1}% v={:.1}% bottom={}px",
            pad.bounds.width,
            pad.bounds.height,
            pad.bounds.x,
            pad.bounds.y,
            pad.horizontal * 100.0,
            pad.vertical * 100.0,
            pad.bottom,
        ),
        None => eprintln!("  no opaque pixels left; try a higher threshold"),
    }
    Ok(())
}

/// `sprite.png` -> `sprite_keyed.png` next to the input.
fn keyed_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sprite".to_owned());
    input.with_file_name(format!("{stem}_keyed.png"))
}
