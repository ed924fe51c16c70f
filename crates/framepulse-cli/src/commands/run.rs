use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use framepulse_core::config::JobConfig;
use framepulse_core::engine::{run_sum, MemoryDataset, RunOptions};
use framepulse_core::indicator::{Indicator, LogIndicator};

use crate::indicator::{bar_style, BarIndicator};
use crate::summary::{print_job_summary, print_run_summary};

#[derive(Args)]
pub struct RunArgs {
    /// Job config file (TOML); flags below override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of frames in the synthetic stack
    #[arg(long)]
    pub frames: Option<usize>,

    /// Signal shape as HEIGHTxWIDTH
    #[arg(long, value_parser = parse_shape)]
    pub sig: Option<(usize, usize)>,

    /// Number of work units the stack is split into
    #[arg(long)]
    pub partitions: Option<usize>,

    /// Frames per tile
    #[arg(long)]
    pub tile_frames: Option<usize>,

    /// Artificial delay after each tile, in milliseconds
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Fraction of frames selected by the region of interest (0-1]
    #[arg(long)]
    pub roi_fraction: Option<f32>,

    /// Units expected to finish faster than this (seconds) send no chunk updates
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Minimum seconds between chunk updates from one unit
    #[arg(long)]
    pub min_interval: Option<f64>,

    /// Disable progress reporting entirely
    #[arg(long)]
    pub no_progress: bool,

    /// Report progress as log lines instead of a terminal bar
    #[arg(long, conflicts_with = "no_progress")]
    pub log_progress: bool,
}

pub fn run(args: &RunArgs) -> Result<()> {
    let config = load_config(args)?;
    print_job_summary(&config);

    let dataset = MemoryDataset::synthetic(&config.dataset)?;
    let roi = config.dataset.roi();
    let options = RunOptions::from(&config);

    let result = if args.log_progress {
        run_sum(&dataset, roi.as_ref(), &options, |total, desc| {
            Box::new(LogIndicator::new(total, desc)) as Box<dyn Indicator>
        })?
    } else {
        let style = bar_style()?;
        run_sum(&dataset, roi.as_ref(), &options, move |total, desc| {
            Box::new(BarIndicator::new(total, desc, style)) as Box<dyn Indicator>
        })?
    };

    print_run_summary(&result);
    Ok(())
}

fn load_config(args: &RunArgs) -> Result<JobConfig> {
    let mut config: JobConfig = if let Some(ref config_path) = args.config {
        let contents = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config {}", config_path.display()))?;
        toml::from_str(&contents).context("Invalid job config")?
    } else {
        JobConfig::default()
    };

    let dataset = &mut config.dataset;
    if let Some(frames) = args.frames {
        dataset.frames = frames;
    }
    if let Some((h, w)) = args.sig {
        dataset.sig_height = h;
        dataset.sig_width = w;
    }
    if let Some(partitions) = args.partitions {
        dataset.partitions = partitions;
    }
    if let Some(tile_frames) = args.tile_frames {
        dataset.tile_frames = tile_frames;
    }
    if let Some(fraction) = args.roi_fraction {
        dataset.roi_fraction = fraction;
    }

    let progress = &mut config.progress;
    if let Some(threshold) = args.threshold {
        progress.threshold_part_time_secs = threshold;
    }
    if let Some(interval) = args.min_interval {
        progress.min_message_interval_secs = interval;
    }
    if args.no_progress {
        progress.enabled = false;
    }

    if let Some(delay) = args.delay_ms {
        config.tile_delay_ms = delay;
    }

    config.validate().context("Invalid job config")?;
    Ok(config)
}

fn parse_shape(s: &str) -> Result<(usize, usize), String> {
    let (h, w) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected HEIGHTxWIDTH, got '{s}'"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<usize>()
            .map_err(|e| format!("invalid dimension '{v}': {e}"))
    };
    Ok((parse(h)?, parse(w)?))
}
