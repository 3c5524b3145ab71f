use clap::{Args, Parser, Subcommand};
use color_eyre::eyre::{ContextCompat, Result, WrapErr};
use frameline_core::frame::Rect;
use itertools::Itertools;
use std::{path::PathBuf, str::FromStr};

#[derive(Parser)]
#[command(author, version, about, long_about = None, propagate_version = true)]
pub struct CliArgs {
	#[command(subcommand)]
	pub command: CliSubcommands,
}

#[derive(Subcommand)]
pub enum CliSubcommands {
	/// Run the capture -> detect -> render pipeline.
	Run(RunArgs),
	/// Benchmark the pipeline and emit CSV timings.
	Bench(BenchArgs),
}

#[derive(Args)]
pub struct RunArgs {
	/// Directory of binary PGM frames to feed in. Generates synthetic frames when omitted.
	#[arg(short, long)]
	pub input: Option<PathBuf>,
	/// How many synthetic frames to generate.
	#[arg(short = 'n', long, default_value = "300")]
	pub frames: usize,
	/// Synthetic frame width.
	#[arg(long, default_value = "640")]
	pub width: u32,
	/// Synthetic frame height.
	#[arg(long, default_value = "480")]
	pub height: u32,
	/// Capacity of each hand-off queue.
	#[arg(short, long, default_value = "2")]
	pub capacity: usize,
	/// The minimum mean-luma detection threshold (0-255).
	#[arg(short = 'm', long, default_value = "128")]
	pub threshold: f64,
	/// Detection grid cells per axis.
	#[arg(short, long, default_value = "8")]
	pub grid: u32,
	/// The bounds of the region of interest (x,y,width,height).
	#[arg(short, long, value_parser = parse_rect)]
	pub bounds: Option<Rect>,
	/// Stop after presenting this many frames, as if the user quit.
	#[arg(short, long)]
	pub quit_after: Option<usize>,
	/// Pin the process stage to this core.
	#[arg(long)]
	pub pin_core: Option<usize>,
	/// Print every detection instead of just the summary.
	#[arg(short, long)]
	pub verbose: bool,
}

#[derive(Args)]
pub struct BenchArgs {
	/// How many synthetic frames to push through the pipeline.
	#[arg(short = 'n', long, default_value = "500")]
	pub frames: usize,
	/// Synthetic frame width.
	#[arg(long, default_value = "640")]
	pub width: u32,
	/// Synthetic frame height.
	#[arg(long, default_value = "480")]
	pub height: u32,
	/// Capacity of each hand-off queue.
	#[arg(short, long, default_value = "2")]
	pub capacity: usize,
	/// The minimum mean-luma detection threshold (0-255).
	#[arg(short = 'm', long, default_value = "128")]
	pub threshold: f64,
	/// Detection grid cells per axis.
	#[arg(short, long, default_value = "8")]
	pub grid: u32,
	/// Append the CSV row to this file as well as stdout.
	#[arg(short, long)]
	pub output: Option<PathBuf>,
}

fn parse_rect(arg: &str) -> Result<Rect> {
	let (x, y, width, height) = arg
		.split(',')
		.map(str::trim)
		.map(|part| u32::from_str(part).wrap_err_with(|| format!("invalid number '{}'", part)))
		.collect::<Result<Vec<u32>>>()
		.wrap_err("rectangle should be formatted as x,y,width,height")?
		.into_iter()
		.collect_tuple()
		.context("rectangle should be formatted as x,y,width,height")?;

	Ok(Rect::new(x, y, width, height))
}
