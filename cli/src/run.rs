use crate::cmd::RunArgs;
use color_eyre::eyre::{Result, WrapErr};
use frameline_core::{
	detect::{Detection, LumaGridDetector},
	frame::Frame,
	pipeline::{self, PipelineConfig},
	sink::{FrameSink, SinkSignal},
	source::{DirectorySource, FrameSource, SyntheticSource},
	FRAMES_PROCESSED,
};
use indicatif::{HumanCount, ProgressBar, ProgressState, ProgressStyle};
use std::{
	fmt::Write,
	sync::atomic::{AtomicBool, Ordering},
	thread,
};
use thread_priority::{ThreadBuilderExt, ThreadPriority};

pub static DONE_PROCESSING: AtomicBool = AtomicBool::new(false);

struct DisplaySink {
	verbose: bool,
	quit_after: Option<usize>,
	shown: usize,
	detections: usize,
}

impl FrameSink for DisplaySink {
	fn present(&mut self, frame: Frame, detections: Vec<Detection>) -> Result<SinkSignal> {
		self.shown += 1;
		self.detections += detections.len();
		if self.verbose && !detections.is_empty() {
			for detection in &detections {
				println!(
					"frame {}: {} ({:.2}) at {},{} {}x{}",
					frame.index(),
					detection.label,
					detection.confidence,
					detection.bounds.x,
					detection.bounds.y,
					detection.bounds.width,
					detection.bounds.height
				);
			}
		}
		match self.quit_after {
			Some(limit) if self.shown >= limit => Ok(SinkSignal::Quit),
			_ => Ok(SinkSignal::Continue),
		}
	}
}

pub fn run(args: RunArgs) -> Result<()> {
	let config = PipelineConfig {
		queue_capacity: args.capacity,
		process_core: args.pin_core,
	};
	let detector = LumaGridDetector::new(args.threshold, args.grid, args.bounds);

	match &args.input {
		Some(dir) => {
			let source = DirectorySource::new(dir)
				.wrap_err_with(|| format!("failed to open frame directory {}", dir.display()))?;
			let total = source.remaining();
			run_pipeline(source, detector, total, &config, &args)
		}
		None => run_pipeline(
			SyntheticSource::new(args.frames, args.width, args.height),
			detector,
			args.frames,
			&config,
			&args,
		),
	}
}

fn run_pipeline<S>(
	source: S,
	detector: LumaGridDetector,
	total_frames: usize,
	config: &PipelineConfig,
	args: &RunArgs,
) -> Result<()>
where
	S: FrameSource + 'static,
{
	FRAMES_PROCESSED.store(0, Ordering::Relaxed);
	DONE_PROCESSING.store(false, Ordering::Relaxed);

	let progress_thread = thread::Builder::new()
		.name("frame progress thread".to_owned())
		.spawn_with_priority(ThreadPriority::Min, move |_| {
			let total_frames = total_frames as u64;
			let progress_bar = ProgressBar::new(total_frames).with_style(
				ProgressStyle::with_template(
					"[{elapsed}] {wide_bar:.green/red} {pos}/{len} frames ({per_sec}, ETA: {eta})",
				)
				.unwrap()
				.with_key("pos", |state: &ProgressState, w: &mut dyn Write| {
					write!(w, "{}", HumanCount(state.pos())).unwrap()
				})
				.with_key("len", |state: &ProgressState, w: &mut dyn Write| {
					write!(w, "{}", HumanCount(state.len().unwrap())).unwrap()
				})
				.with_key("per_sec", |state: &ProgressState, w: &mut dyn Write| {
					write!(w, "{:.1} fps", state.per_sec().round() as u64).unwrap()
				}),
			);
			while !DONE_PROCESSING.load(Ordering::Relaxed) {
				let frames_processed = FRAMES_PROCESSED.load(Ordering::Relaxed) as u64;
				if frames_processed >= total_frames {
					break;
				}
				progress_bar.set_position(frames_processed);
				std::thread::yield_now();
			}
			progress_bar.finish();
		})
		.wrap_err("failed to spawn progress bar thread")?;

	let mut sink = DisplaySink {
		verbose: args.verbose,
		quit_after: args.quit_after,
		shown: 0,
		detections: 0,
	};
	let result = pipeline::run(source, detector, &mut sink, config);
	DONE_PROCESSING.store(true, Ordering::Relaxed);
	let _ = progress_thread.join();
	let report = result.wrap_err("pipeline run failed")?;

	println!(
		"captured {} frames, processed {}, presented {} with {} detections{}",
		report.frames_captured,
		report.frames_processed,
		report.frames_presented,
		sink.detections,
		if report.quit_requested {
			" (stopped early on quit)"
		} else {
			""
		}
	);
	Ok(())
}
