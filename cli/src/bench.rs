use crate::cmd::BenchArgs;
use color_eyre::eyre::{Result, WrapErr};
use crossbeam_channel::{unbounded, Sender};
use frameline_core::{
	detect::{Detection, Detector, LumaGridDetector},
	frame::Frame,
	pipeline::{self, PipelineConfig},
	sink::CountingSink,
	source::SyntheticSource,
	stats::{LatencyStats, PerfReport},
};
use parking_lot::Mutex;
use std::{
	fs::OpenOptions,
	io::Write,
	sync::Arc,
	thread,
	time::{Duration, Instant},
};

/// Wraps a detector and ships the wall time of every `detect` call to the
/// stats collector.
struct TimedDetector<D> {
	inner: D,
	sample_sender: Sender<Duration>,
}

impl<D: Detector> Detector for TimedDetector<D> {
	fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
		let start = Instant::now();
		let result = self.inner.detect(frame);
		let _ = self.sample_sender.send(start.elapsed());
		result
	}
}

pub fn bench(args: BenchArgs) -> Result<()> {
	let (sample_sender, sample_receiver) = unbounded::<Duration>();
	let latencies = Arc::new(Mutex::new(LatencyStats::new()));

	let latencies_clone = latencies.clone();
	let collector = thread::spawn(move || {
		for sample in sample_receiver {
			latencies_clone.lock().record(sample);
		}
	});

	let config = PipelineConfig {
		queue_capacity: args.capacity,
		process_core: None,
	};
	let detector = TimedDetector {
		inner: LumaGridDetector::new(args.threshold, args.grid, None),
		sample_sender,
	};
	let mut sink = CountingSink::new();

	let start = Instant::now();
	let report = pipeline::run(
		SyntheticSource::new(args.frames, args.width, args.height),
		detector,
		&mut sink,
		&config,
	)
	.wrap_err("benchmark pipeline run failed")?;
	let total_ms = start.elapsed().as_secs_f64() * 1000.0;

	// The detector (and with it the sample sender) is gone once the run
	// returns, so the collector drains and exits on its own.
	let _ = collector.join();

	let latencies = latencies.lock();
	let perf = PerfReport {
		mode: "synthetic".to_owned(),
		frames: report.frames_processed,
		frame_width: args.width,
		frame_height: args.height,
		queue_capacity: args.capacity,
		total_ms,
		latency_avg_ms: latencies.avg_ms(),
		latency_min_ms: latencies.min_ms(),
		latency_max_ms: latencies.max_ms(),
	};

	println!("{}", PerfReport::csv_header());
	println!("{}", perf.csv_row());

	if let Some(path) = &args.output {
		let write_header = !path.exists();
		let mut file = OpenOptions::new()
			.create(true)
			.append(true)
			.open(path)
			.wrap_err_with(|| format!("failed to open results file {}", path.display()))?;
		if write_header {
			writeln!(file, "{}", PerfReport::csv_header())
				.wrap_err("failed to write results header")?;
		}
		writeln!(file, "{}", perf.csv_row()).wrap_err("failed to append results row")?;
	}

	Ok(())
}
