use crate::{
	detect::{Detection, Detector},
	frame::Frame,
	queue::BoundedQueue,
	sink::{FrameSink, SinkSignal},
	source::FrameSource,
	FRAMES_PROCESSED,
};
use color_eyre::eyre::{eyre, Result, WrapErr};
use std::{
	sync::{
		atomic::{AtomicBool, Ordering},
		Arc,
	},
	thread,
};

pub type ProcessedFrame = (Frame, Vec<Detection>);

#[derive(Debug, Clone)]
pub struct PipelineConfig {
	/// Slots per hand-off queue. 2 gives double buffering: the stage ahead
	/// can fill one slot while the stage behind drains the other.
	pub queue_capacity: usize,
	/// Pin the process stage to this core, if set.
	pub process_core: Option<usize>,
}

impl Default for PipelineConfig {
	fn default() -> Self {
		Self {
			queue_capacity: 2,
			process_core: None,
		}
	}
}

/// Why the render stage returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
	/// Input queue reported end-of-stream, or the stop flag was observed.
	Drained,
	/// The sink asked for shutdown; every queue must be finished promptly.
	QuitRequested,
}

/// What each stage saw, tallied after all three have terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineReport {
	pub frames_captured: usize,
	pub frames_processed: usize,
	pub frames_presented: usize,
	pub quit_requested: bool,
}

/// Pulls frames from the source into `output` until the source is exhausted,
/// the stop flag is raised, or downstream closes the queue. Always finishes
/// its output on the way out, whatever the exit path.
pub fn capture_stage<S>(mut source: S, output: &BoundedQueue<Frame>, stop: &AtomicBool) -> Result<usize>
where
	S: FrameSource,
{
	let result = (|| {
		let mut captured = 0;
		while !stop.load(Ordering::Relaxed) {
			let frame = match source.next_frame().wrap_err("capture source failed")? {
				Some(frame) => frame,
				None => break,
			};
			if !output.enqueue(frame) {
				// Downstream already closed; not ours to re-finish anything else.
				break;
			}
			captured += 1;
		}
		Ok(captured)
	})();
	output.set_finished();
	result
}

/// Runs the detector over every frame arriving on `input`, forwarding
/// `(frame, detections)` pairs. Finishes only its own output; its input is
/// owned by the capture stage.
pub fn process_stage<D>(
	mut detector: D,
	input: &BoundedQueue<Frame>,
	output: &BoundedQueue<ProcessedFrame>,
	stop: &AtomicBool,
) -> Result<usize>
where
	D: Detector,
{
	let result = (|| {
		let mut processed = 0;
		while !stop.load(Ordering::Relaxed) {
			let frame = match input.dequeue() {
				Some(frame) => frame,
				None => break,
			};
			let detections = detector
				.detect(&frame)
				.wrap_err_with(|| format!("failed to process frame {}", frame.index()))?;
			FRAMES_PROCESSED.fetch_add(1, Ordering::Relaxed);
			processed += 1;
			if !output.enqueue((frame, detections)) {
				break;
			}
		}
		Ok(processed)
	})();
	output.set_finished();
	result
}

/// Presents processed frames until the stream drains or the sink requests
/// shutdown. Quit fan-out is left to the caller, which owns every queue.
pub fn render_stage<K>(
	sink: &mut K,
	input: &BoundedQueue<ProcessedFrame>,
	stop: &AtomicBool,
) -> Result<(usize, RenderOutcome)>
where
	K: FrameSink,
{
	let mut presented = 0;
	while !stop.load(Ordering::Relaxed) {
		let (frame, detections) = match input.dequeue() {
			Some(item) => item,
			None => break,
		};
		let index = frame.index();
		let signal = sink
			.present(frame, detections)
			.wrap_err_with(|| format!("failed to present frame {index}"))?;
		presented += 1;
		if signal == SinkSignal::Quit {
			return Ok((presented, RenderOutcome::QuitRequested));
		}
	}
	Ok((presented, RenderOutcome::Drained))
}

/// Runs the full capture -> process -> render pipeline to completion.
///
/// Capture and process each get their own named thread; render runs on the
/// calling thread so a real display surface can stay on the main thread.
/// Once the render stage returns, for any reason, the stop flag is raised
/// and every queue is finished before joining, so no stage can be left
/// blocked on a hand-off that will never happen.
pub fn run<S, D, K>(
	source: S,
	detector: D,
	sink: &mut K,
	config: &PipelineConfig,
) -> Result<PipelineReport>
where
	S: FrameSource + 'static,
	D: Detector + 'static,
	K: FrameSink,
{
	let stop = Arc::new(AtomicBool::new(false));
	let frame_queue = Arc::new(BoundedQueue::<Frame>::new(config.queue_capacity));
	let processed_queue = Arc::new(BoundedQueue::<ProcessedFrame>::new(config.queue_capacity));

	let capture = thread::Builder::new()
		.name("frame capture thread".to_owned())
		.spawn({
			let output = frame_queue.clone();
			let stop = stop.clone();
			move || capture_stage(source, &output, &stop)
		})
		.wrap_err("failed to spawn capture thread")?;

	let process = thread::Builder::new()
		.name("frame process thread".to_owned())
		.spawn({
			let input = frame_queue.clone();
			let output = processed_queue.clone();
			let stop = stop.clone();
			let core = config.process_core;
			move || {
				if let Some(core) = core {
					pin_current_thread(core);
				}
				process_stage(detector, &input, &output, &stop)
			}
		})
		.wrap_err("failed to spawn process thread")?;

	let render_result = render_stage(sink, &processed_queue, &stop);

	// Converge regardless of which terminal event fired first: raise the
	// stop flag and finish every queue so blocked stages wake immediately,
	// then join everything before reporting.
	stop.store(true, Ordering::Relaxed);
	frame_queue.set_finished();
	processed_queue.set_finished();

	let capture_result = capture
		.join()
		.map_err(|_| eyre!("capture stage panicked"))?;
	let process_result = process
		.join()
		.map_err(|_| eyre!("process stage panicked"))?;

	let frames_captured = capture_result.wrap_err("capture stage failed")?;
	let frames_processed = process_result.wrap_err("process stage failed")?;
	let (frames_presented, outcome) = render_result.wrap_err("render stage failed")?;

	Ok(PipelineReport {
		frames_captured,
		frames_processed,
		frames_presented,
		quit_requested: outcome == RenderOutcome::QuitRequested,
	})
}

fn pin_current_thread(core: usize) {
	let available = core_affinity::get_core_ids()
		.unwrap_or_default()
		.into_iter()
		.any(|id| id.id == core);
	if !available || !core_affinity::set_for_current(core_affinity::CoreId { id: core }) {
		eprintln!("failed to set thread affinity for core {core}");
	}
}
