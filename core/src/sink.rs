use crate::{detect::Detection, frame::Frame};
use color_eyre::eyre::Result;

/// What the sink wants the pipeline to do after presenting a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkSignal {
	Continue,
	/// User-initiated cancellation; the pipeline must stop every stage.
	Quit,
}

/// Downstream collaborator consuming processed frames, driven by the render
/// stage. The only place a cancellation request can originate.
pub trait FrameSink: Send {
	fn present(&mut self, frame: Frame, detections: Vec<Detection>) -> Result<SinkSignal>;
}

impl<F> FrameSink for F
where
	F: FnMut(Frame, Vec<Detection>) -> Result<SinkSignal> + Send,
{
	fn present(&mut self, frame: Frame, detections: Vec<Detection>) -> Result<SinkSignal> {
		self(frame, detections)
	}
}

/// Records what was presented, in order. Used by benchmarks and tests in
/// place of a real display surface.
#[derive(Default)]
pub struct CountingSink {
	indices: Vec<usize>,
	detections: usize,
	quit_after: Option<usize>,
}

impl CountingSink {
	pub fn new() -> Self {
		Self::default()
	}

	/// Request pipeline shutdown once `count` frames have been presented.
	pub fn quit_after(count: usize) -> Self {
		Self {
			quit_after: Some(count),
			..Self::default()
		}
	}

	pub fn presented(&self) -> &[usize] {
		&self.indices
	}

	pub fn frame_count(&self) -> usize {
		self.indices.len()
	}

	pub fn detection_count(&self) -> usize {
		self.detections
	}
}

impl FrameSink for CountingSink {
	fn present(&mut self, frame: Frame, detections: Vec<Detection>) -> Result<SinkSignal> {
		self.indices.push(frame.index());
		self.detections += detections.len();
		match self.quit_after {
			Some(limit) if self.indices.len() >= limit => Ok(SinkSignal::Quit),
			_ => Ok(SinkSignal::Continue),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn counting_sink_records_order() {
		let mut sink = CountingSink::new();
		for i in [3_usize, 1, 2] {
			let signal = sink.present(Frame::new(i, 1, 1, vec![0]), Vec::new()).unwrap();
			assert_eq!(signal, SinkSignal::Continue);
		}
		assert_eq!(sink.presented(), &[3, 1, 2]);
	}

	#[test]
	fn quit_after_limit_requests_shutdown() {
		let mut sink = CountingSink::quit_after(2);
		assert_eq!(
			sink.present(Frame::new(1, 1, 1, vec![0]), Vec::new()).unwrap(),
			SinkSignal::Continue
		);
		assert_eq!(
			sink.present(Frame::new(2, 1, 1, vec![0]), Vec::new()).unwrap(),
			SinkSignal::Quit
		);
	}
}
