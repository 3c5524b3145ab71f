use crate::frame::{Frame, Rect};
use color_eyre::eyre::Result;

/// A region of a frame the detector considers interesting.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
	pub label: String,
	pub confidence: f64,
	pub bounds: Rect,
}

/// The pipeline's transform collaborator. Invoked once per frame by the
/// process stage; may be arbitrarily slow. An error is terminal for the
/// whole pipeline.
pub trait Detector: Send {
	fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>>;
}

impl<F> Detector for F
where
	F: FnMut(&Frame) -> Result<Vec<Detection>> + Send,
{
	fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
		self(frame)
	}
}

/// Splits the frame (or a region of interest within it) into a fixed grid
/// and reports every cell whose mean luma meets the threshold.
///
/// Stands in for model inference: deterministic, pure, and slow in
/// proportion to frame size, which is all the pipeline ever asks of a
/// detector.
pub struct LumaGridDetector {
	threshold: f64,
	grid: u32,
	bounds: Option<Rect>,
}

impl LumaGridDetector {
	/// `threshold` is a mean-luma cutoff in `0.0..=255.0`; `grid` is the
	/// number of cells per axis.
	pub fn new(threshold: f64, grid: u32, bounds: Option<Rect>) -> Self {
		assert!(grid > 0, "detector grid must have at least one cell");
		Self {
			threshold,
			grid,
			bounds,
		}
	}
}

impl Detector for LumaGridDetector {
	fn detect(&mut self, frame: &Frame) -> Result<Vec<Detection>> {
		let region = match self.bounds {
			Some(bounds) => match frame.bounds().intersect(&bounds) {
				Some(region) => region,
				None => return Ok(Vec::new()),
			},
			None => frame.bounds(),
		};

		let cell_w = (region.width / self.grid).max(1);
		let cell_h = (region.height / self.grid).max(1);
		let mut detections = Vec::new();
		for gy in 0..self.grid {
			for gx in 0..self.grid {
				let cell = Rect::new(region.x + gx * cell_w, region.y + gy * cell_h, cell_w, cell_h);
				let cell = match region.intersect(&cell) {
					Some(cell) => cell,
					None => continue,
				};
				let luma = frame.mean_luma(&cell);
				if luma >= self.threshold {
					detections.push(Detection {
						label: format!("cell-{gx}x{gy}"),
						confidence: luma / 255.0,
						bounds: cell,
					});
				}
			}
		}
		Ok(detections)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn flat_frame(index: usize, luma: u8) -> Frame {
		Frame::new(index, 16, 16, vec![luma; 256])
	}

	#[test]
	fn bright_frame_fills_grid() {
		let mut detector = LumaGridDetector::new(128.0, 4, None);
		let detections = detector.detect(&flat_frame(1, 200)).unwrap();
		assert_eq!(detections.len(), 16);
		assert!(detections.iter().all(|d| (d.confidence - 200.0 / 255.0).abs() < 1e-9));
	}

	#[test]
	fn dark_frame_matches_nothing() {
		let mut detector = LumaGridDetector::new(128.0, 4, None);
		assert!(detector.detect(&flat_frame(1, 10)).unwrap().is_empty());
	}

	#[test]
	fn bounds_limit_the_search() {
		let mut data = vec![0_u8; 256];
		for y in 0..8_usize {
			for x in 0..8_usize {
				data[y * 16 + x] = 255;
			}
		}
		let frame = Frame::new(1, 16, 16, data);

		let mut bounded = LumaGridDetector::new(128.0, 2, Some(Rect::new(8, 8, 8, 8)));
		assert!(bounded.detect(&frame).unwrap().is_empty());

		let mut unbounded = LumaGridDetector::new(128.0, 2, None);
		assert_eq!(unbounded.detect(&frame).unwrap().len(), 1);
	}

	#[test]
	fn out_of_frame_bounds_is_empty_not_error() {
		let mut detector = LumaGridDetector::new(0.0, 2, Some(Rect::new(100, 100, 8, 8)));
		assert!(detector.detect(&flat_frame(1, 255)).unwrap().is_empty());
	}
}
