/// Axis-aligned region of a frame, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
	pub x: u32,
	pub y: u32,
	pub width: u32,
	pub height: u32,
}

impl Rect {
	pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
		Self {
			x,
			y,
			width,
			height,
		}
	}

	pub fn area(&self) -> u64 {
		u64::from(self.width) * u64::from(self.height)
	}

	/// Overlap with `other`, or `None` when the two regions are disjoint.
	pub fn intersect(&self, other: &Rect) -> Option<Rect> {
		let x = self.x.max(other.x);
		let y = self.y.max(other.y);
		let right = (self.x + self.width).min(other.x + other.width);
		let bottom = (self.y + self.height).min(other.y + other.height);
		if x >= right || y >= bottom {
			return None;
		}
		Some(Rect::new(x, y, right - x, bottom - y))
	}
}

/// A single grayscale frame travelling through the pipeline.
///
/// The frame exclusively owns its pixel buffer; handing a frame to a queue
/// or a stage moves the whole thing, no aliasing across stage boundaries.
pub struct Frame {
	index: usize,
	width: u32,
	height: u32,
	data: Vec<u8>,
}

impl Frame {
	/// Panics if `data` does not hold exactly `width * height` bytes.
	pub fn new(index: usize, width: u32, height: u32, data: Vec<u8>) -> Self {
		assert_eq!(
			data.len(),
			(width as usize) * (height as usize),
			"frame buffer length must match its dimensions"
		);
		Self {
			index,
			width,
			height,
			data,
		}
	}

	#[inline]
	pub fn index(&self) -> usize {
		self.index
	}

	#[inline]
	pub fn width(&self) -> u32 {
		self.width
	}

	#[inline]
	pub fn height(&self) -> u32 {
		self.height
	}

	#[inline]
	pub fn data(&self) -> &[u8] {
		&self.data
	}

	#[inline]
	pub fn into_data(self) -> Vec<u8> {
		self.data
	}

	pub fn bounds(&self) -> Rect {
		Rect::new(0, 0, self.width, self.height)
	}

	#[inline]
	pub fn pixel(&self, x: u32, y: u32) -> u8 {
		self.data[(y as usize) * (self.width as usize) + (x as usize)]
	}

	/// Mean luma over `region` clamped to the frame, 0.0 if the clamp leaves
	/// nothing.
	pub fn mean_luma(&self, region: &Rect) -> f64 {
		let region = match self.bounds().intersect(region) {
			Some(region) => region,
			None => return 0.0,
		};
		let mut sum = 0_u64;
		for y in region.y..region.y + region.height {
			let row = (y as usize) * (self.width as usize);
			let start = row + region.x as usize;
			let end = start + region.width as usize;
			sum += self.data[start..end].iter().map(|&p| u64::from(p)).sum::<u64>();
		}
		sum as f64 / region.area() as f64
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn intersect_clamps_to_overlap() {
		let frame = Rect::new(0, 0, 10, 10);
		let roi = Rect::new(6, 6, 10, 10);
		assert_eq!(frame.intersect(&roi), Some(Rect::new(6, 6, 4, 4)));
	}

	#[test]
	fn intersect_disjoint_is_none() {
		let a = Rect::new(0, 0, 4, 4);
		let b = Rect::new(8, 8, 4, 4);
		assert_eq!(a.intersect(&b), None);
	}

	#[test]
	fn mean_luma_over_region() {
		let mut data = vec![0_u8; 16];
		data[0] = 100;
		data[1] = 200;
		let frame = Frame::new(1, 4, 4, data);
		assert_eq!(frame.mean_luma(&Rect::new(0, 0, 2, 1)), 150.0);
		assert_eq!(frame.mean_luma(&Rect::new(0, 2, 4, 2)), 0.0);
	}

	#[test]
	#[should_panic(expected = "frame buffer length")]
	fn mismatched_buffer_rejected() {
		let _ = Frame::new(1, 4, 4, vec![0_u8; 3]);
	}
}
