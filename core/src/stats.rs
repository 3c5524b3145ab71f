use std::time::Duration;

/// Per-frame latency accumulator for benchmark runs.
#[derive(Debug, Default, Clone)]
pub struct LatencyStats {
	samples_ms: Vec<f64>,
}

impl LatencyStats {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn record(&mut self, latency: Duration) {
		self.samples_ms.push(latency.as_secs_f64() * 1000.0);
	}

	pub fn count(&self) -> usize {
		self.samples_ms.len()
	}

	pub fn avg_ms(&self) -> f64 {
		if self.samples_ms.is_empty() {
			return 0.0;
		}
		self.samples_ms.iter().sum::<f64>() / self.samples_ms.len() as f64
	}

	pub fn min_ms(&self) -> f64 {
		self.samples_ms.iter().copied().reduce(f64::min).unwrap_or(0.0)
	}

	pub fn max_ms(&self) -> f64 {
		self.samples_ms.iter().copied().reduce(f64::max).unwrap_or(0.0)
	}
}

/// One benchmark run, flattened for CSV output.
#[derive(Debug, Clone)]
pub struct PerfReport {
	pub mode: String,
	pub frames: usize,
	pub frame_width: u32,
	pub frame_height: u32,
	pub queue_capacity: usize,
	pub total_ms: f64,
	pub latency_avg_ms: f64,
	pub latency_min_ms: f64,
	pub latency_max_ms: f64,
}

impl PerfReport {
	pub fn fps(&self) -> f64 {
		if self.total_ms <= 0.0 {
			return 0.0;
		}
		(self.frames as f64 * 1000.0) / self.total_ms
	}

	pub fn csv_header() -> &'static str {
		"mode,frames,width,height,queue_capacity,total_ms,fps,latency_avg_ms,latency_min_ms,latency_max_ms"
	}

	pub fn csv_row(&self) -> String {
		format!(
			"{},{},{},{},{},{:.3},{:.3},{:.3},{:.3},{:.3}",
			self.mode,
			self.frames,
			self.frame_width,
			self.frame_height,
			self.queue_capacity,
			self.total_ms,
			self.fps(),
			self.latency_avg_ms,
			self.latency_min_ms,
			self.latency_max_ms
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn latency_stats_track_extremes() {
		let mut stats = LatencyStats::new();
		stats.record(Duration::from_millis(4));
		stats.record(Duration::from_millis(10));
		stats.record(Duration::from_millis(1));
		assert_eq!(stats.count(), 3);
		assert_eq!(stats.avg_ms(), 5.0);
		assert_eq!(stats.min_ms(), 1.0);
		assert_eq!(stats.max_ms(), 10.0);
	}

	#[test]
	fn empty_stats_are_zero() {
		let stats = LatencyStats::new();
		assert_eq!(stats.avg_ms(), 0.0);
		assert_eq!(stats.min_ms(), 0.0);
		assert_eq!(stats.max_ms(), 0.0);
	}

	#[test]
	fn csv_row_matches_header_shape() {
		let report = PerfReport {
			mode: "synthetic".to_owned(),
			frames: 100,
			frame_width: 640,
			frame_height: 480,
			queue_capacity: 2,
			total_ms: 2000.0,
			latency_avg_ms: 18.5,
			latency_min_ms: 12.0,
			latency_max_ms: 31.25,
		};
		let header_fields = PerfReport::csv_header().split(',').count();
		let row = report.csv_row();
		assert_eq!(row.split(',').count(), header_fields);
		assert!(row.starts_with("synthetic,100,640,480,2,2000.000,50.000,"));
	}
}
