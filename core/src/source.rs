use crate::frame::Frame;
use color_eyre::eyre::{eyre, ContextCompat, Result, WrapErr};
use std::{fs, path::Path};
use walkdir::WalkDir;

/// Pull-style frame producer driven by the capture stage. `Ok(None)` means
/// the source is exhausted and no further frames will ever arrive.
pub trait FrameSource: Send {
	fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Deterministic moving-gradient test pattern, one frame per call up to
/// `count`. Lets the pipeline run without any capture hardware.
pub struct SyntheticSource {
	count: usize,
	width: u32,
	height: u32,
	next_index: usize,
}

impl SyntheticSource {
	pub fn new(count: usize, width: u32, height: u32) -> Self {
		Self {
			count,
			width,
			height,
			next_index: 1,
		}
	}
}

impl FrameSource for SyntheticSource {
	fn next_frame(&mut self) -> Result<Option<Frame>> {
		if self.next_index > self.count {
			return Ok(None);
		}
		let index = self.next_index;
		self.next_index += 1;

		let shift = (index * 8) as u32;
		let mut data = Vec::with_capacity((self.width * self.height) as usize);
		for y in 0..self.height {
			for x in 0..self.width {
				data.push(((x + y + shift) % 256) as u8);
			}
		}
		Ok(Some(Frame::new(index, self.width, self.height, data)))
	}
}

/// Feeds the pipeline from a directory of binary PGM (P5) files, visited in
/// file-name order. Non-PGM files are skipped; a PGM that fails to parse is
/// an error, not a skip.
pub struct DirectorySource {
	paths: std::vec::IntoIter<std::path::PathBuf>,
	next_index: usize,
}

impl DirectorySource {
	pub fn new<P: AsRef<Path>>(dir: P) -> Result<Self> {
		let dir = dir.as_ref();
		let mut paths = Vec::new();
		for entry in WalkDir::new(dir).sort_by_file_name() {
			let entry = entry.wrap_err_with(|| format!("failed to walk {}", dir.display()))?;
			let path = entry.path();
			if path.is_file() && path.extension().is_some_and(|ext| ext == "pgm") {
				paths.push(path.to_owned());
			}
		}
		if paths.is_empty() {
			return Err(eyre!("no .pgm frames found under {}", dir.display()));
		}
		Ok(Self {
			paths: paths.into_iter(),
			next_index: 1,
		})
	}

	/// Frames not yet handed out.
	pub fn remaining(&self) -> usize {
		self.paths.len()
	}
}

impl FrameSource for DirectorySource {
	fn next_frame(&mut self) -> Result<Option<Frame>> {
		let path = match self.paths.next() {
			Some(path) => path,
			None => return Ok(None),
		};
		let index = self.next_index;
		self.next_index += 1;
		let raw = fs::read(&path)
			.wrap_err_with(|| format!("failed to read frame file {}", path.display()))?;
		parse_pgm(&raw, index)
			.map(Some)
			.wrap_err_with(|| format!("failed to parse PGM frame {}", path.display()))
	}
}

fn parse_pgm(raw: &[u8], index: usize) -> Result<Frame> {
	let mut pos = 0;
	let magic = next_token(raw, &mut pos).wrap_err("missing PGM magic number")?;
	if magic != b"P5" {
		return Err(eyre!("not a binary PGM: magic is {:?}", String::from_utf8_lossy(magic)));
	}
	let width: u32 = parse_header_number(raw, &mut pos).wrap_err("invalid PGM width")?;
	let height: u32 = parse_header_number(raw, &mut pos).wrap_err("invalid PGM height")?;
	let maxval: u32 = parse_header_number(raw, &mut pos).wrap_err("invalid PGM maxval")?;
	if maxval == 0 || maxval > 255 {
		return Err(eyre!("unsupported PGM maxval {maxval}, expected 1..=255"));
	}
	// Header ends after exactly one whitespace byte.
	pos += 1;
	let len = (width as usize) * (height as usize);
	let data = raw
		.get(pos..pos + len)
		.wrap_err_with(|| format!("truncated PGM: expected {len} pixel bytes"))?;
	Ok(Frame::new(index, width, height, data.to_vec()))
}

fn next_token<'a>(raw: &'a [u8], pos: &mut usize) -> Option<&'a [u8]> {
	while *pos < raw.len() {
		match raw[*pos] {
			b'#' => {
				while *pos < raw.len() && raw[*pos] != b'\n' {
					*pos += 1;
				}
			}
			c if c.is_ascii_whitespace() => *pos += 1,
			_ => break,
		}
	}
	let start = *pos;
	while *pos < raw.len() && !raw[*pos].is_ascii_whitespace() {
		*pos += 1;
	}
	(*pos > start).then(|| &raw[start..*pos])
}

fn parse_header_number(raw: &[u8], pos: &mut usize) -> Result<u32> {
	let token = next_token(raw, pos).wrap_err("unexpected end of PGM header")?;
	std::str::from_utf8(token)
		.wrap_err("header field is not utf-8")?
		.parse()
		.wrap_err("header field is not a number")
}
