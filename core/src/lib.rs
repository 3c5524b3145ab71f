pub mod detect;
pub mod frame;
pub mod pipeline;
pub mod queue;
pub mod sink;
pub mod source;
pub mod stats;

use std::sync::atomic::AtomicUsize;

/// Running count of frames the process stage has finished, for progress reporting.
pub static FRAMES_PROCESSED: AtomicUsize = AtomicUsize::new(0);
