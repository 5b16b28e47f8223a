//! Events handed to a [`Sink`](crate::sink::Sink).

use std::{
	sync::Arc,
	thread::ThreadId,
	time::{Duration, Instant},
};

use crate::{color::Color, location::SourceLocation};

#[derive(Clone, Debug)]
pub enum Event {
	Zone(ZoneEvent),
	FrameMark(FrameMarkEvent),
	Message(MessageEvent),
}

impl Event {
	pub fn timestamp(&self) -> Instant {
		match self {
			Event::Zone(e) => e.timestamp,
			Event::FrameMark(e) => e.timestamp,
			Event::Message(e) => e.timestamp,
		}
	}

	pub fn thread(&self) -> ThreadId {
		match self {
			Event::Zone(e) => e.thread,
			Event::FrameMark(e) => e.thread,
			Event::Message(e) => e.thread,
		}
	}

	pub fn as_zone(&self) -> Option<&ZoneEvent> {
		match self {
			Event::Zone(e) => Some(e),
			_ => None,
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneEventKind {
	Begin,
	/// The zone closed after `duration`.
	End { duration: Duration },
}

/// A zone opening or closing on a thread.
#[derive(Clone, Debug)]
pub struct ZoneEvent {
	pub location: Arc<SourceLocation>,
	pub kind: ZoneEventKind,
	pub timestamp: Instant,
	pub thread: ThreadId,
	/// Number of zones that were already open on the thread when this one began.
	pub depth: u32,
}

impl ZoneEvent {
	pub fn is_begin(&self) -> bool { self.kind == ZoneEventKind::Begin }

	pub fn duration(&self) -> Option<Duration> {
		match self.kind {
			ZoneEventKind::Begin => None,
			ZoneEventKind::End { duration } => Some(duration),
		}
	}
}

/// The end of a frame. `name` is `None` for the main continuous frame.
#[derive(Clone, Debug)]
pub struct FrameMarkEvent {
	pub name: Option<String>,
	pub timestamp: Instant,
	pub thread: ThreadId,
}

/// Free text, not attached to any zone.
#[derive(Clone, Debug)]
pub struct MessageEvent {
	pub text: String,
	pub color: Color,
	pub timestamp: Instant,
	pub thread: ThreadId,
}
