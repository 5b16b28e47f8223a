//! Event sinks.
//!
//! A sink receives every event the client produces. Emission is fire-and-forget: [`Sink::emit`] has no way to
//! report failure, so a sink deals with its own errors (dropping, counting or logging them) and never blocks for
//! long, since it runs inline on the instrumented thread.

use std::{
	fs::File,
	io::{self, BufWriter, Write},
	path::Path,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc,
	},
	time::Instant,
};

use parking_lot::Mutex;

use crate::event::{Event, ZoneEventKind};

/// Consumer of instrumentation events.
///
/// Implementations must be `Send + Sync`: a single sink is shared by every thread that emits through a
/// [`Client`](crate::Client). Any synchronization across threads is the sink's own business.
pub trait Sink: Send + Sync {
	/// Take ownership of an event. Must not panic on any event the client produces.
	fn emit(&self, event: Event);

	/// Push out anything buffered.
	fn flush(&self) {}
}

impl<S: Sink + ?Sized> Sink for Arc<S> {
	#[inline(always)]
	fn emit(&self, event: Event) { (**self).emit(event) }

	#[inline(always)]
	fn flush(&self) { (**self).flush() }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
	#[inline(always)]
	fn emit(&self, event: Event) { (**self).emit(event) }

	#[inline(always)]
	fn flush(&self) { (**self).flush() }
}

/// Drops every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl Sink for NullSink {
	#[inline(always)]
	fn emit(&self, _: Event) {}
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
	events: Mutex<Vec<Event>>,
}

impl MemorySink {
	pub fn new() -> Self { Self::default() }

	/// A copy of the events collected so far.
	pub fn events(&self) -> Vec<Event> { self.events.lock().clone() }

	/// Remove and return the events collected so far.
	pub fn take(&self) -> Vec<Event> { std::mem::take(&mut *self.events.lock()) }

	pub fn len(&self) -> usize { self.events.lock().len() }

	pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl Sink for MemorySink {
	fn emit(&self, event: Event) { self.events.lock().push(event); }
}

/// Writes one line of text per event.
///
/// Timestamps are printed relative to the creation of the sink, and zones are indented by depth. Write errors
/// are counted and the first one is logged; the event is lost.
pub struct WriterSink<W> {
	writer: Mutex<W>,
	start: Instant,
	failures: AtomicU64,
}

impl WriterSink<io::Stdout> {
	pub fn stdout() -> Self { Self::new(io::stdout()) }
}

impl WriterSink<io::Stderr> {
	pub fn stderr() -> Self { Self::new(io::stderr()) }
}

impl WriterSink<BufWriter<File>> {
	/// Write to a new file at `path`, truncating it if it exists.
	pub fn create(path: impl AsRef<Path>) -> io::Result<Self> {
		let file = File::create(path)?;
		Ok(Self::new(BufWriter::new(file)))
	}
}

impl<W: Write + Send> WriterSink<W> {
	pub fn new(writer: W) -> Self {
		Self {
			writer: Mutex::new(writer),
			start: Instant::now(),
			failures: AtomicU64::new(0),
		}
	}

	/// How many events or flushes failed to write.
	pub fn failures(&self) -> u64 { self.failures.load(Ordering::Relaxed) }

	pub fn into_inner(self) -> W { self.writer.into_inner() }

	fn write_event(&self, writer: &mut W, event: &Event) -> io::Result<()> {
		let secs = event.timestamp().saturating_duration_since(self.start).as_secs_f64();
		write!(writer, "[{secs:>12.6}] {:?} ", event.thread())?;

		match event {
			Event::Zone(zone) => {
				let loc = &zone.location;
				let indent = "  ".repeat(zone.depth as usize);
				match zone.kind {
					ZoneEventKind::Begin => {
						write!(writer, "{indent}begin {}", loc.name())?;
						if let Some(file) = loc.file() {
							write!(writer, " at {}:{}", file, loc.line())?;
						}
						if let Some(function) = loc.function() {
							write!(writer, " in {function}")?;
						}
						writeln!(writer)
					},
					ZoneEventKind::End { duration } => writeln!(writer, "{indent}end {} after {duration:?}", loc.name()),
				}
			},
			Event::FrameMark(frame) => writeln!(writer, "frame {}", frame.name.as_deref().unwrap_or("<main>")),
			Event::Message(message) => writeln!(writer, "message {} {}", message.color, message.text),
		}
	}

	fn record_failure(&self, err: io::Error) {
		if self.failures.fetch_add(1, Ordering::Relaxed) == 0 {
			tracing::warn!("event sink failed to write, further failures are counted silently: {err}");
		}
	}
}

impl<W: Write + Send> Sink for WriterSink<W> {
	fn emit(&self, event: Event) {
		let mut writer = self.writer.lock();
		if let Err(err) = self.write_event(&mut *writer, &event) {
			drop(writer);
			self.record_failure(err);
		}
	}

	fn flush(&self) {
		let result = self.writer.lock().flush();
		if let Err(err) = result {
			self.record_failure(err);
		}
	}
}

/// Forwards events to `tracing` as structured events.
///
/// Zones are logged at `TRACE`, frame marks at `DEBUG` and messages at `INFO`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl Sink for TracingSink {
	fn emit(&self, event: Event) {
		match event {
			Event::Zone(zone) => match zone.kind {
				ZoneEventKind::Begin => tracing::trace!(
					zone = zone.location.name(),
					depth = zone.depth,
					file = zone.location.file(),
					line = zone.location.line(),
					"zone begin"
				),
				ZoneEventKind::End { duration } => tracing::trace!(
					zone = zone.location.name(),
					depth = zone.depth,
					duration_ns = duration.as_nanos() as u64,
					"zone end"
				),
			},
			Event::FrameMark(frame) => tracing::debug!(frame = frame.name.as_deref(), "frame mark"),
			Event::Message(message) => tracing::info!(color = %message.color, "{}", message.text),
		}
	}
}
