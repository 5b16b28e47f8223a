//! Zones: named, timed, properly nested spans of execution on one thread.
//!
//! Every thread owns a stack of open zones. Zones close in reverse order of opening; closing anything but the
//! innermost zone fails with [`Error::InvalidState`]. The stack belongs to the thread, not to a [`Client`], so
//! zones opened through different clients on one thread nest with each other.
//!
//! # Suspension
//!
//! A zone must not stay open across a suspension point: its duration would include time the thread spent on
//! other work. [`ZoneHandle`] and [`Zone`] are `!Send`, so a `Send` future cannot hold one across an `.await`.
//! Use [`trace_future!`](crate::trace_future) to profile async code, which opens a zone for every poll.

use std::{
	cell::{Cell, RefCell},
	marker::PhantomData,
	mem::ManuallyDrop,
	sync::Arc,
	thread::{self, ThreadId},
	time::{Duration, Instant},
};

use crate::{
	color::Color,
	event::{Event, ZoneEvent, ZoneEventKind},
	location::SourceLocation,
	sink::Sink,
	Client,
	Error,
	Result,
};

/// Open a zone on the global client that ends at the end of the enclosing scope.
///
/// Evaluates to `Result<Zone<'static>>`, failing if the name is empty.
///
/// # Example
/// ```
/// # use tracy_lite::{color::Color, zone};
/// # fn main() -> tracy_lite::Result<()> {
/// let _zone = zone!("update")?;
/// {
/// 	let _inner = zone!("physics", Color::BLUE)?;
/// }
/// # Ok(())
/// # }
/// ```
#[macro_export]
macro_rules! zone {
	($name:literal) => {
		$crate::zone!($name, $crate::color::Color::default())
	};

	($name:literal, $color:expr) => {
		$crate::location!($name, $color).map(|location| $crate::client().zone(location))
	};

	($name:expr) => {
		$crate::zone!($name, $crate::color::Color::default())
	};

	($name:expr, $color:expr) => {
		$crate::location!($name, $color).map(|location| $crate::client().zone(location))
	};
}

struct ActiveZone {
	id: u64,
	location: Arc<SourceLocation>,
	begin: Instant,
	thread: ThreadId,
	depth: u32,
	/// Set when the zone's guard went away while inner zones were still open. The zone then closes, through
	/// this sink, as soon as it is back on top of the stack.
	abandoned: Option<Arc<dyn Sink>>,
}

impl ActiveZone {
	fn end_event(self, timestamp: Instant) -> ZoneEvent {
		ZoneEvent {
			location: self.location,
			kind: ZoneEventKind::End {
				duration: timestamp.saturating_duration_since(self.begin),
			},
			timestamp,
			thread: self.thread,
			depth: self.depth,
		}
	}
}

thread_local! {
	static STACK: RefCell<Vec<ActiveZone>> = const { RefCell::new(Vec::new()) };
	static NEXT_ID: Cell<u64> = const { Cell::new(0) };
	static THREAD: ThreadId = thread::current().id();
}

/// Returned while the thread's locals are being torn down.
const TEARDOWN: Error = Error::InvalidState("zone stack is gone, the thread is exiting");

pub(crate) fn current_thread() -> ThreadId { THREAD.try_with(|id| *id).unwrap_or_else(|_| thread::current().id()) }

fn with_stack<R>(f: impl FnOnce(&mut Vec<ActiveZone>) -> R) -> Result<R> {
	STACK
		.try_with(|stack| f(&mut stack.borrow_mut()))
		.map_err(|_| TEARDOWN)
}

/// The number of zones open on the calling thread.
pub fn open_zones() -> usize { with_stack(|stack| stack.len()).unwrap_or(0) }

fn push(location: Arc<SourceLocation>) -> (ZoneHandle, ZoneEvent) {
	let id = NEXT_ID.with(|next| {
		let id = next.get();
		next.set(id + 1);
		id
	});
	let timestamp = Instant::now();
	let thread = current_thread();
	// A zone opened during teardown is never tracked; closing it fails silently with `TEARDOWN`.
	let depth = with_stack(|stack| {
		let depth = stack.len() as u32;
		stack.push(ActiveZone {
			id,
			location: location.clone(),
			begin: timestamp,
			thread,
			depth,
			abandoned: None,
		});
		depth
	})
	.unwrap_or(0);

	let handle = ZoneHandle {
		id,
		depth,
		_thread: PhantomData,
	};
	let event = ZoneEvent {
		location,
		kind: ZoneEventKind::Begin,
		timestamp,
		thread,
		depth,
	};
	(handle, event)
}

fn pop(handle: ZoneHandle) -> Result<ZoneEvent> {
	let active = with_stack(|stack| {
		let top = stack.last().map(|active| active.id);
		match top {
			Some(id) if id == handle.id => stack.pop().ok_or(Error::InvalidState("no zone is open on this thread")),
			Some(_) => Err(Error::InvalidState("zone is not the innermost open zone on this thread")),
			None => Err(Error::InvalidState("no zone is open on this thread")),
		}
	})??;

	Ok(active.end_event(Instant::now()))
}

/// Pop the top of the stack if its guard was abandoned.
fn pop_abandoned() -> Option<(Arc<dyn Sink>, ZoneEvent)> {
	with_stack(|stack| {
		if stack.last()?.abandoned.is_none() {
			return None;
		}
		let mut active = stack.pop()?;
		let sink = active.abandoned.take()?;
		Some((sink, active.end_event(Instant::now())))
	})
	.ok()
	.flatten()
}

/// Mark a zone to be closed once every zone inside it has closed.
fn abandon(handle: ZoneHandle, sink: &Arc<dyn Sink>) -> Result<()> {
	with_stack(|stack| match stack.iter_mut().rev().find(|active| active.id == handle.id) {
		Some(active) => {
			active.abandoned = Some(sink.clone());
			Ok(())
		},
		None => Err(Error::InvalidState("zone is not open on this thread")),
	})?
}

/// Identifies an open zone. Pass it to [`Client::end_zone`] to close the zone.
///
/// Handles are `Copy`: if closing fails because inner zones are still open, the same handle can be used again
/// once they have closed. Every zone gets a new id, so a handle never closes a zone other than its own.
#[must_use = "the zone stays open until the handle is passed to `Client::end_zone`"]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZoneHandle {
	id: u64,
	depth: u32,
	_thread: PhantomData<*const ()>,
}

impl ZoneHandle {
	/// Number of zones that were open on the thread when this one began.
	pub fn depth(&self) -> u32 { self.depth }
}

/// A zone that ends when dropped, including during unwinding.
///
/// If the guard goes away while zones opened after it are still open, the zone ends right after the last of
/// them, so the thread's stack always unwinds completely.
#[must_use = "the zone ends as soon as the guard is dropped"]
#[derive(Debug)]
pub struct Zone<'a> {
	client: &'a Client,
	handle: ZoneHandle,
}

impl Zone<'_> {
	pub fn depth(&self) -> u32 { self.handle.depth }

	/// End the zone now, reporting whether it was the innermost open zone.
	///
	/// On [`Error::InvalidState`] the zone still ends, right after the zones inside it.
	pub fn end(self) -> Result<Duration> {
		let this = ManuallyDrop::new(self);
		this.client.end_or_abandon(this.handle)
	}
}

impl Drop for Zone<'_> {
	fn drop(&mut self) {
		match self.client.end_or_abandon(self.handle) {
			Ok(_) | Err(TEARDOWN) => {},
			Err(err) => tracing::error!(depth = self.handle.depth, "zone guard dropped out of order: {err}"),
		}
	}
}

impl Client {
	/// Open a zone at `location` on the calling thread.
	pub fn begin_zone(&self, location: Arc<SourceLocation>) -> ZoneHandle {
		let (handle, event) = push(location);
		self.sink.emit(Event::Zone(event));
		handle
	}

	/// Build a location and open a zone there. The location is not interned, so dynamic names are fine.
	///
	/// Nothing is pushed or emitted if the name is empty.
	pub fn begin(&self, name: &str, file: &str, function: &str, line: u32, color: Color) -> Result<ZoneHandle> {
		let location = SourceLocation::new(name, file, function, line, color)?;
		Ok(self.begin_zone(Arc::new(location)))
	}

	/// Close the zone behind `handle` and return how long it was open.
	///
	/// Fails with [`Error::InvalidState`] if it is not the innermost open zone on the calling thread; the zone
	/// then stays open and `handle` can close it later.
	pub fn end_zone(&self, handle: ZoneHandle) -> Result<Duration> {
		let event = pop(handle)?;
		let duration = event.duration().unwrap_or_default();
		self.sink.emit(Event::Zone(event));

		while let Some((sink, event)) = pop_abandoned() {
			sink.emit(Event::Zone(event));
		}
		Ok(duration)
	}

	/// End the zone, or have it end after the zones inside it if there are any.
	pub(crate) fn end_or_abandon(&self, handle: ZoneHandle) -> Result<Duration> {
		self.end_zone(handle).map_err(|err| {
			if err != TEARDOWN {
				let _ = abandon(handle, &self.sink);
			}
			err
		})
	}

	/// Open a zone that ends when the returned guard is dropped.
	pub fn zone(&self, location: Arc<SourceLocation>) -> Zone<'_> {
		Zone {
			client: self,
			handle: self.begin_zone(location),
		}
	}

	/// Run `f` inside a zone at `location`.
	pub fn in_zone<T>(&self, location: Arc<SourceLocation>, f: impl FnOnce() -> T) -> T {
		let _zone = self.zone(location);
		f()
	}
}
