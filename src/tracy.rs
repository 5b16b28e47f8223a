//! Forwarding events to the native Tracy client.

use std::{
	cell::RefCell,
	collections::HashMap,
	ffi::{CStr, CString},
};

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::{
	event::{Event, ZoneEvent, ZoneEventKind},
	sink::Sink,
};

thread_local! {
	static STACK: RefCell<Vec<sys::___tracy_c_zone_context>> = const { RefCell::new(Vec::new()) };
}

/// Tracy identifies frames by the address of their name, so every name gets one leaked C string.
static FRAME_NAMES: Lazy<Mutex<HashMap<String, &'static CStr>>> = Lazy::new(|| Mutex::new(HashMap::new()));

fn frame_name(name: &str) -> Option<&'static CStr> {
	let mut names = FRAME_NAMES.lock();
	if let Some(cstr) = names.get(name) {
		return Some(*cstr);
	}

	match CString::new(name) {
		Ok(cstr) => {
			let cstr: &'static CStr = Box::leak(cstr.into_boxed_c_str());
			names.insert(name.to_owned(), cstr);
			Some(cstr)
		},
		Err(err) => {
			tracing::warn!("dropping frame mark, name is not a valid C string: {err}");
			None
		},
	}
}

/// A sink that hands events to Tracy.
///
/// Events must be emitted on the thread they describe, which is always the case for events coming from a
/// [`Client`](crate::Client).
pub struct TracySink {
	_private: (),
}

impl TracySink {
	/// With `manual-init`, this starts the profiler. Create a single `TracySink` per process.
	pub fn new() -> Self {
		#[cfg(feature = "manual-init")]
		unsafe {
			sys::___tracy_startup_profiler();
		}
		Self { _private: () }
	}

	fn zone(&self, zone: ZoneEvent) {
		match zone.kind {
			ZoneEventKind::Begin => {
				let loc = &zone.location;
				let name = loc.name();
				let file = loc.file().unwrap_or("");
				let function = loc.function().unwrap_or("");

				unsafe {
					let srcloc = sys::___tracy_alloc_srcloc_name(
						loc.line(),
						file.as_ptr() as _,
						file.len(),
						function.as_ptr() as _,
						function.len(),
						name.as_ptr() as _,
						name.len(),
						loc.color().to_u32(),
					);

					let ctx = sys::___tracy_emit_zone_begin_alloc(srcloc, 1);
					if STACK.try_with(|stack| stack.borrow_mut().push(ctx)).is_err() {
						sys::___tracy_emit_zone_end(ctx);
					}
				}
			},
			ZoneEventKind::End { .. } => {
				// Ends arriving while the thread's locals are torn down have no context left to close.
				if let Some(ctx) = STACK.try_with(|stack| stack.borrow_mut().pop()).ok().flatten() {
					unsafe {
						sys::___tracy_emit_zone_end(ctx);
					}
				}
			},
		}
	}
}

impl Default for TracySink {
	fn default() -> Self { Self::new() }
}

impl Sink for TracySink {
	fn emit(&self, event: Event) {
		match event {
			Event::Zone(zone) => self.zone(zone),
			Event::FrameMark(frame) => match frame.name {
				None => unsafe { sys::___tracy_emit_frame_mark(std::ptr::null()) },
				Some(name) => {
					if let Some(name) = frame_name(&name) {
						unsafe { sys::___tracy_emit_frame_mark(name.as_ptr()) }
					}
				},
			},
			Event::Message(message) => unsafe {
				sys::___tracy_emit_messageC(
					message.text.as_ptr() as _,
					message.text.len(),
					message.color.to_u32(),
					0,
				);
			},
		}
	}
}

impl Drop for TracySink {
	fn drop(&mut self) {
		#[cfg(feature = "manual-init")]
		unsafe {
			sys::___tracy_shutdown_profiler();
		}
	}
}
