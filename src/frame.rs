use std::time::Instant;

use crate::{
	client,
	color::Color,
	event::{Event, FrameMarkEvent, MessageEvent},
	zone::current_thread,
	Client,
	Error,
	Result,
};

/// Macro to make working with frame marks easier.
///
/// # Example
/// ```
/// # use tracy_lite::frame;
///
/// // Main continuous frame.
/// frame!();
///
/// // Secondary continuous frame.
/// frame!("Secondary Frame");
/// ```
#[macro_export]
macro_rules! frame {
	() => {
		$crate::frame::mark_frame(None);
	};

	($name:expr) => {
		$crate::frame::mark_frame(Some($name));
	};
}

/// Send a message to the global client. Evaluates to `Result<()>`.
///
/// # Example
/// ```
/// # use tracy_lite::{color::Color, message};
/// message!("level loaded").unwrap();
/// message!("out of memory", Color::RED).unwrap();
/// assert!(message!("").is_err());
/// ```
#[macro_export]
macro_rules! message {
	($text:expr) => {
		$crate::frame::emit_message($text, $crate::color::Color::default())
	};

	($text:expr, $color:expr) => {
		$crate::frame::emit_message($text, $color)
	};
}

#[inline]
/// A frame has ended on the global client. `None` is the main continuous frame.
///
/// A 'continuous frame' is some work that repeats continuously for the duration of the program.
pub fn mark_frame(name: Option<&str>) { client().mark_frame(name) }

#[inline]
/// Send a message to the global client.
pub fn emit_message(text: &str, color: Color) -> Result<()> { client().emit_message(text, color) }

impl Client {
	/// The processing of a frame has ended. `None` is the main continuous frame.
	pub fn mark_frame(&self, name: Option<&str>) {
		self.sink.emit(Event::FrameMark(FrameMarkEvent {
			name: name.map(str::to_owned),
			timestamp: Instant::now(),
			thread: current_thread(),
		}));
	}

	/// Send a free-standing message, not tied to any zone.
	///
	/// Fails with [`Error::InvalidArgument`] if `text` is empty.
	pub fn emit_message(&self, text: &str, color: Color) -> Result<()> {
		if text.is_empty() {
			return Err(Error::InvalidArgument("message text is empty"));
		}

		self.sink.emit(Event::Message(MessageEvent {
			text: text.to_owned(),
			color,
			timestamp: Instant::now(),
			thread: current_thread(),
		}));
		Ok(())
	}
}
