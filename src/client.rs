use std::{fmt, sync::Arc};

use once_cell::sync::{Lazy, OnceCell};

use crate::{
	sink::{NullSink, Sink},
	Error,
	Result,
};

/// Entry point for instrumentation: routes zones, frame marks and messages to a [`Sink`].
///
/// Cloning is cheap and clones share the sink. Zone methods live in [`zone`](crate::zone), frame and message
/// methods in [`frame`](crate::frame).
#[derive(Clone)]
pub struct Client {
	pub(crate) sink: Arc<dyn Sink>,
}

impl Client {
	pub fn new<S: Sink + 'static>(sink: S) -> Self { Self { sink: Arc::new(sink) } }

	/// Use a sink that is also held elsewhere, for example to inspect a [`MemorySink`](crate::sink::MemorySink).
	pub fn from_shared(sink: Arc<dyn Sink>) -> Self { Self { sink } }

	/// A client that drops everything.
	pub fn disabled() -> Self { Self::new(NullSink) }

	pub fn sink(&self) -> &dyn Sink { &*self.sink }

	pub fn flush(&self) { self.sink.flush() }
}

impl fmt::Debug for Client {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.debug_struct("Client").finish_non_exhaustive() }
}

static GLOBAL: OnceCell<Client> = OnceCell::new();
static DISABLED: Lazy<Client> = Lazy::new(Client::disabled);

/// Install the client used by the macros and the free functions. Can only be done once per process.
pub fn install(client: Client) -> Result<()> {
	GLOBAL
		.set(client)
		.map_err(|_| Error::InvalidState("a global client is already installed"))
}

/// The installed client, or a disabled one if [`install`] has not been called.
#[inline]
pub fn client() -> &'static Client { GLOBAL.get().unwrap_or(&DISABLED) }

/// Whether [`install`] has been called.
pub fn is_installed() -> bool { GLOBAL.get().is_some() }
