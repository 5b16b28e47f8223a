use std::{
	future::Future,
	pin::Pin,
	sync::Arc,
	task::{Context, Poll},
};

use crate::{location::SourceLocation, Client};

/// Instrument a future on the global client. Evaluates to `Result<Instrumented<_>>`.
#[macro_export]
macro_rules! trace_future {
	($name:literal, $future:expr) => {
		$crate::location!($name).map(|location| $crate::future::Instrumented::new($crate::client().clone(), location, $future))
	};
}

/// A future that records a zone around every poll.
///
/// Each zone covers only the time the inner future actually ran, never the time it spent suspended.
pub struct Instrumented<T> {
	client: Client,
	location: Arc<SourceLocation>,
	inner: T,
}

impl<T> Instrumented<T> {
	pub fn new(client: Client, location: Arc<SourceLocation>, inner: T) -> Self {
		Self {
			client,
			location,
			inner,
		}
	}

	pub fn into_inner(self) -> T { self.inner }
}

impl<T: Future> Future for Instrumented<T> {
	type Output = T::Output;

	fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		// SAFETY: `inner` is never moved out of a pinned `Instrumented`.
		let this = unsafe { self.get_unchecked_mut() };
		let _zone = this.client.zone(this.location.clone());
		let inner = unsafe { Pin::new_unchecked(&mut this.inner) };
		inner.poll(cx)
	}
}
