/// Errors surfaced to instrumented code.
///
/// Sink failures never show up here: a [`Sink`](crate::sink::Sink) absorbs its own errors.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	/// The caller passed a value that cannot produce a meaningful event, such as an empty zone name.
	#[error("invalid argument: {0}")]
	InvalidArgument(&'static str),
	/// The call does not fit the current state, such as closing a zone that is not the innermost one.
	#[error("invalid state: {0}")]
	InvalidState(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
