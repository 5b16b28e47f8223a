use std::{cell::RefCell, sync::Arc};

use tracing::{span::Attributes, Id, Subscriber};
use tracing_subscriber::{
	fmt::{format::DefaultFields, FormatFields, FormattedFields},
	layer::Context,
	registry::LookupSpan,
	Layer,
};

use crate::{
	color::Color,
	location::{Registry, SourceLocation},
	zone::ZoneHandle,
	Client,
};

thread_local! {
	static STACK: RefCell<Vec<Option<ZoneHandle>>> = const { RefCell::new(Vec::new()) };
}

/// A tracing layer that opens a zone whenever a span is entered and closes it when the span is exited.
///
/// The zone is named after the span and its fields, e.g. `load{path="a.png"}`. Spans without fields share an
/// interned location per name and call site; spans with fields get a new location on every enter.
pub struct ZoneLayer {
	client: Client,
}

impl ZoneLayer {
	pub fn new(client: Client) -> Self { Self { client } }
}

impl<S> Layer<S> for ZoneLayer
where
	S: Subscriber,
	S: for<'a> LookupSpan<'a>,
{
	fn on_new_span(&self, attrs: &Attributes<'_>, id: &Id, ctx: Context<'_, S>) {
		if let Some(span) = ctx.span(id) {
			let mut extensions = span.extensions_mut();

			if extensions.get_mut::<FormattedFields<DefaultFields>>().is_none() {
				let mut fields = FormattedFields::<DefaultFields>::new(String::with_capacity(64));

				if DefaultFields::default()
					.format_fields(fields.as_writer(), attrs)
					.is_ok()
				{
					extensions.insert(fields);
				}
			}
		}
	}

	fn on_enter(&self, id: &Id, ctx: Context<'_, S>) {
		let Some(span) = ctx.span(id) else {
			return;
		};
		let meta = span.metadata();
		let file = meta.file().unwrap_or("");
		let module = meta.module_path().unwrap_or("");
		let line = meta.line().unwrap_or(0);

		// Field values vary per span, so only bare span names are interned.
		let location = match span.extensions().get::<FormattedFields<DefaultFields>>() {
			Some(fields) if !fields.fields.as_str().is_empty() => {
				let name = format!("{}{{{}}}", meta.name(), fields.fields.as_str());
				SourceLocation::new(&name, file, module, line, Color::none()).map(Arc::new)
			},
			_ => Registry::global().resolve(meta.name(), file, module, line, Color::none()),
		};

		// Spans with an empty name still get a slot, so exits stay paired with enters.
		let handle = location.ok().map(|location| self.client.begin_zone(location));

		STACK.with(|stack| stack.borrow_mut().push(handle));
	}

	fn on_exit(&self, _id: &Id, _ctx: Context<'_, S>) {
		let handle = STACK.with(|stack| stack.borrow_mut().pop()).flatten();
		if let Some(handle) = handle {
			// Logging from inside the layer would re-enter the subscriber.
			let _ = self.client.end_or_abandon(handle);
		}
	}
}
