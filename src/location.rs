//! Source locations and their registry.

use std::{collections::HashSet, sync::Arc};

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::RwLock;

use crate::{color::Color, Error, Result};

/// Capture the path of the enclosing function.
#[doc(hidden)]
#[macro_export]
macro_rules! function {
	() => {{
		struct S;
		let s = ::std::any::type_name::<S>();
		&s[..s.len() - 3]
	}};
}

/// Resolve a [`SourceLocation`](crate::location::SourceLocation) for the current call site.
///
/// Evaluates to `Result<Arc<SourceLocation>>`. A literal name is interned in the global [`Registry`] and cached in
/// the call site. Any other name gets a fresh location on every evaluation, so names built at runtime never
/// accumulate in the registry.
///
/// # Example
/// ```
/// # use tracy_lite::{color::Color, location};
/// let loc = location!("update").unwrap();
/// assert_eq!(loc.name(), "update");
///
/// let red = location!("render", Color::RED).unwrap();
/// assert_eq!(red.color(), Color::RED);
/// ```
#[macro_export]
macro_rules! location {
	($name:literal) => {
		$crate::location!($name, $crate::color::Color::default())
	};

	($name:literal, $color:expr) => {{
		static LOCATION: $crate::location::CallSite = $crate::location::CallSite::new();
		LOCATION.resolve($name, file!(), $crate::function!(), line!(), $color)
	}};

	($name:expr) => {
		$crate::location!($name, $crate::color::Color::default())
	};

	($name:expr, $color:expr) => {
		$crate::location::SourceLocation::new(
			::std::convert::AsRef::<str>::as_ref(&$name),
			file!(),
			$crate::function!(),
			line!(),
			$color,
		)
		.map(::std::sync::Arc::new)
	};
}

/// Where a zone was declared. Immutable once resolved.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceLocation {
	name: String,
	file: Option<String>,
	function: Option<String>,
	line: u32,
	color: Color,
}

impl SourceLocation {
	/// Build a location without interning it. Empty `file` and `function` are stored as absent.
	///
	/// Fails with [`Error::InvalidArgument`] if `name` is empty.
	pub fn new(name: &str, file: &str, function: &str, line: u32, color: Color) -> Result<Self> {
		if name.is_empty() {
			return Err(Error::InvalidArgument("zone name is empty"));
		}

		Ok(Self {
			name: name.to_owned(),
			file: non_empty(file),
			function: non_empty(function),
			line,
			color,
		})
	}

	pub fn name(&self) -> &str { &self.name }

	/// The source file, or `None` if none was given.
	pub fn file(&self) -> Option<&str> { self.file.as_deref() }

	/// The enclosing function, or `None` if none was given.
	pub fn function(&self) -> Option<&str> { self.function.as_deref() }

	pub fn line(&self) -> u32 { self.line }

	pub fn color(&self) -> Color { self.color }
}

fn non_empty(s: &str) -> Option<String> { (!s.is_empty()).then(|| s.to_owned()) }

/// Interns source locations, so equal call sites share one allocation.
#[derive(Default)]
pub struct Registry {
	locations: RwLock<HashSet<Arc<SourceLocation>>>,
}

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

impl Registry {
	pub fn new() -> Self { Self::default() }

	/// The registry shared by the whole process.
	pub fn global() -> &'static Registry { &GLOBAL }

	/// Resolve a source location, reusing the interned one if it exists. Empty `file` and `function` are stored
	/// as absent.
	///
	/// Interned locations live as long as the registry, so only resolve names drawn from a fixed set.
	///
	/// Fails with [`Error::InvalidArgument`] if `name` is empty, without registering anything.
	pub fn resolve(&self, name: &str, file: &str, function: &str, line: u32, color: Color) -> Result<Arc<SourceLocation>> {
		let location = SourceLocation::new(name, file, function, line, color)?;

		if let Some(interned) = self.locations.read().get(&location) {
			return Ok(interned.clone());
		}

		let mut locations = self.locations.write();
		if let Some(interned) = locations.get(&location) {
			return Ok(interned.clone());
		}
		let interned = Arc::new(location);
		locations.insert(interned.clone());
		Ok(interned)
	}

	/// The number of distinct locations interned so far.
	pub fn len(&self) -> usize { self.locations.read().len() }

	pub fn is_empty(&self) -> bool { self.len() == 0 }
}

/// Per call site cache used by [`location!`](crate::location!).
#[doc(hidden)]
pub struct CallSite {
	location: OnceCell<Arc<SourceLocation>>,
}

impl CallSite {
	pub const fn new() -> Self {
		Self {
			location: OnceCell::new(),
		}
	}

	pub fn resolve(&self, name: &str, file: &str, function: &str, line: u32, color: Color) -> Result<Arc<SourceLocation>> {
		match self.location.get() {
			Some(location) if location.color == color => Ok(location.clone()),
			_ => {
				let location = Registry::global().resolve(name, file, function, line, color)?;
				let _ = self.location.set(location.clone());
				Ok(location)
			},
		}
	}
}
