use std::fmt;

/// A 24-bit RGB color, as shown by the viewer.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Color(u32);

impl Color {
	/// Tracy treats `0` as "no color", so black is nudged off zero.
	pub const BLACK: Color = Color::new(0, 0, 1);
	pub const BLUE: Color = Color::new(0, 0, 255);
	pub const CYAN: Color = Color::new(0, 255, 255);
	pub const GREEN: Color = Color::new(0, 255, 0);
	pub const MAGENTA: Color = Color::new(255, 0, 255);
	pub const RED: Color = Color::new(255, 0, 0);
	pub const WHITE: Color = Color::new(255, 255, 255);
	pub const YELLOW: Color = Color::new(255, 255, 0);
}

impl Color {
	#[inline(always)]
	pub const fn new(r: u8, g: u8, b: u8) -> Color { Color((r as u32) << 16 | (g as u32) << 8 | (b as u32)) }

	/// Build a color from `0xRRGGBB`. Bits above the low 24 are discarded.
	#[inline(always)]
	pub const fn from_rgb(rgb: u32) -> Color { Color(rgb & 0x00FF_FFFF) }

	/// Let the viewer pick the color.
	#[inline(always)]
	pub const fn none() -> Color { Color(0) }

	#[inline(always)]
	pub const fn is_none(&self) -> bool { self.0 == 0 }

	#[inline(always)]
	pub const fn to_u32(&self) -> u32 { self.0 }

	#[inline(always)]
	pub const fn r(&self) -> u8 { (self.0 >> 16) as u8 }

	#[inline(always)]
	pub const fn g(&self) -> u8 { (self.0 >> 8) as u8 }

	#[inline(always)]
	pub const fn b(&self) -> u8 { self.0 as u8 }
}

impl Default for Color {
	fn default() -> Self { Color::WHITE }
}

impl From<u32> for Color {
	#[inline(always)]
	fn from(rgb: u32) -> Self { Color::from_rgb(rgb) }
}

impl From<Color> for u32 {
	#[inline(always)]
	fn from(color: Color) -> Self { color.0 }
}

impl fmt::Display for Color {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "#{:06X}", self.0) }
}
