//! Instrumentation for the Tracy profiler model: zones, frame marks and messages, delivered to a pluggable
//! [`Sink`](sink::Sink).
//!
//! ```
//! use std::sync::Arc;
//! use tracy_lite::{location, sink::MemorySink, Client};
//!
//! let sink = Arc::new(MemorySink::new());
//! let client = Client::from_shared(sink.clone());
//!
//! let handle = client.begin_zone(location!("load").unwrap());
//! client.mark_frame(None);
//! client.end_zone(handle).unwrap();
//!
//! assert_eq!(sink.len(), 3);
//! ```

pub mod client;
pub mod color;
mod error;
pub mod event;
pub mod frame;
#[cfg(feature = "futures")]
pub mod future;
pub mod location;
pub mod sink;
#[cfg(feature = "tracing-layer")]
pub mod tracing;
#[cfg(feature = "enable")]
pub mod tracy;
pub mod zone;

pub use client::{client, install, is_installed, Client};
pub use error::{Error, Result};
pub use zone::{open_zones, Zone, ZoneHandle};
