use std::{
	cell::RefCell,
	panic::{self, AssertUnwindSafe},
	sync::Arc,
	thread,
	time::{Duration, Instant},
};

use tracy_lite::{
	color::Color,
	event::{Event, ZoneEvent, ZoneEventKind},
	location,
	location::Registry,
	open_zones,
	sink::MemorySink,
	Client,
	Error,
	Zone,
};

fn setup() -> (Arc<MemorySink>, Client) {
	let sink = Arc::new(MemorySink::new());
	let client = Client::from_shared(sink.clone());
	(sink, client)
}

fn zones(events: &[Event]) -> Vec<ZoneEvent> { events.iter().filter_map(Event::as_zone).cloned().collect() }

#[test]
fn begin_and_end_emit_paired_events() {
	let (sink, client) = setup();
	let loc = Registry::global()
		.resolve("load", "zones.rs", "begin_and_end", 7, Color::GREEN)
		.unwrap();

	let handle = client.begin_zone(loc.clone());
	assert_eq!(handle.depth(), 0);
	assert_eq!(open_zones(), 1);
	client.end_zone(handle).unwrap();
	assert_eq!(open_zones(), 0);

	let events = zones(&sink.take());
	assert_eq!(events.len(), 2);
	assert!(events[0].is_begin());
	assert_eq!(*events[0].location, *loc);
	assert_eq!(events[1].depth, 0);
	assert!(matches!(events[1].kind, ZoneEventKind::End { .. }));
	assert_eq!(events[0].thread, thread::current().id());
}

#[test]
fn sequential_zones_share_depth_and_nested_zones_go_deeper() {
	let (sink, client) = setup();
	let loc = location!("step").unwrap();

	let first = client.begin_zone(loc.clone());
	client.end_zone(first).unwrap();
	let second = client.begin_zone(loc.clone());
	assert_eq!(second.depth(), 0);

	let child = client.begin_zone(loc.clone());
	assert_eq!(child.depth(), 1);
	let grandchild = client.begin_zone(loc);
	assert_eq!(grandchild.depth(), 2);

	client.end_zone(grandchild).unwrap();
	client.end_zone(child).unwrap();
	client.end_zone(second).unwrap();

	let depths: Vec<_> = zones(&sink.take()).iter().map(|e| e.depth).collect();
	assert_eq!(depths, [0, 0, 0, 1, 2, 2, 1, 0]);
}

#[test]
fn closing_out_of_order_is_invalid_state() {
	let (sink, client) = setup();
	let outer = client.begin_zone(location!("outer").unwrap());
	let inner = client.begin_zone(location!("inner").unwrap());

	assert!(matches!(client.end_zone(outer), Err(Error::InvalidState(_))));
	assert_eq!(open_zones(), 2);

	// The failed close leaves the stack untouched and the handle usable.
	client.end_zone(inner).unwrap();
	assert_eq!(open_zones(), 1);
	client.end_zone(outer).unwrap();
	assert_eq!(open_zones(), 0);

	let later = client.begin_zone(location!("later").unwrap());
	assert_eq!(later.depth(), 0);
	client.end_zone(later).unwrap();

	let events = zones(&sink.take());
	let ends: Vec<_> = events.iter().filter(|e| !e.is_begin()).map(|e| e.location.name()).collect();
	assert_eq!(ends, ["inner", "outer", "later"]);
}

#[test]
fn stale_handle_does_not_match_a_newer_zone_at_the_same_depth() {
	let (_sink, client) = setup();
	let loc = location!("reuse").unwrap();

	let a = client.begin_zone(loc.clone());
	client.end_zone(a).unwrap();

	let b = client.begin_zone(loc);
	assert_eq!(b.depth(), a.depth());
	assert!(matches!(client.end_zone(a), Err(Error::InvalidState(_))));
	assert_eq!(open_zones(), 1);
	client.end_zone(b).unwrap();
	assert!(client.end_zone(b).is_err());
	assert_eq!(open_zones(), 0);
}

#[test]
fn empty_name_fails_without_side_effects() {
	let (sink, client) = setup();
	assert_eq!(
		client.begin("", "a.rs", "f", 1, Color::RED).unwrap_err(),
		Error::InvalidArgument("zone name is empty")
	);
	assert_eq!(open_zones(), 0);
	assert!(sink.is_empty());
}

#[test]
fn begin_resolves_in_place() {
	let (sink, client) = setup();
	let handle = client.begin("parse", "", "", 0, Color::none()).unwrap();
	client.end_zone(handle).unwrap();

	let events = zones(&sink.take());
	assert_eq!(events[0].location.name(), "parse");
	assert_eq!(events[0].location.file(), None);
	assert_eq!(events[0].location.function(), None);
}

#[test]
fn scoped_zone_ends_when_a_panic_unwinds() {
	let (sink, client) = setup();
	let loc = location!("fragile").unwrap();

	let result = panic::catch_unwind(AssertUnwindSafe(|| {
		let _zone = client.zone(loc.clone());
		panic!("boom");
	}));
	assert!(result.is_err());
	assert_eq!(open_zones(), 0);

	let events = zones(&sink.take());
	assert_eq!(events.len(), 2);
	assert!(events[0].is_begin());
	assert!(!events[1].is_begin());
}

#[test]
fn scoped_zone_ends_on_early_return() {
	fn work(client: &Client, fail: bool) -> Result<u32, &'static str> {
		let _zone = client.zone(location!("work").unwrap());
		if fail {
			return Err("failed");
		}
		Ok(1)
	}

	let (sink, client) = setup();
	assert!(work(&client, true).is_err());
	assert_eq!(work(&client, false), Ok(1));
	assert_eq!(open_zones(), 0);

	let ends = zones(&sink.take()).iter().filter(|e| !e.is_begin()).count();
	assert_eq!(ends, 2);
}

#[test]
fn explicit_end_reports_duration() {
	let (sink, client) = setup();
	let zone = client.zone(location!("sleep").unwrap());
	thread::sleep(Duration::from_millis(5));
	let duration = zone.end().unwrap();
	assert!(duration >= Duration::from_millis(5));

	let events = zones(&sink.take());
	assert_eq!(events[1].duration(), Some(duration));
}

#[test]
fn guard_dropped_out_of_order_ends_after_the_inner_zone() {
	let (sink, client) = setup();
	let outer = client.zone(location!("outer").unwrap());
	let inner = client.zone(location!("inner").unwrap());

	drop(outer);
	assert_eq!(open_zones(), 2);
	drop(inner);
	assert_eq!(open_zones(), 0);

	let events = zones(&sink.take());
	assert_eq!(events.len(), 4);
	assert_eq!(events[2].location.name(), "inner");
	assert_eq!(events[3].location.name(), "outer");
	assert_eq!(events[3].depth, 0);
	assert!(events[3].duration() >= events[2].duration());
}

#[test]
fn explicit_end_out_of_order_reports_and_still_closes() {
	let (sink, client) = setup();
	let outer = client.zone(location!("outer").unwrap());
	let inner = client.begin_zone(location!("inner").unwrap());

	assert!(matches!(outer.end(), Err(Error::InvalidState(_))));
	assert_eq!(open_zones(), 2);
	client.end_zone(inner).unwrap();
	assert_eq!(open_zones(), 0);
	assert_eq!(zones(&sink.take()).len(), 4);
}

#[test]
fn guard_held_in_a_thread_local_survives_thread_exit() {
	thread_local! {
		static HELD: RefCell<Option<Zone<'static>>> = const { RefCell::new(None) };
	}

	let sink = Arc::new(MemorySink::new());
	let client: &'static Client = Box::leak(Box::new(Client::from_shared(sink.clone())));

	thread::spawn(move || {
		let zone = client.zone(location!("held").unwrap());
		HELD.with(|held| *held.borrow_mut() = Some(zone));
	})
	.join()
	.unwrap();

	// Depending on teardown order the end event may or may not be emitted, but never twice.
	let ends = zones(&sink.take()).iter().filter(|e| !e.is_begin()).count();
	assert!(ends <= 1);
}

#[test]
fn dynamic_names_do_not_grow_the_registry() {
	let (sink, client) = setup();
	let before = Registry::global().len();

	for i in 0..1000 {
		let handle = client.begin(&format!("request {i}"), file!(), "", line!(), Color::none()).unwrap();
		client.end_zone(handle).unwrap();
		let _zone = client.zone(location!(format!("job {i}")).unwrap());
	}

	// Other tests in this binary intern a few literal names concurrently.
	assert!(Registry::global().len() - before < 50);
	assert_eq!(sink.len(), 4000);
}

#[test]
fn in_zone_wraps_the_closure() {
	let (sink, client) = setup();
	let value = client.in_zone(location!("compute").unwrap(), || {
		assert_eq!(open_zones(), 1);
		42
	});
	assert_eq!(value, 42);
	assert_eq!(sink.len(), 2);
}

#[test]
fn begin_frame_end_are_ordered() {
	let (sink, client) = setup();
	let handle = client.begin_zone(location!("load").unwrap());
	let started = Instant::now();
	client.mark_frame(None);
	thread::sleep(Duration::from_millis(2));
	let elapsed = started.elapsed();
	client.end_zone(handle).unwrap();

	let events = sink.take();
	assert_eq!(events.len(), 3);
	assert!(matches!(&events[0], Event::Zone(z) if z.is_begin() && z.location.name() == "load"));
	assert!(matches!(&events[1], Event::FrameMark(f) if f.name.is_none()));
	let Event::Zone(end) = &events[2] else {
		panic!("expected the zone to end last");
	};
	assert_eq!(end.location.name(), "load");
	assert!(end.duration().unwrap() >= elapsed);
	assert!(events[0].timestamp() <= events[1].timestamp());
	assert!(events[1].timestamp() <= events[2].timestamp());
}

#[test]
fn messages_are_validated() {
	let (sink, client) = setup();
	assert_eq!(
		client.emit_message("", Color::RED),
		Err(Error::InvalidArgument("message text is empty"))
	);
	assert!(sink.is_empty());

	client.emit_message("hello", Color::from_rgb(0xFF0000)).unwrap();
	let events = sink.take();
	assert_eq!(events.len(), 1);
	let Event::Message(message) = &events[0] else {
		panic!("expected a message");
	};
	assert_eq!(message.text, "hello");
	assert_eq!(message.color.to_u32(), 0xFF0000);
}

#[test]
fn named_frames_keep_their_name() {
	let (sink, client) = setup();
	client.mark_frame(Some("physics"));
	let events = sink.take();
	assert!(matches!(&events[0], Event::FrameMark(f) if f.name.as_deref() == Some("physics")));
}

#[test]
fn threads_have_independent_stacks() {
	let (sink, client) = setup();
	let outer = client.begin_zone(location!("main").unwrap());

	let worker = client.clone();
	thread::spawn(move || {
		assert_eq!(open_zones(), 0);
		let handle = worker.begin_zone(location!("worker").unwrap());
		assert_eq!(handle.depth(), 0);
		worker.end_zone(handle).unwrap();
	})
	.join()
	.unwrap();

	client.end_zone(outer).unwrap();
	let events = zones(&sink.take());
	assert_eq!(events.len(), 4);
	let worker_thread = events.iter().find(|e| e.location.name() == "worker").unwrap().thread;
	assert_ne!(worker_thread, thread::current().id());
}
