use shell_controls::{
    error::{clear_failure_hook, set_failure_hook},
    range::ValueRange,
    scheduler::ManualScheduler,
    sink::Scroll,
    source::Source,
    sync::{DebouncedSync, SyncState, DEFAULT_DEBOUNCE},
    testing::{MockSource, RecordingSink},
};
use std::{cell::RefCell, rc::Rc};

struct Bench {
    source: Rc<MockSource>,
    scheduler: Rc<ManualScheduler>,
}

impl Bench {
    fn new(value: f64) -> Self {
        Self {
            source: MockSource::new("volume", value, ValueRange::PERCENT),
            scheduler: Rc::new(ManualScheduler::new()),
        }
    }

    fn slider(&self) -> (Rc<RecordingSink>, DebouncedSync) {
        let sink = RecordingSink::new();
        sink.set_echo_input(true);
        let sync = DebouncedSync::debounced(
            self.source.clone(),
            sink.clone(),
            self.scheduler.clone(),
            DEFAULT_DEBOUNCE,
        );
        (sink, sync)
    }

    fn icon(&self) -> (Rc<RecordingSink>, DebouncedSync) {
        let sink = RecordingSink::new();
        let sync = DebouncedSync::immediate(
            self.source.clone(),
            sink.clone(),
            self.scheduler.clone(),
        );
        (sink, sync)
    }
}

#[test]
fn slider_and_icon_share_a_source() {
    let bench = Bench::new(40.0);
    let (slider, _slider_sync) = bench.slider();
    let (icon, icon_sync) = bench.icon();

    // A drag on the slider reaches the icon once committed.
    for v in [45.0, 50.0, 55.0] {
        slider.drag(v);
        bench.scheduler.advance_ms(40);
    }
    assert_eq!(icon.last_displayed(), Some((40.0, 0.4)));
    bench.scheduler.advance_ms(100);
    assert_eq!(bench.source.writes(), [55.0]);
    assert_eq!(icon.last_displayed(), Some((55.0, 0.55)));

    // Scrolling the icon moves the slider right away.
    if let Some(delta) = Scroll::Up.to_delta(5.0) {
        icon_sync.handle_input(shell_controls::sink::UserInput::Delta(delta));
    }
    assert_eq!(bench.source.writes(), [55.0, 60.0]);
    assert_eq!(slider.last_displayed(), Some((60.0, 0.6)));
    bench.scheduler.advance_ms(1000);
    assert_eq!(bench.source.writes(), [55.0, 60.0]);
}

#[test]
fn hardware_key_during_drag() {
    let bench = Bench::new(50.0);
    let (slider, sync) = bench.slider();
    slider.drag(70.0);
    // The volume key lands while the write is pending, the display follows
    // the device but the user's value still wins.
    bench.source.external_change(45.0);
    assert_eq!(slider.last_displayed(), Some((45.0, 0.45)));
    assert_eq!(sync.state(), SyncState::PendingCommit);
    bench.scheduler.advance_ms(100);
    assert_eq!(bench.source.writes(), [70.0]);
    assert_eq!(bench.source.current(), 70.0);
}

#[test]
fn silent_device_is_written_once() {
    let bench = Bench::new(50.0);
    bench.source.set_echo(false);
    let (slider, sync) = bench.slider();
    slider.drag(80.0);
    bench.scheduler.advance_ms(100);
    assert_eq!(bench.source.writes(), [80.0]);
    // No change notification came back, nothing is retried.
    bench.scheduler.advance_ms(5000);
    assert_eq!(sync.writes(), 1);
    assert_eq!(slider.last_displayed(), Some((50.0, 0.5)));
}

#[test]
fn failing_display_is_reported_and_isolated() {
    let failures = Rc::new(RefCell::new(Vec::new()));
    let f = failures.clone();
    set_failure_hook(move |failure| f.borrow_mut().push(failure.signal));

    let bench = Bench::new(50.0);
    let (first, _first_sync) = bench.slider();
    let (second, _second_sync) = bench.slider();
    first.fail_next_display();
    bench.source.external_change(20.0);
    clear_failure_hook();

    assert_eq!(*failures.borrow(), ["changed"]);
    assert_eq!(first.last_displayed(), Some((50.0, 0.5)));
    assert_eq!(second.last_displayed(), Some((20.0, 0.2)));

    // The failed control still works afterwards.
    bench.source.external_change(30.0);
    assert_eq!(first.last_displayed(), Some((30.0, 0.3)));
}

#[test]
fn device_replaced_with_different_range() {
    let source = MockSource::new("brightness", 100.0, ValueRange::new(0.0, 200.0));
    let scheduler = Rc::new(ManualScheduler::new());
    let sink = RecordingSink::new();
    let sync =
        DebouncedSync::debounced(source.clone(), sink.clone(), scheduler.clone(), DEFAULT_DEBOUNCE);
    assert_eq!(sink.last_displayed(), Some((100.0, 0.5)));

    source.set_available(false);
    assert!(!sink.is_enabled());
    source.set_range(ValueRange::new(0.0, 1000.0));
    source.set_available(true);
    assert!(sink.is_enabled());
    assert_eq!(sink.last_displayed(), Some((100.0, 0.1)));

    sink.drag(1500.0);
    scheduler.advance_ms(100);
    assert_eq!(source.writes(), [1000.0]);
    sync.resync();
    assert_eq!(sink.last_displayed(), Some((1000.0, 1.0)));
    assert!(source.is_available());
}
