//! End-to-end playback through the run controller, driven by a recording
//! driver and a hand-fed input hub.

use clicker_core::{Error, Phase, SequenceStore, Settings, Step};
use clicker_recorder::driver::DriverResult;
use clicker_recorder::{
    Button, InputEvent, InputHub, PlaybackState, PointerDriver, RecordingDriver, RunController,
    RunState,
};
use parking_lot::{Mutex, RwLock};
use std::sync::{Arc, OnceLock};
use std::thread;
use std::time::{Duration, Instant};

fn settings(loop_enabled: bool) -> Arc<RwLock<Settings>> {
    Arc::new(RwLock::new(Settings {
        loop_enabled,
        ..Settings::default()
    }))
}

fn fill(store: &SequenceStore, phase: Phase, xs: &[i32], delay_ms: u64) {
    for &x in xs {
        store.push(phase, Step::new(x, x, delay_ms));
    }
}

fn xs(clicks: &[(i32, i32)]) -> Vec<i32> {
    clicks.iter().map(|(x, _)| *x).collect()
}

fn wait_until(f: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if f() {
            return true;
        }
        thread::sleep(Duration::from_millis(2));
    }
    false
}

/// Records like `RecordingDriver` and requests cancellation on its Nth click.
struct CancelOnClick {
    inner: RecordingDriver,
    at: usize,
    clicks: Mutex<usize>,
    state: OnceLock<Arc<RunState>>,
}

impl CancelOnClick {
    fn new(at: usize) -> Self {
        Self {
            inner: RecordingDriver::new(),
            at,
            clicks: Mutex::new(0),
            state: OnceLock::new(),
        }
    }
}

impl PointerDriver for CancelOnClick {
    fn position(&self) -> DriverResult<(i32, i32)> {
        self.inner.position()
    }

    fn move_to(&self, x: i32, y: i32) -> DriverResult<()> {
        self.inner.move_to(x, y)
    }

    fn click(&self) -> DriverResult<()> {
        self.inner.click()?;
        let mut clicks = self.clicks.lock();
        *clicks += 1;
        if *clicks == self.at {
            if let Some(state) = self.state.get() {
                state.request_cancel();
            }
        }
        Ok(())
    }
}

#[test]
fn plays_phases_in_order() {
    let store = SequenceStore::new();
    fill(&store, Phase::Pre, &[1, 2], 0);
    fill(&store, Phase::Main, &[10, 11], 0);
    fill(&store, Phase::Post, &[20, 21], 0);
    let driver = Arc::new(RecordingDriver::new());
    let c = RunController::new(store, settings(false), driver.clone(), InputHub::new());

    c.start().unwrap();
    let report = c.wait().unwrap();

    assert_eq!(xs(&driver.clicks()), vec![1, 2, 10, 11, 20, 21]);
    assert_eq!(report.total_clicks(), 6);
    assert!(!report.cancelled);
}

#[test]
fn cancel_during_main_still_runs_all_of_post() {
    let store = SequenceStore::new();
    fill(&store, Phase::Pre, &[1], 0);
    fill(&store, Phase::Main, &[10, 11, 12, 13, 14], 0);
    fill(&store, Phase::Post, &[20, 21, 22], 0);
    let driver = Arc::new(CancelOnClick::new(3));
    let c = RunController::new(store, settings(false), driver.clone(), InputHub::new());
    let _ = driver.state.set(c.run_state());

    c.start().unwrap();
    let report = c.wait().unwrap();

    assert_eq!(xs(&driver.inner.clicks()), vec![1, 10, 11, 20, 21, 22]);
    assert!(report.cancelled);
    assert_eq!(report.post_clicks, 3);
}

#[test]
fn no_pre_or_main_click_after_cancel_observed() {
    let store = SequenceStore::new();
    fill(&store, Phase::Pre, &[1, 2, 3], 0);
    fill(&store, Phase::Main, &[10, 11], 0);
    fill(&store, Phase::Post, &[20], 0);
    let driver = Arc::new(CancelOnClick::new(2));
    let c = RunController::new(store, settings(true), driver.clone(), InputHub::new());
    let _ = driver.state.set(c.run_state());

    c.start().unwrap();
    let report = c.wait().unwrap();

    assert_eq!(xs(&driver.inner.clicks()), vec![1, 2, 20]);
    assert_eq!(report.pre_clicks, 2);
    assert_eq!(report.main_clicks, 0);
    assert_eq!(report.main_iterations, 0);
}

#[test]
fn loop_repeats_main_until_right_click() {
    let store = SequenceStore::new();
    fill(&store, Phase::Main, &[10, 11], 1);
    fill(&store, Phase::Post, &[20, 21], 0);
    let driver = Arc::new(RecordingDriver::new());
    let hub = InputHub::new();
    let c = RunController::new(store, settings(true), driver.clone(), hub.clone());

    c.start().unwrap();
    assert!(wait_until(|| driver.click_count() >= 6));
    assert!(driver.clicks().iter().all(|(x, _)| *x < 20));
    assert_eq!(c.state(), PlaybackState::RunningMain);

    hub.publish(InputEvent::ButtonPress(Button::Left));
    hub.publish(InputEvent::ButtonPress(Button::Right));
    let report = c.wait().unwrap();

    assert!(report.cancelled);
    assert!(report.main_iterations >= 3);
    let clicks = xs(&driver.clicks());
    assert_eq!(&clicks[clicks.len() - 2..], &[20, 21]);
    assert_eq!(report.post_clicks, 2);
    assert_eq!(hub.subscriber_count(), 0);
}

#[test]
fn loop_with_empty_main_waits_for_cancel() {
    let store = SequenceStore::new();
    fill(&store, Phase::Post, &[20], 0);
    let driver = Arc::new(RecordingDriver::new());
    let c = RunController::new(store, settings(true), driver.clone(), InputHub::new());

    c.start().unwrap();
    thread::sleep(Duration::from_millis(50));
    assert!(c.is_running());
    assert_eq!(driver.click_count(), 0);

    c.request_cancel();
    let report = c.wait().unwrap();
    assert_eq!(xs(&driver.clicks()), vec![20]);
    assert!(report.cancelled);
}

#[test]
fn second_start_while_running_is_busy() {
    let store = SequenceStore::new();
    fill(&store, Phase::Main, &[10], 200);
    let driver = Arc::new(RecordingDriver::new());
    let c = RunController::new(store, settings(false), driver.clone(), InputHub::new());

    c.start().unwrap();
    assert!(matches!(c.start(), Err(Error::Busy)));
    c.wait().unwrap();

    assert_eq!(driver.click_count(), 1);
    assert!(!c.is_running());
    assert!(c.start().is_ok());
    c.wait();
}

#[test]
fn edits_during_a_run_do_not_affect_it() {
    let store = SequenceStore::new();
    fill(&store, Phase::Main, &[10, 11], 30);
    let driver = Arc::new(RecordingDriver::new());
    let c = RunController::new(store.clone(), settings(false), driver.clone(), InputHub::new());

    c.start().unwrap();
    store.push(Phase::Main, Step::new(99, 99, 0));
    store.edit(Phase::Main, 1, Step::new(55, 55, 0)).unwrap();
    store.push(Phase::Post, Step::new(77, 77, 0));
    c.wait().unwrap();

    assert_eq!(xs(&driver.clicks()), vec![10, 11]);
    assert_eq!(store.len(Phase::Main), 3);
}

#[test]
fn right_click_after_run_does_not_leak_into_next() {
    let store = SequenceStore::new();
    fill(&store, Phase::Main, &[10], 0);
    let driver = Arc::new(RecordingDriver::new());
    let hub = InputHub::new();
    let c = RunController::new(store, settings(false), driver.clone(), hub.clone());

    c.start().unwrap();
    c.wait().unwrap();
    hub.publish(InputEvent::ButtonPress(Button::Right));

    c.start().unwrap();
    let report = c.wait().unwrap();
    assert!(!report.cancelled);
    assert_eq!(driver.click_count(), 2);
}
