//! Phased playback: PRE, then MAIN (once or looped), then POST
//!
//! Cancellation is cooperative. It is polled before every step and again
//! between a step's move and its click, so once the token trips at most one
//! further click lands in PRE or MAIN. POST ignores the token and always
//! runs to completion.

use crate::cancel::CancelToken;
use crate::driver::PointerDriver;
use crate::state::{PlaybackState, RunState};
use clicker_core::{Error, Phase, Sequences, Step};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Poll interval while a looped MAIN has no steps to play.
const EMPTY_LOOP_POLL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub pre_clicks: usize,
    pub main_clicks: usize,
    pub post_clicks: usize,
    /// Steps whose move or click was rejected.
    pub failed_steps: usize,
    /// Passes over MAIN that were started.
    pub main_iterations: usize,
    pub cancelled: bool,
}

impl RunReport {
    pub fn clicks(&self, phase: Phase) -> usize {
        match phase {
            Phase::Pre => self.pre_clicks,
            Phase::Main => self.main_clicks,
            Phase::Post => self.post_clicks,
        }
    }

    pub fn total_clicks(&self) -> usize {
        self.pre_clicks + self.main_clicks + self.post_clicks
    }

    fn record_click(&mut self, phase: Phase) {
        match phase {
            Phase::Pre => self.pre_clicks += 1,
            Phase::Main => self.main_clicks += 1,
            Phase::Post => self.post_clicks += 1,
        }
    }
}

pub struct PlaybackEngine {
    driver: Arc<dyn PointerDriver>,
    loop_main: bool,
    state: Option<Arc<RunState>>,
}

impl PlaybackEngine {
    pub fn new(driver: Arc<dyn PointerDriver>) -> Self {
        Self {
            driver,
            loop_main: false,
            state: None,
        }
    }

    /// Repeat MAIN until cancelled.
    pub fn looped(mut self, loop_main: bool) -> Self {
        self.loop_main = loop_main;
        self
    }

    /// Publish state transitions to `state`.
    pub fn observe(mut self, state: Arc<RunState>) -> Self {
        self.state = Some(state);
        self
    }

    /// Play a snapshot to completion. Returns once POST has finished.
    pub fn run(&self, sequences: &Sequences, cancel: &CancelToken) -> RunReport {
        let mut report = RunReport::default();

        self.enter(PlaybackState::RunningPre);
        self.play_phase(Phase::Pre, sequences.phase(Phase::Pre), cancel, &mut report);

        self.enter(PlaybackState::RunningMain);
        let main = sequences.phase(Phase::Main);
        if self.loop_main {
            while !cancel.is_cancelled() {
                if main.is_empty() {
                    wait_for_cancel(cancel);
                    break;
                }
                report.main_iterations += 1;
                self.play_phase(Phase::Main, main, cancel, &mut report);
            }
        } else {
            report.main_iterations = 1;
            self.play_phase(Phase::Main, main, cancel, &mut report);
        }

        self.enter(PlaybackState::RunningPost);
        self.play_phase(Phase::Post, sequences.phase(Phase::Post), cancel, &mut report);

        self.enter(PlaybackState::Idle);
        report.cancelled = cancel.is_cancelled();
        report
    }

    fn enter(&self, next: PlaybackState) {
        tracing::debug!(state = ?next, "playback state");
        if let Some(state) = &self.state {
            state.set_playback_state(next);
        }
    }

    /// The token only applies to phases that are cancellable.
    fn play_phase(
        &self,
        phase: Phase,
        steps: &[Step],
        cancel: &CancelToken,
        report: &mut RunReport,
    ) {
        let cancel = Some(cancel).filter(|_| phase.is_cancellable());
        for (index, step) in steps.iter().enumerate() {
            if is_cancelled(cancel) {
                tracing::debug!(%phase, index, remaining = steps.len() - index, "phase cancelled");
                return;
            }
            self.play_step(phase, index, step, cancel, report);
        }
    }

    fn play_step(
        &self,
        phase: Phase,
        index: usize,
        step: &Step,
        cancel: Option<&CancelToken>,
        report: &mut RunReport,
    ) {
        match self.driver.move_to(step.x, step.y) {
            Ok(()) => {
                if is_cancelled(cancel) {
                    return;
                }
                match self.driver.click() {
                    Ok(()) => report.record_click(phase),
                    Err(e) => step_failed(phase, index, e.to_string(), report),
                }
            }
            Err(e) => step_failed(phase, index, e.to_string(), report),
        }

        if step.delay_ms > 0 {
            thread::sleep(Duration::from_millis(step.delay_ms));
        }
    }
}

fn is_cancelled(cancel: Option<&CancelToken>) -> bool {
    cancel.is_some_and(CancelToken::is_cancelled)
}

fn step_failed(phase: Phase, index: usize, reason: String, report: &mut RunReport) {
    let err = Error::PlaybackStep {
        phase,
        index,
        reason,
    };
    tracing::warn!(error = %err, "step skipped");
    report.failed_steps += 1;
}

fn wait_for_cancel(cancel: &CancelToken) {
    while !cancel.is_cancelled() {
        thread::sleep(EMPTY_LOOP_POLL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{Action, RecordingDriver};

    fn steps(xs: &[i32]) -> Vec<Step> {
        xs.iter().map(|&x| Step::new(x, x, 0)).collect()
    }

    fn xs(driver: &RecordingDriver) -> Vec<i32> {
        driver.clicks().into_iter().map(|(x, _)| x).collect()
    }

    #[test]
    fn plays_pre_main_post_in_order() {
        let driver = Arc::new(RecordingDriver::new());
        let engine = PlaybackEngine::new(driver.clone());
        let seq = Sequences::from_phases(steps(&[1, 2]), steps(&[10, 11, 12]), steps(&[20]));

        let report = engine.run(&seq, &CancelToken::new());

        assert_eq!(xs(&driver), vec![1, 2, 10, 11, 12, 20]);
        assert_eq!(report.pre_clicks, 2);
        assert_eq!(report.main_clicks, 3);
        assert_eq!(report.post_clicks, 1);
        assert_eq!(report.main_iterations, 1);
        assert!(!report.cancelled);
    }

    #[test]
    fn each_step_moves_then_clicks() {
        let driver = Arc::new(RecordingDriver::new());
        let seq = Sequences::from_phases(vec![], vec![Step::new(7, 8, 0)], vec![]);
        PlaybackEngine::new(driver.clone()).run(&seq, &CancelToken::new());
        assert_eq!(
            driver.actions(),
            vec![Action::Move { x: 7, y: 8 }, Action::Click { x: 7, y: 8 }]
        );
    }

    #[test]
    fn cancelled_before_start_still_runs_post() {
        let driver = Arc::new(RecordingDriver::new());
        let seq = Sequences::from_phases(steps(&[1]), steps(&[2, 3]), steps(&[4, 5]));
        let token = CancelToken::new();
        token.cancel();

        let report = PlaybackEngine::new(driver.clone()).looped(true).run(&seq, &token);

        assert_eq!(xs(&driver), vec![4, 5]);
        assert!(report.cancelled);
        assert_eq!(report.main_iterations, 0);
    }

    /// Cancels the token from inside its first click.
    struct CancelOnFirstClick {
        inner: RecordingDriver,
        token: CancelToken,
    }

    impl PointerDriver for CancelOnFirstClick {
        fn position(&self) -> crate::driver::DriverResult<(i32, i32)> {
            self.inner.position()
        }
        fn move_to(&self, x: i32, y: i32) -> crate::driver::DriverResult<()> {
            self.inner.move_to(x, y)
        }
        fn click(&self) -> crate::driver::DriverResult<()> {
            self.inner.click()?;
            self.token.cancel();
            Ok(())
        }
    }

    #[test]
    fn cancel_during_post_is_ignored() {
        let token = CancelToken::new();
        let driver = Arc::new(CancelOnFirstClick {
            inner: RecordingDriver::new(),
            token: token.clone(),
        });
        let seq = Sequences::from_phases(vec![], vec![], steps(&[20, 21, 22]));

        let report = PlaybackEngine::new(driver.clone()).run(&seq, &token);

        assert_eq!(xs(&driver.inner), vec![20, 21, 22]);
        assert_eq!(report.post_clicks, 3);
        assert!(report.cancelled);
    }

    #[test]
    fn failed_step_does_not_abort_run() {
        let driver = Arc::new(RecordingDriver::new());
        driver.fail_at(2, 2);
        let seq = Sequences::from_phases(steps(&[1, 2, 3]), vec![], steps(&[2, 4]));

        let report = PlaybackEngine::new(driver.clone()).run(&seq, &CancelToken::new());

        assert_eq!(xs(&driver), vec![1, 3, 4]);
        assert_eq!(report.failed_steps, 2);
        assert_eq!(report.total_clicks(), 3);
    }

    #[test]
    fn delays_accumulate() {
        let driver = Arc::new(RecordingDriver::new());
        let seq = Sequences::from_phases(
            vec![Step::new(1, 1, 20)],
            vec![Step::new(2, 2, 20)],
            vec![Step::new(3, 3, 20)],
        );
        let started = std::time::Instant::now();
        PlaybackEngine::new(driver).run(&seq, &CancelToken::new());
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn observed_state_returns_to_idle() {
        let driver = Arc::new(RecordingDriver::new());
        let state = Arc::new(RunState::new());
        let engine = PlaybackEngine::new(driver).observe(state.clone());
        engine.run(&Sequences::new(), &CancelToken::new());
        assert_eq!(state.playback_state(), PlaybackState::Idle);
    }
}
