//! Shared, synchronized sequence store and the armed-phase selector

use crate::error::{Error, Result};
use crate::step::{Phase, Sequences, Step};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// In-memory owner of the three phase sequences.
///
/// Cloning is cheap and yields a handle to the same store. Playback never
/// holds a live reference: it takes a [`snapshot`](Self::snapshot) at run
/// start, so edits made during a run are invisible to it.
#[derive(Debug, Clone, Default)]
pub struct SequenceStore {
    inner: Arc<RwLock<Sequences>>,
}

impl SequenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sequences(sequences: Sequences) -> Self {
        Self {
            inner: Arc::new(RwLock::new(sequences)),
        }
    }

    /// Atomic copy of all three phases.
    pub fn snapshot(&self) -> Arc<Sequences> {
        Arc::new(self.inner.read().clone())
    }

    pub fn replace(&self, sequences: Sequences) {
        *self.inner.write() = sequences;
    }

    pub fn clear(&self) {
        *self.inner.write() = Sequences::new();
    }

    /// Append to `phase`, returning the new step's index.
    pub fn push(&self, phase: Phase, step: Step) -> usize {
        let mut guard = self.inner.write();
        let steps = guard.phase_mut(phase);
        steps.push(step);
        steps.len() - 1
    }

    pub fn steps(&self, phase: Phase) -> Vec<Step> {
        self.inner.read().phase(phase).to_vec()
    }

    pub fn get(&self, phase: Phase, index: usize) -> Result<Step> {
        let guard = self.inner.read();
        let steps = guard.phase(phase);
        steps
            .get(index)
            .copied()
            .ok_or(Error::IndexOutOfRange {
                phase,
                index,
                len: steps.len(),
            })
    }

    pub fn len(&self, phase: Phase) -> usize {
        self.inner.read().phase(phase).len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn edit(&self, phase: Phase, index: usize, step: Step) -> Result<()> {
        let mut guard = self.inner.write();
        let steps = guard.phase_mut(phase);
        let len = steps.len();
        let slot = steps
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { phase, index, len })?;
        *slot = step;
        Ok(())
    }

    pub fn remove(&self, phase: Phase, index: usize) -> Result<Step> {
        let mut guard = self.inner.write();
        let steps = guard.phase_mut(phase);
        if index >= steps.len() {
            return Err(Error::IndexOutOfRange {
                phase,
                index,
                len: steps.len(),
            });
        }
        Ok(steps.remove(index))
    }

    /// Swap with the previous step. `Ok(false)` when already first.
    pub fn move_up(&self, phase: Phase, index: usize) -> Result<bool> {
        let mut guard = self.inner.write();
        let steps = guard.phase_mut(phase);
        check_index(phase, index, steps.len())?;
        if index == 0 {
            return Ok(false);
        }
        steps.swap(index - 1, index);
        Ok(true)
    }

    /// Swap with the next step. `Ok(false)` when already last.
    pub fn move_down(&self, phase: Phase, index: usize) -> Result<bool> {
        let mut guard = self.inner.write();
        let steps = guard.phase_mut(phase);
        check_index(phase, index, steps.len())?;
        if index + 1 == steps.len() {
            return Ok(false);
        }
        steps.swap(index, index + 1);
        Ok(true)
    }
}

fn check_index(phase: Phase, index: usize, len: usize) -> Result<()> {
    if index < len {
        Ok(())
    } else {
        Err(Error::IndexOutOfRange { phase, index, len })
    }
}

/// Phase that receives new captures. Always exactly one value; MAIN by default.
#[derive(Debug)]
pub struct ArmedPhase(AtomicU8);

impl ArmedPhase {
    pub fn new(phase: Phase) -> Self {
        Self(AtomicU8::new(phase.index() as u8))
    }

    pub fn get(&self) -> Phase {
        Phase::from_index(self.0.load(Ordering::SeqCst))
    }

    pub fn set(&self, phase: Phase) {
        self.0.store(phase.index() as u8, Ordering::SeqCst);
    }
}

impl Default for ArmedPhase {
    fn default() -> Self {
        Self::new(Phase::Main)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with_main(n: i32) -> SequenceStore {
        let store = SequenceStore::new();
        for i in 0..n {
            store.push(Phase::Main, Step::new(i, i, 10));
        }
        store
    }

    #[test]
    fn push_returns_index_and_targets_one_phase() {
        let store = SequenceStore::new();
        assert_eq!(store.push(Phase::Post, Step::new(1, 1, 5)), 0);
        assert_eq!(store.push(Phase::Post, Step::new(2, 2, 5)), 1);
        assert_eq!(store.len(Phase::Post), 2);
        assert_eq!(store.len(Phase::Pre), 0);
        assert_eq!(store.len(Phase::Main), 0);
    }

    #[test]
    fn snapshot_is_isolated_from_later_edits() {
        let store = store_with_main(2);
        let snap = store.snapshot();
        store.push(Phase::Main, Step::new(9, 9, 9));
        store.remove(Phase::Main, 0).unwrap();
        assert_eq!(snap.phase(Phase::Main).len(), 2);
        assert_eq!(snap.phase(Phase::Main)[0], Step::new(0, 0, 10));
    }

    #[test]
    fn move_up_and_down() {
        let store = store_with_main(3);
        assert!(!store.move_up(Phase::Main, 0).unwrap());
        assert!(store.move_up(Phase::Main, 2).unwrap());
        let xs: Vec<i32> = store.steps(Phase::Main).iter().map(|s| s.x).collect();
        assert_eq!(xs, vec![0, 2, 1]);

        assert!(!store.move_down(Phase::Main, 2).unwrap());
        assert!(store.move_down(Phase::Main, 0).unwrap());
        let xs: Vec<i32> = store.steps(Phase::Main).iter().map(|s| s.x).collect();
        assert_eq!(xs, vec![2, 0, 1]);
    }

    #[test]
    fn out_of_range_edits_are_rejected() {
        let store = store_with_main(1);
        assert!(matches!(
            store.edit(Phase::Main, 3, Step::new(0, 0, 0)),
            Err(Error::IndexOutOfRange { index: 3, len: 1, .. })
        ));
        assert!(store.remove(Phase::Pre, 0).is_err());
        assert!(store.move_down(Phase::Post, 0).is_err());
    }

    #[test]
    fn edit_in_place() {
        let store = store_with_main(2);
        store.edit(Phase::Main, 1, Step::new(50, 60, 700)).unwrap();
        assert_eq!(store.get(Phase::Main, 1).unwrap(), Step::new(50, 60, 700));
    }

    #[test]
    fn clear_keeps_all_phases() {
        let store = store_with_main(4);
        store.clear();
        assert!(store.is_empty());
        for phase in Phase::ALL {
            assert!(store.steps(phase).is_empty());
        }
    }

    #[test]
    fn armed_phase_defaults_to_main() {
        let armed = ArmedPhase::default();
        assert_eq!(armed.get(), Phase::Main);
        armed.set(Phase::Pre);
        assert_eq!(armed.get(), Phase::Pre);
    }
}
