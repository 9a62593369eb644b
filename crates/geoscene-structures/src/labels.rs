//! Label resynchronization after structural edits.
//!
//! Labels (text tags showing an index, depth or attribute next to a point) are
//! laid out by an external presenter. The sequence tells the presenter, in
//! edit order, which index range changed and how, so that each label stays
//! attached to its point. Rebuilding the merged label mesh is expensive, so it
//! is debounced: edits only mark a rebuild as pending, and [`LabelChannel::flush`]
//! performs at most one rebuild for however many edits happened since.
//!
//! Indices are stored indices. A closed polyline's closing duplicate is a
//! real slot with its own label: it is counted in the initial `Add` on
//! attach, announced as `Add` when the polyline closes and as `Delete` when
//! it reopens, and reported as `Set` whenever it is rewritten to mirror
//! point 0. That `Set` always follows the structural update that caused it.

/// How an index range changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LabelAction {
    Add,
    Insert,
    Delete,
    Set,
    InsertRanges,
    DeleteRanges,
}

/// One structural change, in the sequence's index space after the edit
/// (before it, for deletions).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelUpdate {
    /// First affected index.
    pub index: usize,
    /// Number of affected points.
    pub count: usize,
    /// Kind of change.
    pub action: LabelAction,
    /// Every affected range for the batched actions, `[start, end)`.
    /// A closed-polyline delete split around the duplicate is also reported
    /// as `DeleteRanges`.
    pub ranges: Vec<(usize, usize)>,
}

impl LabelUpdate {
    /// A single-range update.
    #[must_use]
    pub fn new(index: usize, count: usize, action: LabelAction) -> Self {
        Self {
            index,
            count,
            action,
            ranges: Vec::new(),
        }
    }
}

/// The presenter that owns the label objects.
pub trait LabelSink: Send + Sync {
    /// Creates, destroys or repositions individual labels for one edit.
    fn resync(&mut self, update: &LabelUpdate);

    /// Rebuilds the merged label representation.
    ///
    /// Returns `false` if the rebuild could not complete yet; it will be
    /// retried on the next flush unless a newer edit supersedes it.
    fn rebuild(&mut self, generation: u64) -> bool;
}

/// Connects one sequence to its label presenter.
pub struct LabelChannel {
    sink: Box<dyn LabelSink>,
    generation: u64,
    built: u64,
}

impl LabelChannel {
    /// Creates a channel around a presenter.
    #[must_use]
    pub fn new(sink: Box<dyn LabelSink>) -> Self {
        Self {
            sink,
            generation: 0,
            built: 0,
        }
    }

    /// Delivers an update and supersedes any pending rebuild.
    pub fn notify(&mut self, update: &LabelUpdate) {
        self.sink.resync(update);
        self.generation += 1;
        log::debug!(
            "label {:?} at {} (+{}), rebuild generation {}",
            update.action,
            update.index,
            update.count,
            self.generation
        );
    }

    /// Whether a rebuild is outstanding.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.built < self.generation
    }

    /// Current edit generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Runs the pending rebuild, if any. Returns true if a rebuild completed.
    pub fn flush(&mut self) -> bool {
        if !self.is_pending() {
            return false;
        }
        let generation = self.generation;
        if self.sink.rebuild(generation) {
            self.built = generation;
            true
        } else {
            false
        }
    }

    /// Gives the presenter back.
    #[must_use]
    pub fn into_sink(self) -> Box<dyn LabelSink> {
        self.sink
    }
}

impl std::fmt::Debug for LabelChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelChannel")
            .field("generation", &self.generation)
            .field("built", &self.built)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// Records everything a presenter is told.
    #[derive(Default)]
    pub(crate) struct Recorder {
        pub updates: Vec<LabelUpdate>,
        pub rebuilds: Vec<u64>,
        pub refuse: bool,
    }

    #[derive(Clone, Default)]
    pub(crate) struct SharedRecorder(pub Arc<Mutex<Recorder>>);

    impl LabelSink for SharedRecorder {
        fn resync(&mut self, update: &LabelUpdate) {
            self.0.lock().unwrap().updates.push(update.clone());
        }

        fn rebuild(&mut self, generation: u64) -> bool {
            let mut rec = self.0.lock().unwrap();
            if rec.refuse {
                return false;
            }
            rec.rebuilds.push(generation);
            true
        }
    }

    #[test]
    fn test_edits_debounce_into_one_rebuild() {
        let recorder = SharedRecorder::default();
        let mut channel = LabelChannel::new(Box::new(recorder.clone()));
        assert!(!channel.flush());

        channel.notify(&LabelUpdate::new(0, 3, LabelAction::Add));
        channel.notify(&LabelUpdate::new(1, 1, LabelAction::Delete));
        channel.notify(&LabelUpdate::new(0, 2, LabelAction::Set));
        assert!(channel.is_pending());
        assert!(channel.flush());
        assert!(!channel.flush());

        let rec = recorder.0.lock().unwrap();
        assert_eq!(rec.updates.len(), 3);
        assert_eq!(rec.updates[1].action, LabelAction::Delete);
        assert_eq!(rec.rebuilds, [3]);
    }

    #[test]
    fn test_refused_rebuild_is_superseded() {
        let recorder = SharedRecorder::default();
        let mut channel = LabelChannel::new(Box::new(recorder.clone()));
        recorder.0.lock().unwrap().refuse = true;
        channel.notify(&LabelUpdate::new(0, 1, LabelAction::Add));
        assert!(!channel.flush());
        assert!(channel.is_pending());

        channel.notify(&LabelUpdate::new(1, 1, LabelAction::Add));
        recorder.0.lock().unwrap().refuse = false;
        assert!(channel.flush());
        assert_eq!(recorder.0.lock().unwrap().rebuilds, [2]);
    }
}
