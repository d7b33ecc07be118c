//! Observers that record or log changes.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::Level;

use observables_core::{ObservableResult, Observed, Observer, Phase};

use crate::record::{ChangeRecord, ToRecord, render};
use crate::report::ChangeReport;

#[derive(Default)]
struct RecorderState {
    records: Vec<ChangeRecord>,
    next_sequence: u64,
    dropped: u64,
}

/// Collects change records from any number of containers.
///
/// `Recorder` is a shared handle; the observers it installs push into the
/// same buffer as the handle the caller keeps. Records are numbered in the
/// order they arrive, across all attached containers.
///
/// # Example
///
/// ```
/// use observables_collections::ObservableList;
/// use observables_observe::Recorder;
///
/// let list = ObservableList::new();
/// let recorder = Recorder::new();
/// recorder.attach(&list);
///
/// list.append(1).unwrap();
/// assert_eq!(recorder.len(), 2); // before and after
/// ```
#[derive(Clone)]
pub struct Recorder {
    state: Rc<RefCell<RecorderState>>,
    max_records: Option<usize>,
}

impl Recorder {
    /// Create a recorder without a size limit.
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(RecorderState::default())),
            max_records: None,
        }
    }

    /// Create a recorder that keeps at most `max_records` records.
    ///
    /// Records arriving once the limit is reached are counted but dropped.
    pub fn with_capacity(max_records: usize) -> Self {
        Self {
            max_records: Some(max_records),
            ..Self::new()
        }
    }

    /// Record both phases of every change of `target`.
    pub fn attach<O>(&self, target: &O) -> Attachment<O>
    where
        O: Observed,
        O::Change: ToRecord,
    {
        let before = self.observer(target, Phase::Before);
        target.add_before_observer(before.clone());
        let after = self.observer(target, Phase::After);
        target.add_after_observer(after.clone());

        Attachment {
            before: Some(before),
            after,
        }
    }

    /// Record only the after phase of every change of `target`.
    pub fn attach_after<O>(&self, target: &O) -> Attachment<O>
    where
        O: Observed,
        O::Change: ToRecord,
    {
        let after = self.observer(target, Phase::After);
        target.add_after_observer(after.clone());

        Attachment {
            before: None,
            after,
        }
    }

    /// Append a record, assigning its sequence number.
    pub fn push(&self, mut record: ChangeRecord) {
        let mut state = self.state.borrow_mut();
        record.sequence = state.next_sequence;
        state.next_sequence += 1;

        if self.max_records.is_some_and(|max| state.records.len() >= max) {
            state.dropped += 1;
            return;
        }
        state.records.push(record);
    }

    /// All kept records, in arrival order.
    pub fn records(&self) -> Vec<ChangeRecord> {
        self.state.borrow().records.clone()
    }

    /// Kept records of one phase.
    pub fn records_in(&self, phase: Phase) -> Vec<ChangeRecord> {
        self.state
            .borrow()
            .records
            .iter()
            .filter(|record| record.phase == phase)
            .cloned()
            .collect()
    }

    /// Number of kept records.
    pub fn len(&self) -> usize {
        self.state.borrow().records.len()
    }

    /// Check if no records are kept.
    pub fn is_empty(&self) -> bool {
        self.state.borrow().records.is_empty()
    }

    /// Number of records dropped because of the size limit.
    pub fn dropped(&self) -> u64 {
        self.state.borrow().dropped
    }

    /// Discard kept records. Sequence numbers keep counting.
    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        state.records.clear();
        state.dropped = 0;
    }

    /// Build a report from the kept records.
    pub fn report(&self) -> ChangeReport {
        let state = self.state.borrow();
        ChangeReport::new(state.records.clone(), state.dropped)
    }

    fn observer<O>(&self, target: &O, phase: Phase) -> Observer<O, O::Change>
    where
        O: Observed,
        O::Change: ToRecord,
    {
        let recorder = self.clone();
        let label = target.observable().config().label.clone();
        Observer::new(move |source: &O, change: &O::Change| {
            recorder.push(ChangeRecord::new(phase, source.id(), label.clone(), change));
            Ok(())
        })
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("records", &self.len())
            .field("dropped", &self.dropped())
            .field("max_records", &self.max_records)
            .finish()
    }
}

/// Observers a [`Recorder`] installed on one container.
pub struct Attachment<O: Observed> {
    before: Option<Observer<O, O::Change>>,
    after: Observer<O, O::Change>,
}

impl<O: Observed> Attachment<O> {
    /// Remove the recorder's observers from `target`.
    pub fn detach(self, target: &O) -> ObservableResult<()> {
        if let Some(before) = &self.before {
            target.remove_before_observer(before)?;
        }
        target.remove_after_observer(&self.after)
    }
}

/// Emits one `tracing` event per change.
#[derive(Debug, Clone, Copy)]
pub struct LoggingObserver {
    /// Level of the emitted events.
    pub level: Level,
}

impl LoggingObserver {
    /// Create a logging observer emitting at `DEBUG`.
    pub fn new() -> Self {
        Self { level: Level::DEBUG }
    }

    /// Set the log level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Log every applied change of `target`.
    pub fn attach<O>(&self, target: &O) -> Observer<O, O::Change>
    where
        O: Observed,
        O::Change: ToRecord,
    {
        let logger = *self;
        let label = target.observable().config().label.clone();
        target.observe_after(move |source: &O, change: &O::Change| {
            logger.log(&ChangeRecord::new(
                Phase::After,
                source.id(),
                label.clone(),
                change,
            ));
            Ok(())
        })
    }

    /// Log a single record.
    pub fn log(&self, record: &ChangeRecord) {
        macro_rules! change_event {
            ($level:expr) => {
                tracing::event!(
                    $level,
                    observable = %record.source_name(),
                    container = %record.container,
                    operation = %record.operation,
                    phase = %record.phase,
                    locator = %render(&record.locator),
                    old = %render(&record.old_value),
                    new = %render(&record.new_value),
                    "Change observed"
                )
            };
        }

        if self.level == Level::ERROR {
            change_event!(Level::ERROR);
        } else if self.level == Level::WARN {
            change_event!(Level::WARN);
        } else if self.level == Level::INFO {
            change_event!(Level::INFO);
        } else if self.level == Level::DEBUG {
            change_event!(Level::DEBUG);
        } else {
            change_event!(Level::TRACE);
        }
    }
}

impl Default for LoggingObserver {
    fn default() -> Self {
        Self::new()
    }
}
