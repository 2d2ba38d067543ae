//! Hook State Store
//!
//! Hooks are addressed purely by call order: the Nth hook call of a render
//! reads the Nth record of the same fiber's previous render (via its
//! alternate). Calling hooks conditionally breaks that pairing; a record of
//! the wrong kind is treated as absent.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Cleanup returned by an effect, run before the effect re-runs or on unmount
pub type Cleanup = Box<dyn FnOnce()>;

pub(crate) type EffectFn = Box<dyn FnOnce() -> Option<Cleanup>>;
pub(crate) type CleanupSlot = Rc<RefCell<Option<Cleanup>>>;

/// Persistent per-call-site record
pub(crate) enum HookRecord {
    State {
        value: Rc<dyn Any>,
        /// `StateQueue<T>`, shared with every setter handed out for this hook
        queue: Rc<dyn Any>,
        /// Queued updaters folded into `value`, dropped from the queue on commit
        applied: Cell<usize>,
        consume: fn(&dyn Any, usize),
    },
    Effect {
        deps: Option<Rc<dyn Any>>,
        cleanup: CleanupSlot,
    },
}

impl HookRecord {
    /// Take the recorded cleanup of an effect hook
    pub(crate) fn take_cleanup(&self) -> Option<Cleanup> {
        match self {
            HookRecord::Effect { cleanup, .. } => cleanup.borrow_mut().take(),
            HookRecord::State { .. } => None,
        }
    }

    /// Drop the updaters this record folded in from its shared queue
    pub(crate) fn settle(&self) {
        if let HookRecord::State { queue, applied, consume, .. } = self {
            let applied = applied.replace(0);
            if applied > 0 {
                consume(&**queue, applied);
            }
        }
    }

    /// Check if the record folded in updaters that are still queued
    pub(crate) fn is_unsettled(&self) -> bool {
        matches!(self, HookRecord::State { applied, .. } if applied.get() > 0)
    }
}

/// Effect scheduled for the commit phase
pub(crate) struct PendingEffect {
    run: EffectFn,
    slot: CleanupSlot,
}

impl PendingEffect {
    /// Run the effect and store its cleanup on the owning hook record
    pub(crate) fn run(self) {
        let cleanup = (self.run)();
        *self.slot.borrow_mut() = cleanup;
    }
}

/// Re-render request raised by state setters
#[derive(Clone, Default)]
pub(crate) struct UpdateSignal(Rc<Cell<u64>>);

impl UpdateSignal {
    pub(crate) fn request(&self) {
        self.0.set(self.0.get() + 1);
    }

    pub(crate) fn is_requested(&self) -> bool {
        self.0.get() > 0
    }

    /// Clear the request, returning how many setter calls it covered
    pub(crate) fn take(&self) -> u64 {
        self.0.replace(0)
    }
}

type Updater<T> = Rc<dyn Fn(&T) -> T>;

/// Updaters stay queued until the pass that folded them commits, so a
/// discarded pass replays them on the next one.
struct StateQueue<T> {
    pending: RefCell<Vec<Updater<T>>>,
}

impl<T: 'static> StateQueue<T> {
    fn new() -> Self {
        Self { pending: RefCell::new(Vec::new()) }
    }

    /// Fold every queued updater over `state`, in enqueue order. Returns the
    /// new state and how many updaters it covers.
    fn replay(&self, state: T) -> (T, usize) {
        let updates = self.pending.borrow().clone();
        let state = updates.iter().fold(state, |state, update| update(&state));
        (state, updates.len())
    }

    fn consume(queue: &dyn Any, applied: usize) {
        if let Some(queue) = queue.downcast_ref::<Self>() {
            let mut pending = queue.pending.borrow_mut();
            let applied = applied.min(pending.len());
            pending.drain(..applied);
        }
    }
}

/// Setter returned by [`Hooks::use_state`].
///
/// Updates are queued, not applied: they take effect when the next render
/// pass reaches the hook again.
pub struct StateSetter<T> {
    queue: Rc<StateQueue<T>>,
    signal: UpdateSignal,
}

impl<T: 'static> StateSetter<T> {
    /// Queue an updater and request a re-render
    pub fn set<F>(&self, update: F)
    where
        F: Fn(&T) -> T + 'static,
    {
        self.queue.pending.borrow_mut().push(Rc::new(update));
        self.signal.request();
    }

    /// Queue a replacement value
    pub fn set_value(&self, value: T)
    where
        T: Clone,
    {
        self.set(move |_| value.clone());
    }

    /// Number of queued updaters not yet committed
    pub fn pending(&self) -> usize {
        self.queue.pending.borrow().len()
    }
}

impl<T> Clone for StateSetter<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Rc::clone(&self.queue),
            signal: self.signal.clone(),
        }
    }
}

/// Render context handed to a function component.
///
/// Collects the fiber's hook records, scheduled effects, and the cleanups of
/// effects that are about to re-run.
pub struct Hooks<'a> {
    previous: &'a [HookRecord],
    records: Vec<HookRecord>,
    effects: Vec<PendingEffect>,
    cleanups: Vec<Cleanup>,
    signal: &'a UpdateSignal,
}

/// Everything a render left behind for its fiber
pub(crate) struct HookOutput {
    pub(crate) records: Vec<HookRecord>,
    pub(crate) effects: Vec<PendingEffect>,
    pub(crate) cleanups: Vec<Cleanup>,
}

impl<'a> Hooks<'a> {
    pub(crate) fn new(previous: &'a [HookRecord], signal: &'a UpdateSignal) -> Self {
        Self {
            previous,
            records: Vec::with_capacity(previous.len()),
            effects: Vec::new(),
            cleanups: Vec::new(),
            signal,
        }
    }

    pub(crate) fn finish(self) -> HookOutput {
        HookOutput {
            records: self.records,
            effects: self.effects,
            cleanups: self.cleanups,
        }
    }

    fn hook_index(&self) -> usize {
        self.records.len()
    }

    /// State cell seeded from `initial` on first render
    pub fn use_state<T: Clone + 'static>(&mut self, initial: T) -> (T, StateSetter<T>) {
        let index = self.hook_index();
        let previous = self.previous;
        let recovered = match previous.get(index) {
            Some(HookRecord::State { value, queue, .. }) => {
                match (value.downcast_ref::<T>(), Rc::clone(queue).downcast::<StateQueue<T>>()) {
                    (Some(value), Ok(queue)) => Some((value.clone(), queue)),
                    _ => None,
                }
            }
            _ => None,
        };

        let (state, applied, queue) = match recovered {
            Some((value, queue)) => {
                let (state, applied) = queue.replay(value);
                (state, applied, queue)
            }
            None => {
                if index < previous.len() {
                    tracing::warn!(hook = index, "hook order changed between renders; reinitializing state");
                }
                (initial, 0, Rc::new(StateQueue::new()))
            }
        };

        self.records.push(HookRecord::State {
            value: Rc::new(state.clone()),
            queue: Rc::clone(&queue) as Rc<dyn Any>,
            applied: Cell::new(applied),
            consume: StateQueue::<T>::consume,
        });

        let setter = StateSetter {
            queue,
            signal: self.signal.clone(),
        };
        (state, setter)
    }

    /// Effect re-run whenever `deps` differs from the previous render's
    pub fn use_effect<D, F>(&mut self, deps: D, effect: F)
    where
        D: PartialEq + 'static,
        F: FnOnce() -> Option<Cleanup> + 'static,
    {
        let changed = match self.previous.get(self.hook_index()) {
            Some(HookRecord::Effect { deps: Some(prev), .. }) => {
                prev.downcast_ref::<D>().is_none_or(|prev| *prev != deps)
            }
            _ => true,
        };
        self.push_effect(Some(Rc::new(deps)), changed, Box::new(effect));
    }

    /// Effect without a dependency list; runs after every commit
    pub fn use_effect_always<F>(&mut self, effect: F)
    where
        F: FnOnce() -> Option<Cleanup> + 'static,
    {
        self.push_effect(None, true, Box::new(effect));
    }

    fn push_effect(&mut self, deps: Option<Rc<dyn Any>>, changed: bool, effect: EffectFn) {
        let previous = self.previous;
        let previous_slot = match previous.get(self.hook_index()) {
            Some(HookRecord::Effect { cleanup, .. }) => Some(cleanup),
            _ => None,
        };

        let slot = if changed {
            if let Some(cleanup) = previous_slot.and_then(|slot| slot.borrow_mut().take()) {
                self.cleanups.push(cleanup);
            }
            let slot = CleanupSlot::default();
            self.effects.push(PendingEffect {
                run: effect,
                slot: Rc::clone(&slot),
            });
            slot
        } else {
            // Keep the live cleanup until the deps finally change
            previous_slot.cloned().unwrap_or_default()
        };

        self.records.push(HookRecord::Effect { deps, cleanup: slot });
    }
}
