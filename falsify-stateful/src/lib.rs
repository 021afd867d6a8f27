//! # Falsify Stateful - Action-Sequence Testing
//!
//! Stateful testing replays a generated sequence of abstract actions
//! against a system under test, optionally mirrored in a reference model.
//! Sequences shrink like any other container: the list shortens first, then
//! the surviving actions shrink through their own parameter generators.
//!
//! ```rust
//! use std::sync::Arc;
//! use falsify::{Generator, just, one_of};
//! use falsify_stateful::{Action, ActionRef, EmptyModel, action_lists, stateful_property_simple};
//!
//! #[derive(Debug)]
//! struct Push(i32);
//!
//! impl Action<Vec<i32>> for Push {
//!     fn run(&self, system: &mut Vec<i32>, _model: &mut EmptyModel) -> bool {
//!         system.push(self.0);
//!         system.last() == Some(&self.0)
//!     }
//! }
//!
//! let actions = one_of(vec![
//!     just(Arc::new(Push(1)) as ActionRef<Vec<i32>>).boxed(),
//!     just(Arc::new(Push(2)) as ActionRef<Vec<i32>>).boxed(),
//! ]);
//! let ok = stateful_property_simple(
//!     just(Vec::new()).boxed(),
//!     action_lists(actions.boxed()).with_size_range(0, 20).boxed(),
//! )
//! .seed(1)
//! .check();
//! assert!(ok);
//! ```

use std::fmt;
use std::sync::Arc;

use falsify::{GenBoxed, Property, VecGenerator, prop_assert, property_with};

pub mod concurrent;

pub use concurrent::{Concurrency, DEFAULT_CONCURRENT_RUNS, concurrency, concurrency_with_model};

/// Model type for systems tested without a reference model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptyModel;

/// An abstract operation over a system under test `S`, optionally mirrored
/// in a model `M`.
///
/// `precondition` guards whether the action is enabled in the current
/// state; disabled actions are skipped, not failed. `run` performs the
/// operation and reports whether the system behaved as expected.
///
/// Actions are shared (`Arc`) so a generated sequence can be handed to the
/// concurrent runner's workers without copying; implementors therefore need
/// `Send + Sync`, which plain data-carrying action types get for free.
pub trait Action<S, M = EmptyModel>: fmt::Debug + Send + Sync {
    fn precondition(&self, _system: &S, _model: &M) -> bool {
        true
    }

    fn run(&self, system: &mut S, model: &mut M) -> bool;
}

/// A shared, type-erased action.
pub type ActionRef<S, M = EmptyModel> = Arc<dyn Action<S, M>>;

/// A generated sequence of actions.
pub type ActionList<S, M = EmptyModel> = Vec<ActionRef<S, M>>;

/// Sequence generator over an action generator (typically a `one_of` of the
/// per-action generators). Uses the standard container size defaults; the
/// sequence size-shrinks before individual actions do.
pub fn action_lists<S, M>(action: GenBoxed<ActionRef<S, M>>) -> VecGenerator<ActionRef<S, M>>
where
    S: 'static,
    M: 'static,
{
    VecGenerator::new(action)
}

/// Build a property that replays generated action sequences against a
/// fresh system, with a model derived from the initial state.
///
/// Disabled actions are skipped; an action whose `run` returns false fails
/// the property and the sequence shrinks toward a minimal failing one.
pub fn stateful_property<S, M, MF>(
    initial: GenBoxed<S>,
    model_factory: MF,
    actions: GenBoxed<ActionList<S, M>>,
) -> Property<(S, ActionList<S, M>)>
where
    S: Clone + fmt::Debug + 'static,
    M: 'static,
    MF: Fn(&S) -> M + 'static,
{
    property_with(
        move |system: S, actions: ActionList<S, M>| {
            let mut system = system;
            let mut model = model_factory(&system);
            for action in &actions {
                if action.precondition(&system, &model) {
                    prop_assert!(
                        action.run(&mut system, &mut model),
                        "action {:?} failed",
                        action
                    );
                }
            }
            true
        },
        (initial, actions),
    )
}

/// Model-less variant of [`stateful_property`].
pub fn stateful_property_simple<S>(
    initial: GenBoxed<S>,
    actions: GenBoxed<ActionList<S, EmptyModel>>,
) -> Property<(S, ActionList<S, EmptyModel>)>
where
    S: Clone + fmt::Debug + 'static,
{
    stateful_property(initial, |_| EmptyModel, actions)
}
