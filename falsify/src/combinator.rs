//! Combinators that compose generators.

use std::cell::OnceCell;
use std::panic::panic_any;
use std::rc::Rc;

use crate::arbitrary::Arbitrary;
use crate::config::{DEFAULT_FILTER_RETRIES, DEFAULT_FILTER_TOLERANCE, DEFAULT_SOME_PROBABILITY};
use crate::error::PropertyError;
use crate::generator::{GenBoxed, GenFn, Generator, gen_fn};
use crate::rng::Random;
use crate::shrink::Shrinkable;
use crate::stream::Stream;

/// Generator adapter produced by [`Generator::map`].
pub struct Map<G: Generator, U> {
    source: G,
    transform: Rc<dyn Fn(&G::Value) -> U>,
}

impl<G: Generator, U> Map<G, U> {
    pub(crate) fn new(source: G, transform: Rc<dyn Fn(&G::Value) -> U>) -> Self {
        Self { source, transform }
    }
}

impl<G: Generator, U: 'static> Generator for Map<G, U> {
    type Value = U;

    fn generate(&self, rng: &mut Random) -> Shrinkable<U> {
        self.source.generate(rng).map_rc(self.transform.clone())
    }
}

/// Generator adapter produced by [`Generator::filter`] and [`filter`].
///
/// Redraws from the source until the predicate holds on the value, then
/// prunes the shrink tree with the configured tolerance. Redraw attempts are
/// capped; overrunning the cap exhausts the run.
pub struct Filter<G: Generator> {
    source: G,
    predicate: Rc<dyn Fn(&G::Value) -> bool>,
    tolerance: usize,
    max_retries: u32,
}

impl<G: Generator> Filter<G> {
    pub(crate) fn new(
        source: G,
        predicate: Rc<dyn Fn(&G::Value) -> bool>,
        tolerance: usize,
    ) -> Self {
        Self {
            source,
            predicate,
            tolerance,
            max_retries: DEFAULT_FILTER_RETRIES,
        }
    }

    /// Consecutive rejected shrink candidates tolerated before a path is
    /// cut.
    pub fn tolerance(mut self, tolerance: usize) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Cap on redraws while searching for a value that satisfies the
    /// predicate.
    pub fn retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

impl<G: Generator> Generator for Filter<G> {
    type Value = G::Value;

    fn generate(&self, rng: &mut Random) -> Shrinkable<G::Value> {
        for _ in 0..self.max_retries {
            let candidate = self.source.generate(rng);
            if (self.predicate)(candidate.value()) {
                return candidate.filter_rc(self.predicate.clone(), self.tolerance);
            }
        }
        panic_any(PropertyError::exhausted(
            "filtered draws",
            self.max_retries,
            self.max_retries,
        ))
    }
}

/// Redraw from `source` until `predicate` holds (see [`Generator::filter`]).
pub fn filter<G, F>(source: G, predicate: F) -> Filter<G>
where
    G: Generator,
    F: Fn(&G::Value) -> bool + 'static,
{
    Filter::new(source, Rc::new(predicate), DEFAULT_FILTER_TOLERANCE)
}

/// Alias for [`filter`].
pub fn such_that<G, F>(source: G, predicate: F) -> Filter<G>
where
    G: Generator,
    F: Fn(&G::Value) -> bool + 'static,
{
    filter(source, predicate)
}

/// Generator adapter produced by [`Generator::flat_map`] and [`derive`].
pub struct FlatMap<G: Generator, U> {
    source: G,
    bind: Rc<dyn Fn(&G::Value) -> GenBoxed<U>>,
}

impl<G: Generator, U> FlatMap<G, U> {
    pub(crate) fn new(source: G, bind: Rc<dyn Fn(&G::Value) -> GenBoxed<U>>) -> Self {
        Self { source, bind }
    }
}

impl<G: Generator, U: 'static> Generator for FlatMap<G, U> {
    type Value = U;

    fn generate(&self, rng: &mut Random) -> Shrinkable<U> {
        let first = self.source.generate(rng);
        // the pre-draw state is what dependent regeneration replays during
        // shrinking, keeping the second stage deterministic
        let saved = rng.clone();
        let target = (self.bind)(first.value()).generate(rng);
        assemble_derived(first, target, self.bind.clone(), saved)
    }
}

fn assemble_derived<T: 'static, U: 'static>(
    first: Shrinkable<T>,
    target: Shrinkable<U>,
    bind: Rc<dyn Fn(&T) -> GenBoxed<U>>,
    saved: Random,
) -> Shrinkable<U> {
    let appended = target.clone();
    Shrinkable::from_rc(target.value_rc()).with_shrinks(move || {
        let bind = bind.clone();
        let saved = saved.clone();
        let tail = appended.clone();
        first
            .shrinks()
            .map(move |candidate| regenerate_derived(candidate.clone(), bind.clone(), saved.clone()))
            .concat(move || tail.shrinks())
    })
}

fn regenerate_derived<T: 'static, U: 'static>(
    first: Shrinkable<T>,
    bind: Rc<dyn Fn(&T) -> GenBoxed<U>>,
    saved: Random,
) -> Shrinkable<U> {
    let mut rng = saved.clone();
    let target = bind(first.value()).generate(&mut rng);
    assemble_derived(first, target, bind, saved)
}

/// Dependent generation: draw `T` from `source`, then `U` from the
/// generator `bind` selects for it. Shrinks of `T` are explored first, each
/// regenerating `U` from the saved random state; then `U` shrinks for the
/// current `T`.
pub fn derive<G, U, F>(source: G, bind: F) -> FlatMap<G, U>
where
    G: Generator,
    U: 'static,
    F: Fn(&G::Value) -> GenBoxed<U> + 'static,
{
    FlatMap::new(source, Rc::new(bind))
}

/// Weighted choice between alternative generators.
///
/// While shrinking, earlier-listed alternatives are preferred: candidates
/// regenerated from them (with the chosen draw's random state) are tried
/// before the chosen value's own tree.
pub struct OneOf<T: 'static> {
    choices: Rc<Vec<(f64, GenBoxed<T>)>>,
    total: f64,
}

impl<T: 'static> Generator for OneOf<T> {
    type Value = T;

    fn generate(&self, rng: &mut Random) -> Shrinkable<T> {
        let mut roll = rng.fraction() * self.total;
        let mut index = self.choices.len() - 1;
        for (position, (weight, _)) in self.choices.iter().enumerate() {
            if roll < *weight {
                index = position;
                break;
            }
            roll -= *weight;
        }
        let saved = rng.clone();
        let chosen = self.choices[index].1.generate(rng);
        if index == 0 {
            return chosen;
        }
        let choices = self.choices.clone();
        let base = chosen.clone();
        chosen.with_shrinks(move || {
            let tail = base.clone();
            earlier_alternatives(choices.clone(), saved.clone(), 0, index)
                .concat(move || tail.shrinks())
        })
    }
}

fn earlier_alternatives<T: 'static>(
    choices: Rc<Vec<(f64, GenBoxed<T>)>>,
    saved: Random,
    index: usize,
    limit: usize,
) -> Stream<Shrinkable<T>> {
    if index >= limit {
        return Stream::empty();
    }
    let mut rng = saved.clone();
    let candidate = choices[index].1.generate(&mut rng);
    Stream::cons(candidate, move || {
        earlier_alternatives(choices.clone(), saved.clone(), index + 1, limit)
    })
}

/// Uniform choice between alternatives.
pub fn one_of<T: 'static>(alternatives: Vec<GenBoxed<T>>) -> OneOf<T> {
    assert!(!alternatives.is_empty(), "one_of requires at least one alternative");
    let total = alternatives.len() as f64;
    OneOf {
        choices: Rc::new(alternatives.into_iter().map(|g| (1.0, g)).collect()),
        total,
    }
}

/// Weighted choice between alternatives.
pub fn weighted<T: 'static>(choices: Vec<(f64, GenBoxed<T>)>) -> OneOf<T> {
    assert!(!choices.is_empty(), "weighted requires at least one alternative");
    assert!(
        choices.iter().all(|(weight, _)| *weight > 0.0),
        "weighted requires positive weights"
    );
    let total = choices.iter().map(|(weight, _)| *weight).sum();
    OneOf {
        choices: Rc::new(choices),
        total,
    }
}

/// Constant generator with an empty shrink stream.
pub fn just<T: Clone + 'static>(value: T) -> GenFn<T> {
    gen_fn(move |_| Shrinkable::of(value.clone()))
}

/// Uniform pick from a fixed list; shrinks toward earlier-listed values.
pub fn element_of<T: Clone + 'static>(values: Vec<T>) -> GenFn<T> {
    assert!(!values.is_empty(), "element_of requires at least one value");
    let values = Rc::new(values);
    gen_fn(move |rng| {
        let index = rng.size_in(0, values.len());
        element_shrinkable(values.clone(), index)
    })
}

fn element_shrinkable<T: Clone + 'static>(values: Rc<Vec<T>>, index: usize) -> Shrinkable<T> {
    let value = values[index].clone();
    Shrinkable::with(value, move || earlier_elements(values.clone(), 0, index))
}

fn earlier_elements<T: Clone + 'static>(
    values: Rc<Vec<T>>,
    index: usize,
    limit: usize,
) -> Stream<Shrinkable<T>> {
    if index >= limit {
        return Stream::empty();
    }
    let head = element_shrinkable(values.clone(), index);
    Stream::cons(head, move || earlier_elements(values.clone(), index + 1, limit))
}

/// Defer construction of a nested generator, enabling recursive
/// definitions. The thunk runs once, on first use.
pub struct LazyGen<T: 'static> {
    thunk: Rc<dyn Fn() -> GenBoxed<T>>,
    cache: OnceCell<GenBoxed<T>>,
}

impl<T: 'static> Generator for LazyGen<T> {
    type Value = T;

    fn generate(&self, rng: &mut Random) -> Shrinkable<T> {
        self.cache.get_or_init(|| (self.thunk)()).generate(rng)
    }
}

/// See [`LazyGen`].
pub fn lazy_gen<T, F>(thunk: F) -> LazyGen<T>
where
    T: 'static,
    F: Fn() -> GenBoxed<T> + 'static,
{
    LazyGen {
        thunk: Rc::new(thunk),
        cache: OnceCell::new(),
    }
}

/// `Some` with probability 0.95, shrinking to `None` once before the inner
/// tree; otherwise `None`.
pub fn optional<G>(source: G) -> GenFn<Option<G::Value>>
where
    G: Generator + 'static,
    G::Value: Clone,
{
    optional_with(source, DEFAULT_SOME_PROBABILITY)
}

/// [`optional`] with an explicit `Some` probability.
pub fn optional_with<G>(source: G, some_probability: f64) -> GenFn<Option<G::Value>>
where
    G: Generator + 'static,
    G::Value: Clone,
{
    gen_fn(move |rng| {
        if rng.next_bool(some_probability) {
            let inner = source.generate(rng).map(|value| Some(value.clone()));
            let tree = inner.clone();
            inner.with_shrinks(move || {
                let tail = tree.clone();
                Stream::cons(Shrinkable::of(None), move || tail.shrinks())
            })
        } else {
            Shrinkable::of(None)
        }
    })
}

impl<T: Arbitrary + Clone> Arbitrary for Option<T> {
    type Generator = GenFn<Option<T>>;

    fn arbitrary() -> Self::Generator {
        optional(T::arbitrary())
    }
}

// Constructors: draw each field from its generator and build the target
// through the supplied function; the field tuple shrinks coordinate-wise and
// the constructor is re-applied.

pub fn construct1<T, F, G0>(build: F, g0: G0) -> impl Generator<Value = T>
where
    T: 'static,
    G0: Generator + 'static,
    G0::Value: Clone,
    F: Fn(G0::Value) -> T + 'static,
{
    g0.map(move |a| build(a.clone()))
}

pub fn construct2<T, F, G0, G1>(build: F, g0: G0, g1: G1) -> impl Generator<Value = T>
where
    T: 'static,
    G0: Generator + 'static,
    G1: Generator + 'static,
    G0::Value: Clone,
    G1::Value: Clone,
    F: Fn(G0::Value, G1::Value) -> T + 'static,
{
    crate::tuple::tuple2(g0, g1).map(move |args| build(args.0.clone(), args.1.clone()))
}

pub fn construct3<T, F, G0, G1, G2>(build: F, g0: G0, g1: G1, g2: G2) -> impl Generator<Value = T>
where
    T: 'static,
    G0: Generator + 'static,
    G1: Generator + 'static,
    G2: Generator + 'static,
    G0::Value: Clone,
    G1::Value: Clone,
    G2::Value: Clone,
    F: Fn(G0::Value, G1::Value, G2::Value) -> T + 'static,
{
    crate::tuple::tuple3(g0, g1, g2)
        .map(move |args| build(args.0.clone(), args.1.clone(), args.2.clone()))
}

pub fn construct4<T, F, G0, G1, G2, G3>(
    build: F,
    g0: G0,
    g1: G1,
    g2: G2,
    g3: G3,
) -> impl Generator<Value = T>
where
    T: 'static,
    G0: Generator + 'static,
    G1: Generator + 'static,
    G2: Generator + 'static,
    G3: Generator + 'static,
    G0::Value: Clone,
    G1::Value: Clone,
    G2::Value: Clone,
    G3::Value: Clone,
    F: Fn(G0::Value, G1::Value, G2::Value, G3::Value) -> T + 'static,
{
    crate::tuple::tuple4(g0, g1, g2, g3).map(move |args| {
        build(
            args.0.clone(),
            args.1.clone(),
            args.2.clone(),
            args.3.clone(),
        )
    })
}

pub fn construct5<T, F, G0, G1, G2, G3, G4>(
    build: F,
    g0: G0,
    g1: G1,
    g2: G2,
    g3: G3,
    g4: G4,
) -> impl Generator<Value = T>
where
    T: 'static,
    G0: Generator + 'static,
    G1: Generator + 'static,
    G2: Generator + 'static,
    G3: Generator + 'static,
    G4: Generator + 'static,
    G0::Value: Clone,
    G1::Value: Clone,
    G2::Value: Clone,
    G3::Value: Clone,
    G4::Value: Clone,
    F: Fn(G0::Value, G1::Value, G2::Value, G3::Value, G4::Value) -> T + 'static,
{
    crate::tuple::tuple5(g0, g1, g2, g3, g4).map(move |args| {
        build(
            args.0.clone(),
            args.1.clone(),
            args.2.clone(),
            args.3.clone(),
            args.4.clone(),
        )
    })
}

pub fn construct6<T, F, G0, G1, G2, G3, G4, G5>(
    build: F,
    g0: G0,
    g1: G1,
    g2: G2,
    g3: G3,
    g4: G4,
    g5: G5,
) -> impl Generator<Value = T>
where
    T: 'static,
    G0: Generator + 'static,
    G1: Generator + 'static,
    G2: Generator + 'static,
    G3: Generator + 'static,
    G4: Generator + 'static,
    G5: Generator + 'static,
    G0::Value: Clone,
    G1::Value: Clone,
    G2::Value: Clone,
    G3::Value: Clone,
    G4::Value: Clone,
    G5::Value: Clone,
    F: Fn(G0::Value, G1::Value, G2::Value, G3::Value, G4::Value, G5::Value) -> T + 'static,
{
    crate::tuple::tuple6(g0, g1, g2, g3, g4, g5).map(move |args| {
        build(
            args.0.clone(),
            args.1.clone(),
            args.2.clone(),
            args.3.clone(),
            args.4.clone(),
            args.5.clone(),
        )
    })
}
