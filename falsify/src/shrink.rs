//! The shrinkable value: a value paired with a lazy tree of smaller
//! candidates.

use std::rc::Rc;

use crate::stream::Stream;

/// A generated value together with a lazy stream of smaller candidates, each
/// itself shrinkable.
///
/// The value is shared (`Rc`) so combinators and the candidate streams can
/// capture it cheaply. Producers are expected to yield candidates that are
/// "smaller" under a type-appropriate order and whose trees bottom out; the
/// runner relies on termination but does not verify smallness.
pub struct Shrinkable<T> {
    value: Rc<T>,
    shrinks: Rc<dyn Fn() -> Stream<Shrinkable<T>>>,
}

impl<T> Clone for Shrinkable<T> {
    fn clone(&self) -> Self {
        Shrinkable {
            value: self.value.clone(),
            shrinks: self.shrinks.clone(),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Shrinkable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shrinkable").field("value", &self.value).finish()
    }
}

impl<T: 'static> Shrinkable<T> {
    /// A value with no shrinks.
    pub fn of(value: T) -> Self {
        Self::from_rc(Rc::new(value))
    }

    pub fn from_rc(value: Rc<T>) -> Self {
        Shrinkable {
            value,
            shrinks: Rc::new(|| Stream::empty()),
        }
    }

    /// A value with a user-supplied shrink producer.
    pub fn with<F>(value: T, shrinks: F) -> Self
    where
        F: Fn() -> Stream<Shrinkable<T>> + 'static,
    {
        Shrinkable {
            value: Rc::new(value),
            shrinks: Rc::new(shrinks),
        }
    }

    pub fn value(&self) -> &T {
        &self.value
    }

    pub fn value_rc(&self) -> Rc<T> {
        self.value.clone()
    }

    /// Clone the current value out of the node.
    pub fn get(&self) -> T
    where
        T: Clone,
    {
        (*self.value).clone()
    }

    /// The stream of smaller candidates. May be called any number of times
    /// and yields equivalent streams each time.
    pub fn shrinks(&self) -> Stream<Shrinkable<T>> {
        (self.shrinks)()
    }

    /// Replace the shrink stream entirely.
    pub fn with_shrinks<F>(&self, producer: F) -> Self
    where
        F: Fn() -> Stream<Shrinkable<T>> + 'static,
    {
        Shrinkable {
            value: self.value.clone(),
            shrinks: Rc::new(producer),
        }
    }

    /// Transform the value, lifting the function through the whole tree.
    pub fn map<U, F>(&self, transform: F) -> Shrinkable<U>
    where
        U: 'static,
        F: Fn(&T) -> U + 'static,
    {
        self.map_rc(Rc::new(transform))
    }

    pub(crate) fn map_rc<U: 'static>(&self, transform: Rc<dyn Fn(&T) -> U>) -> Shrinkable<U> {
        let value = Rc::new(transform(&self.value));
        let source = self.clone();
        Shrinkable {
            value,
            shrinks: Rc::new(move || {
                let transform = transform.clone();
                source
                    .shrinks()
                    .map(move |candidate| candidate.map_rc(transform.clone()))
            }),
        }
    }

    /// Replace the value with `f(value)`'s value and layer two shrink
    /// strategies: the original tree re-applied through `f` first, then the
    /// target's own tree.
    pub fn flat_map<U, F>(&self, bind: F) -> Shrinkable<U>
    where
        U: 'static,
        F: Fn(&T) -> Shrinkable<U> + 'static,
    {
        self.flat_map_rc(Rc::new(bind))
    }

    pub(crate) fn flat_map_rc<U: 'static>(
        &self,
        bind: Rc<dyn Fn(&T) -> Shrinkable<U>>,
    ) -> Shrinkable<U> {
        let target = bind(&self.value);
        let source = self.clone();
        let appended = target.clone();
        Shrinkable {
            value: target.value_rc(),
            shrinks: Rc::new(move || {
                let bind = bind.clone();
                let tail = appended.clone();
                source
                    .shrinks()
                    .map(move |candidate| candidate.flat_map_rc(bind.clone()))
                    .concat(move || tail.shrinks())
            }),
        }
    }

    /// Prune the tree with the predicate. The root is assumed to satisfy it;
    /// along any path, `tolerance` consecutive rejected candidates cut the
    /// remainder.
    pub fn filter<F>(&self, predicate: F, tolerance: usize) -> Shrinkable<T>
    where
        F: Fn(&T) -> bool + 'static,
    {
        self.filter_rc(Rc::new(predicate), tolerance)
    }

    pub(crate) fn filter_rc(
        &self,
        predicate: Rc<dyn Fn(&T) -> bool>,
        tolerance: usize,
    ) -> Shrinkable<T> {
        let source = self.clone();
        self.with_shrinks(move || {
            filter_candidates(source.shrinks(), predicate.clone(), tolerance)
        })
    }

    /// Append `more(node)` after each node's existing shrinks, recursively.
    pub fn concat<F>(&self, more: F) -> Shrinkable<T>
    where
        F: Fn(&Shrinkable<T>) -> Stream<Shrinkable<T>> + 'static,
    {
        self.concat_rc(Rc::new(more))
    }

    pub(crate) fn concat_rc(
        &self,
        more: Rc<dyn Fn(&Shrinkable<T>) -> Stream<Shrinkable<T>>>,
    ) -> Shrinkable<T> {
        let source = self.clone();
        self.with_shrinks(move || {
            let recurse = more.clone();
            let appended = more.clone();
            let node = source.clone();
            source
                .shrinks()
                .map(move |candidate| candidate.concat_rc(recurse.clone()))
                .concat(move || appended(&node))
        })
    }

    /// Where the tree bottoms out, continue with `next(leaf)` instead of
    /// the empty stream.
    pub fn and_then<F>(&self, next: F) -> Shrinkable<T>
    where
        F: Fn(&Shrinkable<T>) -> Stream<Shrinkable<T>> + 'static,
    {
        self.and_then_rc(Rc::new(next))
    }

    pub(crate) fn and_then_rc(
        &self,
        next: Rc<dyn Fn(&Shrinkable<T>) -> Stream<Shrinkable<T>>>,
    ) -> Shrinkable<T> {
        let source = self.clone();
        self.with_shrinks(move || {
            let inner = source.shrinks();
            if inner.is_empty() {
                next(&source)
            } else {
                let next = next.clone();
                inner.map(move |candidate| candidate.and_then_rc(next.clone()))
            }
        })
    }
}

fn filter_candidates<T: 'static>(
    stream: Stream<Shrinkable<T>>,
    predicate: Rc<dyn Fn(&T) -> bool>,
    tolerance: usize,
) -> Stream<Shrinkable<T>> {
    let mut current = stream;
    let mut remaining = tolerance;
    loop {
        if current.is_empty() {
            return Stream::empty();
        }
        let candidate = current.head().clone();
        if predicate(candidate.value()) {
            let kept = candidate.filter_rc(predicate.clone(), tolerance);
            let rest = current.clone();
            return Stream::cons(kept, move || {
                filter_candidates(rest.tail(), predicate.clone(), tolerance)
            });
        }
        if remaining <= 1 {
            // tolerance consecutive rejections: cut the rest of this path
            return Stream::empty();
        }
        remaining -= 1;
        current = current.tail();
    }
}

/// Canonical numeric shrink tree: the shrinks of `n > 0` are
/// `0, n/2, n - n/4, …, n - 1`, each candidate bisecting further toward the
/// previously tried value; symmetric for `n < 0`. Zero has no shrinks.
pub fn binary_search_shrinkable(value: i64) -> Shrinkable<i64> {
    Shrinkable::with(value, move || {
        if value == 0 {
            Stream::empty()
        } else if value > 0 {
            Stream::cons(Shrinkable::of(0), move || bisect_positive(0, value))
        } else {
            Stream::cons(Shrinkable::of(0), move || bisect_negative(value, 0))
        }
    })
}

/// Unsigned variant of [`binary_search_shrinkable`], used for sizes.
pub fn binary_search_shrinkable_u(value: u64) -> Shrinkable<u64> {
    Shrinkable::with(value, move || {
        if value == 0 {
            Stream::empty()
        } else {
            Stream::cons(Shrinkable::of(0), move || bisect_unsigned(0, value))
        }
    })
}

// Candidates strictly between `low` (known tried) and `high`, nearest the
// target side first. Each candidate bisects toward `low` in its own subtree
// while the tail closes in on `high`; every branch halves its gap.
fn bisect_positive(low: i64, high: i64) -> Stream<Shrinkable<i64>> {
    if high - low <= 1 {
        return Stream::empty();
    }
    let mid = low + (high - low) / 2;
    Stream::cons(
        Shrinkable::with(mid, move || bisect_positive(low, mid)),
        move || bisect_positive(mid, high),
    )
}

fn bisect_negative(low: i64, high: i64) -> Stream<Shrinkable<i64>> {
    let span = high as i128 - low as i128;
    if span <= 1 {
        return Stream::empty();
    }
    let mid = (high as i128 - span / 2) as i64;
    Stream::cons(
        Shrinkable::with(mid, move || bisect_negative(mid, high)),
        move || bisect_negative(low, mid),
    )
}

fn bisect_unsigned(low: u64, high: u64) -> Stream<Shrinkable<u64>> {
    if high - low <= 1 {
        return Stream::empty();
    }
    let mid = low + (high - low) / 2;
    Stream::cons(
        Shrinkable::with(mid, move || bisect_unsigned(low, mid)),
        move || bisect_unsigned(mid, high),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level_values(shrinkable: &Shrinkable<i64>) -> Vec<i64> {
        shrinkable.shrinks().iter().map(|s| s.get()).collect()
    }

    #[test]
    fn of_has_no_shrinks() {
        let shrinkable = Shrinkable::of(17);
        assert_eq!(*shrinkable.value(), 17);
        assert!(shrinkable.shrinks().is_empty());
    }

    #[test]
    fn root_value_is_stable() {
        let shrinkable = binary_search_shrinkable(12);
        assert_eq!(shrinkable.get(), 12);
        assert_eq!(shrinkable.get(), 12);
    }

    #[test]
    fn binary_search_of_eight() {
        let shrinkable = binary_search_shrinkable(8);
        assert_eq!(level_values(&shrinkable), vec![0, 4, 6, 7]);

        // 4 bisects toward the already-tried 0
        let four = shrinkable.shrinks().tail().head().clone();
        assert_eq!(four.get(), 4);
        assert_eq!(level_values(&four), vec![2, 3]);
    }

    #[test]
    fn binary_search_negative_mirrors_positive() {
        let shrinkable = binary_search_shrinkable(-8);
        assert_eq!(level_values(&shrinkable), vec![0, -4, -6, -7]);
    }

    #[test]
    fn binary_search_zero_is_a_leaf() {
        assert!(binary_search_shrinkable(0).shrinks().is_empty());
        assert!(binary_search_shrinkable_u(0).shrinks().is_empty());
    }

    #[test]
    fn binary_search_small_values() {
        assert_eq!(level_values(&binary_search_shrinkable(1)), vec![0]);
        assert_eq!(level_values(&binary_search_shrinkable(2)), vec![0, 1]);
        assert_eq!(level_values(&binary_search_shrinkable(-1)), vec![0]);
    }

    #[test]
    fn binary_search_extremes_terminate() {
        // every path halves its gap, so even the widest values bottom out
        let mut node = binary_search_shrinkable(i64::MIN);
        let mut depth = 0;
        loop {
            let level = node.shrinks();
            if level.is_empty() {
                break;
            }
            let rest = level.tail();
            node = if rest.is_empty() {
                level.head().clone()
            } else {
                rest.head().clone()
            };
            depth += 1;
            assert!(depth < 128, "shrink path did not terminate");
        }
    }

    #[test]
    fn unsigned_tree_matches_signed_shape() {
        let values: Vec<u64> = binary_search_shrinkable_u(8)
            .shrinks()
            .iter()
            .map(|s| s.get())
            .collect();
        assert_eq!(values, vec![0, 4, 6, 7]);
    }

    #[test]
    fn map_preserves_shape() {
        let doubled = binary_search_shrinkable(8).map(|n| n * 2);
        assert_eq!(doubled.get(), 16);
        let level: Vec<i64> = doubled.shrinks().iter().map(|s| s.get()).collect();
        assert_eq!(level, vec![0, 8, 12, 14]);
    }

    #[test]
    fn map_identity_keeps_value() {
        let shrinkable = binary_search_shrinkable(5).map(|n| *n);
        assert_eq!(shrinkable.get(), 5);
        assert_eq!(level_values(&shrinkable), vec![0, 2, 3, 4]);
    }

    #[test]
    fn map_composes() {
        let composed = binary_search_shrinkable(8).map(|n| n + 1).map(|n| n * 10);
        let direct = binary_search_shrinkable(8).map(|n| (n + 1) * 10);
        let left: Vec<i64> = composed.shrinks().iter().map(|s| s.get()).collect();
        let right: Vec<i64> = direct.shrinks().iter().map(|s| s.get()).collect();
        assert_eq!(composed.get(), direct.get());
        assert_eq!(left, right);
    }

    #[test]
    fn flat_map_replaces_value_and_layers_shrinks() {
        let shrinkable = binary_search_shrinkable(2).flat_map(|n| binary_search_shrinkable(n + 1));
        assert_eq!(shrinkable.get(), 3);
        // the T-tree comes first (re-bound through f), then the U-tree of f(2)
        let level: Vec<i64> = shrinkable.shrinks().iter().map(|s| s.get()).collect();
        assert_eq!(level, vec![1, 2, 0, 1, 2]);
    }

    #[test]
    fn filter_prunes_rejected_candidates() {
        let evens = binary_search_shrinkable(8).filter(|n| n % 2 == 0, 5);
        let level: Vec<i64> = evens.shrinks().iter().map(|s| s.get()).collect();
        assert_eq!(level, vec![0, 4, 6]);

        let four = evens.shrinks().tail().head().clone();
        // 4's candidates are [2, 3]; 3 is pruned
        let inner: Vec<i64> = four.shrinks().iter().map(|s| s.get()).collect();
        assert_eq!(inner, vec![2]);
    }

    #[test]
    fn filter_tolerance_cuts_a_path() {
        // candidates [1, 3, 5, 7, 9, 10]: with tolerance 3 the scan gives up
        // before ever reaching 10
        let source = Shrinkable::with(12, || {
            Stream::from_vec(vec![1i64, 3, 5, 7, 9, 10])
                .map(|n| Shrinkable::of(*n))
        });
        let filtered = source.filter(|n| n % 2 == 0, 3);
        assert!(filtered.shrinks().is_empty());
    }

    #[test]
    fn concat_appends_at_every_node() {
        let shrinkable = binary_search_shrinkable(2)
            .concat(|node| Stream::one(Shrinkable::of(node.get() + 100)));
        let level: Vec<i64> = shrinkable.shrinks().iter().map(|s| s.get()).collect();
        assert_eq!(level, vec![0, 1, 102]);

        let zero = shrinkable.shrinks().head().clone();
        let inner: Vec<i64> = zero.shrinks().iter().map(|s| s.get()).collect();
        assert_eq!(inner, vec![100]);
    }

    #[test]
    fn and_then_fires_only_at_leaves() {
        let shrinkable = binary_search_shrinkable(2)
            .and_then(|leaf| Stream::one(Shrinkable::of(leaf.get() + 100)));
        // the root has shrinks, so its first level is untouched
        let level: Vec<i64> = shrinkable.shrinks().iter().map(|s| s.get()).collect();
        assert_eq!(level, vec![0, 1]);

        // 0 is a leaf: the continuation replaces its empty stream
        let zero = shrinkable.shrinks().head().clone();
        let inner: Vec<i64> = zero.shrinks().iter().map(|s| s.get()).collect();
        assert_eq!(inner, vec![100]);
    }

    #[test]
    fn with_shrinks_replaces_the_stream() {
        let shrinkable =
            binary_search_shrinkable(8).with_shrinks(|| Stream::one(Shrinkable::of(-1)));
        assert_eq!(level_values(&shrinkable), vec![-1]);
    }
}
