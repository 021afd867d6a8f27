//! The generator abstraction: a callable from a random source to a
//! shrinkable value.

use std::rc::Rc;

use crate::combinator::{Filter, FlatMap, Map};
use crate::config::DEFAULT_FILTER_TOLERANCE;
use crate::rng::Random;
use crate::shrink::Shrinkable;

/// A source of shrinkable values of a specific type.
///
/// Generators are nominally pure with respect to their captured state: the
/// same `Random` state yields the same value and the same shrink tree, which
/// is what lets the runner replay a failing draw before shrinking.
pub trait Generator {
    /// The type of values this generator produces.
    type Value: 'static;

    /// Draw one shrinkable value.
    fn generate(&self, rng: &mut Random) -> Shrinkable<Self::Value>;

    /// Transform generated values, lifting the function through the shrink
    /// tree.
    fn map<U, F>(self, transform: F) -> Map<Self, U>
    where
        Self: Sized,
        U: 'static,
        F: Fn(&Self::Value) -> U + 'static,
    {
        Map::new(self, Rc::new(transform))
    }

    /// Redraw until the predicate holds; the resulting tree is pruned with
    /// the default tolerance.
    fn filter<F>(self, predicate: F) -> Filter<Self>
    where
        Self: Sized,
        F: Fn(&Self::Value) -> bool + 'static,
    {
        Filter::new(self, Rc::new(predicate), DEFAULT_FILTER_TOLERANCE)
    }

    /// Dependent generation: draw a value, then draw from the generator it
    /// selects. Shrinks the first stage before the second.
    fn flat_map<U, F>(self, bind: F) -> FlatMap<Self, U>
    where
        Self: Sized,
        U: 'static,
        F: Fn(&Self::Value) -> GenBoxed<U> + 'static,
    {
        FlatMap::new(self, Rc::new(bind))
    }

    /// Erase the concrete generator type.
    fn boxed(self) -> GenBoxed<Self::Value>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

/// A boxed, type-erased generator.
pub type GenBoxed<T> = Box<dyn Generator<Value = T>>;

impl<T: 'static> Generator for Box<dyn Generator<Value = T>> {
    type Value = T;

    fn generate(&self, rng: &mut Random) -> Shrinkable<T> {
        (**self).generate(rng)
    }
}

/// A generator built from a closure. Cheap to clone.
pub struct GenFn<T> {
    function: Rc<dyn Fn(&mut Random) -> Shrinkable<T>>,
}

impl<T> Clone for GenFn<T> {
    fn clone(&self) -> Self {
        GenFn {
            function: self.function.clone(),
        }
    }
}

impl<T: 'static> Generator for GenFn<T> {
    type Value = T;

    fn generate(&self, rng: &mut Random) -> Shrinkable<T> {
        (self.function)(rng)
    }
}

/// Wrap a closure as a generator.
pub fn gen_fn<T, F>(function: F) -> GenFn<T>
where
    T: 'static,
    F: Fn(&mut Random) -> Shrinkable<T> + 'static,
{
    GenFn {
        function: Rc::new(function),
    }
}
