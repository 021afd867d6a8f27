//! Heterogeneous tuple generators with coordinate-wise shrinking.

use crate::arbitrary::Arbitrary;
use crate::generator::Generator;
use crate::rng::Random;
use crate::shrink::Shrinkable;

/// Pair two shrinkables: position 0 shrinks first, then position 1; the
/// candidate streams are appended, so the total is linear in arity.
pub fn shrinkable_pair<A, B>(a: &Shrinkable<A>, b: &Shrinkable<B>) -> Shrinkable<(A, B)>
where
    A: Clone + 'static,
    B: Clone + 'static,
{
    let value = (a.get(), b.get());
    let left = a.clone();
    let right = b.clone();
    Shrinkable::with(value, move || {
        let fixed_right = right.clone();
        let fixed_left = left.clone();
        let rights = right.clone();
        left.shrinks()
            .map(move |candidate| shrinkable_pair(candidate, &fixed_right))
            .concat(move || {
                let anchored = fixed_left.clone();
                rights
                    .shrinks()
                    .map(move |candidate| shrinkable_pair(&anchored, candidate))
            })
    })
}

// Wider tuples nest pairs and flatten through `map`, which keeps both the
// coordinate order and the linear candidate count.

pub fn shrinkable_tuple3<A, B, C>(
    a: &Shrinkable<A>,
    b: &Shrinkable<B>,
    c: &Shrinkable<C>,
) -> Shrinkable<(A, B, C)>
where
    A: Clone + 'static,
    B: Clone + 'static,
    C: Clone + 'static,
{
    let rest = shrinkable_pair(b, c);
    shrinkable_pair(a, &rest).map(|nested| {
        let (a, (b, c)) = nested;
        (a.clone(), b.clone(), c.clone())
    })
}

pub fn shrinkable_tuple4<A, B, C, D>(
    a: &Shrinkable<A>,
    b: &Shrinkable<B>,
    c: &Shrinkable<C>,
    d: &Shrinkable<D>,
) -> Shrinkable<(A, B, C, D)>
where
    A: Clone + 'static,
    B: Clone + 'static,
    C: Clone + 'static,
    D: Clone + 'static,
{
    let rest = shrinkable_tuple3(b, c, d);
    shrinkable_pair(a, &rest).map(|nested| {
        let (a, (b, c, d)) = nested;
        (a.clone(), b.clone(), c.clone(), d.clone())
    })
}

pub fn shrinkable_tuple5<A, B, C, D, E>(
    a: &Shrinkable<A>,
    b: &Shrinkable<B>,
    c: &Shrinkable<C>,
    d: &Shrinkable<D>,
    e: &Shrinkable<E>,
) -> Shrinkable<(A, B, C, D, E)>
where
    A: Clone + 'static,
    B: Clone + 'static,
    C: Clone + 'static,
    D: Clone + 'static,
    E: Clone + 'static,
{
    let rest = shrinkable_tuple4(b, c, d, e);
    shrinkable_pair(a, &rest).map(|nested| {
        let (a, (b, c, d, e)) = nested;
        (a.clone(), b.clone(), c.clone(), d.clone(), e.clone())
    })
}

pub fn shrinkable_tuple6<A, B, C, D, E, F>(
    a: &Shrinkable<A>,
    b: &Shrinkable<B>,
    c: &Shrinkable<C>,
    d: &Shrinkable<D>,
    e: &Shrinkable<E>,
    f: &Shrinkable<F>,
) -> Shrinkable<(A, B, C, D, E, F)>
where
    A: Clone + 'static,
    B: Clone + 'static,
    C: Clone + 'static,
    D: Clone + 'static,
    E: Clone + 'static,
    F: Clone + 'static,
{
    let rest = shrinkable_tuple5(b, c, d, e, f);
    shrinkable_pair(a, &rest).map(|nested| {
        let (a, (b, c, d, e, f)) = nested;
        (
            a.clone(),
            b.clone(),
            c.clone(),
            d.clone(),
            e.clone(),
            f.clone(),
        )
    })
}

macro_rules! tuple_generators {
    ($struct_name:ident, $fn_name:ident, $shrink_fn:ident, $(($G:ident, $field:ident)),+) => {
        /// Tuple generator; see the module docs for the shrink strategy.
        pub struct $struct_name<$($G),+> {
            $($field: $G,)+
        }

        impl<$($G),+> Generator for $struct_name<$($G),+>
        where
            $($G: Generator, $G::Value: Clone,)+
        {
            type Value = ($($G::Value,)+);

            fn generate(&self, rng: &mut Random) -> Shrinkable<Self::Value> {
                $(let $field = self.$field.generate(rng);)+
                $shrink_fn($(&$field),+)
            }
        }

        pub fn $fn_name<$($G),+>($($field: $G),+) -> $struct_name<$($G),+>
        where
            $($G: Generator, $G::Value: Clone,)+
        {
            $struct_name { $($field,)+ }
        }
    };
}

tuple_generators!(Tuple2, tuple2, shrinkable_pair, (GA, a), (GB, b));
tuple_generators!(Tuple3, tuple3, shrinkable_tuple3, (GA, a), (GB, b), (GC, c));
tuple_generators!(Tuple4, tuple4, shrinkable_tuple4, (GA, a), (GB, b), (GC, c), (GD, d));
tuple_generators!(
    Tuple5,
    tuple5,
    shrinkable_tuple5,
    (GA, a),
    (GB, b),
    (GC, c),
    (GD, d),
    (GE, e)
);
tuple_generators!(
    Tuple6,
    tuple6,
    shrinkable_tuple6,
    (GA, a),
    (GB, b),
    (GC, c),
    (GD, d),
    (GE, e),
    (GF, f)
);

macro_rules! tuple_arbitrary {
    ($struct_name:ident, $fn_name:ident, $($A:ident),+) => {
        impl<$($A),+> Arbitrary for ($($A,)+)
        where
            $($A: Arbitrary + Clone,)+
        {
            type Generator = $struct_name<$($A::Generator),+>;

            fn arbitrary() -> Self::Generator {
                $fn_name($($A::arbitrary()),+)
            }
        }
    };
}

tuple_arbitrary!(Tuple2, tuple2, A, B);
tuple_arbitrary!(Tuple3, tuple3, A, B, C);
tuple_arbitrary!(Tuple4, tuple4, A, B, C, D);
tuple_arbitrary!(Tuple5, tuple5, A, B, C, D, E);
tuple_arbitrary!(Tuple6, tuple6, A, B, C, D, E, F);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shrink::binary_search_shrinkable;

    #[test]
    fn pair_shrinks_coordinate_wise() {
        let a = binary_search_shrinkable(2);
        let b = binary_search_shrinkable(2);
        let pair = shrinkable_pair(&a, &b);
        assert_eq!(pair.get(), (2, 2));

        let candidates: Vec<(i64, i64)> = pair.shrinks().iter().map(|s| s.get()).collect();
        // position 0 first with position 1 fixed, then the reverse; appended,
        // never a cartesian product
        assert_eq!(candidates, vec![(0, 2), (1, 2), (2, 0), (2, 1)]);
    }

    #[test]
    fn pair_candidates_keep_shrinking_both_positions() {
        let a = binary_search_shrinkable(2);
        let b = binary_search_shrinkable(2);
        let pair = shrinkable_pair(&a, &b);
        // commit to (0, 2): the second coordinate still shrinks from there
        let committed = pair.shrinks().head().clone();
        let candidates: Vec<(i64, i64)> = committed.shrinks().iter().map(|s| s.get()).collect();
        assert_eq!(candidates, vec![(0, 0), (0, 1)]);
    }

    #[test]
    fn triple_preserves_coordinate_order() {
        let a = binary_search_shrinkable(1);
        let b = binary_search_shrinkable(1);
        let c = binary_search_shrinkable(1);
        let triple = shrinkable_tuple3(&a, &b, &c);
        assert_eq!(triple.get(), (1, 1, 1));

        let candidates: Vec<(i64, i64, i64)> = triple.shrinks().iter().map(|s| s.get()).collect();
        assert_eq!(candidates, vec![(0, 1, 1), (1, 0, 1), (1, 1, 0)]);
    }

    #[test]
    fn tuple_generator_draws_each_position() {
        use crate::primitives::in_range;
        let paired = tuple2(in_range(0i32, 10), in_range(100i32, 110));
        let mut rng = crate::rng::Random::new(8);
        for _ in 0..50 {
            let (a, b) = paired.generate(&mut rng).get();
            assert!((0..10).contains(&a));
            assert!((100..110).contains(&b));
        }
    }
}
