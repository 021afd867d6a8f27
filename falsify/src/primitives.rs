//! Generators for primitive types.

use std::marker::PhantomData;

use num_traits::{AsPrimitive, PrimInt};

use crate::arbitrary::Arbitrary;
use crate::generator::{GenFn, Generator, gen_fn};
use crate::rng::Random;
use crate::shrink::{Shrinkable, binary_search_shrinkable, binary_search_shrinkable_u};
use crate::stream::Stream;

// One draw in this many picks a boundary value instead of a uniform one.
const BOUNDARY_BIAS: usize = 8;

/// Boundary set for an integral type: zero, the unit values, the extremes
/// and their neighbors, and the half-width extremes and theirs.
fn boundary_values<T: PrimInt>() -> Vec<T> {
    let zero = T::zero();
    let one = T::one();
    let two = one + one;
    let min = T::min_value();
    let max = T::max_value();
    let half_min = min / two;
    let half_max = max / two;
    let mut values = vec![
        zero,
        one,
        min,
        max,
        min + one,
        max - one,
        half_min,
        half_min + one,
        half_max,
        half_max - one,
        half_max + one,
    ];
    // signed types also get -1 and half_min - 1; unsigned checked ops bow out
    if let Some(minus_one) = zero.checked_sub(&one) {
        values.push(minus_one);
    }
    if let Some(below_half) = half_min.checked_sub(&one) {
        if below_half < half_min {
            values.push(below_half);
        }
    }
    values
}

/// Full-width generator for an integral type: boundary values with small
/// probability, uniform bits otherwise; shrinks by binary search toward
/// zero.
pub struct IntegralGenerator<T> {
    _marker: PhantomData<T>,
}

impl<T> IntegralGenerator<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for IntegralGenerator<T> {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! integral_signed {
    ($($t:ty => $draw:ident),* $(,)?) => {
        $(
            impl Generator for IntegralGenerator<$t> {
                type Value = $t;

                fn generate(&self, rng: &mut Random) -> Shrinkable<$t> {
                    let value = if rng.size_in(0, BOUNDARY_BIAS) == 0 {
                        let boundaries = boundary_values::<$t>();
                        boundaries[rng.size_in(0, boundaries.len())]
                    } else {
                        rng.$draw() as $t
                    };
                    binary_search_shrinkable(value as i64).map(|v| *v as $t)
                }
            }

            impl Arbitrary for $t {
                type Generator = IntegralGenerator<$t>;

                fn arbitrary() -> Self::Generator {
                    IntegralGenerator::new()
                }
            }
        )*
    };
}

macro_rules! integral_unsigned {
    ($($t:ty => $draw:ident),* $(,)?) => {
        $(
            impl Generator for IntegralGenerator<$t> {
                type Value = $t;

                fn generate(&self, rng: &mut Random) -> Shrinkable<$t> {
                    let value = if rng.size_in(0, BOUNDARY_BIAS) == 0 {
                        let boundaries = boundary_values::<$t>();
                        boundaries[rng.size_in(0, boundaries.len())]
                    } else {
                        rng.$draw() as $t
                    };
                    binary_search_shrinkable_u(value as u64).map(|v| *v as $t)
                }
            }

            impl Arbitrary for $t {
                type Generator = IntegralGenerator<$t>;

                fn arbitrary() -> Self::Generator {
                    IntegralGenerator::new()
                }
            }
        )*
    };
}

integral_signed! {
    i8 => next_i8,
    i16 => next_i16,
    i32 => next_i32,
    i64 => next_i64,
    isize => next_i64,
}

integral_unsigned! {
    u8 => next_u8,
    u16 => next_u16,
    u32 => next_u32,
    u64 => next_u64,
    usize => next_u64,
}

// Shared core for in_range/interval. Bounds are an inclusive i128 window,
// which is wide enough for every supported integral type.
fn bounded_integral<T>(low: i128, high_inclusive: i128) -> GenFn<T>
where
    T: PrimInt + 'static,
    i128: AsPrimitive<T>,
{
    gen_fn(move |rng| {
        let span = (high_inclusive - low + 1) as u128;
        let value = low + ((rng.next_u64() as u128) % span) as i128;
        // shrink toward zero when the window contains it, otherwise toward
        // the endpoint nearest zero
        let target = if low <= 0 && 0 <= high_inclusive {
            0
        } else if low > 0 {
            low
        } else {
            high_inclusive
        };
        if value >= target {
            let gap = (value - target) as u64;
            binary_search_shrinkable_u(gap).map(move |d| (target + *d as i128).as_())
        } else {
            let gap = (value - target) as i64;
            binary_search_shrinkable(gap).map(move |d| (target + *d as i128).as_())
        }
    })
}

/// Uniform integral draw in the half-open range `[low, high)`.
pub fn in_range<T>(low: T, high: T) -> GenFn<T>
where
    T: PrimInt + AsPrimitive<i128> + 'static,
    i128: AsPrimitive<T>,
{
    assert!(low < high, "in_range requires low < high");
    bounded_integral(low.as_(), high.as_() - 1)
}

/// Uniform integral draw in the inclusive range `[low, high]`.
pub fn interval<T>(low: T, high: T) -> GenFn<T>
where
    T: PrimInt + AsPrimitive<i128> + 'static,
    i128: AsPrimitive<T>,
{
    assert!(low <= high, "interval requires low <= high");
    bounded_integral(low.as_(), high.as_())
}

/// Generator for floating-point values by raw bit reinterpretation; any
/// pattern can come out, NaN and subnormals included.
pub struct FloatGenerator<T> {
    _marker: PhantomData<T>,
}

impl<T> FloatGenerator<T> {
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for FloatGenerator<T> {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! float_impls {
    ($($t:ty => ($draw:ident, $shrink_fn:ident)),* $(,)?) => {
        $(
            fn $shrink_fn(value: $t) -> Shrinkable<$t> {
                Shrinkable::with(value, move || {
                    if value == 0.0 {
                        Stream::empty()
                    } else if !value.is_finite() {
                        Stream::one(Shrinkable::of(0.0))
                    } else {
                        // halving reaches zero through the subnormals, so
                        // every path is finite
                        Stream::cons(Shrinkable::of(0.0), move || {
                            Stream::one($shrink_fn(value / 2.0))
                        })
                    }
                })
            }

            impl Generator for FloatGenerator<$t> {
                type Value = $t;

                fn generate(&self, rng: &mut Random) -> Shrinkable<$t> {
                    $shrink_fn(rng.$draw())
                }
            }

            impl Arbitrary for $t {
                type Generator = FloatGenerator<$t>;

                fn arbitrary() -> Self::Generator {
                    FloatGenerator::new()
                }
            }
        )*
    };
}

float_impls! {
    f32 => (next_f32, float_shrinkable_f32),
    f64 => (next_f64, float_shrinkable_f64),
}

/// Uniform boolean; `true` shrinks to `false`.
pub struct BoolGenerator;

impl Generator for BoolGenerator {
    type Value = bool;

    fn generate(&self, rng: &mut Random) -> Shrinkable<bool> {
        if rng.next_bool_uniform() {
            Shrinkable::with(true, || Stream::one(Shrinkable::of(false)))
        } else {
            Shrinkable::of(false)
        }
    }
}

impl Arbitrary for bool {
    type Generator = BoolGenerator;

    fn arbitrary() -> Self::Generator {
        BoolGenerator
    }
}

/// ASCII character in `[0x01, 0x7F]`, the default string element.
pub fn ascii_char() -> GenFn<char> {
    gen_fn(|rng| {
        interval(0x01u32, 0x7f)
            .generate(rng)
            .map(|code| (*code as u8) as char)
    })
}

/// Any Unicode scalar value; surrogate codepoints are redrawn and pruned
/// from the shrink tree.
pub fn unicode_char() -> GenFn<char> {
    gen_fn(|rng| {
        loop {
            let code = interval(0x01u32, 0x10FFFF).generate(rng);
            if char::from_u32(*code.value()).is_some() {
                return code
                    .filter(|c| char::from_u32(*c).is_some(), crate::config::DEFAULT_FILTER_TOLERANCE)
                    .map(|c| char::from_u32(*c).unwrap_or('\u{FFFD}'));
            }
        }
    })
}

impl Arbitrary for char {
    type Generator = GenFn<char>;

    fn arbitrary() -> Self::Generator {
        unicode_char()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arbitrary::arbitrary;

    #[test]
    fn integral_arbitrary_is_deterministic() {
        let ints = arbitrary::<i32>();
        let mut a = Random::new(40);
        let mut b = Random::new(40);
        for _ in 0..100 {
            assert_eq!(ints.generate(&mut a).get(), ints.generate(&mut b).get());
        }
    }

    #[test]
    fn integral_shrink_reaches_zero() {
        let ints = arbitrary::<i32>();
        let mut rng = Random::new(17);
        let mut seen_nonzero = false;
        for _ in 0..50 {
            let drawn = ints.generate(&mut rng);
            if drawn.get() != 0 {
                seen_nonzero = true;
                assert_eq!(drawn.shrinks().head().get(), 0);
            } else {
                assert!(drawn.shrinks().is_empty());
            }
        }
        assert!(seen_nonzero);
    }

    #[test]
    fn integral_shrink_reaches_zero_for_every_signed_width() {
        macro_rules! assert_widths_reach_zero {
            ($($t:ty),+) => {
                $({
                    let ints = arbitrary::<$t>();
                    let mut rng = Random::new(91);
                    for _ in 0..50 {
                        let drawn = ints.generate(&mut rng);
                        if drawn.get() != 0 {
                            assert_eq!(drawn.shrinks().head().get(), 0);
                        }
                    }
                })+
            };
        }
        assert_widths_reach_zero!(i8, i16, i32, i64);
    }

    #[test]
    fn boundary_set_is_well_formed() {
        let signed = boundary_values::<i32>();
        assert!(signed.contains(&0));
        assert!(signed.contains(&1));
        assert!(signed.contains(&-1));
        assert!(signed.contains(&i32::MIN));
        assert!(signed.contains(&i32::MAX));
        assert!(signed.contains(&(i32::MIN + 1)));
        assert!(signed.contains(&(i32::MAX - 1)));
        assert!(signed.contains(&(i32::MIN / 2)));
        assert!(signed.contains(&(i32::MAX / 2)));

        let unsigned = boundary_values::<u8>();
        assert!(unsigned.contains(&0));
        assert!(unsigned.contains(&u8::MAX));
    }

    #[test]
    fn in_range_is_half_open() {
        let digits = in_range(0i32, 10);
        let mut rng = Random::new(23);
        for _ in 0..500 {
            let value = digits.generate(&mut rng).get();
            assert!((0..10).contains(&value));
        }
    }

    #[test]
    fn interval_is_inclusive() {
        let coin = interval(0u8, 1);
        let mut rng = Random::new(31);
        let mut seen = [false, false];
        for _ in 0..200 {
            seen[coin.generate(&mut rng).get() as usize] = true;
        }
        assert!(seen[0] && seen[1]);
    }

    #[test]
    fn in_range_shrinks_within_bounds_toward_low() {
        let offsets = in_range(10i32, 100);
        let mut rng = Random::new(3);
        for _ in 0..50 {
            let drawn = offsets.generate(&mut rng);
            if drawn.get() > 10 {
                let candidates: Vec<i32> =
                    drawn.shrinks().iter().map(|s| s.get()).collect();
                assert_eq!(candidates[0], 10);
                for candidate in candidates {
                    assert!((10..100).contains(&candidate));
                }
            }
        }
    }

    #[test]
    fn negative_interval_shrinks_toward_the_near_endpoint() {
        let negatives = interval(-100i32, -10);
        let mut rng = Random::new(13);
        for _ in 0..50 {
            let drawn = negatives.generate(&mut rng);
            if drawn.get() < -10 {
                assert_eq!(drawn.shrinks().head().get(), -10);
            }
        }
    }

    #[test]
    fn interval_spanning_zero_shrinks_toward_zero() {
        let window = interval(-50i32, 50);
        let mut rng = Random::new(29);
        for _ in 0..50 {
            let drawn = window.generate(&mut rng);
            if drawn.get() != 0 {
                assert_eq!(drawn.shrinks().head().get(), 0);
            }
        }
    }

    #[test]
    fn full_width_u64_interval_does_not_overflow() {
        let everything = interval(0u64, u64::MAX);
        let mut rng = Random::new(55);
        for _ in 0..50 {
            let drawn = everything.generate(&mut rng);
            if drawn.get() != 0 {
                assert_eq!(drawn.shrinks().head().get(), 0);
            }
        }
    }

    #[test]
    fn float_shrinks_toward_zero() {
        let drawn = float_shrinkable_f64(64.0);
        let candidates: Vec<f64> = drawn.shrinks().iter().map(|s| s.get()).collect();
        assert_eq!(candidates[0], 0.0);
        assert_eq!(candidates[1], 32.0);
    }

    #[test]
    fn non_finite_floats_shrink_to_zero_once() {
        for odd in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let drawn = float_shrinkable_f64(odd);
            let candidates: Vec<f64> = drawn.shrinks().iter().map(|s| s.get()).collect();
            assert_eq!(candidates, vec![0.0]);
        }
    }

    #[test]
    fn float_generator_reinterprets_raw_bits() {
        let floats = FloatGenerator::<f64>::new();
        let mut value_source = Random::new(2);
        let mut bit_source = Random::new(2);
        for _ in 0..100 {
            let value = floats.generate(&mut value_source).get();
            assert_eq!(value.to_bits(), bit_source.next_u64());
        }
    }

    #[test]
    fn bool_shrinks_to_false() {
        let bools = BoolGenerator;
        let mut rng = Random::new(6);
        for _ in 0..50 {
            let drawn = bools.generate(&mut rng);
            if drawn.get() {
                let candidates: Vec<bool> = drawn.shrinks().iter().map(|s| s.get()).collect();
                assert_eq!(candidates, vec![false]);
            } else {
                assert!(drawn.shrinks().is_empty());
            }
        }
    }

    #[test]
    fn ascii_char_stays_ascii() {
        let chars = ascii_char();
        let mut rng = Random::new(10);
        for _ in 0..200 {
            let c = chars.generate(&mut rng).get();
            assert!(c.is_ascii());
            assert!(c != '\0');
        }
    }

    #[test]
    fn unicode_char_is_always_a_scalar_value() {
        let chars = unicode_char();
        let mut rng = Random::new(44);
        for _ in 0..200 {
            let drawn = chars.generate(&mut rng);
            let _ = drawn.get();
            for candidate in drawn.shrinks().iter().take(5) {
                let _ = candidate.get();
            }
        }
    }
}
