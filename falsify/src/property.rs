//! The property runner: iteration loop, failure detection, and the
//! coordinate-wise shrink driver.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use crate::arbitrary::Arbitrary;
use crate::config::Config;
use crate::error::{PropertyError, classify_panic};
use crate::generator::{GenBoxed, Generator};
use crate::rng::{Random, seed_from_clock};
use crate::shrink::Shrinkable;
use crate::statistics::{ContextGuard, PropertyContext};

/// A predicate over an argument tuple. Implemented for closures of each
/// arity; the return value may be `bool` or `()` (with assertions doing the
/// failing).
pub trait PropertyFn<Args> {
    fn invoke(&self, args: Args) -> bool;
}

/// Return types accepted from property bodies.
pub trait Verdict {
    fn into_pass(self) -> bool;
}

impl Verdict for bool {
    fn into_pass(self) -> bool {
        self
    }
}

impl Verdict for () {
    fn into_pass(self) -> bool {
        true
    }
}

/// Argument tuples the runner can drive: how to draw them, read their
/// current values, and shrink them coordinate by coordinate.
///
/// Implemented for tuples of arity 1 through 6; the macro-generated impls
/// are the typed-tuple replacement for per-arity metaprogramming.
pub trait Arguments: Clone + fmt::Debug + 'static {
    type Generators: 'static;
    type Drawn: Clone + 'static;

    fn draw(generators: &Self::Generators, rng: &mut Random) -> Self::Drawn;
    fn current(drawn: &Self::Drawn) -> Self;

    /// Coordinate-wise shrink driver: for each position in turn, walk the
    /// candidate stream, commit any candidate that still fails, and keep
    /// descending into its stream; move on when a full pass finds nothing.
    fn shrink(drawn: &mut Self::Drawn, still_failing: &mut dyn FnMut(&Self) -> bool);
}

/// Argument tuples whose generators can all be defaulted via [`Arbitrary`].
pub trait ArbitraryArguments: Arguments {
    fn default_generators() -> Self::Generators;
}

/// Generator tuples convertible into a boxed generator tuple for `Args`.
pub trait IntoGenerators<Args: Arguments> {
    fn into_generators(self) -> Args::Generators;
}

macro_rules! arguments_impl {
    ($(($A:ident, $G:ident, $idx:tt)),+) => {
        impl<$($A: Clone + fmt::Debug + 'static),+> Arguments for ($($A,)+) {
            type Generators = ($(GenBoxed<$A>,)+);
            type Drawn = ($(Shrinkable<$A>,)+);

            fn draw(generators: &Self::Generators, rng: &mut Random) -> Self::Drawn {
                ($(generators.$idx.generate(rng),)+)
            }

            fn current(drawn: &Self::Drawn) -> Self {
                ($(drawn.$idx.get(),)+)
            }

            fn shrink(drawn: &mut Self::Drawn, still_failing: &mut dyn FnMut(&Self) -> bool) {
                $({
                    let mut stream = drawn.$idx.shrinks();
                    loop {
                        let mut committed = None;
                        for candidate in stream.iter() {
                            let mut trial = drawn.clone();
                            trial.$idx = candidate.clone();
                            if still_failing(&Self::current(&trial)) {
                                committed = Some(candidate);
                                break;
                            }
                        }
                        match committed {
                            Some(candidate) => {
                                stream = candidate.shrinks();
                                drawn.$idx = candidate;
                            }
                            None => break,
                        }
                    }
                })+
            }
        }

        impl<$($A: Arbitrary + Clone + fmt::Debug),+> ArbitraryArguments for ($($A,)+) {
            fn default_generators() -> Self::Generators {
                ($(<$A as Arbitrary>::arbitrary().boxed(),)+)
            }
        }

        impl<$($A: Clone + fmt::Debug + 'static,)+ $($G: Generator<Value = $A> + 'static),+>
            IntoGenerators<($($A,)+)> for ($($G,)+)
        {
            fn into_generators(self) -> ($(GenBoxed<$A>,)+) {
                ($(self.$idx.boxed(),)+)
            }
        }

        impl<Func, Ret, $($A: Clone + fmt::Debug + 'static),+> PropertyFn<($($A,)+)> for Func
        where
            Func: Fn($($A),+) -> Ret,
            Ret: Verdict,
        {
            #[allow(non_snake_case)]
            fn invoke(&self, args: ($($A,)+)) -> bool {
                let ($($G,)+) = args;
                (self)($($G),+).into_pass()
            }
        }
    };
}

arguments_impl!((A0, G0, 0));
arguments_impl!((A0, G0, 0), (A1, G1, 1));
arguments_impl!((A0, G0, 0), (A1, G1, 1), (A2, G2, 2));
arguments_impl!((A0, G0, 0), (A1, G1, 1), (A2, G2, 2), (A3, G3, 3));
arguments_impl!(
    (A0, G0, 0),
    (A1, G1, 1),
    (A2, G2, 2),
    (A3, G3, 3),
    (A4, G4, 4)
);
arguments_impl!(
    (A0, G0, 0),
    (A1, G1, 1),
    (A2, G2, 2),
    (A3, G3, 3),
    (A4, G4, 4),
    (A5, G5, 5)
);

/// Summary of a passing run.
#[derive(Debug, Clone)]
pub struct TestSuccess {
    pub runs: u32,
    pub seed: u64,
    pub context: PropertyContext,
}

/// Report of a failing run: the error, the original failing arguments, and
/// the minimal tuple the shrink driver settled on. `Unexpected` and
/// `Exhausted` failures carry no arguments.
#[derive(Debug, Clone)]
pub struct TestFailure<Args> {
    pub error: PropertyError,
    pub runs: u32,
    pub seed: u64,
    pub original: Option<Args>,
    pub shrunk: Option<Args>,
}

pub type PropertyResult<Args> = Result<TestSuccess, TestFailure<Args>>;

enum Outcome {
    Pass,
    Discarded,
    Failed(PropertyError),
    Aborted(PropertyError),
}

/// A configurable property over an argument tuple.
pub struct Property<Args: Arguments> {
    function: Rc<dyn PropertyFn<Args>>,
    generators: Args::Generators,
    config: Config,
}

/// Build a property using the default [`Arbitrary`] generator for each
/// argument type.
pub fn property<Args, F>(function: F) -> Property<Args>
where
    Args: ArbitraryArguments,
    F: PropertyFn<Args> + 'static,
{
    Property {
        function: Rc::new(function),
        generators: Args::default_generators(),
        config: Config::default(),
    }
}

/// Build a property with explicit generators, one per argument.
pub fn property_with<Args, F, G>(function: F, generators: G) -> Property<Args>
where
    Args: Arguments,
    F: PropertyFn<Args> + 'static,
    G: IntoGenerators<Args>,
{
    Property {
        function: Rc::new(function),
        generators: generators.into_generators(),
        config: Config::default(),
    }
}

/// Run a property once with default generators and report via stdout.
pub fn check<Args, F>(function: F) -> bool
where
    Args: ArbitraryArguments,
    F: PropertyFn<Args> + 'static,
{
    property(function).check()
}

/// Run a property once with explicit generators and report via stdout.
pub fn check_with<Args, F, G>(function: F, generators: G) -> bool
where
    Args: Arguments,
    F: PropertyFn<Args> + 'static,
    G: IntoGenerators<Args>,
{
    property_with(function, generators).check()
}

impl<Args: Arguments> Property<Args> {
    /// Fix the seed; unseeded runs derive one from the clock.
    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Number of passing iterations required.
    pub fn iterations(mut self, num_runs: u32) -> Self {
        self.config.num_runs = num_runs;
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Drive the run and return a structured result. Printing is left to
    /// [`check`](Property::check).
    pub fn run(&self) -> PropertyResult<Args> {
        let seed = self.config.seed.unwrap_or_else(seed_from_clock);
        let mut rng = Random::new(seed);
        let context = ContextGuard::install();
        let _quiet = QuietPanics::install();
        let discard_limit = self.config.discard_limit();
        let mut passed = 0u32;
        let mut discards = 0u32;
        while passed < self.config.num_runs {
            let saved = rng.clone();
            match self.attempt(&mut rng) {
                Outcome::Pass => passed += 1,
                Outcome::Discarded => {
                    discards += 1;
                    if discards >= discard_limit {
                        return Err(TestFailure {
                            error: PropertyError::exhausted("discards", discards, discard_limit),
                            runs: passed,
                            seed,
                            original: None,
                            shrunk: None,
                        });
                    }
                }
                Outcome::Failed(error) => {
                    let (original, shrunk) = self.shrink_failure(saved);
                    return Err(TestFailure {
                        error,
                        runs: passed + 1,
                        seed,
                        original: Some(original),
                        shrunk: Some(shrunk),
                    });
                }
                Outcome::Aborted(error) => {
                    return Err(TestFailure {
                        error,
                        runs: passed + 1,
                        seed,
                        original: None,
                        shrunk: None,
                    });
                }
            }
        }
        Ok(TestSuccess {
            runs: passed,
            seed,
            context: context.snapshot(),
        })
    }

    /// Run and report: `OK, passed N tests` with the classification
    /// histogram on success, `Falsifiable, after K tests` with the original
    /// and shrunk arguments on failure.
    pub fn check(&self) -> bool {
        match self.run() {
            Ok(success) => {
                println!("OK, passed {} tests", success.runs);
                let summary = success.context.format_summary();
                if !summary.is_empty() {
                    print!("{}", summary);
                }
                true
            }
            Err(failure) => {
                eprintln!("Falsifiable, after {} tests: {}", failure.runs, failure.error);
                eprintln!("  seed: {}", failure.seed);
                if let Some(original) = &failure.original {
                    eprintln!("  original: {:?}", original);
                }
                if let Some(shrunk) = &failure.shrunk {
                    eprintln!("  shrunk: {:?}", shrunk);
                }
                false
            }
        }
    }

    /// Invoke the property once with explicit arguments.
    pub fn example(&self, args: Args) -> bool {
        let _context = ContextGuard::install();
        let _quiet = QuietPanics::install();
        let function = self.function.clone();
        let probe = args.clone();
        let outcome = panic::catch_unwind(AssertUnwindSafe(move || function.invoke(probe)));
        match outcome {
            Ok(passed) => passed,
            Err(payload) => match classify_panic(payload) {
                PropertyError::Success => true,
                PropertyError::Discard => {
                    eprintln!("discard is not supported for a single invocation");
                    false
                }
                error => {
                    eprintln!("property failed: {} for {:?}", error, args);
                    false
                }
            },
        }
    }

    fn attempt(&self, rng: &mut Random) -> Outcome {
        let function = &self.function;
        let generators = &self.generators;
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let drawn = Args::draw(generators, rng);
            function.invoke(Args::current(&drawn))
        }));
        match outcome {
            Ok(true) => Outcome::Pass,
            Ok(false) => Outcome::Failed(PropertyError::Falsified),
            Err(payload) => match classify_panic(payload) {
                PropertyError::Success => Outcome::Pass,
                PropertyError::Discard => Outcome::Discarded,
                error @ PropertyError::AssertFailed { .. } => Outcome::Failed(error),
                // unexpected errors and exhausted caps are reported
                // verbatim; no shrinking
                error => Outcome::Aborted(error),
            },
        }
    }

    // Reconstruct the failing draw from the saved random state and drive
    // the coordinate-wise shrink.
    fn shrink_failure(&self, mut saved: Random) -> (Args, Args) {
        let mut drawn = Args::draw(&self.generators, &mut saved);
        let original = Args::current(&drawn);
        let function = self.function.clone();
        let mut still_failing = move |args: &Args| -> bool {
            let probe = args.clone();
            let function = function.clone();
            let outcome = panic::catch_unwind(AssertUnwindSafe(move || function.invoke(probe)));
            match outcome {
                Ok(passed) => !passed,
                Err(payload) => match classify_panic(payload) {
                    PropertyError::Success | PropertyError::Discard => false,
                    // any other error reproduces the failure
                    _ => true,
                },
            }
        };
        Args::shrink(&mut drawn, &mut still_failing);
        (original, Args::current(&drawn))
    }
}

// Shrinking re-invokes the property for every candidate; the default panic
// hook would spray each probe's message to stderr. Silenced while a run is
// active, restored on drop.
struct QuietPanics {
    previous: Option<Box<dyn Fn(&panic::PanicHookInfo<'_>) + Sync + Send + 'static>>,
}

impl QuietPanics {
    fn install() -> Self {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(|_| {}));
        Self {
            previous: Some(previous),
        }
    }
}

impl Drop for QuietPanics {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            panic::set_hook(previous);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::{in_range, interval};

    #[test]
    fn passing_property_reports_all_runs() {
        let outcome = property(|a: i32, b: i32| a.wrapping_add(b) == b.wrapping_add(a))
            .seed(1)
            .run();
        let success = outcome.expect("commutativity should hold");
        assert_eq!(success.runs, 100);
        assert_eq!(success.seed, 1);
    }

    #[test]
    fn unit_returning_properties_pass() {
        let outcome = property(|n: u8| {
            let _ = n;
        })
        .seed(2)
        .run();
        assert!(outcome.is_ok());
    }

    #[test]
    fn failing_property_shrinks_to_the_boundary() {
        let outcome = property(|n: i32| n < 50).seed(3).run();
        let failure = outcome.expect_err("some draw must be >= 50");
        assert_eq!(failure.shrunk, Some((50,)));
        let (original,) = failure.original.expect("original recorded");
        assert!(original >= 50);
    }

    #[test]
    fn shrinking_is_coordinate_wise_and_minimal() {
        let outcome = property_with(
            |a: i32, b: i32| !(-10 < a && a < 100 && -20 < b && b < 200),
            (interval(-9i32, 99), interval(-19i32, 199)),
        )
        .seed(4)
        .run();
        // every draw is inside the failing region, and both coordinates
        // shrink to the representative nearest zero
        let failure = outcome.expect_err("every draw falsifies");
        assert_eq!(failure.runs, 1);
        assert_eq!(failure.shrunk, Some((0, 0)));
    }

    #[test]
    fn same_seed_reports_identical_outcomes() {
        let run = || property(|v: Vec<i32>| v.len() < 5).seed(5).run();
        let first = run().expect_err("long vectors exist");
        let second = run().expect_err("long vectors exist");
        assert_eq!(first.runs, second.runs);
        assert_eq!(first.original, second.original);
        assert_eq!(first.shrunk, second.shrunk);
    }

    #[test]
    fn vector_length_scenario_shrinks_to_five_zeros() {
        let outcome = property(|v: Vec<i32>| v.len() < 5).seed(6).run();
        let failure = outcome.expect_err("vectors of length >= 5 exist");
        let (shrunk,) = failure.shrunk.expect("shrunk recorded");
        assert_eq!(shrunk, vec![0, 0, 0, 0, 0]);
    }

    #[test]
    fn discarding_everything_exhausts() {
        let outcome = property(|_n: i32| -> bool {
            crate::prop_discard!();
        })
        .seed(7)
        .run();
        let failure = outcome.expect_err("all-discard must exhaust");
        assert!(matches!(
            failure.error,
            PropertyError::Exhausted { what: "discards", .. }
        ));
        assert!(failure.original.is_none());
    }

    #[test]
    fn success_signal_passes_an_iteration() {
        let outcome = property(|_n: i32| -> bool {
            crate::prop_success!();
        })
        .seed(8)
        .run();
        assert!(outcome.is_ok());
    }

    #[test]
    fn unexpected_panics_abort_without_shrinking() {
        let outcome = property(|n: i32| {
            if n >= 0 || n < 0 {
                panic!("database unavailable");
            }
            true
        })
        .seed(9)
        .run();
        let failure = outcome.expect_err("panic must fail the run");
        assert!(matches!(failure.error, PropertyError::Unexpected(_)));
        assert!(failure.original.is_none());
        assert!(failure.shrunk.is_none());
    }

    #[test]
    fn explicit_generators_bound_the_draws() {
        let outcome = property_with(|n: i32| (0..10).contains(&n), (in_range(0i32, 10),))
            .seed(10)
            .run();
        assert!(outcome.is_ok());
    }

    #[test]
    fn example_invokes_once_with_given_arguments() {
        let evens = property(|n: i32| n % 2 == 0);
        assert!(evens.example((4,)));
        assert!(!evens.example((3,)));
    }

    #[test]
    fn tags_aggregate_into_the_context() {
        let outcome = property(|n: i32| {
            crate::prop_tag!("sign", if n < 0 { "negative" } else { "non-negative" });
            true
        })
        .seed(11)
        .run();
        let success = outcome.expect("tagging never fails");
        let context = success.context;
        let total = context.count("sign", "negative") + context.count("sign", "non-negative");
        assert_eq!(total, 100);
    }

    #[test]
    fn assertion_failures_carry_their_location() {
        let outcome = property(|n: u32| {
            crate::prop_assert!(n < 1000, "value too large: {}", n);
            true
        })
        .seed(12)
        .run();
        let failure = outcome.expect_err("large values exist");
        match failure.error {
            PropertyError::AssertFailed { message, .. } => {
                assert!(message.starts_with("value too large"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // the shrunk witness is the smallest value the assertion rejects
        assert_eq!(failure.shrunk, Some((1000,)));
    }

    #[test]
    fn check_reports_a_boolean() {
        assert!(property(|a: u8, b: u8| a.wrapping_add(b) == b.wrapping_add(a))
            .seed(13)
            .check());
        assert!(!property(|_n: i32| false).seed(14).check());
    }
}
