//! # Falsify - Property-Based Testing with Lazy Shrink Trees
//!
//! Falsify searches for counterexamples: a *property* is a predicate over
//! typed inputs, inputs are drawn from composable *generators*, and a
//! failing input is *shrunk* toward a minimal one before it is reported.
//!
//! ## Quick Start
//!
//! ```rust
//! use falsify::property;
//!
//! let ok = property(|a: i32, b: i32| a.wrapping_add(b) == b.wrapping_add(a))
//!     .seed(1)
//!     .check();
//! assert!(ok);
//! ```
//!
//! Generators compose through `map`, `filter`, `flat_map`, `one_of`, tuples
//! and containers; every generator yields a [`Shrinkable`], a value paired
//! with a lazy tree of smaller candidates that the runner walks coordinate
//! by coordinate once a counterexample is found.

// Public modules
pub mod arbitrary;
pub mod collections;
pub mod combinator;
pub mod config;
pub mod error;
pub mod generator;
pub mod macros;
pub mod primitives;
pub mod property;
pub mod rng;
pub mod shrink;
pub mod statistics;
pub mod stream;
pub mod tuple;

// Re-export the main public API
pub use arbitrary::{Arbitrary, arbitrary};
pub use collections::{SetGenerator, StringGenerator, VecGenerator, utf8_string};
pub use combinator::{
    Filter, FlatMap, LazyGen, Map, OneOf, construct1, construct2, construct3, construct4,
    construct5, construct6, derive, element_of, filter, just, lazy_gen, one_of, optional,
    optional_with, such_that, weighted,
};
pub use config::{
    Config, ConfigError, DEFAULT_DISCARD_RATIO, DEFAULT_FILTER_RETRIES, DEFAULT_FILTER_TOLERANCE,
    DEFAULT_MAX_SIZE, DEFAULT_MIN_SIZE, DEFAULT_NUM_RUNS, DEFAULT_SOME_PROBABILITY,
};
pub use error::{PropertyError, classify_panic};
pub use generator::{GenBoxed, GenFn, Generator, gen_fn};
pub use primitives::{
    BoolGenerator, FloatGenerator, IntegralGenerator, ascii_char, in_range, interval, unicode_char,
};
pub use property::{
    Arguments, ArbitraryArguments, IntoGenerators, Property, PropertyFn, PropertyResult,
    TestFailure, TestSuccess, Verdict, check, check_with, property, property_with,
};
pub use rng::{Random, seed_from_clock};
pub use shrink::{Shrinkable, binary_search_shrinkable, binary_search_shrinkable_u};
pub use statistics::PropertyContext;
pub use stream::Stream;
pub use tuple::{
    Tuple2, Tuple3, Tuple4, Tuple5, Tuple6, tuple2, tuple3, tuple4, tuple5, tuple6,
};
