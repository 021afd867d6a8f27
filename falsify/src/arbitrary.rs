//! Type-indexed default generators.

use crate::generator::Generator;

/// Types with a canonical default generator.
///
/// This is the type index the property runner consults when no explicit
/// generator is supplied for an argument.
pub trait Arbitrary: Sized + 'static {
    /// The generator type used for default generation.
    type Generator: Generator<Value = Self> + 'static;

    /// The default generator for this type.
    fn arbitrary() -> Self::Generator;
}

/// Free-function form of [`Arbitrary::arbitrary`], convenient at call sites
/// that would otherwise need a fully qualified path.
pub fn arbitrary<T: Arbitrary>() -> T::Generator {
    T::arbitrary()
}
