//! Assertion, discard, and classification macros for property bodies.
//!
//! These raise [`PropertyError`](crate::PropertyError) signals as panic
//! payloads; the runner recovers them at its boundary.

/// Assert a condition inside a property; on failure the runner records the
/// location and message and starts shrinking.
#[macro_export]
macro_rules! prop_assert {
    ($cond:expr) => {
        if !$cond {
            ::std::panic::panic_any($crate::PropertyError::assert_failed(
                file!(),
                line!(),
                stringify!($cond),
            ));
        }
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            ::std::panic::panic_any($crate::PropertyError::assert_failed(
                file!(),
                line!(),
                format!($($arg)+),
            ));
        }
    };
}

#[macro_export]
macro_rules! prop_assert_eq {
    ($left:expr, $right:expr) => {
        $crate::prop_assert!($left == $right)
    };
}

#[macro_export]
macro_rules! prop_assert_ne {
    ($left:expr, $right:expr) => {
        $crate::prop_assert!($left != $right)
    };
}

#[macro_export]
macro_rules! prop_assert_lt {
    ($left:expr, $right:expr) => {
        $crate::prop_assert!($left < $right)
    };
}

#[macro_export]
macro_rules! prop_assert_le {
    ($left:expr, $right:expr) => {
        $crate::prop_assert!($left <= $right)
    };
}

#[macro_export]
macro_rules! prop_assert_gt {
    ($left:expr, $right:expr) => {
        $crate::prop_assert!($left > $right)
    };
}

#[macro_export]
macro_rules! prop_assert_ge {
    ($left:expr, $right:expr) => {
        $crate::prop_assert!($left >= $right)
    };
}

/// Skip the current iteration without counting it against the run.
#[macro_export]
macro_rules! prop_discard {
    () => {
        ::std::panic::panic_any($crate::PropertyError::Discard)
    };
}

/// Pass the current iteration unconditionally.
#[macro_export]
macro_rules! prop_success {
    () => {
        ::std::panic::panic_any($crate::PropertyError::Success)
    };
}

/// Record a key/value pair under the run's classification context.
#[macro_export]
macro_rules! prop_tag {
    ($key:expr, $value:expr) => {
        $crate::statistics::tag(
            file!(),
            line!(),
            &format!("{}", $key),
            &format!("{}", $value),
        )
    };
}

/// Record a key/value pair when the condition holds.
#[macro_export]
macro_rules! prop_classify {
    ($cond:expr, $key:expr, $value:expr) => {
        if $cond {
            $crate::prop_tag!($key, $value);
        }
    };
}

/// Tag the stringified expression with its (debug-formatted) value.
#[macro_export]
macro_rules! prop_stat {
    ($value:expr) => {{
        let value = $value;
        $crate::statistics::tag(
            file!(),
            line!(),
            stringify!($value),
            &format!("{:?}", value),
        )
    }};
}
