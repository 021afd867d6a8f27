//! Container generators: vectors, ordered sets, and strings.
//!
//! All containers shrink in two layers: the length first (a binary-search
//! tree over prefix lengths, so truncations are explored before any element
//! shrink), then elements in bulk — contiguous groups stepped down their
//! shrink streams simultaneously, coarse groups before fine ones. Bulk
//! candidates follow the truncation candidates at every node, so they are
//! reached once size shrinking has stabilized.

use std::collections::BTreeSet;
use std::panic::panic_any;
use std::rc::Rc;

use crate::arbitrary::Arbitrary;
use crate::config::{DEFAULT_MAX_SIZE, DEFAULT_MIN_SIZE};
use crate::error::PropertyError;
use crate::generator::{GenBoxed, Generator};
use crate::primitives::{ascii_char, unicode_char};
use crate::rng::Random;
use crate::shrink::{Shrinkable, binary_search_shrinkable_u};
use crate::stream::Stream;

type ElementVec<T> = Vec<Shrinkable<T>>;

/// Generator for `Vec<T>` with a configurable length range.
pub struct VecGenerator<T: 'static> {
    element: Rc<GenBoxed<T>>,
    min_size: usize,
    max_size: usize,
}

impl<T: 'static> VecGenerator<T> {
    pub fn new<G>(element: G) -> Self
    where
        G: Generator<Value = T> + 'static,
    {
        Self {
            element: Rc::new(element.boxed()),
            min_size: DEFAULT_MIN_SIZE,
            max_size: DEFAULT_MAX_SIZE,
        }
    }

    pub fn with_size_range(mut self, min_size: usize, max_size: usize) -> Self {
        assert!(min_size <= max_size, "invalid container size range");
        self.min_size = min_size;
        self.max_size = max_size;
        self
    }
}

impl<T: Clone + 'static> Generator for VecGenerator<T> {
    type Value = Vec<T>;

    fn generate(&self, rng: &mut Random) -> Shrinkable<Vec<T>> {
        let len = rng.size_in(self.min_size, self.max_size + 1);
        let elements: ElementVec<T> = (0..len).map(|_| self.element.generate(rng)).collect();
        vec_shrinkable(Rc::new(elements), self.min_size)
    }
}

/// Assemble the two-layer shrink tree over a drawn element list.
///
/// Bulk element candidates are appended after every node's truncation
/// candidates, so the driver reaches them exactly when the size scan has
/// stabilized on a length whose remaining truncations all pass.
pub(crate) fn vec_shrinkable<T: Clone + 'static>(
    elements: Rc<ElementVec<T>>,
    min_size: usize,
) -> Shrinkable<Vec<T>> {
    let len = elements.len();
    let sized = binary_search_shrinkable_u((len - min_size) as u64).map(move |kept| {
        let keep = *kept as usize + min_size;
        elements[..keep].to_vec()
    });
    let layered = sized.concat(|node| shrink_bulk_recursive(node, 0, 0));
    layered.map(|nodes: &ElementVec<T>| nodes.iter().map(|s| s.get()).collect())
}

// Bulk shrinking over the group [from, to): step every element with a
// non-empty stream one candidate forward, substitute into the sequence, and
// keep going until no grouped element can move.
fn shrink_bulk<T: Clone + 'static>(
    ancestor: &Shrinkable<ElementVec<T>>,
    power: u32,
    offset: usize,
) -> Stream<Shrinkable<ElementVec<T>>> {
    let parent_size = ancestor.value().len();
    let groups = 1usize << power;
    if parent_size / groups < 1 || offset >= groups {
        return Stream::empty();
    }
    let from = parent_size * offset / groups;
    let to = parent_size * (offset + 1) / groups;
    let streams: Vec<Stream<Shrinkable<T>>> = ancestor.value()[from..to]
        .iter()
        .map(|element| element.shrinks())
        .collect();
    if streams.iter().all(|stream| stream.is_empty()) {
        return Stream::empty();
    }
    bulk_steps(
        ancestor.clone(),
        power,
        offset,
        ancestor.clone(),
        from,
        to,
        Rc::new(streams),
    )
}

fn bulk_steps<T: Clone + 'static>(
    ancestor: Shrinkable<ElementVec<T>>,
    power: u32,
    offset: usize,
    parent: Shrinkable<ElementVec<T>>,
    from: usize,
    to: usize,
    streams: Rc<Vec<Stream<Shrinkable<T>>>>,
) -> Stream<Shrinkable<ElementVec<T>>> {
    if to == from {
        return Stream::empty();
    }
    let ancestor_elements = ancestor.value();
    let mut next_elements: ElementVec<T> = parent.value().clone();
    let mut next_streams = Vec::with_capacity(to - from);
    let mut stepped = false;
    for (index, stream) in streams.iter().enumerate() {
        if stream.is_empty() {
            // spent: pin this slot to its ancestor value with no further
            // shrinks
            next_elements[from + index] = Shrinkable::of(ancestor_elements[from + index].get());
            next_streams.push(Stream::empty());
        } else {
            next_elements[from + index] = stream.head().clone();
            next_streams.push(stream.tail());
            stepped = true;
        }
    }
    if !stepped {
        return Stream::empty();
    }
    let plain = Shrinkable::of(next_elements);
    let continued = plain.clone();
    let candidate = plain.with_shrinks(move || shrink_bulk(&continued, power, offset));
    let head = candidate.clone();
    let next_streams = Rc::new(next_streams);
    Stream::cons(head, move || {
        bulk_steps(
            ancestor.clone(),
            power,
            offset,
            candidate.clone(),
            from,
            to,
            next_streams.clone(),
        )
    })
}

// Whole-group bulk shrinks at this granularity, then the front and rear
// halves at the next one.
fn shrink_bulk_recursive<T: Clone + 'static>(
    node: &Shrinkable<ElementVec<T>>,
    power: u32,
    offset: usize,
) -> Stream<Shrinkable<ElementVec<T>>> {
    if node.value().is_empty() {
        return Stream::empty();
    }
    let size = node.value().len();
    let groups = 1usize << power;
    if size / groups < 1 || offset >= groups {
        return Stream::empty();
    }
    let whole = node.concat(move |current| {
        let size = current.value().len();
        let groups = 1usize << power;
        if size / groups < 1 || offset >= groups {
            return Stream::empty();
        }
        shrink_bulk(current, power, offset)
    });
    let front = whole.concat(move |current| {
        let size = current.value().len();
        let groups = 1usize << (power + 1);
        if size / groups < 1 || offset * 2 >= groups {
            return Stream::empty();
        }
        shrink_bulk_recursive(current, power + 1, offset * 2)
    });
    let split = front.concat(move |current| {
        let size = current.value().len();
        let groups = 1usize << (power + 1);
        if size / groups < 1 || offset * 2 + 1 >= groups {
            return Stream::empty();
        }
        shrink_bulk_recursive(current, power + 1, offset * 2 + 1)
    });
    split.shrinks()
}

impl<T: Arbitrary + Clone> Arbitrary for Vec<T> {
    type Generator = VecGenerator<T>;

    fn arbitrary() -> Self::Generator {
        VecGenerator::new(T::arbitrary())
    }
}

/// Generator for `BTreeSet<T>`.
///
/// Draws reject duplicates until the target size is met; size shrinking
/// keeps a prefix of the elements in insertion order.
pub struct SetGenerator<T: 'static> {
    element: Rc<GenBoxed<T>>,
    min_size: usize,
    max_size: usize,
}

impl<T: 'static> SetGenerator<T> {
    pub fn new<G>(element: G) -> Self
    where
        G: Generator<Value = T> + 'static,
    {
        Self {
            element: Rc::new(element.boxed()),
            min_size: DEFAULT_MIN_SIZE,
            max_size: DEFAULT_MAX_SIZE,
        }
    }

    pub fn with_size_range(mut self, min_size: usize, max_size: usize) -> Self {
        assert!(min_size <= max_size, "invalid container size range");
        self.min_size = min_size;
        self.max_size = max_size;
        self
    }
}

impl<T: Clone + Ord + 'static> Generator for SetGenerator<T> {
    type Value = BTreeSet<T>;

    fn generate(&self, rng: &mut Random) -> Shrinkable<BTreeSet<T>> {
        let target = rng.size_in(self.min_size, self.max_size + 1);
        let mut drawn: ElementVec<T> = Vec::with_capacity(target);
        let mut seen: BTreeSet<T> = BTreeSet::new();
        let limit = (64 * target + 64) as u32;
        let mut attempts = 0u32;
        while drawn.len() < target {
            attempts += 1;
            if attempts > limit {
                // element domain too small to fill the set
                panic_any(PropertyError::exhausted("set element draws", attempts, limit));
            }
            let element = self.element.generate(rng);
            if seen.insert(element.get()) {
                drawn.push(element);
            }
        }
        let drawn = Rc::new(drawn);
        let min_size = self.min_size;
        binary_search_shrinkable_u((target - min_size) as u64).map(move |kept| {
            let keep = *kept as usize + min_size;
            drawn[..keep].iter().map(|element| element.get()).collect()
        })
    }
}

impl<T: Arbitrary + Clone + Ord> Arbitrary for BTreeSet<T> {
    type Generator = SetGenerator<T>;

    fn arbitrary() -> Self::Generator {
        SetGenerator::new(T::arbitrary())
    }
}

/// Generator for `String` with a configurable codepoint generator
/// (ASCII `[0x01, 0x7F]` by default).
pub struct StringGenerator {
    element: Rc<GenBoxed<char>>,
    min_size: usize,
    max_size: usize,
}

impl StringGenerator {
    pub fn new() -> Self {
        Self::with_elements(ascii_char())
    }

    pub fn with_elements<G>(element: G) -> Self
    where
        G: Generator<Value = char> + 'static,
    {
        Self {
            element: Rc::new(element.boxed()),
            min_size: DEFAULT_MIN_SIZE,
            max_size: DEFAULT_MAX_SIZE,
        }
    }

    pub fn with_size_range(mut self, min_size: usize, max_size: usize) -> Self {
        assert!(min_size <= max_size, "invalid string size range");
        self.min_size = min_size;
        self.max_size = max_size;
        self
    }
}

impl Default for StringGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for StringGenerator {
    type Value = String;

    fn generate(&self, rng: &mut Random) -> Shrinkable<String> {
        let len = rng.size_in(self.min_size, self.max_size + 1);
        let chars: Vec<char> = (0..len).map(|_| self.element.generate(rng).get()).collect();
        string_shrinkable(Rc::new(chars), self.min_size)
    }
}

// Strings truncate from the tail first; each node then carries a second
// pass of head truncations after its tail candidates.
fn string_shrinkable(chars: Rc<Vec<char>>, min_size: usize) -> Shrinkable<String> {
    let len = chars.len();
    let rear = binary_search_shrinkable_u((len - min_size) as u64).map(move |kept| {
        let keep = *kept as usize + min_size;
        chars[..keep].iter().collect::<String>()
    });
    rear.concat(move |node| {
        let current: Vec<char> = node.value().chars().collect();
        let len = current.len();
        if len == min_size {
            return Stream::empty();
        }
        let current = Rc::new(current);
        binary_search_shrinkable_u((len - min_size) as u64)
            .map(move |kept| {
                let keep = *kept as usize + min_size;
                current[len - keep..].iter().collect::<String>()
            })
            .shrinks()
    })
}

/// A string over the full Unicode scalar range; `char` does the encoding.
pub fn utf8_string() -> StringGenerator {
    StringGenerator::with_elements(unicode_char())
}

impl Arbitrary for String {
    type Generator = StringGenerator;

    fn arbitrary() -> Self::Generator {
        StringGenerator::new()
    }
}
