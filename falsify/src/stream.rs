//! Persistent lazy sequence used to hold shrink candidates.

use std::cell::RefCell;
use std::rc::Rc;

/// A persistent, possibly infinite, lazily evaluated single-linked sequence.
///
/// Cloning is O(1) and shares structure. Tail thunks are memoized, so
/// repeated traversal observes the same logical stream. The structure is
/// single-threaded-lazy: concurrent consumers must serialize externally.
pub struct Stream<T> {
    node: Option<Rc<Node<T>>>,
}

struct Node<T> {
    head: T,
    tail: Thunk<T>,
}

struct Thunk<T> {
    state: RefCell<ThunkState<T>>,
}

enum ThunkState<T> {
    Pending(Rc<dyn Fn() -> Stream<T>>),
    Forced(Stream<T>),
}

impl<T> Thunk<T> {
    fn new(producer: Rc<dyn Fn() -> Stream<T>>) -> Self {
        Self {
            state: RefCell::new(ThunkState::Pending(producer)),
        }
    }

    fn force(&self) -> Stream<T> {
        let producer = match &*self.state.borrow() {
            ThunkState::Forced(stream) => return stream.clone(),
            ThunkState::Pending(producer) => producer.clone(),
        };
        let stream = producer();
        *self.state.borrow_mut() = ThunkState::Forced(stream.clone());
        stream
    }
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Stream {
            node: self.node.clone(),
        }
    }
}

impl<T: 'static> Stream<T> {
    pub fn empty() -> Self {
        Stream { node: None }
    }

    pub fn one(value: T) -> Self {
        Self::cons(value, Stream::empty)
    }

    pub fn cons<F>(head: T, tail: F) -> Self
    where
        F: Fn() -> Stream<T> + 'static,
    {
        Self::cons_rc(head, Rc::new(tail))
    }

    fn cons_rc(head: T, tail: Rc<dyn Fn() -> Stream<T>>) -> Self {
        Stream {
            node: Some(Rc::new(Node {
                head,
                tail: Thunk::new(tail),
            })),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.node.is_none()
    }

    /// First element. Calling this on an empty stream is a programming
    /// error.
    pub fn head(&self) -> &T {
        &self
            .node
            .as_ref()
            .expect("head called on an empty stream")
            .head
    }

    /// Everything after the first element. Forces (and memoizes) the tail
    /// thunk. Calling this on an empty stream is a programming error.
    pub fn tail(&self) -> Stream<T> {
        self.node
            .as_ref()
            .expect("tail called on an empty stream")
            .tail
            .force()
    }
}

impl<T: Clone + 'static> Stream<T> {
    /// Single-shot iterator over the elements.
    pub fn iter(&self) -> StreamIter<T> {
        StreamIter {
            current: self.clone(),
        }
    }

    /// Build a (fully materialized) stream from a vector.
    pub fn from_vec(values: Vec<T>) -> Stream<T> {
        Self::from_vec_at(Rc::new(values), 0)
    }

    fn from_vec_at(values: Rc<Vec<T>>, index: usize) -> Stream<T> {
        if index >= values.len() {
            return Stream::empty();
        }
        let head = values[index].clone();
        Stream::cons(head, move || {
            Self::from_vec_at(values.clone(), index + 1)
        })
    }

    /// Elements of `self`, then the elements of `other()`; the thunk runs
    /// only once `self` is exhausted.
    pub fn concat<F>(&self, other: F) -> Stream<T>
    where
        F: Fn() -> Stream<T> + 'static,
    {
        self.concat_rc(Rc::new(other))
    }

    pub(crate) fn concat_rc(&self, other: Rc<dyn Fn() -> Stream<T>>) -> Stream<T> {
        match &self.node {
            None => other(),
            Some(node) => {
                let head = node.head.clone();
                let source = self.clone();
                Stream::cons(head, move || source.tail().concat_rc(other.clone()))
            }
        }
    }

    /// Lazy element-wise transformation; O(1) per element.
    pub fn map<U, F>(&self, transform: F) -> Stream<U>
    where
        U: 'static,
        F: Fn(&T) -> U + 'static,
    {
        self.map_rc(Rc::new(transform))
    }

    pub(crate) fn map_rc<U: 'static>(&self, transform: Rc<dyn Fn(&T) -> U>) -> Stream<U> {
        match &self.node {
            None => Stream::empty(),
            Some(node) => {
                let head = transform(&node.head);
                let source = self.clone();
                Stream::cons(head, move || source.tail().map_rc(transform.clone()))
            }
        }
    }

    /// Keep elements satisfying the predicate, advancing the source as far
    /// as needed to find the next match.
    pub fn filter<F>(&self, predicate: F) -> Stream<T>
    where
        F: Fn(&T) -> bool + 'static,
    {
        self.filter_rc(Rc::new(predicate))
    }

    pub(crate) fn filter_rc(&self, predicate: Rc<dyn Fn(&T) -> bool>) -> Stream<T> {
        let mut current = self.clone();
        while let Some(node) = current.node.clone() {
            if predicate(&node.head) {
                let head = node.head.clone();
                let rest = current.clone();
                return Stream::cons(head, move || rest.tail().filter_rc(predicate.clone()));
            }
            current = node.tail.force();
        }
        Stream::empty()
    }

    /// At most the first `n` elements.
    pub fn take(&self, n: usize) -> Stream<T> {
        if n == 0 {
            return Stream::empty();
        }
        match &self.node {
            None => Stream::empty(),
            Some(node) => {
                let head = node.head.clone();
                let source = self.clone();
                Stream::cons(head, move || source.tail().take(n - 1))
            }
        }
    }
}

pub struct StreamIter<T> {
    current: Stream<T>,
}

impl<T: Clone + 'static> Iterator for StreamIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.current.is_empty() {
            return None;
        }
        let value = self.current.head().clone();
        self.current = self.current.tail();
        Some(value)
    }
}
