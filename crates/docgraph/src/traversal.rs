//! Sequential traversal over an ordered sequence.
//!
//! A [`Traversal`] hands out one item at a time. The consumer finishes its
//! (possibly asynchronous) work on the item and then asks for the next one,
//! so at most one item is ever in flight. Failures reported with
//! [`Traversal::fail`] come back as [`Signal::Error`] before the next item;
//! they never stop the traversal. Once the sequence is exhausted a single
//! [`Signal::End`] is emitted and [`Traversal::advance`] returns `None`
//! afterwards.

use std::collections::VecDeque;
use std::future::Future;
use std::iter::Enumerate;

use tracing::trace;

/// One step of a traversal.
#[derive(Debug)]
pub enum Signal<T, E> {
    /// The next item, with its position in the sequence.
    Item {
        /// Position in the sequence.
        index: usize,
        /// The item.
        item: T,
    },
    /// A failure reported for an earlier item.
    Error {
        /// Position of the failed item.
        index: usize,
        /// The failure.
        error: E,
    },
    /// Terminal signal; emitted exactly once.
    End(Completion),
}

/// Summary emitted with [`Signal::End`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Completion {
    /// Items handed out.
    pub visited: usize,
    /// Failures reported.
    pub failed: usize,
}

impl Completion {
    /// True when no failure was reported.
    pub fn is_clean(&self) -> bool {
        self.failed == 0
    }
}

/// A sequential traversal over an iterator.
pub struct Traversal<I: Iterator, E> {
    items: Enumerate<I>,
    pending: VecDeque<(usize, E)>,
    completion: Completion,
    finished: bool,
}

impl<I: Iterator, E> Traversal<I, E> {
    /// Start a traversal.
    pub fn new(items: impl IntoIterator<IntoIter = I>) -> Self {
        Self {
            items: items.into_iter().enumerate(),
            pending: VecDeque::new(),
            completion: Completion::default(),
            finished: false,
        }
    }

    /// Produce the next signal, or `None` once [`Signal::End`] has been emitted.
    pub fn advance(&mut self) -> Option<Signal<I::Item, E>> {
        if self.finished {
            return None;
        }
        if let Some((index, error)) = self.pending.pop_front() {
            return Some(Signal::Error { index, error });
        }
        match self.items.next() {
            Some((index, item)) => {
                self.completion.visited += 1;
                Some(Signal::Item { index, item })
            }
            None => {
                self.finished = true;
                Some(Signal::End(self.completion))
            }
        }
    }

    /// Report a failure for the item at `index`.
    ///
    /// Failures reported after [`Signal::End`] are dropped.
    pub fn fail(&mut self, index: usize, error: E) {
        if self.finished {
            return;
        }
        self.completion.failed += 1;
        self.pending.push_back((index, error));
    }

    /// Whether the terminal signal has been emitted.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl<I: Iterator, E> Traversal<I, E> {
    /// Drive the traversal to completion with an async step function.
    ///
    /// Each step is awaited before the next item is requested. A failed step
    /// is handed to `on_error` before the next item is produced.
    pub async fn run<F, Fut, R>(mut self, mut step: F, mut on_error: R) -> Completion
    where
        F: FnMut(usize, I::Item) -> Fut,
        Fut: Future<Output = Result<(), E>>,
        R: FnMut(usize, E),
    {
        while let Some(signal) = self.advance() {
            match signal {
                Signal::Item { index, item } => {
                    if let Err(error) = step(index, item).await {
                        self.fail(index, error);
                    }
                }
                Signal::Error { index, error } => on_error(index, error),
                Signal::End(completion) => {
                    trace!(
                        visited = completion.visited,
                        failed = completion.failed,
                        "Traversal completed"
                    );
                    return completion;
                }
            }
        }
        self.completion
    }
}
