//! Value generators for pattern-driven messengers.
//!
//! A [`Generator`] yields payloads one at a time until it runs out. The
//! combinators nest: a [`Repeat`] of a [`Chain`] of [`Sequence`]s is itself a
//! generator.

use crate::message::Payload;

pub trait Generator: Send {
    /// The next value, or `None` once exhausted.
    fn next_value(&mut self) -> Option<Payload>;

    /// Start over from the first value.
    fn reset(&mut self);
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    fn next_value(&mut self) -> Option<Payload> {
        (**self).next_value()
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Fixed list of values, optionally cycling forever.
#[derive(Clone, Debug)]
pub struct Sequence {
    values: Vec<Payload>,
    index: usize,
    looping: bool,
}

impl Sequence {
    pub fn new(values: impl IntoIterator<Item = Payload>) -> Self {
        Self {
            values: values.into_iter().collect(),
            index: 0,
            looping: false,
        }
    }

    /// Sequence of floats.
    pub fn floats(values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(values.into_iter().map(Payload::Float))
    }

    pub fn looping(mut self) -> Self {
        self.looping = true;
        self
    }
}

impl Generator for Sequence {
    fn next_value(&mut self) -> Option<Payload> {
        if self.values.is_empty() {
            return None;
        }
        if self.index >= self.values.len() {
            if !self.looping {
                return None;
            }
            self.index = 0;
        }
        let value = self.values[self.index].clone();
        self.index += 1;
        Some(value)
    }

    fn reset(&mut self) {
        self.index = 0;
    }
}

/// Plays `inner` through `times` times.
pub struct Repeat<G> {
    inner: G,
    times: usize,
    pass: usize,
    /// Whether the current pass produced anything
    yielded: bool,
}

impl<G: Generator> Repeat<G> {
    pub fn new(inner: G, times: usize) -> Self {
        Self {
            inner,
            times,
            pass: 0,
            yielded: false,
        }
    }
}

impl<G: Generator> Generator for Repeat<G> {
    fn next_value(&mut self) -> Option<Payload> {
        while self.pass < self.times {
            if let Some(value) = self.inner.next_value() {
                self.yielded = true;
                return Some(value);
            }
            if !self.yielded {
                // empty inner generator
                self.pass = self.times;
                break;
            }
            self.pass += 1;
            self.yielded = false;
            self.inner.reset();
        }
        None
    }

    fn reset(&mut self) {
        self.pass = 0;
        self.yielded = false;
        self.inner.reset();
    }
}

/// Each generator in turn until the last one is exhausted.
#[derive(Default)]
pub struct Chain {
    generators: Vec<Box<dyn Generator>>,
    current: usize,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(mut self, generator: impl Generator + 'static) -> Self {
        self.generators.push(Box::new(generator));
        self
    }
}

impl Generator for Chain {
    fn next_value(&mut self) -> Option<Payload> {
        while let Some(generator) = self.generators.get_mut(self.current) {
            if let Some(value) = generator.next_value() {
                return Some(value);
            }
            self.current += 1;
        }
        None
    }

    fn reset(&mut self) {
        self.current = 0;
        self.generators.iter_mut().for_each(|g| g.reset());
    }
}

/// Asks `primary` first and `fallback` only when `primary` has nothing.
pub struct Fallback<A, B> {
    primary: A,
    fallback: B,
}

impl<A: Generator, B: Generator> Fallback<A, B> {
    pub fn new(primary: A, fallback: B) -> Self {
        Self { primary, fallback }
    }
}

impl<A: Generator, B: Generator> Generator for Fallback<A, B> {
    fn next_value(&mut self) -> Option<Payload> {
        self.primary.next_value().or_else(|| self.fallback.next_value())
    }

    fn reset(&mut self) {
        self.primary.reset();
        self.fallback.reset();
    }
}
