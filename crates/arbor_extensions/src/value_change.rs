//! # Value Change Detection
//!
//! Polling observers. Each detector reads its value from a context `C`
//! (typically the `World`) on every [`ValueChangeManager::evaluate`] and
//! fires its callback on the first evaluation and whenever the value
//! differs from the previous one.

use std::fmt;

/// Something [`ValueChangeManager`] polls.
pub trait ValueChangeDetector<C: ?Sized>: Send {
    /// Reads the current value and fires the callback if it changed.
    ///
    /// # Returns
    ///
    /// `true` if the callback fired.
    fn evaluate(&mut self, cx: &C) -> bool;
}

/// Ordered collection of detectors evaluated together.
pub struct ValueChangeManager<C: ?Sized = ()> {
    detectors: Vec<Box<dyn ValueChangeDetector<C>>>,
}

impl<C: ?Sized + 'static> ValueChangeManager<C> {
    /// Creates an empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            detectors: Vec::new(),
        }
    }

    /// Observes the value returned by `getter`.
    pub fn add<T, G, F>(&mut self, getter: G, on_changed: F)
    where
        T: PartialEq + Send + 'static,
        G: FnMut(&C) -> T + Send + 'static,
        F: FnMut(&T) + Send + 'static,
    {
        self.add_detector(ValueObserver::<T, G, F>::new(getter, on_changed));
    }

    /// Observes two values; fires when either changes.
    pub fn add_multi2<T1, T2, G1, G2, F>(&mut self, g1: G1, g2: G2, on_changed: F)
    where
        T1: PartialEq + Send + 'static,
        T2: PartialEq + Send + 'static,
        G1: FnMut(&C) -> T1 + Send + 'static,
        G2: FnMut(&C) -> T2 + Send + 'static,
        F: FnMut(&T1, &T2) + Send + 'static,
    {
        self.add_detector(MultiObserver2::<T1, T2, G1, G2, F>::new(g1, g2, on_changed));
    }

    /// Observes three values; fires when any changes.
    pub fn add_multi3<T1, T2, T3, G1, G2, G3, F>(&mut self, g1: G1, g2: G2, g3: G3, on_changed: F)
    where
        T1: PartialEq + Send + 'static,
        T2: PartialEq + Send + 'static,
        T3: PartialEq + Send + 'static,
        G1: FnMut(&C) -> T1 + Send + 'static,
        G2: FnMut(&C) -> T2 + Send + 'static,
        G3: FnMut(&C) -> T3 + Send + 'static,
        F: FnMut(&T1, &T2, &T3) + Send + 'static,
    {
        self.add_detector(MultiObserver3::<T1, T2, T3, G1, G2, G3, F>::new(
            g1, g2, g3, on_changed,
        ));
    }

    /// Fires `on_changed` with the fresh value whenever `computed` changes.
    pub fn bind<T, G, F>(&mut self, computed: Computed<T, G>, on_changed: F)
    where
        T: PartialEq + Send + 'static,
        G: Fn(&C) -> T + Send + 'static,
        F: FnMut(T) + Send + 'static,
    {
        self.add_detector(ComputedObserver::new(computed, on_changed));
    }

    /// Adds a custom detector.
    pub fn add_detector(&mut self, detector: impl ValueChangeDetector<C> + 'static) {
        self.detectors.push(Box::new(detector));
    }

    /// Polls every detector in insertion order.
    ///
    /// # Returns
    ///
    /// The number of callbacks fired.
    pub fn evaluate(&mut self, cx: &C) -> usize {
        let fired: usize = self
            .detectors
            .iter_mut()
            .map(|detector| usize::from(detector.evaluate(cx)))
            .sum();
        tracing::trace!(fired, detectors = self.detectors.len(), "value change pass");
        fired
    }

    /// Number of detectors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.detectors.len()
    }

    /// Returns `true` if no detector is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.detectors.is_empty()
    }

    /// Removes every detector.
    pub fn clear(&mut self) {
        self.detectors.clear();
    }
}

impl<C: ?Sized + 'static> Default for ValueChangeManager<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ?Sized> fmt::Debug for ValueChangeManager<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueChangeManager")
            .field("detectors", &self.detectors.len())
            .finish()
    }
}

// ============================================================================
// OBSERVERS
// ============================================================================

/// Single-value observer.
pub struct ValueObserver<T, G, F> {
    getter: G,
    on_changed: F,
    last: Option<T>,
}

impl<T, G, F> ValueObserver<T, G, F> {
    /// Creates an observer that has not seen a value yet.
    pub const fn new(getter: G, on_changed: F) -> Self {
        Self {
            getter,
            on_changed,
            last: None,
        }
    }

    /// The last value seen, if evaluated at least once.
    pub const fn last(&self) -> Option<&T> {
        self.last.as_ref()
    }
}

impl<C, T, G, F> ValueChangeDetector<C> for ValueObserver<T, G, F>
where
    C: ?Sized,
    T: PartialEq + Send,
    G: FnMut(&C) -> T + Send,
    F: FnMut(&T) + Send,
{
    fn evaluate(&mut self, cx: &C) -> bool {
        let current = (self.getter)(cx);
        if self.last.as_ref() == Some(&current) {
            return false;
        }
        (self.on_changed)(&current);
        self.last = Some(current);
        true
    }
}

/// Two-value observer.
pub struct MultiObserver2<T1, T2, G1, G2, F> {
    getters: (G1, G2),
    on_changed: F,
    last: Option<(T1, T2)>,
}

impl<T1, T2, G1, G2, F> MultiObserver2<T1, T2, G1, G2, F> {
    /// Creates an observer that has not seen a value yet.
    pub const fn new(g1: G1, g2: G2, on_changed: F) -> Self {
        Self {
            getters: (g1, g2),
            on_changed,
            last: None,
        }
    }
}

impl<C, T1, T2, G1, G2, F> ValueChangeDetector<C> for MultiObserver2<T1, T2, G1, G2, F>
where
    C: ?Sized,
    T1: PartialEq + Send,
    T2: PartialEq + Send,
    G1: FnMut(&C) -> T1 + Send,
    G2: FnMut(&C) -> T2 + Send,
    F: FnMut(&T1, &T2) + Send,
{
    fn evaluate(&mut self, cx: &C) -> bool {
        let current = ((self.getters.0)(cx), (self.getters.1)(cx));
        if self.last.as_ref() == Some(&current) {
            return false;
        }
        (self.on_changed)(&current.0, &current.1);
        self.last = Some(current);
        true
    }
}

/// Three-value observer.
pub struct MultiObserver3<T1, T2, T3, G1, G2, G3, F> {
    getters: (G1, G2, G3),
    on_changed: F,
    last: Option<(T1, T2, T3)>,
}

impl<T1, T2, T3, G1, G2, G3, F> MultiObserver3<T1, T2, T3, G1, G2, G3, F> {
    /// Creates an observer that has not seen a value yet.
    pub const fn new(g1: G1, g2: G2, g3: G3, on_changed: F) -> Self {
        Self {
            getters: (g1, g2, g3),
            on_changed,
            last: None,
        }
    }
}

impl<C, T1, T2, T3, G1, G2, G3, F> ValueChangeDetector<C>
    for MultiObserver3<T1, T2, T3, G1, G2, G3, F>
where
    C: ?Sized,
    T1: PartialEq + Send,
    T2: PartialEq + Send,
    T3: PartialEq + Send,
    G1: FnMut(&C) -> T1 + Send,
    G2: FnMut(&C) -> T2 + Send,
    G3: FnMut(&C) -> T3 + Send,
    F: FnMut(&T1, &T2, &T3) + Send,
{
    fn evaluate(&mut self, cx: &C) -> bool {
        let current = (
            (self.getters.0)(cx),
            (self.getters.1)(cx),
            (self.getters.2)(cx),
        );
        if self.last.as_ref() == Some(&current) {
            return false;
        }
        (self.on_changed)(&current.0, &current.1, &current.2);
        self.last = Some(current);
        true
    }
}

// ============================================================================
// COMPUTED VALUES
// ============================================================================

/// A value derived from a context, recomputed on demand.
pub struct Computed<T, G> {
    compute: G,
    last: Option<T>,
}

impl<T: PartialEq, G> Computed<T, G> {
    /// Wraps `compute`.
    pub const fn when(compute: G) -> Self {
        Self {
            compute,
            last: None,
        }
    }

    /// Recomputes and remembers the value.
    ///
    /// # Returns
    ///
    /// `true` on the first call and whenever the value differs from the one
    /// remembered by the previous call.
    pub fn has_changed<C: ?Sized>(&mut self, cx: &C) -> bool
    where
        G: Fn(&C) -> T,
    {
        let current = (self.compute)(cx);
        if self.last.as_ref() == Some(&current) {
            return false;
        }
        self.last = Some(current);
        true
    }

    /// Computes the current value without touching the remembered one.
    pub fn value<C: ?Sized>(&self, cx: &C) -> T
    where
        G: Fn(&C) -> T,
    {
        (self.compute)(cx)
    }
}

/// Fires with the fresh value whenever a [`Computed`] changes.
pub struct ComputedObserver<T, G, F> {
    computed: Computed<T, G>,
    on_changed: F,
}

impl<T, G, F> ComputedObserver<T, G, F> {
    /// Pairs `computed` with its callback.
    pub const fn new(computed: Computed<T, G>, on_changed: F) -> Self {
        Self {
            computed,
            on_changed,
        }
    }
}

impl<C, T, G, F> ValueChangeDetector<C> for ComputedObserver<T, G, F>
where
    C: ?Sized,
    T: PartialEq + Send,
    G: Fn(&C) -> T + Send,
    F: FnMut(T) + Send,
{
    fn evaluate(&mut self, cx: &C) -> bool {
        if !self.computed.has_changed(cx) {
            return false;
        }
        (self.on_changed)(self.computed.value(cx));
        true
    }
}
