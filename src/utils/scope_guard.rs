/// Runs a closure when dropped, unless it already ran.
///
/// Holds room subscriptions and connection registrations open for exactly
/// as long as their owner lives, including on early return or task abort.
pub struct ScopeGuard<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> ScopeGuard<F> {
    pub fn new(f: F) -> Self {
        Self(Some(f))
    }
}

impl<F: FnOnce()> Drop for ScopeGuard<F> {
    fn drop(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

/// Type-erased guard, for storing in structs
pub type BoxedGuard = ScopeGuard<Box<dyn FnOnce() + Send>>;

pub fn boxed_guard(f: impl FnOnce() + Send + 'static) -> BoxedGuard {
    ScopeGuard::new(Box::new(f))
}
