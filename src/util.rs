use std::mem::ManuallyDrop;

/// Runs a closure when dropped, unless [defused](ScopeGuard::defuse) first.
pub struct ScopeGuard<F: FnOnce()> {
    dropfn: ManuallyDrop<F>,
}

impl<F: FnOnce()> ScopeGuard<F> {
    /// Drops the closure without running it.
    pub fn defuse(mut self) {
        // SAFETY: `dropfn` is dropped exactly once here, and `forget` keeps `Drop::drop` from touching it again.
        unsafe { ManuallyDrop::drop(&mut self.dropfn) }
        std::mem::forget(self)
    }
}

impl<F: FnOnce()> Drop for ScopeGuard<F> {
    fn drop(&mut self) {
        // SAFETY: This is OK because `dropfn` is `ManuallyDrop` which will not be dropped by the compiler.
        let dropfn = unsafe { ManuallyDrop::take(&mut self.dropfn) };
        dropfn();
    }
}

/// Undoes a partially completed operation if the enclosing scope is left early, by `?` or by a future being
/// dropped mid-await.
pub fn defer<F: FnOnce()>(dropfn: F) -> ScopeGuard<F> {
    ScopeGuard {
        dropfn: ManuallyDrop::new(dropfn),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[test]
    fn runs_on_drop_unless_defused() {
        let ran = Cell::new(0);
        {
            let _guard = defer(|| ran.set(ran.get() + 1));
        }
        assert_eq!(ran.get(), 1);

        defer(|| ran.set(ran.get() + 1)).defuse();
        assert_eq!(ran.get(), 1);
    }
}
