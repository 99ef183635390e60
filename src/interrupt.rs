//! Interrupt masking around the bus handshake.

/// Runs a closure with interrupts masked.
///
/// Implementations must unmask again on every exit path of `with`, and
/// restore the previous mask state rather than blindly enabling.
pub trait CriticalSection {
    fn with<R>(&mut self, f: impl FnOnce() -> R) -> R;
}

/// Global interrupt mask of a Cortex-M core (`PRIMASK`).
#[derive(Debug, Default, Clone, Copy)]
pub struct CortexM;

impl CriticalSection for CortexM {
    fn with<R>(&mut self, f: impl FnOnce() -> R) -> R {
        cortex_m::interrupt::free(|_| f())
    }
}

impl<C: CriticalSection> CriticalSection for &mut C {
    fn with<R>(&mut self, f: impl FnOnce() -> R) -> R {
        C::with(self, f)
    }
}
