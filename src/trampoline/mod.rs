//! Closure-to-function-pointer trampolines.
//!
//! A plain function pointer cannot carry captured state, so the closure is
//! parked in a process-wide slot and a generated dispatcher forwards every
//! call to whatever closure currently occupies that slot.
//!
//! # Slot aliasing
//!
//! The slot is chosen by type, not by instance: the key is the tuple
//! (tag, closure type, signature, convention). Binding a second closure with
//! the same key replaces the first one, and every pointer handed out for the
//! first closure now runs the second. Closures returned from the same
//! function, or created in a loop, share a type and therefore a slot.
//! Use [`Trampolines::fn_ptr_tagged`] with distinct tag types to keep
//! several trampolines of identical shape alive at once.
//!
//! The slot must be bound before the pointer is first called (for instance,
//! write the patch that calls it only after binding). Concurrent rebinding
//! gives no guarantee about which closure an in-flight call observes.
//!
//! A closure that panics while called through its pointer aborts the
//! process: the dispatcher is an `extern` function and unwinding cannot
//! cross it.
//!
//! ```
//! use asmpatch::trampoline;
//!
//! let offset = 10;
//! let ptr = trampoline::create_fn_ptr(move |a: i32, b: i32| a + b + offset).unwrap();
//! assert_eq!(ptr(2, 3), 15);
//! ```

mod convention;
mod dispatch;
pub(crate) mod registry;

pub use convention::{CallingConvention, CdeclCall, Convention, FastCall, StdCall, ThisCall};
pub use dispatch::IntoFnPtr;
use dispatch::{Bind, Bound};

use crate::config::TrampolineConfig;
use crate::error::{Error, Result};

/// Bytes the inline callable container spends on dispatch bookkeeping.
pub const DISPATCH_OVERHEAD: usize = 3 * std::mem::size_of::<usize>();

/// Inline storage a closure of type `F` needs.
pub fn inline_footprint<F>() -> usize {
    std::mem::size_of::<F>() + DISPATCH_OVERHEAD
}

/// Creates dispatcher pointers under a given inline-storage budget.
#[derive(Debug, Clone, Default)]
pub struct Trampolines {
    config: TrampolineConfig,
}

impl Trampolines {
    pub fn new(config: TrampolineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrampolineConfig {
        &self.config
    }

    /// Bind `f` to its default slot and return a dispatcher with convention `C`.
    pub fn fn_ptr<C, Args, F>(&self, f: F) -> Result<F::Ptr>
    where
        C: Convention,
        F: IntoFnPtr<C, Args>,
    {
        self.fn_ptr_tagged::<(), C, Args, F>(f)
    }

    /// Like [`fn_ptr`](Self::fn_ptr), but in the slot selected by tag type `D`.
    ///
    /// Closures of the same type bound under different tags do not alias.
    pub fn fn_ptr_tagged<D, C, Args, F>(&self, f: F) -> Result<F::Ptr>
    where
        D: 'static,
        C: Convention,
        F: IntoFnPtr<C, Args>,
    {
        let required = inline_footprint::<F>();
        if required > self.config.inline_capacity {
            return Err(Error::CapacityExceeded {
                required,
                capacity: self.config.inline_capacity,
            });
        }

        let key = <F as Bind<C, Args>>::slot_key::<D>();
        let replaced = registry::store(key, f);
        let ptr = <F as Bind<C, Args>>::dispatcher::<D>(Bound(()));
        tracing::debug!(
            convention = %C::KIND,
            closure = std::any::type_name::<F>(),
            footprint = required,
            dispatcher = format_args!("{:#x}", <F as IntoFnPtr<C, Args>>::addr(ptr)),
            replaced,
            "trampoline bound"
        );
        Ok(ptr)
    }

    /// Check whether the default slot for closures of `f`'s type is bound.
    pub fn is_bound<C, Args, F>(&self, f: &F) -> bool
    where
        C: Convention,
        F: IntoFnPtr<C, Args>,
    {
        is_bound_tagged::<(), C, Args, F>(f)
    }
}

/// Check whether the slot for closures of `f`'s type under tag `D` is bound.
pub fn is_bound_tagged<D, C, Args, F>(_f: &F) -> bool
where
    D: 'static,
    C: Convention,
    F: IntoFnPtr<C, Args>,
{
    registry::is_occupied(<F as Bind<C, Args>>::slot_key::<D>())
}

/// Convert `f` into a stdcall function pointer using the default budget.
pub fn create_fn_ptr<Args, F>(f: F) -> Result<F::Ptr>
where
    F: IntoFnPtr<StdCall, Args>,
{
    create_fn_ptr_by::<StdCall, Args, F>(f)
}

/// Convert `f` into a cdecl function pointer using the default budget.
pub fn create_fn_ptr_cdecl<Args, F>(f: F) -> Result<F::Ptr>
where
    F: IntoFnPtr<CdeclCall, Args>,
{
    create_fn_ptr_by::<CdeclCall, Args, F>(f)
}

/// Convert `f` into a thiscall function pointer using the default budget.
pub fn create_fn_ptr_thiscall<Args, F>(f: F) -> Result<F::Ptr>
where
    F: IntoFnPtr<ThisCall, Args>,
{
    create_fn_ptr_by::<ThisCall, Args, F>(f)
}

/// Convert `f` into a fastcall function pointer using the default budget.
pub fn create_fn_ptr_fastcall<Args, F>(f: F) -> Result<F::Ptr>
where
    F: IntoFnPtr<FastCall, Args>,
{
    create_fn_ptr_by::<FastCall, Args, F>(f)
}

/// Convert `f` into a function pointer with convention `C`.
pub fn create_fn_ptr_by<C, Args, F>(f: F) -> Result<F::Ptr>
where
    C: Convention,
    F: IntoFnPtr<C, Args>,
{
    Trampolines::default().fn_ptr::<C, Args, F>(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_round_trip_stdcall() {
        let ptr = create_fn_ptr(|a: i32, b: i32| a + b).unwrap();
        assert_eq!(ptr(2, 3), 5);
    }

    #[test]
    fn test_each_convention_dispatches() {
        let cdecl = create_fn_ptr_cdecl(|a: u32| a * 2).unwrap();
        let this = create_fn_ptr_thiscall(|a: u32, b: u32| a - b).unwrap();
        let fast = create_fn_ptr_fastcall(|a: u8, b: u8, c: u8| a as u32 + b as u32 + c as u32)
            .unwrap();
        let generic = create_fn_ptr_by::<CdeclCall, _, _>(|| 42u64).unwrap();

        assert_eq!(cdecl(21), 42);
        assert_eq!(this(10, 4), 6);
        assert_eq!(fast(1, 2, 3), 6);
        assert_eq!(generic(), 42);
    }

    #[test]
    fn test_captured_state_is_shared() {
        let counter = Arc::new(AtomicU32::new(0));
        let seen = counter.clone();
        let ptr = create_fn_ptr(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

        ptr();
        ptr();
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_capacity_rejected_before_binding() {
        let big = [7u8; 512];
        let f = move |i: usize| big[i];
        let trampolines = Trampolines::default();

        let err = trampolines.fn_ptr::<StdCall, _, _>(f).unwrap_err();
        assert!(matches!(
            err,
            Error::CapacityExceeded { required, .. } if required == 512 + DISPATCH_OVERHEAD
        ));
        assert!(!trampolines.is_bound::<StdCall, _, _>(&f));
    }

    #[test]
    fn test_custom_capacity() {
        let payload = [1u64; 4];
        let f = move || payload.iter().sum::<u64>();
        let tight = Trampolines::new(TrampolineConfig {
            inline_capacity: DISPATCH_OVERHEAD,
        });
        assert!(tight.fn_ptr::<StdCall, _, _>(f).is_err());

        let roomy = Trampolines::new(TrampolineConfig {
            inline_capacity: inline_footprint::<[u64; 4]>(),
        });
        let ptr = roomy.fn_ptr::<StdCall, _, _>(f).unwrap();
        assert_eq!(ptr(), 4);
    }

    #[test]
    fn test_inline_footprint() {
        assert_eq!(inline_footprint::<()>(), DISPATCH_OVERHEAD);
        assert_eq!(inline_footprint::<u32>(), 4 + DISPATCH_OVERHEAD);
    }
}
