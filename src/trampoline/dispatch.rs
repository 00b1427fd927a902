//! Generated dispatchers.
//!
//! For every closure signature up to six parameters and every calling
//! convention there is one generic `extern` dispatcher. Monomorphising it for
//! a slot key yields a plain function pointer whose body looks the closure up
//! in that slot and forwards the arguments.
//!
//! On `x86` the markers map to their native ABIs. Other architectures have no
//! stdcall/thiscall/fastcall, so every convention falls back to `extern "C"`.

use std::any::TypeId;

use super::convention::{CdeclCall, Convention, FastCall, StdCall, ThisCall};

/// Witness that a closure has been stored in its slot.
///
/// Only the trampoline factory can construct one.
pub struct Bound(pub(super) ());

/// Slot and dispatcher lookup, reachable only from inside the crate.
pub trait Bind<C: Convention, Args> {
    /// Function-pointer type of the dispatcher.
    type Ptr: Copy;

    /// Key of the slot a closure of this type is stored in under tag `D`.
    fn slot_key<D: 'static>() -> TypeId;

    /// Dispatcher reading the slot selected by tag `D`.
    fn dispatcher<D: 'static>(bound: Bound) -> Self::Ptr;
}

/// A closure that can be turned into a function pointer with convention `C`.
///
/// `Args` is the closure's parameter tuple. It is inferred from the closure,
/// so callers normally write `_` for it. The trait is sealed: it is
/// implemented for every `Fn` of up to six parameters, and dispatchers are
/// only obtainable through [`Trampolines`](super::Trampolines), which binds the
/// slot first.
///
/// ```compile_fail
/// use asmpatch::trampoline::{IntoFnPtr, StdCall};
///
/// fn unbound<F: IntoFnPtr<StdCall, ()>>() -> F::Ptr {
///     F::dispatcher::<()>()
/// }
/// ```
pub trait IntoFnPtr<C: Convention, Args>: Bind<C, Args> + Send + Sync + Sized + 'static {
    /// Return type of the closure.
    type Output;

    /// Absolute address of a dispatcher pointer.
    fn addr(ptr: Self::Ptr) -> usize;
}

macro_rules! impl_into_fn_ptr {
    ($conv:ty, $abi:tt; $($arg:ident $val:ident),*) => {
        impl<F, R, $($arg,)*> Bind<$conv, ($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: 'static,
            $($arg: 'static,)*
        {
            type Ptr = extern $abi fn($($arg),*) -> R;

            fn slot_key<D: 'static>() -> TypeId {
                TypeId::of::<(D, F, $conv, fn($($arg),*) -> R)>()
            }

            fn dispatcher<D: 'static>(_bound: Bound) -> Self::Ptr {
                #[allow(improper_ctypes_definitions)]
                extern $abi fn dispatch<D, F, R, $($arg,)*>($($val: $arg),*) -> R
                where
                    D: 'static,
                    F: Fn($($arg),*) -> R + Send + Sync + 'static,
                    R: 'static,
                    $($arg: 'static,)*
                {
                    let key = <F as Bind<$conv, ($($arg,)*)>>::slot_key::<D>();
                    // Reaching here required a `Bound`, and slots are never cleared.
                    match $crate::trampoline::registry::load::<F>(key) {
                        Some(f) => (*f)($($val),*),
                        None => unreachable!("trampoline called before its slot was bound"),
                    }
                }
                dispatch::<D, F, R, $($arg,)*>
            }
        }

        impl<F, R, $($arg,)*> IntoFnPtr<$conv, ($($arg,)*)> for F
        where
            F: Fn($($arg),*) -> R + Send + Sync + 'static,
            R: 'static,
            $($arg: 'static,)*
        {
            type Output = R;

            fn addr(ptr: <Self as Bind<$conv, ($($arg,)*)>>::Ptr) -> usize {
                ptr as usize
            }
        }
    };
}

macro_rules! impl_convention {
    ($conv:ty, $abi:tt) => {
        impl_into_fn_ptr!($conv, $abi;);
        impl_into_fn_ptr!($conv, $abi; A0 a0);
        impl_into_fn_ptr!($conv, $abi; A0 a0, A1 a1);
        impl_into_fn_ptr!($conv, $abi; A0 a0, A1 a1, A2 a2);
        impl_into_fn_ptr!($conv, $abi; A0 a0, A1 a1, A2 a2, A3 a3);
        impl_into_fn_ptr!($conv, $abi; A0 a0, A1 a1, A2 a2, A3 a3, A4 a4);
        impl_into_fn_ptr!($conv, $abi; A0 a0, A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
    };
}

#[cfg(target_arch = "x86")]
impl_convention!(StdCall, "stdcall");
// cdecl is the C ABI on x86
#[cfg(target_arch = "x86")]
impl_convention!(CdeclCall, "C");
#[cfg(target_arch = "x86")]
impl_convention!(ThisCall, "thiscall");
#[cfg(target_arch = "x86")]
impl_convention!(FastCall, "fastcall");

#[cfg(not(target_arch = "x86"))]
impl_convention!(StdCall, "C");
#[cfg(not(target_arch = "x86"))]
impl_convention!(CdeclCall, "C");
#[cfg(not(target_arch = "x86"))]
impl_convention!(ThisCall, "C");
#[cfg(not(target_arch = "x86"))]
impl_convention!(FastCall, "C");
