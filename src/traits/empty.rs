//! The *empty sentinel* capability.
//!
//! Failed chains never hand out a missing value: they carry the result type's
//! empty sentinel instead. Entities loaded by a transactional chain use the
//! same capability to report that a lookup found nothing.
//!
//! # Examples
//!
//! ```
//! use service_rail::traits::Empty;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Equipment { id: u32, name: String }
//!
//! impl Empty for Equipment {
//!     fn empty() -> Self {
//!         Self { id: 0, name: String::new() }
//!     }
//!
//!     fn is_empty(&self) -> bool {
//!         self.id == 0
//!     }
//! }
//!
//! assert!(Empty::is_empty(&Equipment::empty()));
//! ```

/// A type with a distinguished "nothing here" value.
pub trait Empty: Sized {
    /// Returns the sentinel value.
    fn empty() -> Self;

    /// Returns `true` when `self` is the sentinel.
    fn is_empty(&self) -> bool;
}

impl Empty for () {
    #[inline]
    fn empty() -> Self {}

    #[inline]
    fn is_empty(&self) -> bool {
        true
    }
}

impl Empty for bool {
    #[inline]
    fn empty() -> Self {
        false
    }

    #[inline]
    fn is_empty(&self) -> bool {
        !*self
    }
}

impl Empty for String {
    #[inline]
    fn empty() -> Self {
        String::new()
    }

    #[inline]
    fn is_empty(&self) -> bool {
        str::is_empty(self)
    }
}

impl<T> Empty for Option<T> {
    #[inline]
    fn empty() -> Self {
        None
    }

    #[inline]
    fn is_empty(&self) -> bool {
        self.is_none()
    }
}

impl<T> Empty for Vec<T> {
    #[inline]
    fn empty() -> Self {
        Vec::new()
    }

    #[inline]
    fn is_empty(&self) -> bool {
        <[T]>::is_empty(self)
    }
}

macro_rules! impl_empty_for_numbers {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Empty for $ty {
                #[inline]
                fn empty() -> Self {
                    0 as $ty
                }

                #[inline]
                fn is_empty(&self) -> bool {
                    *self == 0 as $ty
                }
            }
        )*
    };
}

impl_empty_for_numbers!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64);
