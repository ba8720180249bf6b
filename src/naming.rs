//! Deterministic storage keys for [`DynamicChainContext`](crate::context::DynamicChainContext).
//!
//! Repositories are keyed by their type name and access mode, data by a
//! [`DataKey`] resolved at compile time: result wrappers and options unwrap to
//! their inner type, collections pluralize their element name.
//!
//! # Examples
//!
//! ```
//! use service_rail::naming::{DataKey, NamingEngine};
//! use service_rail::impl_data_key;
//!
//! struct Exercise;
//! impl_data_key!(Exercise);
//!
//! assert_eq!(
//!     NamingEngine::repository_key_from_name("IExerciseRepository", true),
//!     "ReadOnlyExerciseRepository"
//! );
//! assert_eq!(NamingEngine::data_key::<Vec<Exercise>>(), "Exercises");
//! assert_eq!(NamingEngine::pluralize("Category"), "Categories");
//! ```
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};

use crate::types::ServiceResult;

const READ_ONLY_PREFIX: &str = "ReadOnly";
const WRITABLE_PREFIX: &str = "Writable";

const IRREGULAR_PLURALS: &[(&str, &str)] = &[
    ("Person", "People"),
    ("Child", "Children"),
    ("Man", "Men"),
    ("Woman", "Women"),
    ("Tooth", "Teeth"),
    ("Foot", "Feet"),
    ("Mouse", "Mice"),
    ("Goose", "Geese"),
];

const PLAIN_O_PLURALS: &[&str] = &["photo", "piano", "halo"];

/// Key derivation utilities. Pure and total.
#[derive(Debug, Clone, Copy)]
pub struct NamingEngine;

impl NamingEngine {
    /// Key under which a repository of type `R` is stored.
    ///
    /// Smart pointers and trait objects resolve to the type they point at, so
    /// `Box<dyn IEquipmentRepository>` keys as `"ReadOnlyEquipmentRepository"`.
    pub fn repository_key<R: ?Sized>(read_only: bool) -> String {
        Self::repository_key_from_name(Self::type_name::<R>(), read_only)
    }

    /// Key for a repository identified by name.
    ///
    /// A leading interface marker (`I` followed by an uppercase letter) is
    /// dropped, then `"ReadOnly"` or `"Writable"` is prefixed.
    pub fn repository_key_from_name(type_name: &str, read_only: bool) -> String {
        let mut chars = type_name.chars();
        let name = match (chars.next(), chars.next()) {
            (Some('I'), Some(second)) if second.is_uppercase() => &type_name[1..],
            _ => type_name,
        };
        let prefix = if read_only { READ_ONLY_PREFIX } else { WRITABLE_PREFIX };
        format!("{prefix}{name}")
    }

    /// Key under which a value of type `T` is stored.
    #[inline]
    pub fn data_key<T: DataKey + ?Sized>() -> String {
        T::data_key()
    }

    /// Key for a map from `K` to `V`: `"{Elements}By{Key}"` when `V` is a
    /// collection, `"{Value}By{Key}"` otherwise.
    pub fn suggested_key<K: DataKey + ?Sized, V: DataKey + ?Sized>() -> String {
        match V::element_name() {
            Some(element) => format!("{}By{}", Self::pluralize(&element), K::data_key()),
            None => format!("{}By{}", V::data_key(), K::data_key()),
        }
    }

    /// Unqualified name of `T` without generic arguments.
    ///
    /// `Box`, `Arc`, `Rc` and references are looked through; trait objects
    /// report the trait name.
    pub fn type_name<T: ?Sized>() -> &'static str {
        short_name(std::any::type_name::<T>())
    }

    /// English pluralization heuristic.
    ///
    /// ```
    /// use service_rail::naming::NamingEngine;
    ///
    /// assert_eq!(NamingEngine::pluralize("Exercise"), "Exercises");
    /// assert_eq!(NamingEngine::pluralize("Class"), "Classes");
    /// assert_eq!(NamingEngine::pluralize("Photo"), "Photos");
    /// assert_eq!(NamingEngine::pluralize("Leaf"), "Leaves");
    /// assert_eq!(NamingEngine::pluralize("Person"), "People");
    /// ```
    pub fn pluralize(singular: &str) -> String {
        if singular.is_empty() {
            return String::new();
        }

        if let Some((_, plural)) =
            IRREGULAR_PLURALS.iter().find(|(word, _)| word.eq_ignore_ascii_case(singular))
        {
            return (*plural).to_owned();
        }

        let lower = singular.to_lowercase();
        let long_enough = singular.chars().count() > 1;
        let penultimate = singular.chars().rev().nth(1);

        if long_enough && lower.ends_with('y') && penultimate.is_some_and(|c| !is_vowel(c)) {
            return format!("{}ies", &singular[..singular.len() - 1]);
        }

        if ["s", "ss", "sh", "ch", "x", "z"].iter().any(|suffix| lower.ends_with(suffix)) {
            return format!("{singular}es");
        }

        if long_enough
            && lower.ends_with('o')
            && penultimate.is_some_and(|c| !is_vowel(c))
            && !PLAIN_O_PLURALS.iter().any(|word| lower.ends_with(word))
        {
            return format!("{singular}es");
        }

        if lower.ends_with('f') {
            return format!("{}ves", &singular[..singular.len() - 1]);
        }
        if lower.ends_with("fe") {
            return format!("{}ves", &singular[..singular.len() - 2]);
        }

        format!("{singular}s")
    }
}

fn is_vowel(c: char) -> bool {
    "aeiouAEIOU".contains(c)
}

fn short_name(mut name: &str) -> &str {
    loop {
        name = name.trim();
        for prefix in ["&mut ", "&", "dyn ", "impl "] {
            if let Some(rest) = name.strip_prefix(prefix) {
                name = rest.trim_start();
            }
        }

        let base_end = name.find(['<', ' ']).unwrap_or(name.len());
        let base = last_segment(&name[..base_end]);

        let is_pointer = matches!(base, "Box" | "Arc" | "Rc");
        if is_pointer && name[base_end..].starts_with('<') {
            if let Some(close) = name.rfind('>') {
                name = &name[base_end + 1..close];
                continue;
            }
        }
        return base;
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// Compile-time data key of a type stored in a chain context.
///
/// Implement with [`impl_data_key!`](crate::impl_data_key) for plain types.
pub trait DataKey {
    fn data_key() -> String;

    /// Element name of a collection; `None` for non-collections.
    fn element_name() -> Option<String> {
        None
    }
}

/// Implements [`DataKey`] for plain types, keyed by their unqualified name.
///
/// ```
/// use service_rail::impl_data_key;
/// use service_rail::naming::NamingEngine;
///
/// struct MuscleGroup;
/// impl_data_key!(MuscleGroup);
///
/// assert_eq!(NamingEngine::data_key::<MuscleGroup>(), "MuscleGroup");
/// assert_eq!(NamingEngine::data_key::<Option<MuscleGroup>>(), "MuscleGroup");
/// ```
#[macro_export]
macro_rules! impl_data_key {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl $crate::naming::DataKey for $ty {
                fn data_key() -> ::std::string::String {
                    $crate::naming::NamingEngine::type_name::<$ty>().to_owned()
                }
            }
        )+
    };
}

impl_data_key!(
    String, str, bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32,
    f64
);

impl<T: DataKey> DataKey for ServiceResult<T> {
    fn data_key() -> String {
        T::data_key()
    }

    fn element_name() -> Option<String> {
        T::element_name()
    }
}

impl<T: DataKey> DataKey for Option<T> {
    fn data_key() -> String {
        T::data_key()
    }

    fn element_name() -> Option<String> {
        T::element_name()
    }
}

macro_rules! impl_collection_data_key {
    ($($collection:ident),+) => {
        $(
            impl<T: DataKey> DataKey for $collection<T> {
                fn data_key() -> String {
                    NamingEngine::pluralize(&T::data_key())
                }

                fn element_name() -> Option<String> {
                    Some(T::data_key())
                }
            }
        )+
    };
}

impl_collection_data_key!(Vec, VecDeque, HashSet, BTreeSet);

impl<T: DataKey> DataKey for [T] {
    fn data_key() -> String {
        NamingEngine::pluralize(&T::data_key())
    }

    fn element_name() -> Option<String> {
        Some(T::data_key())
    }
}

impl<T: DataKey, const N: usize> DataKey for [T; N] {
    fn data_key() -> String {
        NamingEngine::pluralize(&T::data_key())
    }

    fn element_name() -> Option<String> {
        Some(T::data_key())
    }
}

impl<K: DataKey, V: DataKey, S> DataKey for HashMap<K, V, S> {
    fn data_key() -> String {
        NamingEngine::suggested_key::<K, V>()
    }
}

impl<K: DataKey, V: DataKey> DataKey for BTreeMap<K, V> {
    fn data_key() -> String {
        NamingEngine::suggested_key::<K, V>()
    }
}
