pub mod id;
pub mod span;

pub use id::Id;
pub use span::*;

use std::fmt;

pub type Map<K, V> = rustc_hash::FxHashMap<K, V>;
pub type Set<T> = rustc_hash::FxHashSet<T>;
pub type Hasher = std::hash::BuildHasherDefault<rustc_hash::FxHasher>;

pub fn format_vec<T: fmt::Display>(
    f: &mut fmt::Formatter,
    v: &[T],
    left: &str,
    sep: &str,
    right: &str,
) -> fmt::Result {
    write!(f, "{}", left)?;
    if !v.is_empty() {
        write!(f, "{}", v[0])?;
        for e in &v[1..v.len()] {
            write!(f, "{}{}", sep, e)?;
        }
    }
    write!(f, "{}", right)
}
