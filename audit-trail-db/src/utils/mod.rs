use heapless::String as HeaplessString;

use crate::error::ValueError;

/// Converts into a bounded string, failing when `s` does not fit.
pub fn to_bounded<const N: usize>(property: &str, s: &str) -> Result<HeaplessString<N>, ValueError> {
    let mut bounded = HeaplessString::<N>::new();
    bounded.push_str(s).map_err(|_| ValueError::Invalid {
        property: property.to_string(),
        value: s.to_string(),
    })?;
    Ok(bounded)
}

/// Converts into a bounded string, truncating at a character boundary.
///
/// Only used for identifiers whose length the model registry has already checked.
pub fn to_bounded_lossy<const N: usize>(s: &str) -> HeaplessString<N> {
    let mut bounded = HeaplessString::<N>::new();
    for ch in s.chars() {
        if bounded.push(ch).is_err() {
            break;
        }
    }
    bounded
}
