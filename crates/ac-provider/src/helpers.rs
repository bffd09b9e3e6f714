//! Free helper functions any provider can call.
//!
//! These replace what a base class would otherwise provide: bounds-checked
//! reads and writes into action/observation buffers, and numeric
//! sanitising.  None of them panic.

/// Replace NaN and ±infinity with `0.0`.
#[inline]
pub fn sanitize(value: f32) -> f32 {
    if value.is_finite() { value } else { 0.0 }
}

/// Sanitise every element in place.  Returns the number of values replaced.
pub fn sanitize_slice(values: &mut [f32]) -> usize {
    let mut replaced = 0;
    for v in values.iter_mut().filter(|v| !v.is_finite()) {
        *v = 0.0;
        replaced += 1;
    }
    replaced
}

/// `values[index]`, or `0.0` when out of range.
#[inline]
pub fn safe_get(values: &[f32], index: usize) -> f32 {
    values.get(index).copied().unwrap_or(0.0)
}

/// `values[index]`, or `0` when out of range.
#[inline]
pub fn safe_get_discrete(values: &[i32], index: usize) -> i32 {
    values.get(index).copied().unwrap_or(0)
}

/// Write `value` (sanitised) at `index`.  Returns `false` if out of range.
#[inline]
pub fn safe_set(values: &mut [f32], index: usize, value: f32) -> bool {
    match values.get_mut(index) {
        Some(slot) => {
            *slot = sanitize(value);
            true
        }
        None => false,
    }
}

/// Write `value` at `index`.  Returns `false` if out of range.
#[inline]
pub fn safe_set_discrete(values: &mut [i32], index: usize, value: i32) -> bool {
    match values.get_mut(index) {
        Some(slot) => {
            *slot = value;
            true
        }
        None => false,
    }
}

/// Clamp a continuous action to the conventional `[-1, 1]` range.
#[inline]
pub fn clamp_unit(value: f32) -> f32 {
    sanitize(value).clamp(-1.0, 1.0)
}

/// Zero-pad or truncate `values` to exactly `size` elements.
///
/// Returns `true` if the length had to change.
pub fn fit_to_size(values: &mut Vec<f32>, size: usize) -> bool {
    if values.len() == size {
        return false;
    }
    values.resize(size, 0.0);
    true
}
