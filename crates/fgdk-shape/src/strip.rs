//! Triangle strip decomposition.

use crate::{Error, Result};

/// Flatten a strip-length table and its index buffer into triangles.
///
/// Each strip of length `L` occupies `L` consecutive indices and yields
/// `max(0, L - 2)` triangles. Odd triangles within a strip have their second
/// and third corners swapped so every face keeps the same winding. Parity
/// restarts at the beginning of each strip.
///
/// # Example
///
/// ```
/// use fgdk_shape::strips_to_triangles;
///
/// let triangles = strips_to_triangles(&[4], &[0, 1, 2, 3]).unwrap();
/// assert_eq!(triangles, vec![[0, 1, 2], [1, 3, 2]]);
/// ```
pub fn strips_to_triangles(strip_lengths: &[u16], indices: &[u16]) -> Result<Vec<[u16; 3]>> {
    let capacity = strip_lengths
        .iter()
        .map(|&len| usize::from(len).saturating_sub(2))
        .sum();
    let mut triangles = Vec::with_capacity(capacity);

    let mut offset = 0usize;
    for &length in strip_lengths {
        let length = usize::from(length);
        let strip = indices
            .get(offset..offset + length)
            .ok_or(Error::MalformedShape {
                field: "strip_length",
                value: length as i64,
                offset,
            })?;

        for (i, window) in strip.windows(3).enumerate() {
            if i % 2 == 0 {
                triangles.push([window[0], window[1], window[2]]);
            } else {
                triangles.push([window[0], window[2], window[1]]);
            }
        }

        offset += length;
    }

    Ok(triangles)
}
