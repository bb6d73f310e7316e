//! Sliding-window smoothing.

/// Centered running median with reflected boundaries.
///
/// Window `i` covers `series[i - size/2 .. i - size/2 + size]`; samples past
/// either end are mirrored about the edge (`d c b a | a b c d | d c b a`), so
/// the output has the same length as the input and step edges stay sharp.
///
/// # Arguments
/// * `series` - Input series
/// * `size` - Window size (odd sizes give a symmetric window)
pub fn median_filter(series: &[f64], size: usize) -> Vec<f64> {
    let n = series.len();
    if n == 0 || size <= 1 {
        return series.to_vec();
    }

    let half = (size / 2) as isize;
    let mut window = Vec::with_capacity(size);
    let mut result = Vec::with_capacity(n);

    for i in 0..n as isize {
        window.clear();
        for k in 0..size as isize {
            window.push(series[reflect_index(i - half + k, n)]);
        }
        window.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        result.push(window[size / 2]);
    }

    result
}

/// Map an out-of-range index onto the series by half-sample reflection.
fn reflect_index(i: isize, n: usize) -> usize {
    let n = n as isize;
    let period = 2 * n;
    let m = i.rem_euclid(period);
    if m >= n {
        (period - 1 - m) as usize
    } else {
        m as usize
    }
}
