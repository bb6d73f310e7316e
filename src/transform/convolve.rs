//! Discrete 1-D convolution.

/// Full discrete convolution, length `signal.len() + kernel.len() - 1`.
pub fn convolve_full(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    if signal.is_empty() || kernel.is_empty() {
        return Vec::new();
    }

    let mut out = vec![0.0; signal.len() + kernel.len() - 1];
    for (i, &x) in signal.iter().enumerate() {
        for (j, &h) in kernel.iter().enumerate() {
            out[i + j] += x * h;
        }
    }
    out
}

/// Convolution trimmed to the central `max(len)` samples, zero-padded.
///
/// With `kernel = [1, 0, -1]` this gives `out[i] = signal[i+1] - signal[i-1]`,
/// with `kernel = [1, -1]` it gives `out[i] = signal[i] - signal[i-1]`; samples
/// outside the signal count as zero.
pub fn convolve_same(signal: &[f64], kernel: &[f64]) -> Vec<f64> {
    let full = convolve_full(signal, kernel);
    if full.is_empty() {
        return full;
    }

    let len = signal.len().max(kernel.len());
    let start = (signal.len().min(kernel.len()) - 1) / 2;
    full[start..start + len].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_convolution() {
        assert_eq!(
            convolve_full(&[1.0, 2.0, 3.0], &[0.0, 1.0, 0.5]),
            vec![0.0, 1.0, 2.5, 4.0, 1.5]
        );
        assert!(convolve_full(&[], &[1.0]).is_empty());
    }

    #[test]
    fn same_centered_difference() {
        let out = convolve_same(&[1.0, 2.0, 4.0, 8.0], &[1.0, 0.0, -1.0]);
        // Interior: x[i+1] - x[i-1]; ends see zero padding
        assert_eq!(out, vec![2.0, 3.0, 6.0, -4.0]);
    }

    #[test]
    fn same_backward_difference() {
        let out = convolve_same(&[1.0, 2.0, 4.0, 8.0], &[1.0, -1.0]);
        assert_eq!(out, vec![1.0, 1.0, 2.0, 4.0]);
    }
}
