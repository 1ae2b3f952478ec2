//! Saturating PCM summing.

use crate::format::saturate_i16;

/// Computes, for every input, the saturating sum of all the *other* inputs.
///
/// Output `i` never contains input `i`, so a participant never hears
/// themselves. A single input yields silence. Every output has the length of
/// the longest input.
///
/// # Example
///
/// ```
/// use stream_mix::mix_minus;
///
/// let a = [100i16, -100];
/// let b = [30_000i16, -30_000];
/// let c = [30_000i16, 1];
///
/// let mixes = mix_minus(&[&a, &b, &c]);
/// assert_eq!(mixes[0], vec![i16::MAX, -29_999]);
/// assert_eq!(mixes[1], vec![30_100, -99]);
/// assert_eq!(mixes[2], vec![30_100, -30_100]);
/// ```
pub fn mix_minus(inputs: &[&[i16]]) -> Vec<Vec<i16>> {
    let total = accumulate(inputs);
    inputs
        .iter()
        .map(|own| {
            total
                .iter()
                .enumerate()
                .map(|(i, &sum)| saturate_i16(sum - own.get(i).copied().map_or(0, i32::from)))
                .collect()
        })
        .collect()
}

fn accumulate(inputs: &[&[i16]]) -> Vec<i32> {
    let len = inputs.iter().map(|s| s.len()).max().unwrap_or(0);
    let mut total = vec![0i32; len];
    for input in inputs {
        for (acc, &s) in total.iter_mut().zip(input.iter()) {
            *acc += i32::from(s);
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lone_source_hears_silence() {
        let a = [1000i16, -1000, 32767];
        let mixes = mix_minus(&[&a]);
        assert_eq!(mixes, vec![vec![0, 0, 0]]);
    }

    #[test]
    fn test_self_exclusion() {
        let a = [10i16, 20];
        let b = [1i16, 2];
        let mixes = mix_minus(&[&a, &b]);
        assert_eq!(mixes[0], vec![1, 2]);
        assert_eq!(mixes[1], vec![10, 20]);
    }

    #[test]
    fn test_sum_never_wraps() {
        let loud = [i16::MAX; 4];
        let quiet = [i16::MIN; 4];
        let mixes = mix_minus(&[&loud, &loud, &loud]);
        assert!(mixes.iter().all(|m| m.iter().all(|&s| s == i16::MAX)));

        let mixes = mix_minus(&[&quiet, &quiet, &quiet]);
        assert!(mixes.iter().all(|m| m.iter().all(|&s| s == i16::MIN)));
    }

    #[test]
    fn test_shorter_inputs_padded() {
        let a = [5i16, 5, 5];
        let b = [1i16];
        let mixes = mix_minus(&[&a, &b]);
        assert_eq!(mixes[0], vec![1, 0, 0]);
        assert_eq!(mixes[1], vec![5, 5, 5]);
    }

    #[test]
    fn test_no_inputs() {
        assert!(mix_minus(&[]).is_empty());
    }
}
