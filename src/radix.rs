//! In-place LSD radix sort for `u64` keys with a paired values array.
//! 8-bit passes, stable via counting + prefix sums. Passes whose byte is
//! constant across all keys are skipped.

/// Sort `keys` ascending and permute `vals` accordingly.
/// Scratch buffers are allocated once and reused across passes.
pub fn radix_sort_pairs_u64<T: Copy>(keys: &mut [u64], vals: &mut [T]) {
    debug_assert_eq!(keys.len(), vals.len());
    let n = keys.len();
    if n <= 1 {
        return;
    }

    let mut tmp_keys = vec![0u64; n];
    let mut tmp_vals: Vec<T> = vals.to_vec();

    for pass in 0..8 {
        let shift = pass * 8;
        let mut counts = [0usize; 256];

        for &k in keys.iter() {
            counts[((k >> shift) & 0xFF) as usize] += 1;
        }
        if counts.iter().any(|&c| c == n) {
            continue;
        }

        // Prefix sums -> positions
        let mut sum = 0usize;
        for c in counts.iter_mut() {
            let tmp = *c;
            *c = sum;
            sum += tmp;
        }

        for i in 0..n {
            let k = keys[i];
            let b = ((k >> shift) & 0xFF) as usize;
            let pos = counts[b];
            tmp_keys[pos] = k;
            tmp_vals[pos] = vals[i];
            counts[b] = pos + 1;
        }

        keys.copy_from_slice(&tmp_keys);
        vals.copy_from_slice(&tmp_vals);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorts_pairs_stably() {
        let mut keys = vec![(1u64 << 32) | 7, 3, (1u64 << 32) | 2, 3, 0];
        let mut vals = vec!['a', 'b', 'c', 'd', 'e'];
        radix_sort_pairs_u64(&mut keys, &mut vals);
        assert_eq!(keys, vec![0, 3, 3, (1 << 32) | 2, (1 << 32) | 7]);
        assert_eq!(vals, vec!['e', 'b', 'd', 'c', 'a']);
    }
}
