//! Single-kmer chemistry pass: clear failing length variants, then rebuild each
//! index once with every dead code pruned.

use rayon::prelude::*;

use crate::chemistry::Chemistry;
use crate::encode::{KmerCode, KmerCodec};
use crate::error::Result;
use crate::index::SuccinctPositionIndex;
use crate::observe::{Observer, Stage};

/// Copy of `code` with every length variant that fails `chem` cleared.
pub fn filter_code(codec: &KmerCodec, chem: &Chemistry, mut code: KmerCode) -> Result<KmerCode> {
    let lengths: Vec<usize> = codec.live_lengths(code).collect();
    for len in lengths {
        let bases = codec.decode(code, len)?;
        if !chem.variant_ok(&bases) {
            codec.clear_length(&mut code, len)?;
        }
    }
    Ok(code)
}

/// Apply [`Chemistry::variant_ok`] to every live variant of every index.
pub fn filter_single(
    indexes: Vec<SuccinctPositionIndex>,
    codec: &KmerCodec,
    chem: &Chemistry,
    observer: &dyn Observer,
) -> Result<Vec<SuccinctPositionIndex>> {
    let filtered = indexes
        .into_par_iter()
        .map(|idx| {
            let updated = idx
                .codes()
                .iter()
                .map(|&c| filter_code(codec, chem, c))
                .collect::<Result<Vec<_>>>()?;
            idx.rebuild_index(updated)
        })
        .collect::<Result<Vec<_>>>()?;
    observer.stage(
        Stage::ChemistryFiltered,
        filtered.iter().map(SuccinctPositionIndex::ones).sum(),
    );
    Ok(filtered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PrimerConfig;
    use crate::error::PrimerError;
    use crate::observe::CountingObserver;

    #[test]
    fn failing_lengths_are_cleared_independently() {
        let codec = KmerCodec::new(4, 6).unwrap();
        // ACGT passes, ACGTTT drops below 0.4 CG.
        let chem = Chemistry::new(
            &PrimerConfig::default()
                .primer_lengths(4, 6)
                .melting_range(0.0, 100.0)
                .cg_content(0.4, 0.6),
        );
        let a = codec.encode(b"ACGTTT", 4).unwrap();
        let b = codec.encode(b"ACGTTT", 6).unwrap();
        let code = a.merge(b).unwrap();
        let out = filter_code(&codec, &chem, code).unwrap();
        assert_eq!(codec.live_lengths(out).collect::<Vec<_>>(), vec![4]);

        let dead = filter_code(&codec, &chem, codec.encode(b"AAAAAC", 6).unwrap()).unwrap();
        assert!(dead.is_dead());
    }

    #[test]
    fn live_bit_past_payload_is_fatal() {
        let codec = KmerCodec::new(4, 6).unwrap();
        let chem = Chemistry::new(&PrimerConfig::default().primer_lengths(4, 6));
        // Four bases packed, yet lengths 4 and 6 flagged live.
        let code = codec.encode(b"ACGT", 4).unwrap().with_mask(0b101);
        assert_eq!(
            filter_code(&codec, &chem, code),
            Err(PrimerError::DeadVariant { len: 6 })
        );
    }

    #[test]
    fn dead_codes_leave_the_index() {
        let codec = KmerCodec::new(4, 4).unwrap();
        let chem = Chemistry::new(
            &PrimerConfig::default()
                .primer_lengths(4, 4)
                .melting_range(12.0, 12.0)
                .cg_content(0.0, 1.0),
        );
        let keep = codec.encode(b"ACGT", 4).unwrap();
        let drop = codec.encode(b"AAAA", 4).unwrap();
        let idx =
            SuccinctPositionIndex::from_entries(0, 20, vec![(1, keep), (7, drop), (19, keep)])
                .unwrap();
        let obs = CountingObserver::new();
        let out = filter_single(vec![idx], &codec, &chem, &obs).unwrap();
        assert_eq!(out[0].iter().map(|(p, _)| p).collect::<Vec<_>>(), vec![1, 19]);
        assert_eq!(out[0].rank(19), 1);
        assert_eq!(obs.survivors(Stage::ChemistryFiltered), 2);
    }
}
