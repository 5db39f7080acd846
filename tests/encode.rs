use kira_primer_pairs::encode::*;
use kira_primer_pairs::{KmerCodec, PrimerError};

#[test]
fn test_encode_decode_variants() {
    let codec = KmerCodec::new(4, 8).unwrap();
    let long = codec.encode(b"ACGTTGCA", 8).unwrap();
    let short = codec.encode(b"ACGTTG", 6).unwrap();
    let code = long.merge(short).unwrap();

    assert_eq!(codec.encoded_length(code), 8);
    assert_eq!(codec.live_lengths(code).collect::<Vec<_>>(), vec![6, 8]);
    assert_eq!(codec.decode(code, 8).unwrap(), b"ACGTTGCA".to_vec());
    assert_eq!(codec.decode(code, 6).unwrap(), b"ACGTTG".to_vec());
    assert_eq!(
        codec.decode(code, 7).unwrap_err(),
        PrimerError::DeadVariant { len: 7 }
    );
}

#[test]
fn test_clear_is_per_length() {
    let codec = KmerCodec::new(4, 6).unwrap();
    let mut code = codec
        .encode(b"GATTAC", 6)
        .unwrap()
        .merge(codec.encode(b"GATT", 4).unwrap())
        .unwrap();
    codec.clear_length(&mut code, 6).unwrap();
    assert!(!codec.is_live(code, 6));
    assert!(codec.is_live(code, 4));
    assert_eq!(codec.decode(code, 4).unwrap(), b"GATT".to_vec());
    codec.clear_length(&mut code, 4).unwrap();
    assert!(code.is_dead());
}

#[test]
fn test_lut_and_errors() {
    assert_eq!(map_base(b'A'), Some(0));
    assert_eq!(map_base(b'c'), Some(1));
    assert_eq!(map_base(b'G'), Some(2));
    assert_eq!(map_base(b't'), Some(3));
    assert_eq!(map_base(b'N'), None);

    let codec = KmerCodec::new(16, 25).unwrap();
    assert!(matches!(
        codec.encode(b"ACGTACGTACGTACGN", 16),
        Err(PrimerError::InvalidSymbol { symbol: b'N', offset: 15 })
    ));
    assert!(matches!(
        codec.encode(b"ACGT", 4),
        Err(PrimerError::LengthOutOfRange { len: 4, min: 16, max: 25 })
    ));
    assert!(KmerCodec::new(10, 26).is_err());
    assert!(KmerCodec::new(20, 32).is_err());
}

#[test]
fn test_kmer_display() {
    let k = Kmer::from_bases(b"acgt").unwrap();
    assert_eq!(k.to_string(), "ACGT");
    assert_eq!(k.len(), 4);
    assert_eq!(k, Kmer::from_bases(b"ACGT").unwrap());
}
