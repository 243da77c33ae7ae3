use crate::error::CacheError;
use crate::geometry::{AddressDecoder, Geometry};
use crate::test::geometry;

#[test]
fn default_geometry_has_64_lines() {
    let geometry = Geometry::default();
    assert_eq!(geometry, super::geometry(1));
    assert_eq!(geometry.num_sets(), 64);
    assert_eq!(geometry.num_lines(), 64);
    assert_eq!(geometry.decoder().offset_bits(), 6);
    assert_eq!(geometry.decoder().index_bits(), 6);
    assert_eq!(geometry.decoder().tag_bits(), 20);
}

#[test]
fn decode_splits_index_and_tag() {
    let decoder = *geometry(1).decoder();
    assert_eq!(decoder.decode(0x0), Ok((0, 0)));
    // Offset bits are ignored
    assert_eq!(decoder.decode(0x3f), Ok((0, 0)));
    assert_eq!(decoder.decode(0x1040), Ok((1, 1)));
    // Same index as 0x0, different tag
    assert_eq!(decoder.decode(0x1000), Ok((0, 1)));
    assert_eq!(decoder.decode(0xffff_ffff), Ok((63, 0xf_ffff)));
}

#[test]
fn associativity_reduces_index_bits() {
    let two_way = geometry(2);
    assert_eq!(two_way.num_sets(), 32);
    assert_eq!(two_way.decoder().index_bits(), 5);
    assert_eq!(two_way.decoder().decode(0x800), Ok((0, 1)));

    let fully_associative = geometry(64);
    assert_eq!(fully_associative.num_sets(), 1);
    assert_eq!(fully_associative.decoder().index_bits(), 0);
    assert_eq!(fully_associative.decoder().decode(0x1000), Ok((0, 0x40)));
}

#[test]
fn address_out_of_range_is_rejected() {
    let decoder = *geometry(1).decoder();
    assert_eq!(
        decoder.decode(1 << 32),
        Err(CacheError::AddressOutOfRange {
            address: 1 << 32,
            width: 32
        })
    );

    let narrow = Geometry::new(16, 16, 256, 1, 1, 10).unwrap();
    assert!(narrow.decoder().decode(0xffff).is_ok());
    assert!(matches!(
        narrow.decoder().decode(0x1_0000),
        Err(CacheError::AddressOutOfRange { width: 16, .. })
    ));
}

#[test]
fn full_width_addresses_decode() {
    let wide = Geometry::new(64, 64, 4096, 1, 1, 10).unwrap();
    assert_eq!(wide.decoder().decode(u64::MAX), Ok((63, u64::MAX >> 12)));
    assert_eq!(wide.decoder().tag_bits(), 52);
}

#[test]
fn decoder_handles_single_byte_lines() {
    let decoder = AddressDecoder::new(1, 4, 8);
    assert_eq!(decoder.offset_bits(), 0);
    assert_eq!(decoder.decode(0b1011_0110), Ok((0b10, 0b10_1101)));
}

#[test]
fn tag_storage_is_reported_in_kib() {
    // 20 bit tags for 64 lines = 160 bytes
    assert_eq!(geometry(1).tag_storage_kib(), 160.0 / 1024.0);
    assert_eq!(geometry(1).capacity_kib(), 4.0);
}

#[test]
fn invalid_geometries_are_rejected() {
    let invalid = [
        // line size not a power of two
        Geometry::new(32, 48, 4096, 1, 1, 10),
        // 48 lines
        Geometry::new(32, 64, 3072, 1, 1, 10),
        // 4096 is not a multiple of 3 * 64
        Geometry::new(32, 64, 4096, 3, 1, 10),
        Geometry::new(32, 64, 4096, 0, 1, 10),
        Geometry::new(32, 64, 0, 1, 1, 10),
        Geometry::new(0, 64, 4096, 1, 1, 10),
        Geometry::new(65, 64, 4096, 1, 1, 10),
        // 6 offset bits and 6 index bits don't fit in 8
        Geometry::new(8, 64, 4096, 1, 1, 10),
    ];
    for geometry in invalid {
        assert!(
            matches!(geometry, Err(CacheError::InvalidGeometry(_))),
            "{geometry:?}"
        );
    }
}

#[test]
fn odd_associativity_with_matching_capacity_is_valid() {
    let three_way = Geometry::new(32, 64, 3072, 3, 1, 10).unwrap();
    assert_eq!(three_way.num_sets(), 16);
    assert_eq!(three_way.num_lines(), 48);
}
