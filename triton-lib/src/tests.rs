use crate::codec::{decode, decode_frame, encode, encode_frame};
use crate::error::FrameError;
use crate::params::{ParameterSet, Timestamp, Variant};
use crate::validate::checksum;

fn reference_params() -> ParameterSet {
    ParameterSet::new(Timestamp::new(2025, 1, 7, 19, 9, 54))
        .with_windows(50, 3333, 4096, 13311)
        .with_modes(3, 11)
}

#[test]
fn test_encode_reference_vector() {
    let encoded = encode(&reference_params(), Variant::A).expect("Failed to encode");
    assert_eq!(encoded, "2419010713093600320D05100033FF3B583B");

    let frame = encode_frame(&reference_params(), Variant::A).unwrap();
    assert_eq!(
        &frame[..16],
        &[0x24, 0x19, 0x01, 0x07, 0x13, 0x09, 0x36, 0x00, 0x32, 0x0D, 0x05, 0x10, 0x00, 0x33, 0xFF, 0x3B]
    );
    assert_eq!(frame[16], checksum(&frame[..16]));
    assert_eq!(frame[17], 0x3B);
}

#[test]
fn test_encode_variant_b_layout() {
    let params = reference_params().with_dive(5, 200);
    let encoded = encode(&params, Variant::B).unwrap();
    // mode byte stays at offset 15, dive fields follow it
    assert_eq!(encoded, "2419010713093600320D05100033FF3B05C8253B");
    assert_eq!(encoded.len(), 40);
}

#[test]
fn test_decode_reference_vector() {
    let decoded = decode("2419010713093600320D05100033FF3B583B").expect("Failed to decode");
    assert_eq!(decoded, reference_params());
}

#[test]
fn test_decode_lowercase_and_delimited() {
    assert_eq!(decode("2419010713093600320d05100033ff3b583b").unwrap(), reference_params());
    assert_eq!(decode("$2419010713093600320D05100033FF3B583B;").unwrap(), reference_params());
    assert_eq!(decode("2419010713093600320D05100033FF3B583B\r\n").unwrap(), reference_params());
}

#[test]
fn test_legacy_swapped_trailer_rejected() {
    // footer before checksum, as one early decoder expected
    let result = decode("$2419010713093600320D05100033FF3B3B58;");
    assert_eq!(result, Err(FrameError::InvalidFooter { found: 0x58 }));
}

#[test]
fn test_footer_zero_is_invalid_footer() {
    let result = decode("2419010713093600320D05100033FF3B5800");
    assert_eq!(result, Err(FrameError::InvalidFooter { found: 0x00 }));
}

#[test]
fn test_window_boundaries() {
    let params = reference_params().with_windows(0, 65535, 0, 65535);
    let frame = encode_frame(&params, Variant::A).unwrap();
    assert_eq!(&frame[7..9], &[0x00, 0x00]);
    assert_eq!(&frame[9..11], &[0xFF, 0xFF]);
    assert_eq!(decode_frame(&frame).unwrap().params, params);
}

#[test]
fn test_mode_boundaries() {
    let frame = encode_frame(&reference_params().with_modes(15, 15), Variant::A).unwrap();
    assert_eq!(frame[15], 0xFF);

    // 16 is outside the 4-bit range and is masked, never rejected
    let frame = encode_frame(&reference_params().with_modes(16, 16), Variant::A).unwrap();
    assert_eq!(frame[15], 0x00);
    let decoded = decode_frame(&frame).unwrap().params;
    assert_eq!((decoded.lcd_mode, decoded.log_mode), (0, 0));
}

#[test]
fn test_year_out_of_range_is_encoding_error() {
    let mut params = reference_params();
    params.timestamp.year = 2256;
    assert!(matches!(
        encode(&params, Variant::A),
        Err(FrameError::Encoding { field: "year", .. })
    ));
}

#[test]
fn test_encode_is_deterministic() {
    let params = reference_params().with_dive(1, 2);
    assert_eq!(encode(&params, Variant::B), encode(&params, Variant::B));
}
