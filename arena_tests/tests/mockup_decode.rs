//! Mockup stream decoding against encoded fixtures.

use arena_shared::mockup::{
    decode_mockups, DecodeError, Gun, Mockup, MockupId, MockupTable, Turret,
};
use arena_tests::harness::encode_mockups;

fn basic() -> Mockup {
    Mockup {
        id: MockupId(7),
        size: 20,
        shape: 3,
        guns: Vec::new(),
        turrets: Vec::new(),
    }
}

fn armed() -> Mockup {
    Mockup {
        id: MockupId(12),
        size: 35,
        shape: 0,
        guns: vec![
            Gun {
                length: 18,
                width: 8,
                x: 0.0,
                y: 0.0,
                angle: 0.0,
                aspect: 1.0,
            },
            Gun {
                length: 14,
                width: 6,
                x: 3.0,
                y: -4.0,
                angle: std::f32::consts::FRAC_PI_2,
                aspect: -1.4,
            },
        ],
        turrets: vec![Turret {
            size: 12,
            x: 0.0,
            y: 6.0,
            shape: 6,
        }],
    }
}

/// A template with no attachments roundtrips with empty sub-lists.
#[test]
fn zero_counts_decode_cleanly() {
    let decoded = decode_mockups(&encode_mockups(&[basic()])).unwrap();
    assert_eq!(decoded.len(), 1);
    assert!(decoded[0].guns.is_empty());
    assert!(decoded[0].turrets.is_empty());
    assert_eq!(decoded[0], basic());
}

/// Multiple heterogeneous records decode back to back in declared order.
#[test]
fn multi_record_stream_roundtrips() {
    let decoded = decode_mockups(&encode_mockups(&[basic(), armed()])).unwrap();
    assert_eq!(decoded, vec![basic(), armed()]);
}

/// Truncation anywhere mid-stream fails the call and leaves the table as it
/// was before.
#[test]
fn truncation_leaves_table_untouched() {
    let mut table = MockupTable::default();
    table.load_hex(&encode_mockups(&[basic()])).unwrap();

    let full = encode_mockups(&[armed()]);
    // Cut at every even position: each prefix must fail, never half-insert.
    for cut in (0..full.len()).step_by(2).skip(1) {
        let err = table.load_hex(&full[..cut]).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedEof { .. }), "cut={cut}: {err}");
        assert_eq!(table.len(), 1);
        assert!(table.get(MockupId(12)).is_none());
    }

    // The intact stream still loads afterwards.
    table.load_hex(&full).unwrap();
    assert_eq!(table.get(MockupId(12)), Some(&armed()));
}

/// Re-decoding the same id overwrites the previous record.
#[test]
fn redecoding_same_id_overwrites() {
    let mut table = MockupTable::default();
    table.load_hex(&encode_mockups(&[basic()])).unwrap();

    let replacement = Mockup {
        size: 28,
        shape: 5,
        ..basic()
    };
    let loaded = table.load_hex(&encode_mockups(&[replacement.clone()])).unwrap();
    assert_eq!(loaded, 1);
    assert_eq!(table.len(), 1);
    assert_eq!(table.get(MockupId(7)), Some(&replacement));
}

/// Non-hex input is rejected before any record parsing.
#[test]
fn malformed_hex_is_rejected() {
    assert!(matches!(
        decode_mockups("0g").unwrap_err(),
        DecodeError::InvalidHexDigit { pos: 1, byte: b'g' }
    ));
    assert!(matches!(
        decode_mockups("abc").unwrap_err(),
        DecodeError::OddHexLength(3)
    ));
}
