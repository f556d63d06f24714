//! End-to-end container tests over the public API.
//!
//! These build a realistic cue sheet (header constants, a nested cue
//! table, an embedded audio bank) and push it through full encode/decode
//! cycles, including the scrambled and unpadded variants.

use cue_table::{
    AwbBank, ColumnStorage, DataPayload, StorageKind, UtfColumn, UtfTable, UtfValue, ValueType,
    parse_utf, parse_utf_at, unscramble,
};

/// A sheet shaped like real cue banks: header constants on the outer
/// table, per-cue rows in a nested table, streams in an AFS2 bank under
/// the reserved column name.
fn create_cue_sheet() -> UtfTable {
    let mut cues = UtfTable::new("Cue");
    cues.add_column(
        UtfColumn::per_row(
            "CueName",
            ValueType::String,
            vec![
                UtfValue::String("bgm_title".into()),
                UtfValue::String("bgm_battle".into()),
                UtfValue::String("bgm_title".into()),
            ],
        )
        .unwrap(),
    )
    .add_column(
        UtfColumn::per_row(
            "CueId",
            ValueType::UInt32,
            vec![
                UtfValue::UInt32(0),
                UtfValue::UInt32(1),
                UtfValue::UInt32(7),
            ],
        )
        .unwrap(),
    )
    .add_column(
        UtfColumn::per_row(
            "LengthMs",
            ValueType::UInt32,
            vec![
                UtfValue::UInt32(152_000),
                UtfValue::UInt32(98_500),
                UtfValue::UInt32(152_000),
            ],
        )
        .unwrap(),
    )
    .add_column(UtfColumn::zero("Reserved", ValueType::UInt32));
    cues.declared_row_count = 3;

    let mut bank = AwbBank::new(32);
    bank.add_entry(0, vec![0x11; 50])
        .add_entry(1, vec![0x22; 17])
        .add_entry(7, vec![0x33; 3]);

    let mut sheet = UtfTable::new("CueSheet");
    sheet
        .add_column(UtfColumn::constant("Version", UtfValue::UInt32(19)))
        .add_column(UtfColumn::constant(
            "SheetId",
            UtfValue::Guid([
                0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08,
                0x09, 0x0A, 0x0B,
            ]),
        ))
        .add_column(UtfColumn::constant("MasterVolume", UtfValue::Float32(0.8)))
        .add_column(UtfColumn::constant(
            "CueTable",
            UtfValue::Data(DataPayload::Table(Box::new(cues))),
        ))
        .add_column(UtfColumn::constant(
            "AwbFile",
            UtfValue::Data(DataPayload::AudioBank(bank)),
        ));
    sheet
}

#[test]
fn test_full_tree_roundtrip() {
    let sheet = create_cue_sheet();
    let bytes = sheet.to_bytes(true).unwrap();
    let decoded = parse_utf(&bytes).unwrap();

    assert_eq!(decoded, sheet);
    assert_eq!(decoded.name.as_deref(), Some("CueSheet"));
    assert_eq!(decoded.value_as::<u32>("Version", 0).unwrap(), 19);
    assert_eq!(decoded.value_as::<f32>("MasterVolume", 0).unwrap(), 0.8);

    // Walk into the nested cue table.
    let UtfValue::Data(DataPayload::Table(cues)) = decoded.value("CueTable", 0).unwrap() else {
        panic!("CueTable did not decode as a nested table");
    };
    assert_eq!(cues.row_count().unwrap(), 3);
    assert_eq!(cues.value_as::<String>("CueName", 1).unwrap(), "bgm_battle");
    assert_eq!(cues.value_as::<u32>("CueId", 2).unwrap(), 7);
    assert_eq!(
        cues.column("Reserved").unwrap().storage_kind(),
        StorageKind::Zero
    );

    // And into the audio bank.
    let UtfValue::Data(DataPayload::AudioBank(bank)) = decoded.value("AwbFile", 0).unwrap() else {
        panic!("AwbFile did not decode as an audio bank");
    };
    assert_eq!(bank.len(), 3);
    assert_eq!(bank.entry(7).unwrap().data, vec![0x33; 3]);
}

#[test]
fn test_scrambled_file_decodes() {
    let sheet = create_cue_sheet();
    let mut bytes = sheet.to_bytes(true).unwrap();

    // The transform is its own inverse, so applying it to a plain file
    // produces the shipped scrambled form.
    unscramble(&mut bytes);
    assert_ne!(&bytes[0..4], b"@UTF");

    let decoded = parse_utf(&bytes).unwrap();
    assert_eq!(decoded, sheet);
}

#[test]
fn test_reencode_is_byte_identical() {
    let sheet = create_cue_sheet();

    for pad in [true, false] {
        let bytes = sheet.to_bytes(pad).unwrap();
        let reencoded = parse_utf(&bytes).unwrap().to_bytes(pad).unwrap();
        assert_eq!(bytes, reencoded);
    }
}

#[test]
fn test_unpadded_is_smaller_but_equivalent() {
    let sheet = create_cue_sheet();
    let padded = sheet.to_bytes(true).unwrap();
    let packed = sheet.to_bytes(false).unwrap();

    assert!(packed.len() < padded.len());
    assert_eq!(parse_utf(&packed).unwrap(), parse_utf(&padded).unwrap());
}

#[test]
fn test_parse_embedded_in_archive() {
    let sheet = create_cue_sheet();
    let bytes = sheet.to_bytes(true).unwrap();

    // A table inside a larger file, found by signature scan.
    let mut archive = b"ARCH\x00\x00\x00\x01padpad".to_vec();
    let at = archive.len();
    archive.extend_from_slice(&bytes);
    archive.extend_from_slice(&[0xFF; 64]);

    assert_eq!(parse_utf_at(&archive, at).unwrap(), sheet);
}

#[test]
fn test_unnamed_table_stays_unnamed() {
    let mut table = UtfTable::unnamed();
    table.add_column(UtfColumn::constant("Version", UtfValue::UInt32(1)));

    let decoded = parse_utf(&table.to_bytes(true).unwrap()).unwrap();
    assert_eq!(decoded.name, None);

    // An empty name is not distinguishable from no name on the wire.
    let mut empty_named = UtfTable::new("");
    empty_named.add_column(UtfColumn::constant("Version", UtfValue::UInt32(1)));
    let decoded = parse_utf(&empty_named.to_bytes(true).unwrap()).unwrap();
    assert_eq!(decoded.name, None);
}

#[test]
fn test_duplicate_strings_share_pool_entries() {
    let sheet = create_cue_sheet();
    let bytes = sheet.to_bytes(false).unwrap();

    // "bgm_title" appears in two rows of the nested table but once in its
    // pool.
    let hits = bytes
        .windows(10)
        .filter(|&w| w == b"bgm_title\0")
        .count();
    assert_eq!(hits, 1);
}

#[test]
fn test_edit_cue_and_reencode() {
    let sheet = create_cue_sheet();
    let mut decoded = parse_utf(&sheet.to_bytes(true).unwrap()).unwrap();

    // Patch one cue's length inside the nested table, then write the
    // whole sheet back out.
    {
        let column = decoded.column_mut("CueTable").unwrap();
        let ColumnStorage::Constant(UtfValue::Data(DataPayload::Table(cues))) = &mut column.storage
        else {
            panic!("CueTable did not decode as a nested table");
        };
        cues.set_value("LengthMs", 1, UtfValue::UInt32(99_000)).unwrap();
    }

    let reparsed = parse_utf(&decoded.to_bytes(true).unwrap()).unwrap();
    let UtfValue::Data(DataPayload::Table(cues)) = reparsed.value("CueTable", 0).unwrap() else {
        panic!("CueTable did not decode as a nested table");
    };
    assert_eq!(cues.value_as::<u32>("LengthMs", 1).unwrap(), 99_000);
    assert_eq!(cues.value_as::<u32>("LengthMs", 0).unwrap(), 152_000);
}

#[test]
fn test_constant_promotion_survives_roundtrip() {
    let mut sheet = create_cue_sheet();
    // Diverging a constant promotes it to per-row storage. The outer
    // sheet has no row storage, so give it rows first.
    sheet.declared_row_count = 2;
    sheet
        .set_value("MasterVolume", 1, UtfValue::Float32(0.5))
        .unwrap();

    assert_eq!(
        sheet.column("MasterVolume").unwrap().storage_kind(),
        StorageKind::PerRow
    );

    let decoded = parse_utf(&sheet.to_bytes(true).unwrap()).unwrap();
    assert_eq!(decoded.value_as::<f32>("MasterVolume", 0).unwrap(), 0.8);
    assert_eq!(decoded.value_as::<f32>("MasterVolume", 1).unwrap(), 0.5);
}
