use ndstrans::formats::{Container, StringTable, presets};
use ndstrans::script::{self, TextEncoding};
use ndstrans::text::{TextVariant, Transcoder};
use ndstrans::utils::{read_u16, read_u32};
use ndstrans::{Error, ErrorKind};
use pretty_assertions::assert_eq;

#[rustfmt::skip]
const NIDX: &[u8] = &[
    b'N', b'I', b'D', b'X', 2, 0, 0, 0, 16, 0, 0, 0, 28, 0, 0, 0,
    // group 0
    3, 0, b'a', b'b', 0, 0,
    2, 0, b'c', 0,
    0, 0,
    // group 1
    0, 0,
    4, 0, b'x', b'y', b'z', 0,
];

#[test]
fn nidx_pairs_load_flat_and_save_identically() {
    let c = Container::load(presets::NIDX, NIDX).unwrap();
    assert_eq!(NIDX.len(), 36);
    let table = &c.tables()[0];
    assert!(!table.is_sectioned());
    assert_eq!(table.strings().collect::<Vec<_>>(), ["ab", "c", "", "xyz"]);
    assert_eq!(c.save().unwrap(), NIDX);
}

#[test]
fn nidx_edit_moves_the_second_group() {
    let mut c = Container::load(presets::NIDX, NIDX).unwrap();
    assert!(c.tables_mut()[0].set(0, 1, "cdef"));
    let out = c.save().unwrap();
    // stored length 5 plus two padding bytes pushes the group past 28
    assert_eq!(read_u16(&out, 22).unwrap(), 5);
    assert_eq!(read_u32(&out, 12).unwrap(), 32);
    assert_eq!(out.len(), NIDX.len() + 4);

    let back = Container::load(presets::NIDX, &out).unwrap();
    assert_eq!(
        back.tables()[0].strings().collect::<Vec<_>>(),
        ["ab", "cdef", "", "xyz"]
    );
}

#[test]
fn nidx_text_file_is_utf16() {
    let c = Container::load(presets::NIDX, NIDX).unwrap();
    let text = c.export(0).unwrap();
    assert_eq!(&text[..4], &[0xFF, 0xFE, b'a', 0]);
}

#[test]
fn wrong_signature_is_a_format_error() {
    let mut data = NIDX.to_vec();
    data[0] = b'M';
    let err = Container::load(presets::NIDX, &data).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn mamoru_colour_code_survives_export() {
    let bytes = [0x1B, 0x43, 0x05, 0x82, 0xA0];
    let text = TextVariant::Mamoru.decode(&bytes, 0, Some(bytes.len())).unwrap();
    assert_eq!(text, "<C05>あ");

    let table = StringTable::flat(vec![text]);
    let file = script::export(&table, TextEncoding::ShiftJis).unwrap();
    let back = script::import(&file, &table, TextEncoding::ShiftJis).unwrap();
    let line = back.get(0, 0).unwrap();
    assert_eq!(TextVariant::Mamoru.encode(line).unwrap(), bytes);
}

#[rustfmt::skip]
const DMST: &[u8] = &[
    b'D', b'M', b'S', b'T', 1, 0, 0, 0, 12, 0, 0, 0,
    1, 0, 0, 0,
    8, 0, 0, 0, 2, 0, 0, 0,
    b'h', b'i',
];

#[test]
fn dmst_rejects_a_merged_separator() {
    let mut c = Container::load(presets::DMST, DMST).unwrap();
    assert_eq!(c.save().unwrap(), DMST);

    let exported = String::from_utf8(c.export(0).unwrap()).unwrap();
    assert_eq!(
        exported,
        "====================[0]====================\r\nhi\r\n"
    );

    let broken = "====================[0]====================\r\n\
                  ====================[1]====================\r\n";
    let err = c.import(0, broken.as_bytes()).unwrap_err();
    assert!(matches!(err, Error::LineBreak { section: 0, line: 2 }));
    assert_eq!(c.tables()[0].get(0, 0), Some("hi"));
}

fn music_box() -> Vec<u8> {
    let mut data = vec![0u8; 0x18 + 0x48];
    data[8] = 1;
    data[0x14] = 0x14;
    data[0x18..0x1B].copy_from_slice(b"abc");
    data
}

#[test]
fn music_box_enforces_the_slot_size() {
    let data = music_box();
    let mut c = Container::load(presets::MUSIC_BOX, &data).unwrap();
    assert_eq!(c.tables()[0].get(0, 0), Some("abc"));
    assert_eq!(c.save().unwrap(), data);

    c.tables_mut()[0].set(0, 0, "a".repeat(0x3E));
    let out = c.save().unwrap();
    assert_eq!(&out[0x18..0x18 + 0x3E], "a".repeat(0x3E).as_bytes());
    assert_eq!(out.len(), data.len());

    c.tables_mut()[0].set(0, 0, "a".repeat(0x3F));
    match c.save().unwrap_err() {
        Error::StringTooLong { length, max, .. } => {
            assert_eq!((length, max), (0x3F, 0x3E));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn every_preset_rejects_truncated_input_without_panicking() {
    for config in presets::ALL {
        let data = [0x01, 0x02, 0x03];
        assert!(Container::load(*config, &data).is_err(), "{}", config.name);
    }
}
