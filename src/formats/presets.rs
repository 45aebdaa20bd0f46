//! Ready-made [`FormatConfig`]s for the supported game files.

use crate::formats::langdb::BlockLayout;
use crate::formats::message::MessageLayout;
use crate::formats::pointer::{Entry, NullPad, OffsetBase, PointerLayout, TableStart};
use crate::formats::prefixed::PrefixedLayout;
use crate::formats::record::{RecordLayout, RecordSection};
use crate::formats::section::SectionLayout;
use crate::formats::slots::SlotLayout;
use crate::formats::{FormatConfig, Layout};
use crate::script::TextEncoding;
use crate::text::TextVariant;
use crate::utils::read_u32;

/// Ash item/skill index: pairs of length-prefixed strings, 4-byte aligned.
pub const NIDX: FormatConfig = FormatConfig {
    name: "NIDX",
    signature: Some(0x5844494E),
    text: TextVariant::ShiftJis,
    export: TextEncoding::Utf16Le,
    layout: Layout::Prefixed(PrefixedLayout {
        count_offset: 4,
        group_len: 2,
        group_align: 4,
        sectioned: false,
    }),
};

/// SaGa 2 dungeon names, exported as one section per pair.
pub const DNGC: FormatConfig = FormatConfig {
    name: "DNGC",
    signature: Some(0x43474E44),
    text: TextVariant::ShiftJis,
    export: TextEncoding::ShiftJis,
    layout: Layout::Prefixed(PrefixedLayout {
        count_offset: 4,
        group_len: 2,
        group_align: 1,
        sectioned: true,
    }),
};

/// SaGa 2 message sections.
pub const DMST: FormatConfig = FormatConfig {
    name: "DMST",
    signature: Some(0x54534D44),
    text: TextVariant::ShiftJis,
    export: TextEncoding::ShiftJis,
    layout: Layout::Sections(SectionLayout { count_offset: 4 }),
};

/// SaGa 2 string table behind an opaque blob.
pub const DCPB: FormatConfig = FormatConfig {
    name: "DCPB",
    signature: Some(0x42504344),
    text: TextVariant::ShiftJis,
    export: TextEncoding::ShiftJis,
    layout: Layout::Pointers(PointerLayout {
        start: TableStart::AfterBlob {
            size_offset: 4,
            blob_offset: 8,
        },
        entry: Entry::OffsetLength,
        base: OffsetBase::Table,
    }),
};

/// SaGa 2 unsigned message block.
pub const DMSB: FormatConfig = FormatConfig {
    name: "DMSB",
    signature: None,
    text: TextVariant::ShiftJis,
    export: TextEncoding::ShiftJis,
    layout: Layout::Pointers(PointerLayout {
        start: TableStart::AfterCount { count_offset: 0 },
        entry: Entry::OffsetLength,
        base: OffsetBase::Table,
    }),
};

/// SaGa 2 music box titles, patched in place.
pub const MUSIC_BOX: FormatConfig = FormatConfig {
    name: "MusicBox",
    signature: None,
    text: TextVariant::ShiftJis,
    export: TextEncoding::ShiftJis,
    layout: Layout::Slots(SlotLayout {
        count_offset: 8,
        start_field: 0x14,
        start_bias: 4,
        stride: 0x48,
        max_len: 0x3E,
    }),
};

/// Summon Night X script (a DPK child).
pub const DTX: FormatConfig = FormatConfig {
    name: "DTX",
    signature: None,
    text: TextVariant::Summon,
    export: TextEncoding::ShiftJis,
    layout: Layout::Pointers(PointerLayout {
        start: TableStart::AfterRecords {
            records_count_offset: 0,
            records_offset: 8,
            record_len: 8,
            count_offset: 4,
        },
        entry: Entry::Offset { pad: NullPad::Even },
        base: OffsetBase::Strings,
    }),
};

const fn rec(record_len: usize, pointers: &'static [usize]) -> RecordSection {
    RecordSection {
        record_len,
        pointers,
    }
}

/// Section geometry of Mamoru-kun parameter files.
pub const PARM_SECTIONS: &[RecordSection] = &[
    rec(0x0C, &[4]),
    rec(0x4C, &[4, 0x48]),
    rec(0x10, &[4]),
    rec(0x2C, &[4]),
    rec(0x28, &[]),
    rec(0x10, &[4]),
    rec(0x18, &[4, 0x10, 0x14]),
    rec(0x10, &[4]),
    rec(0x10, &[4, 0x0C]),
    rec(0x10, &[4]),
    rec(0x10, &[4]),
    rec(0x10, &[4]),
    rec(0x1C, &[4]),
    rec(0x10, &[4]),
    rec(0x10, &[4]),
    rec(0x10, &[4]),
    rec(0x14, &[4]),
    rec(0x18, &[4, 0x10, 0x14]),
    rec(0x18, &[4, 0x14]),
    rec(0x28, &[4, 0x24]),
    rec(0x5C, &[4, 8, 0x54, 0x58]),
    rec(0x30, &[4, 0x2C]),
    rec(0x28, &[4, 0x24]),
    rec(0x10, &[]),
    rec(0x18, &[4, 0x14]),
    rec(0x10, &[4, 0x0C]),
];

/// Mamoru-kun parameter file.
pub const PARM: FormatConfig = FormatConfig {
    name: "PARM",
    signature: None,
    text: TextVariant::Mamoru,
    export: TextEncoding::ShiftJis,
    layout: Layout::Records(RecordLayout {
        header_len: 8,
        align: 4,
        sections: PARM_SECTIONS,
    }),
};

/// MapleStory DS message file (an NXARC child).
pub const GMM: FormatConfig = FormatConfig {
    name: "GMM",
    signature: None,
    text: TextVariant::Maple,
    export: TextEncoding::Utf16Le,
    layout: Layout::Messages(MessageLayout {
        total_len_offset: 0,
        count_offset: 2,
        table_offset: 4,
        entry_len: 12,
        pointer_field: 8,
    }),
};

/// Tingle language database.
pub const LANGUAGE_DB: FormatConfig = FormatConfig {
    name: "LanguageDB",
    signature: None,
    text: TextVariant::Tingle,
    export: TextEncoding::Utf16Le,
    layout: Layout::Blocks(BlockLayout {
        table_count_offset: 0,
        string_count_offset: 2,
        header_len: 0x80,
        directory: 0x10,
        record_len: 8,
        length_field: 6,
        text_align: 16,
    }),
};

/// Every preset, signed ones first.
pub const ALL: &[FormatConfig] = &[
    NIDX,
    DNGC,
    DMST,
    DCPB,
    DMSB,
    MUSIC_BOX,
    DTX,
    PARM,
    GMM,
    LANGUAGE_DB,
];

/// Look up a preset by name, ignoring ASCII case.
pub fn by_name(name: &str) -> Option<FormatConfig> {
    ALL.iter().copied().find(|c| c.name.eq_ignore_ascii_case(name))
}

/// The signed preset whose signature starts `data`.
///
/// Unsigned formats cannot be told apart by content and are never returned.
pub fn detect(data: &[u8]) -> Option<FormatConfig> {
    let found = read_u32(data, 0).ok()?;
    ALL.iter().copied().find(|c| c.signature == Some(found))
}
