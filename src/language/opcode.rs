//! Byte assignments of the gs2 opcode table.
//!
//! Every opcode is listed once in [`MNEMONICS`] with all of its
//! whitespace-separated aliases; the first alias is the canonical spelling
//! used when printing programs back out.

pub const NOP: u8 = 0x00;
pub const BYTE_LITERAL: u8 = 0x01;
pub const SHORT_LITERAL: u8 = 0x02;
pub const LONG_LITERAL: u8 = 0x03;
pub const STRING_OPEN: u8 = 0x04;
pub const STRING_PLAIN: u8 = 0x05;
pub const STRING_ARRAY: u8 = 0x06;
/// Separates the parts of a string literal; also opens a one-character string.
pub const STRING_SEPARATOR: u8 = 0x07;
pub const CHAR_LITERAL: u8 = 0x07;
pub const BLOCK_OPEN: u8 = 0x08;
pub const BLOCK_CLOSE: u8 = 0x09;

pub const NOT_TAIL: u8 = 0x22;
pub const DOUBLE_LINES: u8 = 0x2a;
pub const SQUARE_WORDS: u8 = 0x2c;
pub const MAP: u8 = 0x34;
pub const FILTER: u8 = 0x35;
pub const BOTH: u8 = 0x38;
pub const SHOW_LINES: u8 = 0x54;
pub const SHOW_WORDS: u8 = 0x55;
pub const DUMP: u8 = 0x90;

pub const STRING_PRINTF: u8 = 0x9b;
pub const STRING_REGEX_MATCH: u8 = 0x9c;
pub const STRING_REGEX_SUB: u8 = 0x9d;
pub const STRING_REGEX_FIND: u8 = 0x9e;
pub const STRING_REGEX_SPLIT: u8 = 0x9f;

pub const STRING_TERMINATORS: [u8; 7] = [
    STRING_PLAIN,
    STRING_ARRAY,
    STRING_PRINTF,
    STRING_REGEX_MATCH,
    STRING_REGEX_SUB,
    STRING_REGEX_FIND,
    STRING_REGEX_SPLIT,
];

pub const JUNK_BASE: u8 = 0xa0;
pub const ZIP: u8 = 0xb0;
pub const ZIPWITH: u8 = 0xb1;
pub const COUNTER: u8 = 0xb2;

pub const REGISTER_SAVE: u8 = 0xc8;
pub const REGISTER_POP: u8 = 0xcc;
pub const REGISTER_PUSH: u8 = 0xd0;
pub const REGISTER_NIP: u8 = 0xd4;
pub const REGISTER_TUCK: u8 = 0xd8;
pub const REGISTER_SHOW: u8 = 0xdc;

pub const QUICK_BLOCK: u8 = 0xe0;
pub const QUICK_MAP: u8 = 0xe8;
pub const QUICK_FILTER: u8 = 0xf0;
pub const QUICK_BOTH: u8 = 0xf8;
pub const ZIPWITH1: u8 = 0xee;
pub const ZIPWITH2: u8 = 0xef;
pub const DUMP_MAP: u8 = 0xf6;
pub const DUMP_FILTER: u8 = 0xf7;
pub const MAP_REST: u8 = 0xfe;
pub const FILTER_REST: u8 = 0xff;

pub const MODE_LINES: u8 = 0x30;
pub const MODE_WORDS: u8 = 0x31;
pub const MODE_LINES_SKIP_FIRST: u8 = 0x32;

pub static MODE_MNEMONICS: &[(&str, u8)] = &[
    ("line-mode", MODE_LINES),
    ("word-mode", MODE_WORDS),
    ("line-mode-skip-first", MODE_LINES_SKIP_FIRST),
];

pub static MNEMONICS: &[(&str, u8)] = &[
    ("nop", 0x00),
    ("{", 0x08),
    ("}", 0x09),
    ("new-line", 0x0a),
    ("empty-list", 0x0b),
    ("empty-block", 0x0c),
    ("space", 0x0d),
    ("make-array", 0x0e),
    ("exit", 0x0f),
    ("negate reverse eval", 0x20),
    ("bnot head", 0x21),
    ("not tail", 0x22),
    ("abs init", 0x23),
    ("digits last", 0x24),
    ("random", 0x25),
    ("dec left-uncons", 0x26),
    ("inc right-uncons", 0x27),
    ("sign min", 0x28),
    ("thousand max", 0x29),
    ("double lines", 0x2a),
    ("half unlines", 0x2b),
    ("square words", 0x2c),
    ("sqrt unwords", 0x2d),
    ("range length", 0x2e),
    ("range1 sort", 0x2f),
    ("+ add cat", 0x30),
    ("- sub diff", 0x31),
    ("* mul join times fold", 0x32),
    ("/ div chunks split each", 0x33),
    ("% mod step clean-split map", 0x34),
    ("& and get when filter", 0x35),
    ("| or unless", 0x36),
    ("^ xor concatmap", 0x37),
    ("smallest both", 0x38),
    ("biggest", 0x39),
    ("clamp", 0x3a),
    ("gcd take", 0x3c),
    ("lcm drop", 0x3d),
    ("pow index", 0x3e),
    ("log member", 0x3f),
    ("dup", 0x40),
    ("dup2", 0x41),
    ("swap", 0x42),
    ("rot", 0x43),
    ("rrot", 0x44),
    ("over", 0x45),
    ("nip", 0x46),
    ("tuck", 0x47),
    ("2dup", 0x48),
    ("pick", 0x49),
    ("roll", 0x4a),
    ("get-stack", 0x4b),
    ("leave-top", 0x4c),
    ("itemize", 0x4d),
    ("rrange", 0x4e),
    ("crange", 0x4f),
    ("pop", 0x50),
    ("pop2", 0x51),
    ("show", 0x52),
    ("map-show", 0x53),
    ("show-lines", 0x54),
    ("show-words", 0x55),
    ("read-num", 0x56),
    ("read-nums", 0x57),
    ("show-line", 0x58),
    ("show-space", 0x59),
    ("show-comma", 0x5a),
    ("show-python", 0x5b),
    ("ljust", 0x5c),
    ("center", 0x5d),
    ("rjust", 0x5e),
    ("inspect", 0x5f),
    ("logical-and", 0x60),
    ("logical-or", 0x61),
    ("divides left-cons", 0x62),
    ("divmod group", 0x63),
    ("sum even", 0x64),
    ("product odd", 0x65),
    ("fizzbuzz", 0x66),
    ("popcnt", 0x67),
    ("hello", 0x68),
    ("base", 0x69),
    ("binary", 0x6a),
    ("is-prime", 0x6b),
    ("primes", 0x6c),
    ("scan", 0x6d),
    ("factors", 0x6e),
    ("totient", 0x6f),
    ("lt", 0x70),
    ("eq", 0x71),
    ("gt", 0x72),
    ("ge", 0x73),
    ("ne", 0x74),
    ("le", 0x75),
    ("cmp", 0x76),
    ("sorted", 0x77),
    ("shift-left inits", 0x78),
    ("shift-right tails", 0x79),
    ("digit-left enumerate", 0x7a),
    ("digit-right", 0x7b),
    ("power-of-2", 0x7c),
    ("power-of-10", 0x7d),
    ("sub-power-of-2", 0x7e),
    ("sub-power-of-10", 0x7f),
    ("pair", 0x80),
    ("copies", 0x81),
    ("take-end", 0x82),
    ("cartesian-product", 0x83),
    ("uppercase-alphabet", 0x84),
    ("lowercase-alphabet", 0x85),
    ("ascii-digits", 0x86),
    ("printable-ascii", 0x87),
    ("is-alnum", 0x88),
    ("is-alpha", 0x89),
    ("is-digit", 0x8a),
    ("is-lower", 0x8b),
    ("is-space", 0x8c),
    ("is-upper", 0x8d),
    ("is-printable", 0x8e),
    ("is-hexdigit", 0x8f),
    ("dump", 0x90),
    ("compress", 0x91),
    ("select", 0x92),
    ("permutations", 0x93),
    ("fold-product", 0x94),
    ("repeat-product", 0x95),
    ("combinations", 0x96),
    ("combinations-with-replacement", 0x97),
    ("pairwise", 0x98),
    ("flatten", 0x99),
    ("transpose", 0x9a),
    ("zip", 0xb0),
    ("zipwith", 0xb1),
    ("counter", 0xb2),
    ("z1 zipwith1", 0xee),
    ("z2 zipwith2", 0xef),
    ("dm1 dump-map1", 0xf6),
    ("df1 dump-filter1", 0xf7),
    ("m: map-rest", 0xfe),
    ("f: filter-rest", 0xff),
];

static JUNK_NAMES: [&str; 16] = [
    "@0", "@1", "@2", "@3", "@4", "@5", "@6", "@7", "@8", "@9", "@10", "@11", "@12", "@13",
    "@14", "@15",
];

static REGISTER_NAMES: [[&str; 4]; 6] = [
    ["save-a", "save-b", "save-c", "save-d"],
    ["pop-a", "pop-b", "pop-c", "pop-d"],
    ["push-a", "push-b", "push-c", "push-d"],
    ["nip-a", "nip-b", "nip-c", "nip-d"],
    ["tuck-a", "tuck-b", "tuck-c", "tuck-d"],
    ["show-a", "show-b", "show-c", "show-d"],
];

static QUICK_NAMES: [[&str; 6]; 4] = [
    ["b1", "b2", "b3", "b4", "b5", "b6"],
    ["m1", "m2", "m3", "m4", "m5", "m6"],
    ["f1", "f2", "f3", "f4", "f5", "f6"],
    ["t1", "t2", "t3", "t4", "t5", "t6"],
];

/// Full alias list of an opcode, e.g. `"negate reverse eval"`.
pub fn name(op: u8) -> &'static str {
    match op {
        0x01 => "push-byte",
        0x02 => "push-short",
        0x03 => "push-long",
        0x04 => "string",
        0x07 => "char",
        0x10..=0x1f => "push-number",
        0xa0..=0xaf => JUNK_NAMES[(op - JUNK_BASE) as usize],
        0xc8..=0xdf => REGISTER_NAMES[((op - REGISTER_SAVE) / 4) as usize][(op & 3) as usize],
        _ if quick_block(op).is_some() => {
            QUICK_NAMES[((op >> 3) & 3) as usize][(op & 7) as usize]
        }
        _ => MNEMONICS
            .iter()
            .find(|(_, byte)| *byte == op)
            .map(|(names, _)| *names)
            .unwrap_or("unknown"),
    }
}

/// First alias of an opcode, the spelling the disassembler prints.
pub fn primary_name(op: u8) -> &'static str {
    name(op).split_whitespace().next().unwrap_or("unknown")
}

/// Combinator appended after a quick block: none, map, filter or both.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuickCombinator {
    None,
    Map,
    Filter,
    Both,
}

impl QuickCombinator {
    pub fn opcode(self) -> Option<u8> {
        match self {
            QuickCombinator::None => None,
            QuickCombinator::Map => Some(MAP),
            QuickCombinator::Filter => Some(FILTER),
            QuickCombinator::Both => Some(BOTH),
        }
    }
}

/// Decodes a quick-block byte `0b111CCNNN`: `NNN + 1` items (1-6) wrapped,
/// then combinator `CC`.
pub fn quick_block(op: u8) -> Option<(usize, QuickCombinator)> {
    if !(QUICK_BLOCK..=0xfd).contains(&op) || op & 7 >= 6 {
        return None;
    }
    let combinator = match (op >> 3) & 3 {
        0 => QuickCombinator::None,
        1 => QuickCombinator::Map,
        2 => QuickCombinator::Filter,
        _ => QuickCombinator::Both,
    };
    Some(((op & 7) as usize + 1, combinator))
}

pub fn is_string_terminator(byte: u8) -> bool {
    STRING_TERMINATORS.contains(&byte)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quick_block_bits_select_count_and_combinator() {
        assert_eq!(quick_block(0xe0), Some((1, QuickCombinator::None)));
        assert_eq!(quick_block(0xe9), Some((2, QuickCombinator::Map)));
        assert_eq!(quick_block(0xf5), Some((6, QuickCombinator::Filter)));
        assert_eq!(quick_block(0xfd), Some((6, QuickCombinator::Both)));
        assert_eq!(quick_block(0xee), None);
        assert_eq!(quick_block(0xf7), None);
        assert_eq!(quick_block(0xfe), None);
        assert_eq!(quick_block(0x34), None);
    }

    #[test]
    fn names_cover_generated_families() {
        assert_eq!(name(0x20), "negate reverse eval");
        assert_eq!(primary_name(0x32), "*");
        assert_eq!(name(0xa3), "@3");
        assert_eq!(name(0xd5), "nip-b");
        assert_eq!(name(0xeb), "m4");
        assert_eq!(name(0x3b), "unknown");
    }
}
