//! ARIB STD-B24 §7 8-bit character stream decoder.
//!
//! ISO 2022-style code-element machinery: four slots G0..G3, two invocation
//! pointers GL/GR, locking and single shifts, escape designations, and the
//! ARIB control sets C0/C1. Output is UTF-8; the Kanji path converts JIS
//! row-cell codes through the Shift-JIS offset formula and transcodes with
//! `encoding_rs`.

pub mod gaiji;
mod macros;

use encoding_rs::SHIFT_JIS;

// G set finals
const KANJI: u8 = 0x42;
const ASCII: u8 = 0x4A;
const HIRA: u8 = 0x30;
const KANA: u8 = 0x31;
const MOSAIC_A: u8 = 0x32;
const MOSAIC_B: u8 = 0x33;
const MOSAIC_C: u8 = 0x34;
const MOSAIC_D: u8 = 0x35;
const PROPORTIONAL_ASCII: u8 = 0x36;
const PROPORTIONAL_HIRA: u8 = 0x37;
const PROPORTIONAL_KANA: u8 = 0x38;
const JIS_X0201_KANA: u8 = 0x49;
const JIS_KANJI_1: u8 = 0x39;
const JIS_KANJI_2: u8 = 0x3A;
const SYMBOL: u8 = 0x3B;

// C0
const C0_APR: u8 = 0x0D;
const C0_LS1: u8 = 0x0E;
const C0_LS0: u8 = 0x0F;
const C0_PAPF: u8 = 0x16;
const C0_SS2: u8 = 0x19;
const C0_ESC: u8 = 0x1B;
const C0_APS: u8 = 0x1C;
const C0_SS3: u8 = 0x1D;
const SP: u8 = 0x20;

// C1
const C1_SSZ: u8 = 0x88;
const C1_MSZ: u8 = 0x89;
const C1_NSZ: u8 = 0x8A;
const C1_SZX: u8 = 0x8B;
const C1_COL: u8 = 0x90;
const C1_FLC: u8 = 0x91;
const C1_CDC: u8 = 0x92;
const C1_POL: u8 = 0x93;
const C1_WMM: u8 = 0x94;
const C1_MACRO: u8 = 0x95;
const C1_HLC: u8 = 0x97;
const C1_RPC: u8 = 0x98;
const C1_CSI: u8 = 0x9B;
const C1_TIME: u8 = 0x9D;

const MACRO_TERMINATOR: u8 = 0x4F;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeSetClass {
    GSet,
    Drcs,
}

/// One of the four code-element slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CodeElement {
    class: CodeSetClass,
    code_set: u8,
    bytes_per_char: u8,
}

/// Decodes one ARIB text field with a fresh decoder.
pub fn decode(buf: &[u8]) -> String {
    TextDecoder::new().decode(buf)
}

/// Stateful decoder; a plain value, reset at the start of every field.
pub struct TextDecoder {
    elements: [CodeElement; 4],
    gl: usize,
    gr: usize,
    middle_size: bool,
    out: String,
}

impl Default for TextDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl TextDecoder {
    pub fn new() -> Self {
        let mut d = TextDecoder {
            elements: [CodeElement {
                class: CodeSetClass::GSet,
                code_set: KANJI,
                bytes_per_char: 2,
            }; 4],
            gl: 0,
            gr: 2,
            middle_size: false,
            out: String::new(),
        };
        d.reset();
        d
    }

    /// Restores the canonical G0..G3/GL/GR assignment.
    pub fn reset(&mut self) {
        let gset = |code_set, bytes_per_char| CodeElement {
            class: CodeSetClass::GSet,
            code_set,
            bytes_per_char,
        };
        self.elements = [gset(KANJI, 2), gset(ASCII, 1), gset(HIRA, 1), gset(KANA, 1)];
        self.gl = 0; // LS0
        self.gr = 2; // LS2R
        self.middle_size = false;
        self.out.clear();
    }

    /// Decodes a complete text field and returns the accumulated string.
    pub fn decode(&mut self, buf: &[u8]) -> String {
        self.reset();
        self.run(buf);
        std::mem::take(&mut self.out)
    }

    fn run(&mut self, buf: &[u8]) {
        let mut i = 0usize;
        while i < buf.len() {
            let consumed = match buf[i] {
                0x00..=0x20 => self.decode_c0(&buf[i..]),
                0x21..=0x7E => self.decode_graphic(&buf[i..], self.elements[self.gl]),
                0x7F..=0xA0 => self.decode_c1(&buf[i..]),
                0xA1..=0xFE => self.decode_graphic(&buf[i..], self.elements[self.gr]),
                0xFF => 1,
            };
            i += consumed.max(1);
        }
    }

    fn decode_c0(&mut self, buf: &[u8]) -> usize {
        match buf[0] {
            C0_APR => {
                self.out.push_str("\r\n");
                1
            }
            C0_LS1 => {
                self.gl = 1;
                1
            }
            C0_LS0 => {
                self.gl = 0;
                1
            }
            C0_PAPF => 2,
            C0_APS => 3,
            C0_SS2 => self.decode_single_shift(buf, 2),
            C0_SS3 => self.decode_single_shift(buf, 3),
            C0_ESC => self.decode_esc(buf),
            SP => {
                self.out.push(if self.middle_size { ' ' } else { '　' });
                1
            }
            _ => 1,
        }
    }

    fn decode_single_shift(&mut self, buf: &[u8], element: usize) -> usize {
        if buf.len() < 2 {
            return buf.len();
        }
        1 + self.decode_graphic(&buf[1..], self.elements[element])
    }

    fn decode_esc(&mut self, buf: &[u8]) -> usize {
        if buf.len() < 2 {
            return buf.len();
        }
        match buf[1] {
            // Table 7-1: invocation of code elements
            0x6E => {
                self.gl = 2; // LS2
                2
            }
            0x6F => {
                self.gl = 3; // LS3
                2
            }
            0x7E => {
                self.gr = 1; // LS1R
                2
            }
            0x7D => {
                self.gr = 2; // LS2R
                2
            }
            0x7C => {
                self.gr = 3; // LS3R
                2
            }

            // Table 7-2: designation of graphic sets
            0x28..=0x2B => {
                let index = (buf[1] - 0x28) as usize;
                if buf.len() < 3 {
                    return buf.len();
                }
                if buf[2] == 0x20 {
                    // ESC 0x2? 0x20 F : 1-byte DRCS
                    if buf.len() < 4 {
                        return buf.len();
                    }
                    self.elements[index] = CodeElement {
                        class: CodeSetClass::Drcs,
                        code_set: buf[3],
                        bytes_per_char: 1,
                    };
                    4
                } else {
                    // ESC 0x2? F : 1-byte G set
                    self.elements[index] = CodeElement {
                        class: CodeSetClass::GSet,
                        code_set: buf[2],
                        bytes_per_char: 1,
                    };
                    3
                }
            }
            0x24 => {
                if buf.len() < 3 {
                    return buf.len();
                }
                if !(0x28..=0x2B).contains(&buf[2]) {
                    // ESC 0x24 F : 2-byte G set into G0
                    self.elements[0] = CodeElement {
                        class: CodeSetClass::GSet,
                        code_set: buf[2],
                        bytes_per_char: 2,
                    };
                    3
                } else {
                    let index = (buf[2] - 0x28) as usize;
                    if buf.len() < 4 {
                        return buf.len();
                    }
                    if buf[3] == 0x20 {
                        // ESC 0x24 0x2? 0x20 F : 2-byte DRCS
                        if buf.len() < 5 {
                            return buf.len();
                        }
                        self.elements[index] = CodeElement {
                            class: CodeSetClass::Drcs,
                            code_set: buf[4],
                            bytes_per_char: 2,
                        };
                        5
                    } else {
                        // ESC 0x24 0x2? F : 2-byte G set into G1..G3
                        self.elements[index] = CodeElement {
                            class: CodeSetClass::GSet,
                            code_set: buf[3],
                            bytes_per_char: 2,
                        };
                        4
                    }
                }
            }
            _ => 1,
        }
    }

    fn decode_c1(&mut self, buf: &[u8]) -> usize {
        match buf[0] {
            C1_SSZ => 1,
            C1_MSZ => {
                self.middle_size = true;
                1
            }
            C1_NSZ => {
                self.middle_size = false;
                1
            }
            C1_SZX | C1_COL | C1_FLC | C1_POL | C1_WMM | C1_HLC | C1_RPC => 2,
            C1_CDC => {
                if buf.len() >= 2 && (buf[1] == 0x40 || buf[1] == 0x4F) {
                    2
                } else {
                    3
                }
            }
            C1_TIME => {
                // only the 0x20-prefixed wait form has a fixed length; other
                // forms consume a single byte so the loop keeps moving
                if buf.len() >= 2 && buf[1] == 0x20 {
                    3
                } else {
                    1
                }
            }
            C1_MACRO => match buf.iter().skip(1).position(|&b| b == MACRO_TERMINATOR) {
                Some(p) => 2 + p,
                None => buf.len(),
            },
            C1_CSI => self.decode_csi(buf),
            _ => 1,
        }
    }

    /// CSI: parameter bytes up to 0x20, then one final character.
    fn decode_csi(&mut self, buf: &[u8]) -> usize {
        match buf.iter().skip(1).position(|&b| b == 0x20) {
            Some(p) => {
                // 1 (CSI) + p parameters + 0x20 + final byte
                (2 + p + 1).min(buf.len())
            }
            None => buf.len(),
        }
    }

    fn decode_graphic(&mut self, buf: &[u8], element: CodeElement) -> usize {
        let n = element.bytes_per_char as usize;
        if buf.len() < n {
            return buf.len();
        }

        match element.class {
            CodeSetClass::GSet => {
                let c = buf[0] & 0x7F;
                match element.code_set {
                    KANJI | JIS_KANJI_1 | JIS_KANJI_2 | SYMBOL => {
                        self.emit_kanji(c, buf[1] & 0x7F);
                    }
                    ASCII | PROPORTIONAL_ASCII => {
                        if self.middle_size {
                            self.out.push(c as char);
                        } else {
                            // 0x21..0x7E maps onto the full-width forms block
                            self.push_u32(0xFF01 + (c - 0x21) as u32);
                        }
                    }
                    HIRA | PROPORTIONAL_HIRA => self.emit_hiragana(c),
                    KANA | PROPORTIONAL_KANA => self.emit_katakana(c),
                    JIS_X0201_KANA => self.push_u32(0xFF61 + (c - 0x21) as u32),
                    MOSAIC_A | MOSAIC_B | MOSAIC_C | MOSAIC_D => {}
                    other => {
                        log::debug!("unknown graphic set {other:#04x}");
                    }
                }
            }
            CodeSetClass::Drcs => {
                // DRCS glyphs are not rendered; bytes 0x60..0x6F replay the
                // default macros
                let c = buf[0] & 0x7F;
                if (0x60..=0x6F).contains(&c) {
                    self.run(macros::DEFAULT_MACROS[(c - 0x60) as usize]);
                }
            }
        }

        n
    }

    fn emit_kanji(&mut self, first: u8, second: u8) {
        if first >= 0x75 && second >= 0x21 {
            let code = (first as u16) << 8 | second as u16;
            if let Some(replacement) = gaiji::lookup(code) {
                self.out.push_str(replacement);
            }
            return;
        }

        let sjis = jis_to_sjis(first, second);
        let (s, _, _) = SHIFT_JIS.decode(&sjis);
        self.out.push_str(&s);
    }

    fn emit_hiragana(&mut self, c: u8) {
        match c {
            0x21..=0x73 => self.push_u32(0x3041 + (c - 0x21) as u32),
            0x74..=0x76 => self.out.push('　'),
            0x77 => self.out.push('ゝ'),
            0x78 => self.out.push('ゞ'),
            0x79 => self.out.push('ー'),
            0x7A => self.out.push('。'),
            0x7B => self.out.push('「'),
            0x7C => self.out.push('」'),
            0x7D => self.out.push('、'),
            0x7E => self.out.push('・'),
            _ => {}
        }
    }

    fn emit_katakana(&mut self, c: u8) {
        match c {
            0x21..=0x76 => self.push_u32(0x30A1 + (c - 0x21) as u32),
            0x77 => self.out.push('ヽ'),
            0x78 => self.out.push('ヾ'),
            0x79 => self.out.push('ー'),
            0x7A => self.out.push('。'),
            0x7B => self.out.push('「'),
            0x7C => self.out.push('」'),
            0x7D => self.out.push('、'),
            0x7E => self.out.push('・'),
            _ => {}
        }
    }

    fn push_u32(&mut self, cp: u32) {
        if let Some(ch) = char::from_u32(cp) {
            self.out.push(ch);
        }
    }
}

/// JIS X 0208 row-cell to Shift-JIS, the standard offset computation.
fn jis_to_sjis(first: u8, second: u8) -> [u8; 2] {
    let cell = if first & 1 != 0 {
        0x1F + (second > 0x5F) as u8
    } else {
        0x7E
    };
    let s = second.wrapping_add(cell);

    let half_row = (first.wrapping_sub(0x21)) >> 1;
    let row_base = if half_row >= 0x1F { 0xC1 } else { 0x81 };
    let f = half_row.wrapping_add(row_base);

    [f, s]
}
