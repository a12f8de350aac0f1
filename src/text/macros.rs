//! Default macro definitions, ARIB STD-B24 table 7-20.
//!
//! Bytes 0x60..0x6F received under a DRCS code element replay one of these
//! sequences, each of which redesignates G0..G3 and re-invokes GL/GR.

const ESC: u8 = 0x1B;
const LS0: u8 = 0x0F;

const KANJI: u8 = 0x42;
const ASCII: u8 = 0x4A;
const HIRA: u8 = 0x30;
const KANA: u8 = 0x31;
const MOSAIC_A: u8 = 0x32;
const MOSAIC_B: u8 = 0x33;
const MOSAIC_C: u8 = 0x34;
const MOSAIC_D: u8 = 0x35;
const MACRO: u8 = 0x70;
const DRCS_1: u8 = 0x41;
const DRCS_2: u8 = 0x42;
const DRCS_3: u8 = 0x43;
const DRCS_4: u8 = 0x44;
const DRCS_5: u8 = 0x45;
const DRCS_6: u8 = 0x46;
const DRCS_7: u8 = 0x47;
const DRCS_8: u8 = 0x48;
const DRCS_9: u8 = 0x49;
const DRCS_10: u8 = 0x4A;
const DRCS_11: u8 = 0x4B;
const DRCS_12: u8 = 0x4C;
const DRCS_13: u8 = 0x4D;
const DRCS_14: u8 = 0x4E;
const DRCS_15: u8 = 0x4F;

pub static DEFAULT_MACROS: [&[u8]; 16] = [
    &[ESC, 0x24, KANJI, ESC, 0x29, ASCII, ESC, 0x2A, HIRA, ESC, 0x2B, 0x20, MACRO, LS0, ESC, 0x7D],
    &[ESC, 0x24, KANJI, ESC, 0x29, KANA, ESC, 0x2A, HIRA, ESC, 0x2B, 0x20, MACRO, LS0, ESC, 0x7D],
    &[ESC, 0x24, KANJI, ESC, 0x29, 0x20, DRCS_1, ESC, 0x2A, HIRA, ESC, 0x2B, 0x20, MACRO, LS0, ESC, 0x7D],
    &[ESC, 0x28, MOSAIC_A, ESC, 0x29, MOSAIC_C, ESC, 0x2A, MOSAIC_D, ESC, 0x2B, 0x20, MACRO, LS0, ESC, 0x7D],
    &[ESC, 0x28, MOSAIC_A, ESC, 0x29, MOSAIC_B, ESC, 0x2A, MOSAIC_D, ESC, 0x2B, 0x20, MACRO, LS0, ESC, 0x7D],
    &[ESC, 0x28, MOSAIC_A, ESC, 0x29, 0x20, DRCS_1, ESC, 0x2A, MOSAIC_D, ESC, 0x2B, 0x20, MACRO, LS0, ESC, 0x7D],
    &[ESC, 0x28, 0x20, DRCS_1, ESC, 0x29, 0x20, DRCS_2, ESC, 0x2A, 0x20, DRCS_3, ESC, 0x2B, 0x20, MACRO, LS0, ESC, 0x7D],
    &[ESC, 0x28, 0x20, DRCS_4, ESC, 0x29, 0x20, DRCS_5, ESC, 0x2A, 0x20, DRCS_6, ESC, 0x2B, 0x20, MACRO, LS0, ESC, 0x7D],
    &[ESC, 0x28, 0x20, DRCS_7, ESC, 0x29, 0x20, DRCS_8, ESC, 0x2A, 0x20, DRCS_9, ESC, 0x2B, 0x20, MACRO, LS0, ESC, 0x7D],
    &[ESC, 0x28, 0x20, DRCS_10, ESC, 0x29, 0x20, DRCS_11, ESC, 0x2A, 0x20, DRCS_12, ESC, 0x2B, 0x20, MACRO, LS0, ESC, 0x7D],
    &[ESC, 0x28, 0x20, DRCS_13, ESC, 0x29, 0x20, DRCS_14, ESC, 0x2A, 0x20, DRCS_15, ESC, 0x2B, 0x20, MACRO, LS0, ESC, 0x7D],
    &[ESC, 0x24, KANJI, ESC, 0x29, 0x20, DRCS_2, ESC, 0x2A, HIRA, ESC, 0x2B, 0x20, MACRO, LS0, ESC, 0x7D],
    &[ESC, 0x24, KANJI, ESC, 0x29, 0x20, DRCS_3, ESC, 0x2A, HIRA, ESC, 0x2B, 0x20, MACRO, LS0, ESC, 0x7D],
    &[ESC, 0x24, KANJI, ESC, 0x29, 0x20, DRCS_4, ESC, 0x2A, HIRA, ESC, 0x2B, 0x20, MACRO, LS0, ESC, 0x7D],
    &[ESC, 0x28, KANA, ESC, 0x29, HIRA, ESC, 0x2A, ASCII, ESC, 0x2B, 0x20, MACRO, LS0, ESC, 0x7D],
    &[ESC, 0x28, ASCII, ESC, 0x29, MOSAIC_A, ESC, 0x2A, 0x20, DRCS_1, ESC, 0x2B, 0x20, MACRO, LS0, ESC, 0x7D],
];
