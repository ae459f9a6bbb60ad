//! Reference FIC data for tests
//!
//! The FIBs carry CRCs computed by an independent CRC-16/GENIBUS routine, and the FIC block was
//! produced by a separate encoder following EN 300 401 clauses 10 and 11, so none of these
//! bytes come from the code under test.

/// FIG 0/0 (EId `0xCE15`, CIF count 4999) and FIG 1/0 "BBC National DAB"
pub(crate) const ENSEMBLE_FIB: [u8; 32] = [
    0x05, 0x00, 0xCE, 0x15, 0x13, 0xF9, 0x35, 0x00, 0xCE, 0x15, 0x42, 0x42,
    0x43, 0x20, 0x4E, 0x61, 0x74, 0x69, 0x6F, 0x6E, 0x61, 0x6C, 0x20, 0x44,
    0x41, 0x42, 0xE0, 0x0F, 0xFF, 0xFF, 0x81, 0x77,
];

/// FIG 1/1 "BBC Radio 4" (SId `0xC224`) and FIG 0/1 with UEP sub-channels 1 and 2
pub(crate) const RADIO_4_FIB: [u8; 32] = [
    0x35, 0x01, 0xC2, 0x24, 0x42, 0x42, 0x43, 0x20, 0x52, 0x61, 0x64, 0x69,
    0x6F, 0x20, 0x34, 0x20, 0x20, 0x20, 0x20, 0x20, 0x0F, 0xE0, 0x07, 0x01,
    0x04, 0x00, 0x23, 0x08, 0x60, 0x23, 0x90, 0xF4,
];

/// FIG 1/1 "BBC Radio 2" (SId `0xC222`) and FIG 0/2 binding it to sub-channel 2
pub(crate) const RADIO_2_FIB: [u8; 32] = [
    0x35, 0x01, 0xC2, 0x22, 0x42, 0x42, 0x43, 0x20, 0x52, 0x61, 0x64, 0x69,
    0x6F, 0x20, 0x32, 0x20, 0x20, 0x20, 0x20, 0x20, 0x0F, 0xE0, 0x06, 0x02,
    0xC2, 0x22, 0x01, 0x3F, 0x0A, 0xFF, 0xBB, 0xAF,
];

/// Code bits of a mode I FIC block carrying the three FIBs above, after energy dispersal,
/// convolutional encoding and puncturing, MSB first
pub(crate) const MODE_I_FIC_BLOCK: [u8; 288] = [
    0x00, 0x00, 0x3B, 0x34, 0x68, 0x16, 0xA0, 0x0C, 0xD3, 0xFE, 0x26, 0x5D,
    0x07, 0x19, 0xC7, 0x65, 0x49, 0xF5, 0xC9, 0x65, 0x6C, 0x70, 0x3E, 0x4B,
    0x4B, 0xBD, 0xCF, 0x21, 0x69, 0xC0, 0x1E, 0x51, 0xEC, 0x69, 0x99, 0x8B,
    0xA7, 0x1B, 0xE5, 0x3F, 0x50, 0x45, 0x5A, 0x17, 0x7A, 0xEF, 0x8C, 0xD4,
    0x98, 0xD2, 0x18, 0x7F, 0x2B, 0x27, 0x25, 0xDC, 0x9E, 0x2D, 0x59, 0x46,
    0xA3, 0x37, 0x03, 0xFA, 0x92, 0xE1, 0x52, 0x73, 0xB8, 0xC9, 0x02, 0x16,
    0x82, 0x5F, 0x26, 0x0B, 0x41, 0x2F, 0x8D, 0x2D, 0x0C, 0x37, 0x2A, 0x81,
    0x16, 0xA2, 0x67, 0xF2, 0xF6, 0x1F, 0xD7, 0x25, 0xAE, 0x85, 0xD1, 0x93,
    0xF9, 0xA6, 0x1E, 0x29, 0x65, 0x50, 0xCD, 0xB9, 0xBE, 0x6D, 0xC2, 0xDC,
    0x0C, 0x56, 0x22, 0x97, 0x27, 0xB7, 0x04, 0xB5, 0x65, 0xF6, 0x24, 0x07,
    0xAB, 0xC4, 0x88, 0x8E, 0x9F, 0xA8, 0x3F, 0x40, 0x89, 0xBD, 0x97, 0x3E,
    0x56, 0x39, 0xFA, 0xD4, 0x0F, 0x57, 0x65, 0xCE, 0x4C, 0xC2, 0x53, 0xCE,
    0x30, 0x4B, 0xE3, 0x55, 0x1C, 0x2C, 0x56, 0x28, 0xD3, 0xDF, 0xB1, 0x5F,
    0x1E, 0x29, 0x72, 0x94, 0x1D, 0xB9, 0x37, 0x35, 0x59, 0x56, 0x37, 0x37,
    0x3C, 0x8A, 0x8F, 0xEB, 0xA0, 0x09, 0x86, 0x14, 0xBA, 0x21, 0x78, 0xD2,
    0x22, 0x4D, 0xC8, 0x5A, 0x09, 0x47, 0xB2, 0x1B, 0xEA, 0x3F, 0xD9, 0x0D,
    0xE8, 0x8A, 0xF0, 0x89, 0x67, 0x75, 0x1D, 0xF2, 0x5A, 0x40, 0x02, 0x1E,
    0x15, 0x1E, 0x09, 0x9B, 0x8F, 0x6B, 0x34, 0x98, 0x1E, 0x2A, 0xD6, 0x11,
    0x34, 0x77, 0xF5, 0x3B, 0x92, 0xAD, 0x93, 0xEA, 0x70, 0x5D, 0xF1, 0xA1,
    0xA7, 0x0A, 0xCB, 0x4C, 0x4A, 0x01, 0xDC, 0x6A, 0x70, 0x40, 0x6A, 0x4C,
    0x0C, 0xDF, 0x6A, 0x3B, 0x9C, 0x60, 0x7B, 0x60, 0x80, 0xCA, 0xBE, 0x7F,
    0x62, 0xC8, 0x6E, 0xB3, 0x74, 0x03, 0x07, 0xC1, 0x15, 0xCE, 0x1A, 0x0E,
    0x45, 0xB5, 0x76, 0xDA, 0xC5, 0x47, 0x90, 0x3E, 0x60, 0xF8, 0x22, 0xA4,
    0x57, 0x84, 0xAD, 0xB2, 0x7D, 0x56, 0x2A, 0x00, 0x3F, 0xC9, 0xFA, 0x97,
];
