//! Binary XML encoding and decoding for the FunXMPP protocol.
//!
//! Stanzas travel as compact binary trees instead of textual XML. This module
//! provides the [`Node`] model and the codec between nodes and frame bodies.

mod cursor;
mod decoder;
mod encoder;
mod node;
mod token;

pub use cursor::ByteCursor;
pub use decoder::{decode, DecodeError, Decoder};
pub use encoder::{encode, EncodeError, Encoder};
pub use node::*;
pub use token::{
    lookup, resolve, Token, TokenCode, DICTIONARY_ESCAPE, MAX_ESCAPE_DEPTH, PRIMARY_TOKENS,
    SECONDARY_TOKENS,
};

/// Control bytes of the binary format.
///
/// Bytes `0x05..=0xEC` are primary dictionary tokens and `0xFE` is the
/// dictionary escape; everything else is listed here.
pub mod marker {
    /// Empty list; the empty string when a string is expected.
    pub const LIST_EMPTY: u8 = 0x00;
    /// First list marker carrying its count in the byte itself.
    pub const LIST_SHORT_FIRST: u8 = 0xED;
    /// Last list marker carrying its count in the byte itself.
    pub const LIST_SHORT_LAST: u8 = 0xF7;
    /// List followed by a 1-byte count.
    pub const LIST_8: u8 = 0xF8;
    /// List followed by a 2-byte count.
    pub const LIST_16: u8 = 0xF9;
    /// `user@server` sent as two string items.
    pub const JID_PAIR: u8 = 0xFA;
    /// Literal string or raw bytes with a 2-byte length.
    pub const BINARY_16: u8 = 0xFB;
    /// Literal string or raw bytes with a 1-byte length.
    pub const BINARY_8: u8 = 0xFC;
    /// Literal string or raw bytes with a 4-byte length.
    pub const BINARY_32: u8 = 0xFD;
    /// Nibble-packed decimal digits.
    pub const NIBBLE_8: u8 = 0xFF;

    /// Largest count expressible by a short list marker.
    pub const LIST_SHORT_MAX: usize = (LIST_SHORT_LAST - LIST_SHORT_FIRST) as usize + 1;
    /// Header bit flagging an odd digit count in a packed digit string.
    pub const NIBBLE_ODD_FLAG: u8 = 0x80;
    /// Filler for the unused low half of the last packed byte.
    pub const NIBBLE_PAD: u8 = 0x0F;
    /// Most packed bytes a nibble string can carry.
    pub const NIBBLE_MAX_BYTES: usize = 0x7F;
    /// Shortest digit string worth packing.
    pub const NIBBLE_MIN_DIGITS: usize = 2;

    /// True for every byte that opens a list.
    pub fn is_list(byte: u8) -> bool {
        matches!(byte, LIST_EMPTY | LIST_SHORT_FIRST..=LIST_SHORT_LAST | LIST_8 | LIST_16)
    }
}
