//! Binary decoder for FunXMPP stanzas.
//!
//! Decodes a frame body into a [`Node`] tree.

use thiserror::Error;

use super::cursor::ByteCursor;
use super::marker::*;
use super::node::{Attrs, Node, NodeContent};
use super::token::{resolve, Token, DICTIONARY_ESCAPE, PRIMARY_TOKENS};
use crate::config::DEFAULT_MAX_DEPTH;
use crate::types::JID;

/// Error type for decoding. Every variant is fatal for the frame.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated input: needed {needed} bytes, {remaining} left")]
    TruncatedInput { needed: usize, remaining: usize },
    #[error("unknown control byte 0x{byte:02x} at offset {offset}")]
    UnknownControlByte { byte: u8, offset: usize },
    #[error("no dictionary entry for code 0x{code:02x} in table {depth}")]
    DictionaryMiss { depth: usize, code: u8 },
    #[error("{remaining} trailing bytes after node")]
    TrailingData { remaining: usize },
    #[error("malformed identifier pair: {0}")]
    MalformedIdentifierPair(String),
    #[error("invalid nibble 0x{0:x} in packed digits")]
    InvalidNibble(u8),
    #[error("literal string is not valid UTF-8")]
    InvalidUtf8,
    #[error("node encoded as an empty list")]
    EmptyNode,
    #[error("nodes nested deeper than {0} levels")]
    NestingTooDeep(usize),
}

/// Binary decoder over one frame body.
pub struct Decoder<'a> {
    cursor: ByteCursor<'a>,
    max_depth: usize,
    depth: usize,
}

impl<'a> Decoder<'a> {
    /// Create a new decoder
    pub fn new(data: &'a [u8]) -> Self {
        Self::with_max_depth(data, DEFAULT_MAX_DEPTH)
    }

    /// Create a decoder that rejects nodes nested deeper than `max_depth`.
    pub fn with_max_depth(data: &'a [u8], max_depth: usize) -> Self {
        Self {
            cursor: ByteCursor::new(data),
            max_depth,
            depth: 0,
        }
    }

    /// Decode the data into a node, requiring every byte to be consumed.
    pub fn decode(data: &[u8]) -> Result<Node, DecodeError> {
        Decoder::new(data).decode_all()
    }

    /// Read one node and fail if anything is left over.
    pub fn decode_all(mut self) -> Result<Node, DecodeError> {
        let node = self.read_node()?;
        match self.cursor.bytes_remaining() {
            0 => Ok(node),
            remaining => Err(DecodeError::TrailingData { remaining }),
        }
    }

    /// Bytes not consumed yet.
    pub fn bytes_remaining(&self) -> usize {
        self.cursor.bytes_remaining()
    }

    /// Read a node
    pub fn read_node(&mut self) -> Result<Node, DecodeError> {
        if self.depth >= self.max_depth {
            return Err(DecodeError::NestingTooDeep(self.max_depth));
        }
        self.depth += 1;
        let node = self.read_node_list();
        self.depth -= 1;
        node
    }

    /// Read a single string item: token, literal, packed digits or pair.
    pub fn read_string(&mut self) -> Result<String, DecodeError> {
        let (marker, offset) = self.read_marker()?;
        self.read_string_with(marker, offset)
    }

    fn read_marker(&mut self) -> Result<(u8, usize), DecodeError> {
        let offset = self.cursor.position();
        Ok((self.cursor.read_u8()?, offset))
    }

    fn read_node_list(&mut self) -> Result<Node, DecodeError> {
        let (marker, offset) = self.read_marker()?;
        let size = self.read_list_size(marker, offset)?;
        if size == 0 {
            return Err(DecodeError::EmptyNode);
        }

        let tag = self.read_string()?;

        // [tag, (key, value)*, content?]
        let num_attr_pairs = (size - 1) / 2;
        let mut attrs = Attrs::with_capacity(self.capacity_for(num_attr_pairs));
        for _ in 0..num_attr_pairs {
            let key = self.read_string()?;
            let value = self.read_string()?;
            attrs.insert(key, value);
        }

        let content = if size % 2 == 0 {
            self.read_content()?
        } else {
            NodeContent::None
        };

        Ok(Node { tag, attrs, content })
    }

    // Counts come from the peer. Every child node and attribute pair takes at
    // least two bytes, so never reserve more than the rest of the body can hold.
    fn capacity_for(&self, count: usize) -> usize {
        count.min(self.cursor.bytes_remaining() / 2)
    }

    fn read_list_size(&mut self, marker: u8, offset: usize) -> Result<usize, DecodeError> {
        match marker {
            LIST_EMPTY => Ok(0),
            LIST_SHORT_FIRST..=LIST_SHORT_LAST => Ok((marker - LIST_SHORT_FIRST) as usize + 1),
            LIST_8 => Ok(self.cursor.read_u8()? as usize),
            LIST_16 => Ok(self.cursor.read_u16()? as usize),
            byte => Err(DecodeError::UnknownControlByte { byte, offset }),
        }
    }

    fn read_content(&mut self) -> Result<NodeContent, DecodeError> {
        let (marker, offset) = self.read_marker()?;

        if is_list(marker) {
            let len = self.read_list_size(marker, offset)?;
            if len == 0 {
                return Ok(NodeContent::None);
            }
            let mut children = Vec::with_capacity(self.capacity_for(len));
            for _ in 0..len {
                children.push(self.read_node()?);
            }
            return Ok(NodeContent::Children(children));
        }

        match marker {
            BINARY_8 | BINARY_16 | BINARY_32 => {
                Ok(NodeContent::Bytes(self.read_binary(marker)?.to_vec()))
            }
            _ => {
                let s = self.read_string_with(marker, offset)?;
                Ok(NodeContent::Bytes(s.into_bytes()))
            }
        }
    }

    fn read_string_with(&mut self, marker: u8, offset: usize) -> Result<String, DecodeError> {
        match marker {
            LIST_EMPTY => Ok(String::new()),
            BINARY_8 | BINARY_16 | BINARY_32 => {
                let bytes = self.read_binary(marker)?;
                String::from_utf8(bytes.to_vec()).map_err(|_| DecodeError::InvalidUtf8)
            }
            JID_PAIR => Ok(self.read_jid()?.to_string()),
            NIBBLE_8 => self.read_packed_digits(),
            _ => self.read_token(marker, offset).map(str::to_string),
        }
    }

    /// Length-prefixed bytes; the caller has consumed `marker`.
    fn read_binary(&mut self, marker: u8) -> Result<&'a [u8], DecodeError> {
        let len = match marker {
            BINARY_8 => self.cursor.read_u8()? as usize,
            BINARY_16 => self.cursor.read_u16()? as usize,
            _ => self.cursor.read_u32()? as usize,
        };
        self.cursor.read_bytes(len)
    }

    fn read_token(&mut self, first: u8, offset: usize) -> Result<&'static str, DecodeError> {
        if first as usize >= PRIMARY_TOKENS.len() && first != DICTIONARY_ESCAPE {
            return Err(DecodeError::UnknownControlByte { byte: first, offset });
        }

        let mut depth = 0;
        let mut code = first;
        loop {
            match resolve(depth, code) {
                Some(Token::Str(s)) => return Ok(s),
                Some(Token::Escape(next)) => {
                    depth = next;
                    code = self.cursor.read_u8()?;
                }
                None => return Err(DecodeError::DictionaryMiss { depth, code }),
            }
        }
    }

    fn read_jid(&mut self) -> Result<JID, DecodeError> {
        let user = self.read_jid_part()?;
        let server = self.read_jid_part()?;

        if user.contains('@') || server.contains('@') {
            return Err(DecodeError::MalformedIdentifierPair(format!(
                "unexpected '@' in {:?} / {:?}",
                user, server
            )));
        }
        if server.is_empty() {
            return Err(DecodeError::MalformedIdentifierPair(format!(
                "empty server for user {:?}",
                user
            )));
        }
        Ok(JID::new(user, server))
    }

    // Pairs do not nest; this also bounds recursion on `FA FA FA ...`.
    fn read_jid_part(&mut self) -> Result<String, DecodeError> {
        let (marker, offset) = self.read_marker()?;
        if marker == JID_PAIR {
            return Err(DecodeError::MalformedIdentifierPair(format!(
                "nested pair at offset {}",
                offset
            )));
        }
        self.read_string_with(marker, offset)
    }

    fn read_packed_digits(&mut self) -> Result<String, DecodeError> {
        let header = self.cursor.read_u8()?;
        let odd = header & NIBBLE_ODD_FLAG != 0;
        let packed = self.cursor.read_bytes((header & !NIBBLE_ODD_FLAG) as usize)?;
        if odd && packed.is_empty() {
            return Err(DecodeError::InvalidNibble(NIBBLE_PAD));
        }

        let mut digits = String::with_capacity(packed.len() * 2);
        for (i, byte) in packed.iter().enumerate() {
            digits.push(unpack_nibble(byte >> 4)?);
            let low = byte & 0x0F;
            if odd && i + 1 == packed.len() {
                if low != NIBBLE_PAD {
                    return Err(DecodeError::InvalidNibble(low));
                }
            } else {
                digits.push(unpack_nibble(low)?);
            }
        }
        Ok(digits)
    }
}

fn unpack_nibble(nibble: u8) -> Result<char, DecodeError> {
    match nibble {
        0..=9 => Ok(char::from(b'0' + nibble)),
        _ => Err(DecodeError::InvalidNibble(nibble)),
    }
}

/// Decode binary data into a node
pub fn decode(data: &[u8]) -> Result<Node, DecodeError> {
    Decoder::decode(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_transparent_list() {
        let body = [0xF8, 0x02, 0xBB, 0xF8, 0x01, 0xF8, 0x01, 0x9C];
        let node = decode(&body).unwrap();

        assert_eq!(node.tag, "stream:features");
        assert!(node.attrs.is_empty());
        let children = node.get_children().unwrap();
        assert_eq!(children, [Node::new("receipt_acks")]);
    }

    #[test]
    fn test_decode_attribute_and_payload() {
        let mut body = vec![0xF8, 0x04, 0x1B, 0xE8, 0xCF, 0xFC, 0x03];
        body.extend_from_slice(&[0x31, 0xE3, 0xB5]);
        let node = decode(&body).unwrap();

        assert_eq!(node.tag, "challenge");
        assert_eq!(node.get_attr("xmlns"), Some("urn:ietf:params:xml:ns:xmpp-sasl"));
        assert_eq!(node.get_bytes(), Some(&[0x31, 0xE3, 0xB5][..]));
    }

    #[test]
    fn test_short_list_markers() {
        // 0xEF = three items: tag, key, value
        let node = decode(&[0xEF, 0x6F, 0xCB, 0x8B]).unwrap();
        assert_eq!(node, Node::new("message").with_attr("type", "ping"));
    }

    #[test]
    fn test_odd_sizes_carry_no_content() {
        let node = decode(&[0xF8, 0x03, 0x6F, 0xCB, 0x8B]).unwrap();
        assert_eq!(node.content, NodeContent::None);
        assert_eq!(node.get_attr("type"), Some("ping"));
    }

    #[test]
    fn test_empty_child_list_is_no_content() {
        let node = decode(&[0xF8, 0x02, 0x6F, 0x00]).unwrap();
        assert!(matches!(node.content, NodeContent::None));
    }

    #[test]
    fn test_empty_tag() {
        let node = decode(&[0xED, 0x00]).unwrap();
        assert_eq!(node, Node::new(""));
    }

    #[test]
    fn test_literal_strings() {
        let mut body = vec![0xED, 0xFB, 0x00, 0x05];
        body.extend_from_slice(b"hello");
        assert_eq!(decode(&body).unwrap().tag, "hello");

        let mut body = vec![0xED, 0xFD, 0x00, 0x00, 0x00, 0x03];
        body.extend_from_slice(b"abc");
        assert_eq!(decode(&body).unwrap().tag, "abc");
    }

    #[test]
    fn test_secondary_dictionary() {
        // value "image/jpeg" from table 1, tag "c0" from table 2
        let node = decode(&[0xEF, 0xFE, 0xFE, 0x00, 0x6E, 0xFE, 0x0E]).unwrap();
        assert_eq!(node.tag, "c0");
        assert_eq!(node.get_attr("media"), Some("image/jpeg"));
    }

    #[test]
    fn test_packed_digits() {
        // "12345" padded
        let node = decode(&[0xED, 0xFF, 0x83, 0x12, 0x34, 0x5F]).unwrap();
        assert_eq!(node.tag, "12345");

        let node = decode(&[0xED, 0xFF, 0x02, 0x00, 0x99]).unwrap();
        assert_eq!(node.tag, "0099");
    }

    #[test]
    fn test_packed_digits_errors() {
        assert_eq!(
            decode(&[0xED, 0xFF, 0x01, 0x1A]).unwrap_err(),
            DecodeError::InvalidNibble(0x0A)
        );
        assert_eq!(
            decode(&[0xED, 0xFF, 0x81, 0x12]).unwrap_err(),
            DecodeError::InvalidNibble(0x02)
        );
        assert_eq!(
            decode(&[0xED, 0xFF, 0x01, 0xF1]).unwrap_err(),
            DecodeError::InvalidNibble(0x0F)
        );
        assert_eq!(decode(&[0xED, 0xFF, 0x80]).unwrap_err(), DecodeError::InvalidNibble(0x0F));
    }

    #[test]
    fn test_identifier_pair() {
        // <message to="31612345678@s.whatsapp.net"/>
        let body = [0xEF, 0x6F, 0xC8, 0xFA, 0xFF, 0x86, 0x31, 0x61, 0x23, 0x45, 0x67, 0x8F, 0xAB];
        let node = decode(&body).unwrap();
        assert_eq!(node.get_attr("to"), Some("31612345678@s.whatsapp.net"));
    }

    #[test]
    fn test_identifier_pair_without_user() {
        let node = decode(&[0xEF, 0x6F, 0xC8, 0xFA, 0x00, 0xAB]).unwrap();
        assert_eq!(node.get_attr("to"), Some("s.whatsapp.net"));
    }

    #[test]
    fn test_malformed_identifier_pairs() {
        let mut body = vec![0xEF, 0x6F, 0xC8, 0xFA, 0xFC, 0x03];
        body.extend_from_slice(b"a@b");
        body.push(0xAB);
        assert!(matches!(decode(&body), Err(DecodeError::MalformedIdentifierPair(_))));

        let body = [0xEF, 0x6F, 0xC8, 0xFA, 0x06, 0x00];
        assert!(matches!(decode(&body), Err(DecodeError::MalformedIdentifierPair(_))));

        let body = [0xEF, 0x6F, 0xC8, 0xFA, 0xFA, 0xFA, 0xFA];
        assert!(matches!(decode(&body), Err(DecodeError::MalformedIdentifierPair(_))));
    }

    #[test]
    fn test_truncated_input() {
        let err = decode(&[0xF8, 0x04, 0x1B, 0xE8, 0xCF, 0xFC, 0x14, 0x31]).unwrap_err();
        assert_eq!(err, DecodeError::TruncatedInput { needed: 20, remaining: 1 });
        assert!(matches!(decode(&[]), Err(DecodeError::TruncatedInput { .. })));
    }

    #[test]
    fn test_unknown_control_byte() {
        assert_eq!(
            decode(&[0x6F]).unwrap_err(),
            DecodeError::UnknownControlByte { byte: 0x6F, offset: 0 }
        );
        assert_eq!(
            decode(&[0xED, 0xF8]).unwrap_err(),
            DecodeError::UnknownControlByte { byte: 0xF8, offset: 1 }
        );
    }

    #[test]
    fn test_dictionary_miss() {
        assert_eq!(
            decode(&[0xED, 0x03]).unwrap_err(),
            DecodeError::DictionaryMiss { depth: 0, code: 0x03 }
        );
        assert_eq!(
            decode(&[0xED, 0xFE, 0xF0]).unwrap_err(),
            DecodeError::DictionaryMiss { depth: 1, code: 0xF0 }
        );
        assert_eq!(
            decode(&[0xED, 0xFE, 0xFE, 0xFE]).unwrap_err(),
            DecodeError::DictionaryMiss { depth: 2, code: 0xFE }
        );
    }

    #[test]
    fn test_empty_node_and_trailing_data() {
        assert_eq!(decode(&[0x00]).unwrap_err(), DecodeError::EmptyNode);
        assert_eq!(
            decode(&[0xED, 0x6F, 0x00]).unwrap_err(),
            DecodeError::TrailingData { remaining: 1 }
        );
    }

    #[test]
    fn test_invalid_utf8() {
        assert_eq!(decode(&[0xED, 0xFC, 0x01, 0xFF]).unwrap_err(), DecodeError::InvalidUtf8);
    }

    #[test]
    fn test_nesting_limit() {
        // each level: list of 2 (tag + content), content list of 1 child
        let mut body = Vec::new();
        for _ in 0..10 {
            body.extend_from_slice(&[0xEE, 0x6F, 0xED]);
        }
        body.extend_from_slice(&[0xED, 0x6F]);

        assert!(Decoder::with_max_depth(&body, 11).decode_all().is_ok());
        assert_eq!(
            Decoder::with_max_depth(&body, 10).decode_all().unwrap_err(),
            DecodeError::NestingTooDeep(10)
        );
    }

    #[test]
    fn test_oversized_counts_fail_without_reserving() {
        // each level claims 65535 children but carries only the first one
        let body = [0xEE, 0x6F, 0xF9, 0xFF, 0xFF].repeat(60);
        assert_eq!(
            decode(&body).unwrap_err(),
            DecodeError::TruncatedInput { needed: 1, remaining: 0 }
        );

        let mut decoder = Decoder::new(&body[..10]);
        assert_eq!(decoder.capacity_for(0xFFFF), 5);
        decoder.cursor.read_bytes(9).unwrap();
        assert_eq!(decoder.capacity_for(0xFFFF), 0);
    }

    #[test]
    fn test_oversized_attribute_count() {
        // 0xF9 0xFF 0xFF: tag plus 32767 attribute pairs, only one present
        let body = [0xF9, 0xFF, 0xFF, 0x6F, 0xCB, 0x8B];
        assert_eq!(
            decode(&body).unwrap_err(),
            DecodeError::TruncatedInput { needed: 1, remaining: 0 }
        );
    }

    #[test]
    fn test_text_content_becomes_bytes() {
        let node = decode(&[0xEE, 0x17, 0xC4]).unwrap();
        assert_eq!(node.tag, "body");
        assert_eq!(node.get_bytes(), Some(&b"text"[..]));
    }
}
