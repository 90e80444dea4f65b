use funxmpp_rust::{read_frame, write_frame, FrameBuffer, Node, ReadFrame};
use proptest::prelude::*;

const CHALLENGE_PAYLOAD: [u8; 20] = [
    0x31, 0xE3, 0xB5, 0xE4, 0x5C, 0x35, 0xB4, 0x9A, 0xF2, 0xF8, 0x91, 0x4C, 0x24, 0x8A, 0x52,
    0x4A, 0xDA, 0x05, 0x18, 0x44,
];

fn features_frame() -> Vec<u8> {
    hex::decode("000008f802bbf801f8019c").unwrap()
}

fn challenge_frame() -> Vec<u8> {
    let mut frame = vec![0x00, 0x00, 0x1B, 0xF8, 0x04, 0x1B, 0xE8, 0xCF, 0xFC, 0x14];
    frame.extend_from_slice(&CHALLENGE_PAYLOAD);
    frame
}

fn decode_frame(bytes: &[u8]) -> Node {
    match read_frame(bytes).expect("frame should decode") {
        ReadFrame::Frame { node, consumed } => {
            assert_eq!(consumed, bytes.len());
            node
        }
        ReadFrame::Incomplete { needed } => panic!("frame incomplete, {} bytes missing", needed),
    }
}

#[test]
fn stream_features_with_transparent_list() {
    let node = decode_frame(&features_frame());

    let expected = Node::new("stream:features").with_children(vec![Node::new("receipt_acks")]);
    assert_eq!(node, expected);
}

#[test]
fn challenge_with_attribute_and_payload() {
    let node = decode_frame(&challenge_frame());

    let expected = Node::new("challenge")
        .with_attr("xmlns", "urn:ietf:params:xml:ns:xmpp-sasl")
        .with_bytes(CHALLENGE_PAYLOAD.to_vec());
    assert_eq!(node, expected);
    assert_eq!(node.attrs.len(), 1);
}

#[test]
fn two_buffered_bytes_need_more() {
    assert_eq!(
        read_frame(&[0x00, 0x00]).unwrap(),
        ReadFrame::Incomplete { needed: 1 }
    );
}

#[test]
fn short_body_needs_more() {
    let buf = [0x00, 0x00, 0x05, 0xF8, 0x02, 0xBB, 0xED];
    assert_eq!(read_frame(&buf).unwrap(), ReadFrame::Incomplete { needed: 1 });
}

#[test]
fn re_encoded_frames_decode_to_the_same_node() {
    for frame in [features_frame(), challenge_frame()] {
        let node = decode_frame(&frame);
        let rewritten = write_frame(&node).unwrap();
        assert_eq!(decode_frame(&rewritten), node);
    }
}

#[test]
fn split_delivery_through_frame_buffer() {
    let mut stream = features_frame();
    stream.extend_from_slice(&challenge_frame());

    let mut buffer = FrameBuffer::new();
    let mut nodes = Vec::new();
    for chunk in stream.chunks(4) {
        buffer.feed(chunk);
        nodes.extend(buffer.drain_frames().unwrap());
    }

    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[0].tag, "stream:features");
    assert_eq!(nodes[1].get_bytes(), Some(&CHALLENGE_PAYLOAD[..]));
    assert_eq!(buffer.buffered_len(), 0);
}

proptest! {
    #[test]
    fn frame_boundaries_do_not_matter(split in 0usize..41) {
        let mut stream = features_frame();
        stream.extend_from_slice(&challenge_frame());
        let split = split.min(stream.len());

        let mut buffer = FrameBuffer::new();
        buffer.feed(&stream[..split]);
        let mut nodes = buffer.drain_frames().unwrap();
        buffer.feed(&stream[split..]);
        nodes.extend(buffer.drain_frames().unwrap());

        prop_assert_eq!(nodes.len(), 2);
        prop_assert_eq!(buffer.buffered_len(), 0);
    }
}
