//! Codec round trips through the public API.
//!
//! Mirrors the loopback shape of the protocol: frames built the way the
//! daemon builds requests, decoded the way incoming datagrams are decoded.

use wifind::netlink::attr::get;
use wifind::netlink::message::{NLM_F_REQUEST, NLMSG_HDRLEN};
use wifind::netlink::{GenlMessage, MessageBuilder};
use wifind::nl80211::event::{self, StationEvent};
use wifind::nl80211::{Nl80211Attr, Nl80211Cmd};

const FAMILY_ID: u16 = 28;

fn decode_one(data: &[u8]) -> GenlMessage {
    let (mut frames, failures) = GenlMessage::parse_all(data);
    assert!(failures.is_empty());
    assert_eq!(frames.len(), 1);
    frames.remove(0)
}

#[test]
fn encode_decode_preserves_type_seq_and_attributes() {
    let mut builder = MessageBuilder::genl(FAMILY_ID, NLM_F_REQUEST, 7, 1);
    builder.set_seq(4242);
    builder.append_attr_u32(3, 9);
    builder.append_attr_str(4, "wlan0");

    let msg = decode_one(&builder.finish());

    assert_eq!(msg.msg_type(), FAMILY_ID);
    assert_eq!(msg.flags(), NLM_F_REQUEST);
    assert_eq!(msg.seq(), 4242);
    assert_eq!(msg.cmd(), Some(7));
    assert_eq!(msg.version(), Some(1));
    assert_eq!(get::u32_ne(msg.attr(3).unwrap()).unwrap(), 9);
    assert_eq!(get::string(msg.attr(4).unwrap()).unwrap(), "wlan0");
}

#[test]
fn nested_attributes_survive_the_round_trip() {
    let mut builder = MessageBuilder::genl(FAMILY_ID, NLM_F_REQUEST, 7, 1);
    let nest = builder.nest_start(10);
    builder.append_attr_u32(1, 100);
    builder.append_attr_u32(2, 200);
    builder.nest_end(nest);

    let msg = decode_one(&builder.finish());

    let inner: Vec<_> = msg
        .nested(10)
        .unwrap()
        .collect::<wifind::Result<_>>()
        .unwrap();
    assert_eq!(inner.len(), 2);
    assert_eq!(get::u32_ne(inner[0].1).unwrap(), 100);
    assert_eq!(get::u32_ne(inner[1].1).unwrap(), 200);
}

#[test]
fn batched_datagram_with_truncated_tail_keeps_valid_frames() {
    let mut first = MessageBuilder::genl(FAMILY_ID, NLM_F_REQUEST, 7, 1);
    first.set_seq(1);
    let mut second = MessageBuilder::genl(FAMILY_ID, NLM_F_REQUEST, 8, 1);
    second.set_seq(2);

    let mut buf = first.finish();
    buf.extend_from_slice(&second.finish());
    // A trailing header that claims more bytes than remain
    let mut tail = MessageBuilder::genl(FAMILY_ID, NLM_F_REQUEST, 9, 1).finish();
    tail[0..4].copy_from_slice(&128u32.to_ne_bytes());
    buf.extend_from_slice(&tail);

    let (frames, failures) = GenlMessage::parse_all(&buf);
    assert_eq!(frames.len(), 2);
    assert_eq!(failures.len(), 1);
    assert_eq!(frames[0].seq(), 1);
    assert_eq!(frames[1].seq(), 2);
}

#[test]
fn header_only_frame_has_no_attributes() {
    let msg = decode_one(&MessageBuilder::genl(FAMILY_ID, NLM_F_REQUEST, 7, 1).finish());
    assert!(msg.attrs().next().is_none());
    assert_eq!(msg.attr(1), None);
}

#[test]
fn frame_length_is_patched_on_finish() {
    let mut builder = MessageBuilder::genl(FAMILY_ID, NLM_F_REQUEST, 7, 1);
    builder.append_attr_u32(3, 9);
    let bytes = builder.finish();

    let declared = u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    assert_eq!(declared as usize, bytes.len());
    assert!(bytes.len() > NLMSG_HDRLEN);
}

#[test]
fn station_event_echo_decodes_to_typed_event() {
    let mut builder = MessageBuilder::genl(FAMILY_ID, 0, Nl80211Cmd::NewStation as u8, 1);
    builder.append_attr(Nl80211Attr::Mac as u16, &[2, 0, 0, 0, 0, 1]);
    builder.append_attr_u32(Nl80211Attr::Ifindex as u16, 3);

    let msg = decode_one(&builder.finish());
    let (ifindex, event) = event::station_event(&msg).unwrap().unwrap();

    assert_eq!(ifindex, 3);
    match event {
        StationEvent::Connected(mac) => assert_eq!(mac.to_string(), "02:00:00:00:00:01"),
        other => panic!("unexpected event: {:?}", other),
    }
}
