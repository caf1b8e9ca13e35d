//! Hand-built netlink frames for codec and routing tests.
//!
//! Byte layouts mirror what the kernel emits on the wire (little-endian
//! hosts); each fixture documents its framing inline.

/// Family id used by every nl80211-shaped fixture.
pub const FAMILY_ID: u16 = 28;

/// Interface index carried by the event fixtures.
pub const IFINDEX: u32 = 7;

/// Station MAC carried by the station event fixtures.
pub const STATION_MAC: [u8; 6] = [0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff];

fn set_seq(frame: &mut [u8], seq: u32) {
    frame[8..12].copy_from_slice(&seq.to_ne_bytes());
}

/// NL80211_CMD_NEW_STATION event for aa:bb:cc:dd:ee:ff on ifindex 7.
pub fn new_station_event() -> Vec<u8> {
    station_event(19)
}

/// NL80211_CMD_DEL_STATION event for aa:bb:cc:dd:ee:ff on ifindex 7.
pub fn del_station_event() -> Vec<u8> {
    station_event(20)
}

fn station_event(cmd: u8) -> Vec<u8> {
    vec![
        // nlmsghdr: len=40, type=28 (nl80211), flags=0, seq=0 (event), pid=0
        0x28, 0x00, 0x00, 0x00, // nlmsg_len = 40
        0x1c, 0x00, // nlmsg_type = 28
        0x00, 0x00, // nlmsg_flags = 0
        0x00, 0x00, 0x00, 0x00, // nlmsg_seq = 0
        0x00, 0x00, 0x00, 0x00, // nlmsg_pid = 0
        // genlmsghdr
        cmd, 0x01, 0x00, 0x00, // cmd, version = 1
        // NL80211_ATTR_MAC = aa:bb:cc:dd:ee:ff
        0x0a, 0x00, // len = 10
        0x06, 0x00, // type = 6
        0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff, 0x00, 0x00, // mac + padding
        // NL80211_ATTR_IFINDEX = 7
        0x08, 0x00, // len = 8
        0x03, 0x00, // type = 3
        0x07, 0x00, 0x00, 0x00, // ifindex = 7
    ]
}

/// NL80211_CMD_CH_SWITCH_NOTIFY event: 2437 MHz, 20 MHz width, ifindex 7.
pub fn channel_switch_event() -> Vec<u8> {
    vec![
        // nlmsghdr: len=44, type=28 (nl80211), flags=0, seq=0 (event), pid=0
        0x2c, 0x00, 0x00, 0x00, // nlmsg_len = 44
        0x1c, 0x00, // nlmsg_type = 28
        0x00, 0x00, // nlmsg_flags = 0
        0x00, 0x00, 0x00, 0x00, // nlmsg_seq = 0
        0x00, 0x00, 0x00, 0x00, // nlmsg_pid = 0
        // genlmsghdr: cmd=88 (CH_SWITCH_NOTIFY), version=1
        0x58, 0x01, 0x00, 0x00,
        // NL80211_ATTR_IFINDEX = 7
        0x08, 0x00, // len = 8
        0x03, 0x00, // type = 3
        0x07, 0x00, 0x00, 0x00, // ifindex = 7
        // NL80211_ATTR_WIPHY_FREQ = 2437
        0x08, 0x00, // len = 8
        0x26, 0x00, // type = 38
        0x85, 0x09, 0x00, 0x00, // 2437 MHz
        // NL80211_ATTR_CHANNEL_WIDTH = 1 (20 MHz)
        0x08, 0x00, // len = 8
        0x9f, 0x00, // type = 159
        0x01, 0x00, 0x00, 0x00,
    ]
}

/// CTRL_CMD_NEWFAMILY reply for "nl80211": family id 28, groups
/// {"mlme": 3, "scan": 7}.
pub fn ctrl_new_family_reply(seq: u32) -> Vec<u8> {
    let mut frame = vec![
        // nlmsghdr: len=100, type=16 (nlctrl), flags=0, pid=0
        0x64, 0x00, 0x00, 0x00, // nlmsg_len = 100
        0x10, 0x00, // nlmsg_type = 16
        0x00, 0x00, // nlmsg_flags = 0
        0x00, 0x00, 0x00, 0x00, // nlmsg_seq (patched below)
        0x00, 0x00, 0x00, 0x00, // nlmsg_pid = 0
        // genlmsghdr: cmd=1 (NEWFAMILY), version=2
        0x01, 0x02, 0x00, 0x00,
        // CTRL_ATTR_FAMILY_NAME = "nl80211"
        0x0c, 0x00, // len = 12
        0x02, 0x00, // type = 2
        b'n', b'l', b'8', b'0', b'2', b'1', b'1', 0x00,
        // CTRL_ATTR_FAMILY_ID = 28
        0x06, 0x00, // len = 6
        0x01, 0x00, // type = 1
        0x1c, 0x00, 0x00, 0x00, // id = 28 + padding
        // CTRL_ATTR_VERSION = 1
        0x08, 0x00, // len = 8
        0x03, 0x00, // type = 3
        0x01, 0x00, 0x00, 0x00,
        // CTRL_ATTR_MCAST_GROUPS (nested array)
        0x34, 0x00, // len = 52
        0x07, 0x80, // type = 7 | NLA_F_NESTED
        //   group entry 1
        0x18, 0x00, // len = 24
        0x01, 0x00, // index = 1
        //     CTRL_ATTR_MCAST_GRP_NAME = "mlme"
        0x09, 0x00, // len = 9
        0x01, 0x00, // type = 1
        b'm', b'l', b'm', b'e', 0x00, 0x00, 0x00, 0x00,
        //     CTRL_ATTR_MCAST_GRP_ID = 3
        0x08, 0x00, // len = 8
        0x02, 0x00, // type = 2
        0x03, 0x00, 0x00, 0x00,
        //   group entry 2
        0x18, 0x00, // len = 24
        0x02, 0x00, // index = 2
        //     CTRL_ATTR_MCAST_GRP_NAME = "scan"
        0x09, 0x00, // len = 9
        0x01, 0x00, // type = 1
        b's', b'c', b'a', b'n', 0x00, 0x00, 0x00, 0x00,
        //     CTRL_ATTR_MCAST_GRP_ID = 7
        0x08, 0x00, // len = 8
        0x02, 0x00, // type = 2
        0x07, 0x00, 0x00, 0x00,
    ];
    set_seq(&mut frame, seq);
    frame
}

/// NLMSG_ERROR frame carrying `errno` (0 for an ACK).
pub fn error_frame(seq: u32, errno: i32) -> Vec<u8> {
    let mut frame = vec![
        // nlmsghdr: len=36, type=2 (NLMSG_ERROR), flags=0, pid=0
        0x24, 0x00, 0x00, 0x00, // nlmsg_len = 36
        0x02, 0x00, // nlmsg_type = 2
        0x00, 0x00, // nlmsg_flags = 0
        0x00, 0x00, 0x00, 0x00, // nlmsg_seq (patched below)
        0x00, 0x00, 0x00, 0x00, // nlmsg_pid = 0
        // nlmsgerr: error code (patched below)
        0x00, 0x00, 0x00, 0x00,
        // original request header
        0x20, 0x00, 0x00, 0x00, // len = 32
        0x10, 0x00, // type = 16 (nlctrl)
        0x01, 0x00, // flags = NLM_F_REQUEST
        0x00, 0x00, 0x00, 0x00, // seq (patched below)
        0x00, 0x00, 0x00, 0x00, // pid
    ];
    set_seq(&mut frame, seq);
    frame[16..20].copy_from_slice(&errno.to_ne_bytes());
    // seq field of the embedded original header
    frame[28..32].copy_from_slice(&seq.to_ne_bytes());
    frame
}

/// A frame whose header declares more bytes than the buffer holds.
pub fn truncated_frame() -> Vec<u8> {
    vec![
        0x40, 0x00, 0x00, 0x00, // nlmsg_len = 64, but only 20 bytes follow
        0x1c, 0x00, // nlmsg_type = 28
        0x00, 0x00, // nlmsg_flags = 0
        0x00, 0x00, 0x00, 0x00, // nlmsg_seq = 0
        0x00, 0x00, 0x00, 0x00, // nlmsg_pid = 0
        0x13, 0x01, 0x00, 0x00, // genlmsghdr
    ]
}

/// A well-framed event whose attribute region is corrupt (attribute
/// declares more bytes than remain).
pub fn corrupt_attr_event() -> Vec<u8> {
    vec![
        // nlmsghdr: len=28, type=28 (nl80211), flags=0, seq=0, pid=0
        0x1c, 0x00, 0x00, 0x00, // nlmsg_len = 28
        0x1c, 0x00, // nlmsg_type = 28
        0x00, 0x00, // nlmsg_flags = 0
        0x00, 0x00, 0x00, 0x00, // nlmsg_seq = 0
        0x00, 0x00, 0x00, 0x00, // nlmsg_pid = 0
        // genlmsghdr: cmd=19, version=1
        0x13, 0x01, 0x00, 0x00,
        // attribute declaring 32 bytes with 8 present
        0x20, 0x00, 0x06, 0x00, 0xaa, 0xbb, 0xcc, 0xdd,
    ]
}
