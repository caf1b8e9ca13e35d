//! Generic netlink family discovery.
//!
//! Family ids and multicast group ids are assigned by the kernel at module
//! load and are not stable across boots, so they must be resolved at
//! runtime: a `CTRL_CMD_GETFAMILY` request to the controller family returns
//! the numeric family id and the name-to-id mapping of its multicast
//! groups. The manager runs this exactly once per family at startup and
//! treats the result as immutable for the process lifetime.

use std::collections::HashMap;

use super::attr::get;
use super::builder::MessageBuilder;
use super::error::{Error, Result};
use super::genl::{
    CTRL_VERSION, CtrlAttr, CtrlAttrMcastGrp, CtrlCmd, GENL_ID_CTRL, GenlMessage,
};
use super::message::NLM_F_REQUEST;

/// Resolved metadata of a generic netlink family.
#[derive(Debug, Clone)]
pub struct FamilyInfo {
    /// Kernel-assigned family id (used as nlmsg_type).
    pub id: u16,
    /// Family version.
    pub version: u8,
    /// Multicast groups: name -> kernel-assigned group id.
    pub mcast_groups: HashMap<String, u32>,
}

impl FamilyInfo {
    /// Look up a multicast group id by name.
    pub fn group_id(&self, name: &str) -> Option<u32> {
        self.mcast_groups.get(name).copied()
    }
}

/// Build a `CTRL_CMD_GETFAMILY` request for the named family.
pub fn family_request(name: &str) -> MessageBuilder {
    let mut builder = MessageBuilder::genl(
        GENL_ID_CTRL,
        NLM_F_REQUEST,
        CtrlCmd::GetFamily as u8,
        CTRL_VERSION,
    );
    builder.append_attr_str(CtrlAttr::FamilyName as u16, name);
    builder
}

/// Parse the kernel's reply to a `CTRL_CMD_GETFAMILY` request.
///
/// The reply is either a `CTRL_CMD_NEWFAMILY` frame carrying the family
/// metadata or an error frame; ENOENT means the kernel does not know the
/// family (typically: the wireless subsystem is not loaded).
pub fn parse_family_reply(name: &str, msg: &GenlMessage) -> Result<FamilyInfo> {
    if msg.is_error() {
        let errno = msg.error_code().ok_or_else(|| {
            Error::InvalidMessage("error frame without error code".into())
        })?;
        if errno == -libc::ENOENT {
            return Err(Error::FamilyNotFound {
                name: name.to_string(),
            });
        }
        if errno == 0 {
            return Err(Error::InvalidMessage(
                "unexpected ack to family query".into(),
            ));
        }
        return Err(Error::from_errno(errno));
    }

    let mut id: Option<u16> = None;
    let mut version: u8 = 0;
    let mut mcast_groups = HashMap::new();

    for item in msg.attrs() {
        let (attr_type, payload) = item?;
        match attr_type {
            t if t == CtrlAttr::FamilyId as u16 => {
                id = Some(get::u16_ne(payload)?);
            }
            t if t == CtrlAttr::Version as u16 => {
                version = get::u32_ne(payload)? as u8;
            }
            t if t == CtrlAttr::McastGroups as u16 => {
                mcast_groups = parse_mcast_groups(payload)?;
            }
            _ => {}
        }
    }

    let id = id.ok_or_else(|| Error::InvalidMessage("family reply missing family id".into()))?;

    Ok(FamilyInfo {
        id,
        version,
        mcast_groups,
    })
}

/// Parse the nested group array inside `CTRL_ATTR_MCAST_GROUPS`.
///
/// Each element is an index-typed attribute nesting the group name and id.
fn parse_mcast_groups(data: &[u8]) -> Result<HashMap<String, u32>> {
    let mut groups = HashMap::new();

    for entry in super::attr::AttrIter::new(data) {
        let (_index, group_payload) = entry?;
        let mut name: Option<String> = None;
        let mut group_id: Option<u32> = None;

        for item in super::attr::AttrIter::new(group_payload) {
            let (attr_type, payload) = item?;
            match attr_type {
                t if t == CtrlAttrMcastGrp::Name as u16 => {
                    name = Some(get::string(payload)?.to_string());
                }
                t if t == CtrlAttrMcastGrp::Id as u16 => {
                    group_id = Some(get::u32_ne(payload)?);
                }
                _ => {}
            }
        }

        if let (Some(name), Some(id)) = (name, group_id) {
            groups.insert(name, id);
        }
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::netlink::fixtures;

    fn decode_one(data: &[u8]) -> GenlMessage {
        let (mut frames, failures) = GenlMessage::parse_all(data);
        assert!(failures.is_empty());
        frames.remove(0)
    }

    #[test]
    fn test_parse_family_reply() {
        let msg = decode_one(&fixtures::ctrl_new_family_reply(1));
        let info = parse_family_reply("nl80211", &msg).unwrap();

        assert_eq!(info.id, 28);
        assert_eq!(info.version, 1);
        assert_eq!(info.group_id("mlme"), Some(3));
        assert_eq!(info.group_id("scan"), Some(7));
        assert_eq!(info.group_id("vendor"), None);
    }

    #[test]
    fn test_unknown_family_maps_to_not_found() {
        let msg = decode_one(&fixtures::error_frame(1, -libc::ENOENT));
        match parse_family_reply("nl80211", &msg) {
            Err(Error::FamilyNotFound { name }) => assert_eq!(name, "nl80211"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_other_kernel_error_is_preserved() {
        let msg = decode_one(&fixtures::error_frame(1, -libc::EPERM));
        let err = parse_family_reply("nl80211", &msg).unwrap_err();
        assert_eq!(err.errno(), Some(libc::EPERM));
    }

    #[test]
    fn test_reply_without_family_id_is_invalid() {
        // A NEW_STATION frame has none of the control attributes
        let msg = decode_one(&fixtures::new_station_event());
        assert!(matches!(
            parse_family_reply("nl80211", &msg),
            Err(Error::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_request_round_trip() {
        let msg = decode_one(&family_request("nl80211").finish());

        assert_eq!(msg.msg_type(), GENL_ID_CTRL);
        assert_eq!(msg.cmd(), Some(CtrlCmd::GetFamily as u8));
        let name = msg.attr(CtrlAttr::FamilyName as u16).unwrap();
        assert_eq!(get::string(name).unwrap(), "nl80211");
    }
}
