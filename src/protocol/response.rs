use crate::common::all_link::AllLinkRecord;
use crate::common::commands::CommandBytes;
use crate::common::flags::MessageFlags;
use crate::common::identity::Id;
use crate::common::im_info::IMInfo;
use crate::common::user_data::{UserData, USER_DATA_LEN};
use crate::error::Error;

pub const ACK: u8 = 0x06;
pub const NAK: u8 = 0x15;

/// The response frame kinds the core decodes, keyed by command code.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResponseKind {
    StandardMessageReceived,
    ExtendedMessageReceived,
    AllLinkRecord,
    GetIMInfo,
    SendMessage,
    GetFirstAllLinkRecord,
    GetNextAllLinkRecord,
}

/// Frames the background loop decodes while no conversation is active.
pub const UNSOLICITED: &[ResponseKind] = &[
    ResponseKind::StandardMessageReceived,
    ResponseKind::ExtendedMessageReceived,
];

impl ResponseKind {
    pub const fn code(&self) -> u8 {
        match self {
            ResponseKind::StandardMessageReceived => 0x50,
            ResponseKind::ExtendedMessageReceived => 0x51,
            ResponseKind::AllLinkRecord => 0x57,
            ResponseKind::GetIMInfo => 0x60,
            ResponseKind::SendMessage => 0x62,
            ResponseKind::GetFirstAllLinkRecord => 0x69,
            ResponseKind::GetNextAllLinkRecord => 0x6a,
        }
    }

    /// Payload length after the command code, where it does not depend on
    /// the payload itself. `SendMessage` echoes are sized by their flags
    /// byte; see [`send_message_payload_len`].
    pub(crate) const fn fixed_payload_len(&self) -> Option<usize> {
        match self {
            ResponseKind::StandardMessageReceived => Some(9),
            ResponseKind::ExtendedMessageReceived => Some(9 + USER_DATA_LEN),
            ResponseKind::AllLinkRecord => Some(8),
            ResponseKind::GetIMInfo => Some(7),
            ResponseKind::SendMessage => None,
            ResponseKind::GetFirstAllLinkRecord => Some(1),
            ResponseKind::GetNextAllLinkRecord => Some(1),
        }
    }
}

/// Bytes within a `SendMessage` echo before its flags byte.
pub(crate) const SEND_MESSAGE_FLAGS_OFFSET: usize = 3;

/// Total payload length of a `SendMessage` echo given its flags byte:
/// target, flags, command pair, optional user data, trailing ack.
pub(crate) const fn send_message_payload_len(flags_byte: u8) -> usize {
    if MessageFlags::from_byte(flags_byte).is_extended() {
        3 + 1 + 2 + USER_DATA_LEN + 1
    } else {
        3 + 1 + 2 + 1
    }
}

/// A standard message received from a device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StandardMessage {
    pub from: Id,
    pub to: Id,
    pub flags: MessageFlags,
    pub command: CommandBytes,
}

/// An extended message received from a device.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ExtendedMessage {
    pub from: Id,
    pub to: Id,
    pub flags: MessageFlags,
    pub command: CommandBytes,
    pub user_data: UserData,
}

/// The modem's echo of a sent message.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct MessageEcho {
    pub target: Id,
    pub flags: MessageFlags,
    pub command: CommandBytes,
    pub user_data: Option<UserData>,
}

/// A decoded modem-to-host frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Response {
    StandardMessageReceived(StandardMessage),
    ExtendedMessageReceived(ExtendedMessage),
    AllLinkRecord(AllLinkRecord),
    GetIMInfo(IMInfo),
    SendMessage(MessageEcho),
    GetFirstAllLinkRecord,
    GetNextAllLinkRecord,
}

impl Response {
    pub fn kind(&self) -> ResponseKind {
        match self {
            Response::StandardMessageReceived(_) => ResponseKind::StandardMessageReceived,
            Response::ExtendedMessageReceived(_) => ResponseKind::ExtendedMessageReceived,
            Response::AllLinkRecord(_) => ResponseKind::AllLinkRecord,
            Response::GetIMInfo(_) => ResponseKind::GetIMInfo,
            Response::SendMessage(_) => ResponseKind::SendMessage,
            Response::GetFirstAllLinkRecord => ResponseKind::GetFirstAllLinkRecord,
            Response::GetNextAllLinkRecord => ResponseKind::GetNextAllLinkRecord,
        }
    }

    /// Parses a frame payload (everything after the command code, with the
    /// length already established). A trailing NAK yields `CommandFailure`;
    /// the frame is consumed either way so the stream stays in sync.
    pub(crate) fn parse(kind: ResponseKind, payload: &[u8]) -> Result<Response, Error> {
        match kind {
            ResponseKind::StandardMessageReceived => Ok(Response::StandardMessageReceived(
                StandardMessage {
                    from: id_at(payload, 0),
                    to: id_at(payload, 3),
                    flags: MessageFlags::from_byte(payload[6]),
                    command: CommandBytes(payload[7], payload[8]),
                },
            )),
            ResponseKind::ExtendedMessageReceived => Ok(Response::ExtendedMessageReceived(
                ExtendedMessage {
                    from: id_at(payload, 0),
                    to: id_at(payload, 3),
                    flags: MessageFlags::from_byte(payload[6]),
                    command: CommandBytes(payload[7], payload[8]),
                    user_data: UserData::try_from(&payload[9..9 + USER_DATA_LEN])?,
                },
            )),
            ResponseKind::AllLinkRecord => Ok(Response::AllLinkRecord(AllLinkRecord {
                flags: payload[0],
                group: payload[1],
                id: id_at(payload, 2),
                link_data: [payload[5], payload[6], payload[7]],
            })),
            ResponseKind::GetIMInfo => {
                check_ack(payload[6])?;
                Ok(Response::GetIMInfo(IMInfo {
                    id: id_at(payload, 0),
                    category: payload[3],
                    subcategory: payload[4],
                    firmware_version: payload[5],
                }))
            }
            ResponseKind::SendMessage => {
                check_ack(payload[payload.len() - 1])?;
                let flags = MessageFlags::from_byte(payload[SEND_MESSAGE_FLAGS_OFFSET]);
                let user_data = if flags.is_extended() {
                    Some(UserData::try_from(&payload[6..6 + USER_DATA_LEN])?)
                } else {
                    None
                };
                Ok(Response::SendMessage(MessageEcho {
                    target: id_at(payload, 0),
                    flags,
                    command: CommandBytes(payload[4], payload[5]),
                    user_data,
                }))
            }
            ResponseKind::GetFirstAllLinkRecord => {
                check_ack(payload[0])?;
                Ok(Response::GetFirstAllLinkRecord)
            }
            ResponseKind::GetNextAllLinkRecord => {
                check_ack(payload[0])?;
                Ok(Response::GetNextAllLinkRecord)
            }
        }
    }
}

fn id_at(payload: &[u8], offset: usize) -> Id {
    Id::new([payload[offset], payload[offset + 1], payload[offset + 2]])
}

fn check_ack(byte: u8) -> Result<(), Error> {
    match byte {
        ACK => Ok(()),
        NAK => Err(Error::CommandFailure),
        other => Err(Error::Decode(format!(
            "expected ack or nak, got 0x{:02x}",
            other
        ))),
    }
}

#[cfg(test)]
mod test {
    use super::{Response, ResponseKind};
    use crate::common::identity::Id;
    use crate::error::Error;

    #[test]
    fn parse_standard_message() {
        let payload = [0xaa, 0xbb, 0xcc, 0x00, 0x00, 0x01, 0xcb, 0x13, 0x00];
        match Response::parse(ResponseKind::StandardMessageReceived, &payload).unwrap() {
            Response::StandardMessageReceived(msg) => {
                assert_eq!(msg.from, Id::new([0xaa, 0xbb, 0xcc]));
                assert_eq!(msg.to, Id::new([0x00, 0x00, 0x01]));
                assert_eq!(msg.flags.byte(), 0xcb);
                assert_eq!(msg.command.cmd1(), 0x13);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn parse_im_info() {
        let payload = [0x1a, 0x2b, 0x3c, 0x01, 0x20, 0x9b, 0x06];
        match Response::parse(ResponseKind::GetIMInfo, &payload).unwrap() {
            Response::GetIMInfo(info) => {
                assert_eq!(info.id, Id::new([0x1a, 0x2b, 0x3c]));
                assert_eq!(info.category, 0x01);
                assert_eq!(info.subcategory, 0x20);
                assert_eq!(info.firmware_version, 0x9b);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn parse_all_link_record() {
        let payload = [0xe2, 0x01, 0xaa, 0xbb, 0xcc, 0x01, 0x02, 0x03];
        match Response::parse(ResponseKind::AllLinkRecord, &payload).unwrap() {
            Response::AllLinkRecord(record) => {
                assert_eq!(record.flags, 0xe2);
                assert_eq!(record.group, 1);
                assert_eq!(record.id, Id::new([0xaa, 0xbb, 0xcc]));
                assert_eq!(record.link_data, [1, 2, 3]);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn nak_is_command_failure() {
        assert_eq!(
            Response::parse(ResponseKind::GetFirstAllLinkRecord, &[0x15]),
            Err(Error::CommandFailure)
        );
        assert_eq!(
            Response::parse(ResponseKind::GetNextAllLinkRecord, &[0x15]),
            Err(Error::CommandFailure)
        );
    }

    #[test]
    fn bad_ack_byte_is_decode_error() {
        match Response::parse(ResponseKind::GetFirstAllLinkRecord, &[0x42]) {
            Err(Error::Decode(_)) => {}
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn parse_send_message_echo() {
        let payload = [0x11, 0x22, 0x33, 0x00, 0x30, 0x00, 0x06];
        match Response::parse(ResponseKind::SendMessage, &payload).unwrap() {
            Response::SendMessage(echo) => {
                assert_eq!(echo.target, Id::new([0x11, 0x22, 0x33]));
                assert!(!echo.flags.is_extended());
                assert_eq!(echo.command.cmd1(), 0x30);
                assert!(echo.user_data.is_none());
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn parse_extended_send_message_echo() {
        let mut payload = vec![0x11, 0x22, 0x33, 0x10, 0x2e, 0x00];
        payload.extend_from_slice(&[0u8; 14]);
        payload.push(0x06);
        match Response::parse(ResponseKind::SendMessage, &payload).unwrap() {
            Response::SendMessage(echo) => {
                assert!(echo.flags.is_extended());
                assert!(echo.user_data.is_some());
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }
}
