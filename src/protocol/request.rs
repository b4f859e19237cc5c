use crate::common::commands::CommandBytes;
use crate::common::flags::MessageFlags;
use crate::common::identity::Id;
use crate::common::user_data::UserData;

/// Frame sync byte. Every frame in either direction starts with it.
pub const SYNC: u8 = 0x02;

pub const GET_IM_INFO: u8 = 0x60;
pub const SEND_MESSAGE: u8 = 0x62;
pub const GET_FIRST_ALL_LINK_RECORD: u8 = 0x69;
pub const GET_NEXT_ALL_LINK_RECORD: u8 = 0x6a;

/// A host-to-modem request frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    GetIMInfo,
    SendMessage {
        target: Id,
        flags: MessageFlags,
        command: CommandBytes,
        user_data: Option<UserData>,
    },
    GetFirstAllLinkRecord,
    GetNextAllLinkRecord,
}

impl Request {
    /// Builds a standard message request.
    pub fn standard(target: Id, command: CommandBytes) -> Request {
        Request::SendMessage {
            target,
            flags: crate::common::flags::STANDARD,
            command,
            user_data: None,
        }
    }

    /// Builds an extended message request carrying a user-data block.
    pub fn extended(target: Id, command: CommandBytes, user_data: UserData) -> Request {
        Request::SendMessage {
            target,
            flags: crate::common::flags::EXTENDED,
            command,
            user_data: Some(user_data),
        }
    }

    /// Encodes the request as one self-delimiting frame.
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Request::GetIMInfo => vec![SYNC, GET_IM_INFO],
            Request::GetFirstAllLinkRecord => vec![SYNC, GET_FIRST_ALL_LINK_RECORD],
            Request::GetNextAllLinkRecord => vec![SYNC, GET_NEXT_ALL_LINK_RECORD],
            Request::SendMessage {
                target,
                flags,
                command,
                user_data,
            } => {
                let mut frame = Vec::with_capacity(22);
                frame.push(SYNC);
                frame.push(SEND_MESSAGE);
                frame.extend_from_slice(&target.bytes());
                frame.push(flags.byte());
                frame.push(command.cmd1());
                frame.push(command.cmd2());
                if flags.is_extended() {
                    let user_data = (*user_data).unwrap_or_default();
                    frame.extend_from_slice(user_data.bytes());
                }
                frame
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::Request;
    use crate::common::commands;
    use crate::common::identity::Id;
    use crate::common::user_data::UserData;

    #[test]
    fn encode_get_im_info() {
        assert_eq!(Request::GetIMInfo.encode(), vec![0x02, 0x60]);
    }

    #[test]
    fn encode_all_link_requests() {
        assert_eq!(Request::GetFirstAllLinkRecord.encode(), vec![0x02, 0x69]);
        assert_eq!(Request::GetNextAllLinkRecord.encode(), vec![0x02, 0x6a]);
    }

    #[test]
    fn encode_standard_message() {
        let req = Request::standard(Id::new([0x11, 0x22, 0x33]), commands::BEEP);
        assert_eq!(
            req.encode(),
            vec![0x02, 0x62, 0x11, 0x22, 0x33, 0x00, 0x30, 0x00]
        );
    }

    #[test]
    fn encode_extended_message_appends_user_data() {
        let mut user_data = UserData::default();
        user_data[1] = 0x05;
        user_data[2] = 0x1f;
        let req = Request::extended(
            Id::new([0xaa, 0xbb, 0xcc]),
            commands::SET_DEVICE_INFO,
            user_data,
        );
        let bytes = req.encode();
        assert_eq!(bytes.len(), 22);
        assert_eq!(&bytes[..8], &[0x02, 0x62, 0xaa, 0xbb, 0xcc, 0x10, 0x2e, 0x00]);
        assert_eq!(bytes[9], 0x05);
        assert_eq!(bytes[10], 0x1f);
    }
}
