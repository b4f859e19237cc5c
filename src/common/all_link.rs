use crate::common::identity::Id;
use serde_derive::{Deserialize, Serialize};

/// One entry of the modem's all-link database.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllLinkRecord {
    pub flags: u8,
    pub group: u8,
    pub id: Id,
    pub link_data: [u8; 3],
}

impl AllLinkRecord {
    /// Database ordering key. Enumerations are sorted by it, ascending.
    pub fn sort_key(&self) -> (u8, Id) {
        (self.group, self.id)
    }
}

#[cfg(test)]
mod test {
    use super::AllLinkRecord;
    use crate::common::identity::Id;

    #[test]
    fn sort_key_orders_by_group_then_id() {
        let mut records = vec![
            AllLinkRecord {
                flags: 0xa2,
                group: 2,
                id: Id::new([0x11, 0x22, 0x33]),
                link_data: [4, 5, 6],
            },
            AllLinkRecord {
                flags: 0xe2,
                group: 1,
                id: Id::new([0xaa, 0xbb, 0xcc]),
                link_data: [1, 2, 3],
            },
            AllLinkRecord {
                flags: 0xe2,
                group: 1,
                id: Id::new([0x00, 0x00, 0x01]),
                link_data: [0, 0, 0],
            },
        ];
        records.sort_by_key(AllLinkRecord::sort_key);
        assert_eq!(records[0].id, Id::new([0x00, 0x00, 0x01]));
        assert_eq!(records[1].id, Id::new([0xaa, 0xbb, 0xcc]));
        assert_eq!(records[2].group, 2);
    }
}
