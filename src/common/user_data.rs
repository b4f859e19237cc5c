use crate::error::Error;

pub const USER_DATA_LEN: usize = 14;

/// The fixed 14-byte payload of an extended message. Zeroed when unused.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct UserData([u8; USER_DATA_LEN]);

impl UserData {
    pub const fn new(bytes: [u8; USER_DATA_LEN]) -> UserData {
        UserData(bytes)
    }

    pub const fn bytes(&self) -> &[u8; USER_DATA_LEN] {
        &self.0
    }

    pub fn bytes_mut(&mut self) -> &mut [u8; USER_DATA_LEN] {
        &mut self.0
    }
}

impl From<[u8; USER_DATA_LEN]> for UserData {
    fn from(bytes: [u8; USER_DATA_LEN]) -> UserData {
        UserData(bytes)
    }
}

impl std::convert::TryFrom<&[u8]> for UserData {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<UserData, Error> {
        let bytes: [u8; USER_DATA_LEN] = bytes.try_into().map_err(|_| {
            Error::InvalidArgument(format!(
                "user data must be exactly {} bytes, got {}",
                USER_DATA_LEN,
                bytes.len()
            ))
        })?;
        Ok(UserData(bytes))
    }
}

impl std::ops::Index<usize> for UserData {
    type Output = u8;
    fn index(&self, i: usize) -> &u8 {
        &self.0[i]
    }
}

impl std::ops::IndexMut<usize> for UserData {
    fn index_mut(&mut self, i: usize) -> &mut u8 {
        &mut self.0[i]
    }
}

#[cfg(test)]
mod test {
    use super::UserData;

    #[test]
    fn try_from_enforces_length() {
        assert!(UserData::try_from(&[0u8; 14][..]).is_ok());
        assert!(UserData::try_from(&[0u8; 13][..]).is_err());
        assert!(UserData::try_from(&[0u8; 15][..]).is_err());
        assert!(UserData::try_from(&[][..]).is_err());
    }
}
