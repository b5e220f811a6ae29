use core::fmt::{Display, Formatter};
use md5::{Digest as _, Md5};

/// 128-bit content fingerprint used to de-duplicate artifacts across locations.
///
/// This is for identifying identical bytes, not for integrity protection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest([u8; 16]);

impl Digest {
    /// Compute the digest of a byte sequence.
    #[must_use]
    pub fn of(bytes: &[u8]) -> Self {
        let hash = Md5::digest(bytes);
        let mut out = [0u8; 16];
        out.copy_from_slice(&hash);
        Self(out)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl Display for Digest {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}
