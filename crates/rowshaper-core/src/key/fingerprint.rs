use crate::key::ShapeKey;
use sha2::{Digest, Sha256};
use std::fmt;

///
/// ShapeFingerprint
///
/// Stable sha256 digest of a shape key, used to label plans in traces.
///

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ShapeFingerprint([u8; 32]);

impl ShapeFingerprint {
    #[must_use]
    pub fn of(key: &ShapeKey) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"shapefp:v1");
        hasher.update(key.as_bytes());
        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);

        Self(out)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    #[must_use]
    pub fn as_hex(&self) -> String {
        let mut out = String::with_capacity(64);
        for byte in self.0 {
            use std::fmt::Write as _;
            let _ = write!(out, "{byte:02x}");
        }
        out
    }
}

impl fmt::Display for ShapeFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_hex())
    }
}
