//! Container version gating (§4.6, §6 "Version policy").

use std::fmt;

use crate::error::bad_version;

/// A quip container version.
///
/// Versions 2 and 3 are both accepted at the format gate; this build
/// only implements the version 3 wire layout (§9 Open Questions).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Version(u8);

impl Version {
    /// Version 2.
    pub const V2: Self = Self(2);

    /// Version 3, the default and only version this build can decode.
    pub const V3: Self = Self(3);

    /// Returns the raw on-wire version byte.
    pub fn raw(self) -> u8 {
        self.0
    }

    pub(crate) fn from_raw(raw: u8) -> std::io::Result<Self> {
        match raw {
            2 | 3 => Ok(Self(raw)),
            _ => Err(bad_version(raw)),
        }
    }

    /// Returns `Ok(())` if this build can actually decode a container of
    /// this version, distinct from [`Self::from_raw`] accepting it at the
    /// format gate.
    pub(crate) fn require_decodable(self) -> std::io::Result<()> {
        if self == Self::V3 {
            Ok(())
        } else {
            Err(bad_version(self.0))
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::V3
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        assert_eq!(Version::default(), Version::V3);
    }

    #[test]
    fn test_from_raw_accepts_2_and_3() {
        assert_eq!(Version::from_raw(2).unwrap(), Version::V2);
        assert_eq!(Version::from_raw(3).unwrap(), Version::V3);
    }

    #[test]
    fn test_from_raw_rejects_1_with_dedicated_message() {
        let err = Version::from_raw(1).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Unsupported);
        assert!(err.to_string().contains("version 1"));
    }

    #[test]
    fn test_from_raw_rejects_newer_versions() {
        let err = Version::from_raw(9).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Unsupported);
        assert!(err.to_string().contains("newer"));
    }

    #[test]
    fn test_v2_is_accepted_but_not_decodable() {
        let v2 = Version::from_raw(2).unwrap();
        assert!(v2.require_decodable().is_err());
        let v3 = Version::from_raw(3).unwrap();
        assert!(v3.require_decodable().is_ok());
    }
}
