use hex::FromHex;
use sha1::{Digest, Sha1};
use tracing::trace;

use crate::error::TransportError;

/// SHA1 and MD5 digests of a resource, as published next to it in `.sha1` and `.md5` files
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Checksums {
    pub sha1: [u8; 20],
    pub md5: [u8; 16],
}
impl Checksums {
    pub fn of(data: &[u8]) -> Checksums {
        Checksums {
            sha1: Sha1::digest(data).into(),
            md5: md5::compute(data).0,
        }
    }

    pub fn sha1_hex(&self) -> String {
        hex::encode(self.sha1)
    }

    pub fn md5_hex(&self) -> String {
        hex::encode(self.md5)
    }
}

/// A digest announced by the remote side (e.g. in an `X-Checksum-Sha1` header) that the
///  received content must match
pub enum ExpectedChecksum {
    Sha1([u8; 20]),
    Md5([u8; 16]),
}
impl ExpectedChecksum {
    /// Parses a hex digest. Some servers return it wrapped in quotes, as an ETag.
    pub fn sha1(header_value: &str) -> Option<ExpectedChecksum> {
        <[u8; 20]>::from_hex(unquote(header_value)).ok().map(ExpectedChecksum::Sha1)
    }

    pub fn md5(header_value: &str) -> Option<ExpectedChecksum> {
        <[u8; 16]>::from_hex(unquote(header_value)).ok().map(ExpectedChecksum::Md5)
    }

    pub fn verify(&self, resource: &str, data: &[u8]) -> Result<(), TransportError> {
        let actual = Checksums::of(data);
        let (expected, actual) = match self {
            ExpectedChecksum::Sha1(expected) => {
                trace!("validating SHA1 hash of {}", resource);
                (hex::encode(expected), actual.sha1_hex())
            }
            ExpectedChecksum::Md5(expected) => {
                trace!("validating MD5 hash of {}", resource);
                (hex::encode(expected), actual.md5_hex())
            }
        };

        if expected == actual {
            Ok(())
        }
        else {
            Err(TransportError::ChecksumMismatch {
                resource: resource.to_string(),
                expected,
                actual,
            })
        }
    }
}

fn unquote(s: &str) -> &str {
    s.trim().trim_matches('"')
}
