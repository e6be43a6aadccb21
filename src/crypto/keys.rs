//! Per-chat key material and its lifecycle.
//!
//! A [`ChatKeyRing`] moves through four stages while a chat is
//! established: empty, own keypair generated, peer public key received,
//! and complete (symmetric key derived). The private key exists only while
//! the chat is still initializing; once the symmetric key is derived the
//! ring is reduced to the symmetric key alone and everything else is
//! zeroized in place before release.
//!
//! ## Persisted encoding
//!
//! The ring serializes to a versioned, length-prefixed binary layout so the
//! stored representation is inspectable and forward-compatible:
//!
//! ```text
//! [version: u16 BE]
//! [kem tag: 12 bytes, NUL-padded][symmetric tag: 12][signature tag: 12]
//! [presence bitmap: u8]
//! for each present field, in order own_public, own_private, peer_public,
//! symmetric: [len: u32 BE][bytes]
//! ```

use crate::crypto::AlgorithmSuite;
use crate::error::{Result, YumsgError};
use std::fmt;
use zeroize::{Zeroize, Zeroizing};

/// Current encoding version.
const RING_VERSION: u16 = 1;

/// Fixed width of each algorithm tag in the encoded form.
const TAG_WIDTH: usize = 12;

const HAS_OWN_PUBLIC: u8 = 1 << 0;
const HAS_OWN_PRIVATE: u8 = 1 << 1;
const HAS_PEER_PUBLIC: u8 = 1 << 2;
const HAS_SYMMETRIC: u8 = 1 << 3;

/// Key material for a single chat.
#[derive(Clone)]
pub struct ChatKeyRing {
    suite: AlgorithmSuite,
    own_public: Option<Vec<u8>>,
    own_private: Option<Zeroizing<Vec<u8>>>,
    peer_public: Option<Vec<u8>>,
    symmetric: Option<Zeroizing<Vec<u8>>>,
}

impl fmt::Debug for ChatKeyRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatKeyRing")
            .field("suite", &self.suite)
            .field("has_keypair", &self.has_keypair())
            .field("has_peer_key", &self.has_peer_key())
            .field("has_symmetric", &self.symmetric.is_some())
            .finish()
    }
}

impl ChatKeyRing {
    /// Creates an empty ring for the given algorithm suite.
    pub fn new(suite: AlgorithmSuite) -> Self {
        Self {
            suite,
            own_public: None,
            own_private: None,
            peer_public: None,
            symmetric: None,
        }
    }

    /// Creates a ring holding a fresh own keypair.
    pub fn with_keypair(suite: AlgorithmSuite, public: Vec<u8>, private: Zeroizing<Vec<u8>>) -> Self {
        Self {
            suite,
            own_public: Some(public),
            own_private: Some(private),
            peer_public: None,
            symmetric: None,
        }
    }

    /// Returns the algorithm suite this ring was created for.
    pub fn suite(&self) -> AlgorithmSuite {
        self.suite
    }

    /// True when both halves of our own keypair are present.
    pub fn has_keypair(&self) -> bool {
        self.own_public.is_some() && self.own_private.is_some()
    }

    /// True when the peer's public key is present.
    pub fn has_peer_key(&self) -> bool {
        self.peer_public.is_some()
    }

    /// True when the ring holds a keypair, the peer key, and the derived
    /// symmetric key.
    pub fn is_complete(&self) -> bool {
        self.has_keypair() && self.has_peer_key() && self.symmetric.is_some()
    }

    /// Returns our own public key, if present.
    pub fn own_public(&self) -> Option<&[u8]> {
        self.own_public.as_deref()
    }

    /// Returns our own private key, if present.
    pub fn own_private(&self) -> Option<&[u8]> {
        self.own_private.as_deref().map(|k| k.as_slice())
    }

    /// Returns the peer's public key, if present.
    pub fn peer_public(&self) -> Option<&[u8]> {
        self.peer_public.as_deref()
    }

    /// Returns the derived symmetric key, if present.
    pub fn symmetric(&self) -> Option<&[u8]> {
        self.symmetric.as_deref().map(|k| k.as_slice())
    }

    /// Stores the peer's public key.
    pub fn set_peer_public(&mut self, key: Vec<u8>) {
        self.peer_public = Some(key);
    }

    /// Stores the derived symmetric key.
    pub fn set_symmetric(&mut self, key: Zeroizing<Vec<u8>>) {
        self.symmetric = Some(key);
    }

    /// Reduces the ring to its established form.
    ///
    /// Consumes the full ring and returns one holding only the symmetric
    /// key and the suite. The keypair and peer key are wiped in place
    /// before the buffers are released.
    pub fn into_established(mut self) -> Result<ChatKeyRing> {
        let symmetric = self
            .symmetric
            .take()
            .ok_or_else(|| YumsgError::crypto("ring has no symmetric key to retain"))?;
        let suite = self.suite;
        self.secure_wipe();
        Ok(ChatKeyRing {
            suite,
            own_public: None,
            own_private: None,
            peer_public: None,
            symmetric: Some(symmetric),
        })
    }

    /// Overwrites all present key material with zeros and clears the ring.
    ///
    /// Every buffer is zeroized in place before its storage is released, so
    /// no field survives in memory once this returns.
    pub fn secure_wipe(&mut self) {
        if let Some(mut key) = self.own_public.take() {
            wipe_buffer(&mut key);
        }
        if let Some(mut key) = self.own_private.take() {
            key.zeroize();
        }
        if let Some(mut key) = self.peer_public.take() {
            wipe_buffer(&mut key);
        }
        if let Some(mut key) = self.symmetric.take() {
            key.zeroize();
        }
    }

    /// Serializes the ring to the versioned binary layout.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(64);
        out.extend_from_slice(&RING_VERSION.to_be_bytes());
        push_tag(&mut out, self.suite.kem.wire_name());
        push_tag(&mut out, self.suite.symmetric.wire_name());
        push_tag(&mut out, self.suite.signature.wire_name());

        let mut bitmap = 0u8;
        if self.own_public.is_some() {
            bitmap |= HAS_OWN_PUBLIC;
        }
        if self.own_private.is_some() {
            bitmap |= HAS_OWN_PRIVATE;
        }
        if self.peer_public.is_some() {
            bitmap |= HAS_PEER_PUBLIC;
        }
        if self.symmetric.is_some() {
            bitmap |= HAS_SYMMETRIC;
        }
        out.push(bitmap);

        if let Some(field) = &self.own_public {
            push_field(&mut out, field);
        }
        if let Some(field) = &self.own_private {
            push_field(&mut out, field);
        }
        if let Some(field) = &self.peer_public {
            push_field(&mut out, field);
        }
        if let Some(field) = &self.symmetric {
            push_field(&mut out, field);
        }
        out
    }

    /// Deserializes a ring from the versioned binary layout.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor { bytes, pos: 0 };

        let version = u16::from_be_bytes(cursor.take(2)?.try_into().unwrap());
        if version != RING_VERSION {
            return Err(YumsgError::serialization(format!(
                "unsupported key ring version {}",
                version
            )));
        }

        let kem = read_tag(&mut cursor)?;
        let symmetric = read_tag(&mut cursor)?;
        let signature = read_tag(&mut cursor)?;
        let suite = AlgorithmSuite::parse(&kem, &symmetric, &signature)?;

        let bitmap = cursor.take(1)?[0];
        let own_public = if bitmap & HAS_OWN_PUBLIC != 0 {
            Some(read_field(&mut cursor)?)
        } else {
            None
        };
        let own_private = if bitmap & HAS_OWN_PRIVATE != 0 {
            Some(Zeroizing::new(read_field(&mut cursor)?))
        } else {
            None
        };
        let peer_public = if bitmap & HAS_PEER_PUBLIC != 0 {
            Some(read_field(&mut cursor)?)
        } else {
            None
        };
        let symmetric_key = if bitmap & HAS_SYMMETRIC != 0 {
            Some(Zeroizing::new(read_field(&mut cursor)?))
        } else {
            None
        };

        Ok(Self {
            suite,
            own_public,
            own_private,
            peer_public,
            symmetric: symmetric_key,
        })
    }
}

impl Drop for ChatKeyRing {
    fn drop(&mut self) {
        self.secure_wipe();
    }
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        if self.pos + len > self.bytes.len() {
            return Err(YumsgError::serialization("truncated key ring blob"));
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }
}

fn push_tag(out: &mut Vec<u8>, tag: &str) {
    debug_assert!(tag.len() <= TAG_WIDTH);
    let mut fixed = [0u8; TAG_WIDTH];
    fixed[..tag.len()].copy_from_slice(tag.as_bytes());
    out.extend_from_slice(&fixed);
}

fn read_tag(cursor: &mut Cursor<'_>) -> Result<String> {
    let raw = cursor.take(TAG_WIDTH)?;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(TAG_WIDTH);
    std::str::from_utf8(&raw[..end])
        .map(|s| s.to_string())
        .map_err(|_| YumsgError::serialization("non-UTF-8 algorithm tag in key ring blob"))
}

fn push_field(out: &mut Vec<u8>, field: &[u8]) {
    out.extend_from_slice(&(field.len() as u32).to_be_bytes());
    out.extend_from_slice(field);
}

fn read_field(cursor: &mut Cursor<'_>) -> Result<Vec<u8>> {
    let len = u32::from_be_bytes(cursor.take(4)?.try_into().unwrap()) as usize;
    Ok(cursor.take(len)?.to_vec())
}

/// Zeroizes a buffer in place.
///
/// `Zeroize` guarantees the overwrite is not optimized away; the buffer's
/// allocation is untouched so callers can release it afterwards.
fn wipe_buffer(buf: &mut Vec<u8>) {
    buf.zeroize();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_ring() -> ChatKeyRing {
        let mut ring = ChatKeyRing::with_keypair(
            AlgorithmSuite::recommended(),
            vec![1u8; 64],
            Zeroizing::new(vec![2u8; 96]),
        );
        ring.set_peer_public(vec![3u8; 64]);
        ring.set_symmetric(Zeroizing::new(vec![4u8; 32]));
        ring
    }

    #[test]
    fn test_lifecycle_predicates() {
        let suite = AlgorithmSuite::recommended();
        let mut ring = ChatKeyRing::new(suite);
        assert!(!ring.has_keypair());
        assert!(!ring.has_peer_key());
        assert!(!ring.is_complete());

        ring = ChatKeyRing::with_keypair(suite, vec![1u8; 8], Zeroizing::new(vec![2u8; 8]));
        assert!(ring.has_keypair());
        assert!(!ring.is_complete());

        ring.set_peer_public(vec![3u8; 8]);
        assert!(ring.has_peer_key());
        assert!(!ring.is_complete());

        ring.set_symmetric(Zeroizing::new(vec![4u8; 32]));
        assert!(ring.is_complete());
    }

    #[test]
    fn test_into_established_keeps_only_symmetric() {
        let ring = full_ring();
        let established = ring.into_established().unwrap();
        assert!(!established.has_keypair());
        assert!(!established.has_peer_key());
        assert_eq!(established.symmetric().unwrap(), &[4u8; 32][..]);
    }

    #[test]
    fn test_into_established_requires_symmetric() {
        let ring = ChatKeyRing::with_keypair(
            AlgorithmSuite::recommended(),
            vec![1u8; 8],
            Zeroizing::new(vec![2u8; 8]),
        );
        assert!(ring.into_established().is_err());
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let ring = full_ring();
        let blob = ring.encode();
        let decoded = ChatKeyRing::decode(&blob).unwrap();
        assert_eq!(decoded.suite(), ring.suite());
        assert_eq!(decoded.own_public(), ring.own_public());
        assert_eq!(decoded.own_private(), ring.own_private());
        assert_eq!(decoded.peer_public(), ring.peer_public());
        assert_eq!(decoded.symmetric(), ring.symmetric());
    }

    #[test]
    fn test_decode_partial_ring() {
        let ring = ChatKeyRing::with_keypair(
            AlgorithmSuite::recommended(),
            vec![1u8; 16],
            Zeroizing::new(vec![2u8; 16]),
        );
        let decoded = ChatKeyRing::decode(&ring.encode()).unwrap();
        assert!(decoded.has_keypair());
        assert!(!decoded.has_peer_key());
        assert!(decoded.symmetric().is_none());
    }

    #[test]
    fn test_decode_rejects_truncated_blob() {
        let blob = full_ring().encode();
        assert!(ChatKeyRing::decode(&blob[..blob.len() - 3]).is_err());
        assert!(ChatKeyRing::decode(&blob[..1]).is_err());
    }

    #[test]
    fn test_decode_rejects_unknown_version() {
        let mut blob = full_ring().encode();
        blob[0] = 0xff;
        assert!(ChatKeyRing::decode(&blob).is_err());
    }

    #[test]
    fn test_wipe_buffer_zeroizes_before_release() {
        // Zeroization witness: the wipe only resets the length, so reading
        // the original extent through a raw view while the allocation is
        // still owned observes the overwritten bytes.
        let mut buf = vec![0xAAu8; 96];
        let ptr = buf.as_ptr();
        let len = buf.len();

        wipe_buffer(&mut buf);

        let view = unsafe { std::slice::from_raw_parts(ptr, len) };
        assert!(view.iter().all(|&b| b == 0));
        drop(buf);
    }

    #[test]
    fn test_secure_wipe_clears_every_field() {
        let mut ring = full_ring();
        ring.secure_wipe();
        assert!(!ring.has_keypair());
        assert!(!ring.has_peer_key());
        assert!(ring.own_public().is_none());
        assert!(ring.own_private().is_none());
        assert!(ring.peer_public().is_none());
        assert!(ring.symmetric().is_none());
    }
}
