use std::ops::Deref;

/// The byte contents of a resource.
///
/// A `ResourceBuffer` is produced by the mutator and handed back to the owning
/// [`Resource`](crate::resource::Resource) for commit. Offsets into it are zero-based.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ResourceBuffer {
    bytes: Vec<u8>,
}

impl ResourceBuffer {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// MD5 digest of the contents, used to tie a plan to the buffer it was computed for.
    pub fn digest(&self) -> [u8; 16] {
        digest_of(&self.bytes)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

pub(crate) fn digest_of(bytes: &[u8]) -> [u8; 16] {
    md5::compute(bytes).0
}

pub(crate) fn hex_digest(digest: &[u8; 16]) -> String {
    format!("{:x}", md5::Digest(*digest))
}

impl Deref for ResourceBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsRef<[u8]> for ResourceBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<Vec<u8>> for ResourceBuffer {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for ResourceBuffer {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

impl From<ResourceBuffer> for Vec<u8> {
    fn from(buffer: ResourceBuffer) -> Self {
        buffer.bytes
    }
}
