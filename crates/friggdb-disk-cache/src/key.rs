//! Cache keys and their on-disk file names

use std::fmt;
use uuid::Uuid;

const DELIMITER: char = ':';

/// The block artifacts kept in the disk cache
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ArtifactKind {
    Bloom,
    Index,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 2] = [ArtifactKind::Bloom, ArtifactKind::Index];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactKind::Bloom => "bloom",
            ArtifactKind::Index => "index",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "bloom" => Some(ArtifactKind::Bloom),
            "index" => Some(ArtifactKind::Index),
            _ => None,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one cached artifact of one block.
///
/// Ordering is by block, then tenant, then kind, which gives the janitor a
/// deterministic tie-break between entries written at the same instant.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CacheKey {
    block_id: Uuid,
    tenant_id: String,
    kind: ArtifactKind,
}

impl CacheKey {
    pub fn new(block_id: Uuid, tenant_id: impl Into<String>, kind: ArtifactKind) -> Self {
        Self {
            block_id,
            tenant_id: tenant_id.into(),
            kind,
        }
    }

    pub fn block_id(&self) -> Uuid {
        self.block_id
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// File name of this key under the cache root.
    ///
    /// The tenant is percent-encoded, so neither the delimiter nor a path
    /// separator can appear inside it.
    pub fn file_name(&self) -> String {
        format!(
            "{}{d}{}{d}{}",
            self.block_id.hyphenated(),
            urlencoding::encode(&self.tenant_id),
            self.kind,
            d = DELIMITER
        )
    }

    /// Inverse of [`CacheKey::file_name`]. Names not produced by it yield `None`.
    pub fn from_file_name(name: &str) -> Option<Self> {
        let mut parts = name.split(DELIMITER);
        let block_id = Uuid::parse_str(parts.next()?).ok()?;
        let tenant_id = urlencoding::decode(parts.next()?).ok()?.into_owned();
        let kind = ArtifactKind::parse(parts.next()?)?;
        if parts.next().is_some() {
            return None;
        }

        let key = Self::new(block_id, tenant_id, kind);
        // Reject alternate spellings (simple uuids, optional escapes)
        (key.file_name() == name).then_some(key)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}
