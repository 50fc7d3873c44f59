use std::collections::HashMap;

use super::{PreparedSource, SourceIdentity};

/// Storage for prepared sources, keyed by source identity.
///
/// Entries are never evicted automatically. Uploaded files expire on the
/// service side after about 48 hours; a stale handle surfaces as a failed
/// generation call for that job.
pub trait SourceCache: Send + Sync {
    fn get(&self, identity: &SourceIdentity) -> Option<PreparedSource>;

    fn insert(&mut self, identity: SourceIdentity, source: PreparedSource);

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-lifetime cache backed by a `HashMap`
#[derive(Debug, Default)]
pub struct MemorySourceCache {
    entries: HashMap<SourceIdentity, PreparedSource>,
}

impl MemorySourceCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SourceCache for MemorySourceCache {
    fn get(&self, identity: &SourceIdentity) -> Option<PreparedSource> {
        self.entries.get(identity).cloned()
    }

    fn insert(&mut self, identity: SourceIdentity, source: PreparedSource) {
        self.entries.insert(identity, source);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{OriginKind, ReadinessState};
    use std::path::PathBuf;

    fn handle(uri: &str) -> PreparedSource {
        PreparedSource {
            uri: uri.to_string(),
            mime_type: "video/mp4".to_string(),
            display_name: "clip".to_string(),
            origin_kind: OriginKind::Local,
            readiness: ReadinessState::Ready,
            remote_name: Some("files/clip".to_string()),
        }
    }

    #[test]
    fn test_identities_are_distinct_by_kind() {
        let mut cache = MemorySourceCache::new();
        cache.insert(SourceIdentity::LocalPath(PathBuf::from("a.mp4")), handle("u1"));

        assert!(cache.get(&SourceIdentity::RemoteUrl("a.mp4".to_string())).is_none());
        assert_eq!(
            cache.get(&SourceIdentity::LocalPath(PathBuf::from("a.mp4"))).map(|h| h.uri),
            Some("u1".to_string())
        );
    }

    #[test]
    fn test_clear() {
        let mut cache = MemorySourceCache::new();
        cache.insert(SourceIdentity::RemoteUrl("https://youtu.be/x".to_string()), handle("u"));
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }
}
