use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Process-wide interner for annotation node ids.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Identifier of an annotation node inside a layer.
///
/// Ids are interned strings: copying and comparing them is O(1), and they
/// serialize as plain strings so history snapshots stay readable.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Spur);

impl NodeId {
    /// Intern `s` as a node id (returns the existing id if already known).
    pub fn intern(s: &str) -> Self {
        NodeId(INTERNER.get_or_intern(s))
    }

    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Allocate a fresh id such as `rect_12` or `crop_3`.
    ///
    /// The counter is shared by every engine in the process, so ids created
    /// by two editors never collide.
    pub fn fresh(prefix: &str) -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        let n = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self::intern(&format!("{prefix}_{n}"))
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.as_str())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodeId::intern(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_interns_to_same_id() {
        let a = NodeId::intern("arrow_7");
        let b = NodeId::intern("arrow_7");
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "arrow_7");
    }

    #[test]
    fn fresh_ids_never_repeat() {
        let a = NodeId::fresh("rect");
        let b = NodeId::fresh("rect");
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("rect_"));
    }
}
