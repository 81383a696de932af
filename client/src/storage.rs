//! Durable key-value storage behind a trait so the core never sees
//! storage failures: a failed read is an absent key, a failed write
//! is a no-op, and the in-memory state stays authoritative.

use std::cell::RefCell;
use std::collections::HashMap;

pub trait KvStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

/// In-memory store for native use and tests.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: RefCell<HashMap<String, String>>,
}

impl MemoryKv {
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KvStore for MemoryKv {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_kv_roundtrip() {
        let kv = MemoryKv::default();
        assert_eq!(kv.get("missing"), None);
        kv.set("k", "v1");
        kv.set("k", "v2");
        assert_eq!(kv.get("k").as_deref(), Some("v2"));
        assert_eq!(kv.len(), 1);
    }
}
