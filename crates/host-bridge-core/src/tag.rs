//! Native view tags and their allocation.
//!
//! Tags are plain integers shared with the native side. Tags ending in `1`
//! (`tag % 10 == 1`) are reserved for root containers, so the view allocator
//! skips them and the root allocator hands out only those.

use std::fmt;

use serde::{Deserialize, Serialize};

const ROOT_TAG_STRIDE: u32 = 10;

/// Opaque identifier of a native view or text instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tag(pub u32);

impl Tag {
    /// The root tag used when a session is not told otherwise.
    pub const DEFAULT_ROOT: Tag = Tag(1);

    pub fn get(self) -> u32 {
        self.0
    }

    /// Returns whether this tag lives in the space reserved for root containers.
    pub fn is_root(self) -> bool {
        self.0 % ROOT_TAG_STRIDE == 1
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for Tag {
    fn from(value: u32) -> Self {
        Tag(value)
    }
}

/// Issues fresh view tags, monotonically increasing and never reused.
#[derive(Debug, Clone)]
pub struct TagAllocator {
    next: u32,
    allocated: usize,
}

impl TagAllocator {
    pub fn new() -> Self {
        Self {
            next: 1,
            allocated: 0,
        }
    }

    pub fn allocate(&mut self) -> Tag {
        while Tag(self.next).is_root() {
            self.next = self.bump(self.next, 1);
        }
        let tag = Tag(self.next);
        self.next = self.bump(self.next, 1);
        self.allocated += 1;
        tag
    }

    /// Number of tags handed out so far.
    pub fn allocated(&self) -> usize {
        self.allocated
    }

    fn bump(&self, value: u32, by: u32) -> u32 {
        value.checked_add(by).expect("native tag space exhausted")
    }
}

impl Default for TagAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// Issues root container tags: 1, 11, 21, ...
#[derive(Debug, Clone)]
pub struct RootTagAllocator {
    next: u32,
}

impl RootTagAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self) -> Tag {
        let tag = Tag(self.next);
        self.next = self
            .next
            .checked_add(ROOT_TAG_STRIDE)
            .expect("root tag space exhausted");
        tag
    }
}

impl Default for RootTagAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_tags_skip_root_space() {
        let mut tags = TagAllocator::new();
        let issued: Vec<u32> = (0..12).map(|_| tags.allocate().get()).collect();
        assert_eq!(issued, vec![2, 3, 4, 5, 6, 7, 8, 9, 10, 12, 13, 14]);
        assert!(issued.iter().all(|tag| !Tag(*tag).is_root()));
        assert_eq!(tags.allocated(), 12);
    }

    #[test]
    fn view_tags_are_strictly_increasing() {
        let mut tags = TagAllocator::new();
        let mut last = tags.allocate();
        for _ in 0..200 {
            let next = tags.allocate();
            assert!(next > last);
            last = next;
        }
    }

    #[test]
    fn root_tags_step_by_ten() {
        let mut roots = RootTagAllocator::new();
        assert_eq!(roots.allocate(), Tag(1));
        assert_eq!(roots.allocate(), Tag(11));
        assert_eq!(roots.allocate(), Tag(21));
        assert!(Tag(21).is_root());
    }
}
