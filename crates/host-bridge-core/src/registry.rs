//! Tag-keyed bookkeeping for one bridge session.
//!
//! Two associations live here: the reconciler's own node handle for a tag
//! (`precache` / `instance_from_tag` / `uncache`), and the host instance record
//! created for that tag. Both are last-write-wins and single-threaded.

use crate::collections::map::HashMap;
use crate::error::BridgeError;
use crate::instance::{HostInstance, TextInstance, ViewInstance};
use crate::tag::Tag;

/// Reconciler handles that may carry the tag of the host instance they own.
pub trait TaggedHandle {
    fn tag(&self) -> Option<Tag>;
}

impl TaggedHandle for Tag {
    fn tag(&self) -> Option<Tag> {
        Some(*self)
    }
}

impl<T: TaggedHandle> TaggedHandle for Option<T> {
    fn tag(&self) -> Option<Tag> {
        self.as_ref().and_then(TaggedHandle::tag)
    }
}

/// Resolves the tag of a handle, failing when the handle has none.
pub fn tag_from_handle<T: TaggedHandle + ?Sized>(handle: &T) -> Result<Tag, BridgeError> {
    handle.tag().ok_or(BridgeError::MissingTag)
}

#[derive(Debug)]
pub struct InstanceRegistry<H> {
    handles: HashMap<Tag, H>,
    instances: HashMap<Tag, HostInstance>,
}

impl<H> InstanceRegistry<H> {
    pub fn new() -> Self {
        Self {
            handles: HashMap::default(),
            instances: HashMap::default(),
        }
    }

    /// Associates `tag` with the reconciler handle, replacing any previous one.
    pub fn precache(&mut self, tag: Tag, handle: H) {
        if self.handles.insert(tag, handle).is_some() {
            log::trace!("precache replaced handle for {tag}");
        }
    }

    pub fn instance_from_tag(&self, tag: Tag) -> Option<&H> {
        self.handles.get(&tag)
    }

    /// Drops the handle association for the tag carried by `handle`.
    /// Handles without a tag are ignored.
    pub fn uncache<T: TaggedHandle + ?Sized>(&mut self, handle: &T) -> Option<H> {
        let tag = handle.tag()?;
        self.handles.remove(&tag)
    }

    pub fn insert_instance(&mut self, instance: HostInstance) {
        let tag = instance.tag();
        log::trace!("registered {} instance {tag}", instance.class_name());
        self.instances.insert(tag, instance);
    }

    pub fn instance(&self, tag: Tag) -> Option<&HostInstance> {
        self.instances.get(&tag)
    }

    pub fn instance_mut(&mut self, tag: Tag) -> Option<&mut HostInstance> {
        self.instances.get_mut(&tag)
    }

    pub fn require(&self, tag: Tag) -> Result<&HostInstance, BridgeError> {
        self.instance(tag)
            .ok_or(BridgeError::UnknownInstance { tag })
    }

    pub fn require_mut(&mut self, tag: Tag) -> Result<&mut HostInstance, BridgeError> {
        self.instance_mut(tag)
            .ok_or(BridgeError::UnknownInstance { tag })
    }

    pub fn view(&self, tag: Tag) -> Result<&ViewInstance, BridgeError> {
        self.require(tag)?
            .as_view()
            .ok_or(BridgeError::NotAView { tag })
    }

    pub fn view_mut(&mut self, tag: Tag) -> Result<&mut ViewInstance, BridgeError> {
        self.require_mut(tag)?
            .as_view_mut()
            .ok_or(BridgeError::NotAView { tag })
    }

    pub fn text_mut(&mut self, tag: Tag) -> Result<&mut TextInstance, BridgeError> {
        self.require_mut(tag)?
            .as_text_mut()
            .ok_or(BridgeError::NotText { tag })
    }

    pub fn contains(&self, tag: Tag) -> bool {
        self.instances.contains_key(&tag)
    }

    /// Removes both associations of a single tag.
    pub fn release(&mut self, tag: Tag) -> Option<HostInstance> {
        self.handles.remove(&tag);
        self.instances.remove(&tag)
    }

    /// Releases `tag` and every instance reachable through its children.
    /// Returns the number of instance records removed.
    pub fn release_subtree(&mut self, tag: Tag) -> usize {
        let mut released = 0;
        let mut pending = vec![tag];
        while let Some(tag) = pending.pop() {
            if let Some(instance) = self.release(tag) {
                released += 1;
                pending.extend_from_slice(instance.children());
            }
        }
        log::trace!("released {released} instance(s) under {tag}");
        released
    }

    /// Number of live host instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Number of live reconciler handle associations.
    pub fn handle_count(&self) -> usize {
        self.handles.len()
    }
}

impl<H> Default for InstanceRegistry<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view_config::ViewType;

    #[derive(Debug, Clone, PartialEq)]
    struct Fiber {
        id: u32,
        state_node: Option<Tag>,
    }

    impl TaggedHandle for Fiber {
        fn tag(&self) -> Option<Tag> {
            self.state_node
        }
    }

    fn view(tag: u32, children: &[u32]) -> HostInstance {
        HostInstance::View(ViewInstance {
            tag: Tag(tag),
            view_type: ViewType::new("RCTView"),
            children: children.iter().copied().map(Tag).collect(),
            text_child: None,
        })
    }

    #[test]
    fn precache_is_last_write_wins() {
        let mut registry = InstanceRegistry::new();
        registry.precache(Tag(2), Fiber { id: 1, state_node: None });
        registry.precache(Tag(2), Fiber { id: 2, state_node: None });
        assert_eq!(registry.instance_from_tag(Tag(2)).map(|fiber| fiber.id), Some(2));
        assert_eq!(registry.handle_count(), 1);
    }

    #[test]
    fn lookup_of_unknown_tag_is_absent() {
        let registry: InstanceRegistry<Fiber> = InstanceRegistry::new();
        assert!(registry.instance_from_tag(Tag(42)).is_none());
        assert_eq!(
            registry.require(Tag(42)),
            Err(BridgeError::UnknownInstance { tag: Tag(42) })
        );
    }

    #[test]
    fn uncache_uses_the_handle_tag() {
        let mut registry = InstanceRegistry::new();
        registry.precache(Tag(3), Fiber { id: 7, state_node: Some(Tag(3)) });

        let untagged = Fiber { id: 8, state_node: None };
        assert!(registry.uncache(&untagged).is_none());
        assert_eq!(registry.handle_count(), 1);

        let tagged = Fiber { id: 7, state_node: Some(Tag(3)) };
        assert_eq!(registry.uncache(&tagged).map(|fiber| fiber.id), Some(7));
        assert!(registry.instance_from_tag(Tag(3)).is_none());
    }

    #[test]
    fn tag_from_handle_requires_a_tag() {
        let fiber = Fiber { id: 1, state_node: None };
        assert_eq!(tag_from_handle(&fiber), Err(BridgeError::MissingTag));
        assert_eq!(tag_from_handle(&Tag(5)), Ok(Tag(5)));
    }

    #[test]
    fn release_subtree_walks_children() {
        let mut registry: InstanceRegistry<Tag> = InstanceRegistry::new();
        registry.insert_instance(view(2, &[3, 4]));
        registry.insert_instance(view(3, &[5]));
        registry.insert_instance(view(4, &[]));
        registry.insert_instance(HostInstance::Text(TextInstance {
            tag: Tag(5),
            text: "leaf".to_owned(),
        }));
        registry.insert_instance(view(6, &[]));
        registry.precache(Tag(3), Tag(3));

        assert_eq!(registry.release_subtree(Tag(2)), 4);
        assert_eq!(registry.len(), 1);
        assert!(registry.contains(Tag(6)));
        assert_eq!(registry.handle_count(), 0);
    }

    #[test]
    fn typed_accessors_reject_the_other_variant() {
        let mut registry: InstanceRegistry<Tag> = InstanceRegistry::new();
        registry.insert_instance(HostInstance::Text(TextInstance {
            tag: Tag(2),
            text: String::new(),
        }));
        registry.insert_instance(view(3, &[]));
        assert_eq!(
            registry.view(Tag(2)).map(|_| ()),
            Err(BridgeError::NotAView { tag: Tag(2) })
        );
        assert_eq!(
            registry.text_mut(Tag(3)).map(|_| ()),
            Err(BridgeError::NotText { tag: Tag(3) })
        );
    }
}
