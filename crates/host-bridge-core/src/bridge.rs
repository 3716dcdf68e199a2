//! The host bridge: callbacks a reconciler invokes to realize its diffs.
//!
//! One [`HostBridge`] is one session. It owns the tag allocator, the view
//! configs, the instance registry and the view manager, so every operation
//! takes `&mut self` and runs to completion before the next one starts.
//! The reconciler refers to host instances by [`Tag`].

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::attributes::{AttributeDiffer, PayloadDiffer};
use crate::collections::map::HashMap;
use crate::error::BridgeError;
use crate::instance::{HostInstance, TextInstance, ViewInstance, RAW_TEXT_CLASS};
use crate::node::{flatten_children, HostNode};
use crate::platform::{FrameCallback, HostScheduler, IdleCallback, IdleDeadline, ImmediateScheduler};
use crate::props::{scalar_text_children, text_payload, Props};
use crate::registry::{tag_from_handle, InstanceRegistry, TaggedHandle};
use crate::tag::{Tag, TagAllocator};
use crate::view_config::{ViewConfig, ViewConfigRegistry, ViewType};
use crate::view_manager::{ManageChildren, ViewManager};

static EXPERIMENTAL_WARNED: AtomicBool = AtomicBool::new(false);

/// How advisory prop validators are enforced.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PropValidation {
    Off,
    /// Log violations and carry on.
    #[default]
    Warn,
    /// Reject the operation with [`BridgeError::InvalidProp`].
    Strict,
}

#[derive(Clone, Debug)]
pub struct BridgeConfig {
    /// Root tag passed along with every `create_view`.
    pub root_tag: Tag,
    pub prop_validation: PropValidation,
    /// Log once per process that this renderer is experimental.
    pub warn_experimental: bool,
}

impl BridgeConfig {
    pub fn with_root_tag(mut self, root_tag: Tag) -> Self {
        self.root_tag = root_tag;
        self
    }

    pub fn with_prop_validation(mut self, prop_validation: PropValidation) -> Self {
        self.prop_validation = prop_validation;
        self
    }

    pub fn with_warn_experimental(mut self, warn_experimental: bool) -> Self {
        self.warn_experimental = warn_experimental;
        self
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            root_tag: Tag::DEFAULT_ROOT,
            prop_validation: PropValidation::default(),
            warn_experimental: true,
        }
    }
}

pub struct HostBridge<V, H, D = PayloadDiffer> {
    view_manager: V,
    differ: D,
    tags: TagAllocator,
    view_configs: ViewConfigRegistry,
    registry: InstanceRegistry<H>,
    containers: HashMap<Tag, Vec<Tag>>,
    scheduler: Rc<dyn HostScheduler>,
    config: BridgeConfig,
}

impl<V: ViewManager, H> HostBridge<V, H, PayloadDiffer> {
    pub fn new(view_manager: V) -> Self {
        Self::with_config(view_manager, BridgeConfig::default())
    }

    pub fn with_config(view_manager: V, config: BridgeConfig) -> Self {
        Self::with_differ(view_manager, PayloadDiffer, config)
    }
}

impl<V: ViewManager, H, D: AttributeDiffer> HostBridge<V, H, D> {
    pub fn with_differ(view_manager: V, differ: D, config: BridgeConfig) -> Self {
        Self {
            view_manager,
            differ,
            tags: TagAllocator::new(),
            view_configs: ViewConfigRegistry::new(),
            registry: InstanceRegistry::new(),
            containers: HashMap::default(),
            scheduler: Rc::new(ImmediateScheduler),
            config,
        }
    }

    pub fn with_scheduler(mut self, scheduler: Rc<dyn HostScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Replaces the view configs, e.g. with a registry shared by the host.
    pub fn with_view_configs(mut self, view_configs: ViewConfigRegistry) -> Self {
        self.view_configs = view_configs;
        self
    }

    pub fn register_view_type(&mut self, config: ViewConfig) -> ViewType {
        self.view_configs.register(config)
    }

    pub fn view_configs(&self) -> &ViewConfigRegistry {
        &self.view_configs
    }

    pub fn registry(&self) -> &InstanceRegistry<H> {
        &self.registry
    }

    pub fn view_manager(&self) -> &V {
        &self.view_manager
    }

    pub fn view_manager_mut(&mut self) -> &mut V {
        &mut self.view_manager
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn instance(&self, tag: Tag) -> Option<&HostInstance> {
        self.registry.instance(tag)
    }

    /// Creates a native view of `view_type`.
    ///
    /// Scalar `children` props become a single raw text child; otherwise the
    /// flattened `children` are attached. The handle is cached under the new
    /// tag before this returns.
    pub fn create_instance(
        &mut self,
        view_type: &str,
        props: &Props,
        children: &[HostNode],
        handle: H,
    ) -> Result<Tag, BridgeError> {
        let config = self.view_configs.require(view_type)?;
        check_props(self.config.prop_validation, config, props)?;
        let view_type = config.view_type().clone();
        let payload = self
            .differ
            .create(props, &config.valid_attributes)
            .unwrap_or_default();

        let child_tags = flatten_children(children);
        if let Some(unknown) = child_tags.iter().find(|tag| !self.registry.contains(**tag)) {
            return Err(BridgeError::UnknownInstance { tag: *unknown });
        }

        let tag = self.tags.allocate();
        self.registry.precache(tag, handle);
        self.view_manager
            .create_view(tag, view_type.as_str(), self.config.root_tag, &payload);

        let (children, text_child) = match scalar_text_children(props) {
            Some(text) => {
                let text_tag = self.create_raw_text(text);
                self.view_manager.set_children(tag, &[text_tag]);
                (vec![text_tag], Some(text_tag))
            }
            None => {
                self.view_manager.set_children(tag, &child_tags);
                (child_tags, None)
            }
        };

        self.registry.insert_instance(HostInstance::View(ViewInstance {
            tag,
            view_type,
            children,
            text_child,
        }));
        Ok(tag)
    }

    pub fn create_text_instance(&mut self, text: impl fmt::Display, handle: H) -> Tag {
        let tag = self.create_raw_text(text.to_string());
        self.registry.precache(tag, handle);
        tag
    }

    fn create_raw_text(&mut self, text: String) -> Tag {
        let tag = self.tags.allocate();
        self.view_manager.create_view(
            tag,
            RAW_TEXT_CLASS,
            self.config.root_tag,
            &text_payload(text.as_str()),
        );
        self.registry
            .insert_instance(HostInstance::Text(TextInstance { tag, text }));
        tag
    }

    /// Sends the changed attributes of a view, if any.
    ///
    /// Returns whether an `update_view` was issued for the view itself. A
    /// scalar text child created from `children` follows text changes too.
    pub fn commit_update(
        &mut self,
        tag: Tag,
        old_props: &Props,
        new_props: &Props,
    ) -> Result<bool, BridgeError> {
        let view = self.registry.view(tag)?;
        let text_child = view.text_child;
        let config = self.view_configs.require(view.view_type.as_str())?;
        check_props(self.config.prop_validation, config, new_props)?;

        let updated = match self
            .differ
            .diff(old_props, new_props, &config.valid_attributes)
        {
            Some(payload) => {
                self.view_manager
                    .update_view(tag, config.view_type().as_str(), &payload);
                true
            }
            None => false,
        };

        if let (Some(text_tag), Some(old_text), Some(new_text)) = (
            text_child,
            scalar_text_children(old_props),
            scalar_text_children(new_props),
        ) {
            self.commit_text_update(text_tag, old_text, new_text)?;
        }
        Ok(updated)
    }

    /// Replaces the content of a text instance when its stringified value
    /// changed. Returns whether an `update_view` was issued.
    pub fn commit_text_update(
        &mut self,
        tag: Tag,
        old_text: impl fmt::Display,
        new_text: impl fmt::Display,
    ) -> Result<bool, BridgeError> {
        let text = self.registry.text_mut(tag)?;
        let (old_text, new_text) = (old_text.to_string(), new_text.to_string());
        if old_text == new_text {
            return Ok(false);
        }
        text.text = new_text;
        let payload = text_payload(text.text.as_str());
        self.view_manager.update_view(tag, RAW_TEXT_CLASS, &payload);
        Ok(true)
    }

    /// Attaches `child` at the end of `parent`. A child already attached to
    /// `parent` is moved to the end instead.
    pub fn append_child(&mut self, parent: Tag, child: Tag) -> Result<(), BridgeError> {
        self.registry.require(child)?;
        let view = self.registry.view_mut(parent)?;
        let ops = match view.children.iter().position(|tag| *tag == child) {
            Some(from) => {
                view.children.remove(from);
                view.children.push(child);
                ManageChildren::move_child(from, view.children.len() - 1)
            }
            None => {
                view.children.push(child);
                ManageChildren::add(child, view.children.len() - 1)
            }
        };
        self.view_manager.manage_children(parent, &ops);
        Ok(())
    }

    /// Places `child` right before `before` among the children of `parent`,
    /// moving it if it is already attached there.
    pub fn insert_before(
        &mut self,
        parent: Tag,
        child: Tag,
        before: Tag,
    ) -> Result<(), BridgeError> {
        self.registry.require(child)?;
        let view = self.registry.view_mut(parent)?;
        if !view.children.contains(&before) {
            return Err(BridgeError::ChildNotFound {
                parent,
                child: before,
            });
        }
        if child == before {
            return Ok(());
        }

        let existing = view.children.iter().position(|tag| *tag == child);
        if let Some(from) = existing {
            view.children.remove(from);
        }
        let to = view
            .children
            .iter()
            .position(|tag| *tag == before)
            .ok_or(BridgeError::ChildNotFound {
                parent,
                child: before,
            })?;
        view.children.insert(to, child);

        let ops = match existing {
            Some(from) => ManageChildren::move_child(from, to),
            None => ManageChildren::add(child, to),
        };
        self.view_manager.manage_children(parent, &ops);
        Ok(())
    }

    /// Detaches `child` from `parent` and releases its subtree.
    ///
    /// A child that is not attached to `parent` is an error and issues no
    /// native command.
    pub fn remove_child(&mut self, parent: Tag, child: Tag) -> Result<(), BridgeError> {
        let view = self.registry.view_mut(parent)?;
        let index = view
            .children
            .iter()
            .position(|tag| *tag == child)
            .ok_or(BridgeError::ChildNotFound { parent, child })?;
        view.children.remove(index);
        if view.text_child == Some(child) {
            view.text_child = None;
        }
        self.view_manager
            .manage_children(parent, &ManageChildren::remove(index));
        self.registry.release_subtree(child);
        Ok(())
    }

    /// Replaces everything mounted in `container` with `children`.
    ///
    /// Previously mounted instances that are not part of the new list are
    /// released.
    pub fn update_container(
        &mut self,
        container: Tag,
        children: &[HostNode],
    ) -> Result<(), BridgeError> {
        let next = flatten_children(children);
        if let Some(unknown) = next.iter().find(|tag| !self.registry.contains(**tag)) {
            return Err(BridgeError::UnknownInstance { tag: *unknown });
        }
        let previous = self
            .containers
            .insert(container, next.clone())
            .unwrap_or_default();

        self.view_manager.remove_children(container, &previous);
        self.view_manager.set_children(container, &next);

        for stale in previous.iter().filter(|tag| !next.contains(tag)) {
            self.registry.release_subtree(*stale);
        }
        Ok(())
    }

    /// Mounts `children` into `container`, or updates what is already there.
    /// Returns `true` when this call mounted the container.
    pub fn render_root(
        &mut self,
        container: Tag,
        children: &[HostNode],
    ) -> Result<bool, BridgeError> {
        if self.config.warn_experimental && !EXPERIMENTAL_WARNED.swap(true, Ordering::Relaxed) {
            log::warn!(
                "this host bridge is an experimental renderer; \
                 expect bugs and breaking changes"
            );
        }
        if !container.is_root() {
            log::debug!("container {container} is outside the root tag space");
        }
        let mounting = !self.containers.contains_key(&container);
        self.update_container(container, children)?;
        Ok(mounting)
    }

    /// Removes the tree mounted in `container` and releases it.
    /// Returns the number of instances released.
    pub fn unmount_container(&mut self, container: Tag) -> Result<usize, BridgeError> {
        let mounted = self
            .containers
            .remove(&container)
            .ok_or(BridgeError::ContainerNotMounted { container })?;
        self.view_manager.remove_children(container, &mounted);
        Ok(mounted
            .iter()
            .map(|tag| self.registry.release_subtree(*tag))
            .sum())
    }

    pub fn mounted_children(&self, container: Tag) -> Option<&[Tag]> {
        self.containers.get(&container).map(Vec::as_slice)
    }

    /// Releases `tag` and its subtree from the registry.
    pub fn dispose(&mut self, tag: Tag) -> usize {
        self.registry.release_subtree(tag)
    }

    /// Tag of the host instance owned by a reconciler handle.
    pub fn find_node_handle<T: TaggedHandle + ?Sized>(&self, handle: &T) -> Result<Tag, BridgeError> {
        tag_from_handle(handle)
    }

    /// Reconciler handle cached for `tag`, if any.
    pub fn instance_from_tag(&self, tag: Tag) -> Option<&H> {
        self.registry.instance_from_tag(tag)
    }

    /// Forgets the cached handle association for `handle`'s tag.
    pub fn uncache(&mut self, handle: &impl TaggedHandle) -> Option<H> {
        self.registry.uncache(handle)
    }

    pub fn schedule_animation_callback(&self, callback: impl FnOnce(u64) + 'static) {
        let callback: FrameCallback = Box::new(callback);
        self.scheduler.schedule_animation_callback(callback);
    }

    pub fn schedule_deferred_callback(
        &self,
        callback: impl FnOnce(IdleDeadline) + 'static,
    ) {
        let callback: IdleCallback = Box::new(callback);
        self.scheduler.schedule_deferred_callback(callback);
    }
}

fn check_props(
    policy: PropValidation,
    config: &ViewConfig,
    props: &Props,
) -> Result<(), BridgeError> {
    if policy == PropValidation::Off {
        return Ok(());
    }
    for violation in config.validate(props) {
        match policy {
            PropValidation::Strict => {
                return Err(BridgeError::InvalidProp {
                    type_name: config.view_type().to_string(),
                    prop: violation.prop,
                    expected: violation.expected,
                })
            }
            _ => log::warn!(
                "invalid prop `{}` supplied to {}: expected {}",
                violation.prop,
                config.view_type(),
                violation.expected
            ),
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "tests/bridge_tests.rs"]
mod tests;
