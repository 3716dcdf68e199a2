//! The native view manager seam.
//!
//! The bridge talks to the native side only through [`ViewManager`]. Commands
//! are fire-and-forget: nothing is returned and nothing is acknowledged, and
//! implementations are expected to apply them in submission order.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::collections::map::HashMap;
use crate::props::Payload;
use crate::tag::Tag;

/// Arguments of a `manage_children` command.
///
/// `move_from` and `remove_at_indices` refer to positions before the command;
/// `move_to` and `add_at_indices` refer to positions in the resulting list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManageChildren {
    pub move_from: Vec<usize>,
    pub move_to: Vec<usize>,
    pub add_child_tags: Vec<Tag>,
    pub add_at_indices: Vec<usize>,
    pub remove_at_indices: Vec<usize>,
}

impl ManageChildren {
    pub fn add(child: Tag, index: usize) -> Self {
        Self {
            add_child_tags: vec![child],
            add_at_indices: vec![index],
            ..Self::default()
        }
    }

    pub fn remove(index: usize) -> Self {
        Self {
            remove_at_indices: vec![index],
            ..Self::default()
        }
    }

    pub fn move_child(from: usize, to: usize) -> Self {
        Self {
            move_from: vec![from],
            move_to: vec![to],
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.move_from.is_empty()
            && self.add_child_tags.is_empty()
            && self.remove_at_indices.is_empty()
    }
}

pub trait ViewManager {
    fn create_view(&mut self, tag: Tag, class_name: &str, root_tag: Tag, payload: &Payload);
    fn update_view(&mut self, tag: Tag, class_name: &str, payload: &Payload);
    fn set_children(&mut self, tag: Tag, children: &[Tag]);
    fn remove_children(&mut self, tag: Tag, children: &[Tag]);
    fn manage_children(&mut self, tag: Tag, ops: &ManageChildren);
}

impl<V: ViewManager + ?Sized> ViewManager for &mut V {
    fn create_view(&mut self, tag: Tag, class_name: &str, root_tag: Tag, payload: &Payload) {
        (**self).create_view(tag, class_name, root_tag, payload)
    }

    fn update_view(&mut self, tag: Tag, class_name: &str, payload: &Payload) {
        (**self).update_view(tag, class_name, payload)
    }

    fn set_children(&mut self, tag: Tag, children: &[Tag]) {
        (**self).set_children(tag, children)
    }

    fn remove_children(&mut self, tag: Tag, children: &[Tag]) {
        (**self).remove_children(tag, children)
    }

    fn manage_children(&mut self, tag: Tag, ops: &ManageChildren) {
        (**self).manage_children(tag, ops)
    }
}

impl<V: ViewManager + ?Sized> ViewManager for Box<V> {
    fn create_view(&mut self, tag: Tag, class_name: &str, root_tag: Tag, payload: &Payload) {
        (**self).create_view(tag, class_name, root_tag, payload)
    }

    fn update_view(&mut self, tag: Tag, class_name: &str, payload: &Payload) {
        (**self).update_view(tag, class_name, payload)
    }

    fn set_children(&mut self, tag: Tag, children: &[Tag]) {
        (**self).set_children(tag, children)
    }

    fn remove_children(&mut self, tag: Tag, children: &[Tag]) {
        (**self).remove_children(tag, children)
    }

    fn manage_children(&mut self, tag: Tag, ops: &ManageChildren) {
        (**self).manage_children(tag, ops)
    }
}

/// One native command, in a form that can be stored, compared, or serialized.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum UiCommand {
    CreateView {
        tag: Tag,
        class_name: String,
        root_tag: Tag,
        payload: Payload,
    },
    UpdateView {
        tag: Tag,
        class_name: String,
        payload: Payload,
    },
    SetChildren {
        tag: Tag,
        children: Vec<Tag>,
    },
    RemoveChildren {
        tag: Tag,
        children: Vec<Tag>,
    },
    ManageChildren {
        tag: Tag,
        #[serde(flatten)]
        ops: ManageChildren,
    },
}

impl UiCommand {
    pub fn tag(&self) -> Tag {
        match self {
            UiCommand::CreateView { tag, .. }
            | UiCommand::UpdateView { tag, .. }
            | UiCommand::SetChildren { tag, .. }
            | UiCommand::RemoveChildren { tag, .. }
            | UiCommand::ManageChildren { tag, .. } => *tag,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            UiCommand::CreateView { .. } => "create_view",
            UiCommand::UpdateView { .. } => "update_view",
            UiCommand::SetChildren { .. } => "set_children",
            UiCommand::RemoveChildren { .. } => "remove_children",
            UiCommand::ManageChildren { .. } => "manage_children",
        }
    }

    /// Replays this command against a view manager.
    pub fn apply_to<V: ViewManager + ?Sized>(&self, view_manager: &mut V) {
        match self {
            UiCommand::CreateView {
                tag,
                class_name,
                root_tag,
                payload,
            } => view_manager.create_view(*tag, class_name, *root_tag, payload),
            UiCommand::UpdateView {
                tag,
                class_name,
                payload,
            } => view_manager.update_view(*tag, class_name, payload),
            UiCommand::SetChildren { tag, children } => view_manager.set_children(*tag, children),
            UiCommand::RemoveChildren { tag, children } => {
                view_manager.remove_children(*tag, children)
            }
            UiCommand::ManageChildren { tag, ops } => view_manager.manage_children(*tag, ops),
        }
    }
}

/// Collects commands in the order they are issued. Used to observe native
/// traffic and to build batches.
#[derive(Debug, Default)]
pub struct RecordingViewManager {
    commands: Vec<UiCommand>,
}

impl RecordingViewManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[UiCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<UiCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl ViewManager for RecordingViewManager {
    fn create_view(&mut self, tag: Tag, class_name: &str, root_tag: Tag, payload: &Payload) {
        self.commands.push(UiCommand::CreateView {
            tag,
            class_name: class_name.to_owned(),
            root_tag,
            payload: payload.clone(),
        });
    }

    fn update_view(&mut self, tag: Tag, class_name: &str, payload: &Payload) {
        self.commands.push(UiCommand::UpdateView {
            tag,
            class_name: class_name.to_owned(),
            payload: payload.clone(),
        });
    }

    fn set_children(&mut self, tag: Tag, children: &[Tag]) {
        self.commands.push(UiCommand::SetChildren {
            tag,
            children: children.to_vec(),
        });
    }

    fn remove_children(&mut self, tag: Tag, children: &[Tag]) {
        self.commands.push(UiCommand::RemoveChildren {
            tag,
            children: children.to_vec(),
        });
    }

    fn manage_children(&mut self, tag: Tag, ops: &ManageChildren) {
        self.commands.push(UiCommand::ManageChildren {
            tag,
            ops: ops.clone(),
        });
    }
}

/// Logs every command at debug level before forwarding it.
#[derive(Debug, Default)]
pub struct LoggingViewManager<V> {
    inner: V,
}

impl<V: ViewManager> LoggingViewManager<V> {
    pub fn new(inner: V) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &V {
        &self.inner
    }

    pub fn inner_mut(&mut self) -> &mut V {
        &mut self.inner
    }

    pub fn into_inner(self) -> V {
        self.inner
    }
}

impl<V: ViewManager> ViewManager for LoggingViewManager<V> {
    fn create_view(&mut self, tag: Tag, class_name: &str, root_tag: Tag, payload: &Payload) {
        log::debug!("create_view {tag} {class_name} root={root_tag} {payload:?}");
        self.inner.create_view(tag, class_name, root_tag, payload);
    }

    fn update_view(&mut self, tag: Tag, class_name: &str, payload: &Payload) {
        log::debug!("update_view {tag} {class_name} {payload:?}");
        self.inner.update_view(tag, class_name, payload);
    }

    fn set_children(&mut self, tag: Tag, children: &[Tag]) {
        log::debug!("set_children {tag} {children:?}");
        self.inner.set_children(tag, children);
    }

    fn remove_children(&mut self, tag: Tag, children: &[Tag]) {
        log::debug!("remove_children {tag} {children:?}");
        self.inner.remove_children(tag, children);
    }

    fn manage_children(&mut self, tag: Tag, ops: &ManageChildren) {
        log::debug!("manage_children {tag} {ops:?}");
        self.inner.manage_children(tag, ops);
    }
}

/// Something the in-memory native tree could not apply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NativeFault {
    #[error("view {tag} does not exist")]
    UnknownView { tag: Tag },
    #[error("view {tag} already exists")]
    DuplicateView { tag: Tag },
    #[error("index {index} out of range for {parent} with {len} children")]
    IndexOutOfRange { parent: Tag, index: usize, len: usize },
    #[error("{parent} has no child {child}")]
    MissingChild { parent: Tag, child: Tag },
    #[error("mismatched index lists in manage_children on {parent}")]
    MismatchedLengths { parent: Tag },
    #[error("index {index} removed twice from {parent}")]
    DuplicateIndex { parent: Tag, index: usize },
}

pub const ROOT_CLASS: &str = "RCTRootView";

#[derive(Clone, Debug, PartialEq)]
pub struct NativeView {
    pub class_name: String,
    pub root_tag: Tag,
    pub props: Payload,
    pub children: Vec<Tag>,
}

/// Applies commands to an in-memory copy of the native view tree.
///
/// Root container tags come into existence the first time children are set
/// on them. Commands that cannot be applied are logged, recorded as
/// [`NativeFault`]s and otherwise ignored, as a real native side would.
#[derive(Debug, Default)]
pub struct MemoryViewManager {
    views: HashMap<Tag, NativeView>,
    recorder: RecordingViewManager,
    faults: Vec<NativeFault>,
}

impl MemoryViewManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self, tag: Tag) -> Option<&NativeView> {
        self.views.get(&tag)
    }

    pub fn children_of(&self, tag: Tag) -> Option<&[Tag]> {
        self.views.get(&tag).map(|view| view.children.as_slice())
    }

    pub fn prop(&self, tag: Tag, name: &str) -> Option<&Value> {
        self.views.get(&tag)?.props.get(name)
    }

    /// Number of native views, root containers included.
    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Every command received so far, applied or not.
    pub fn commands(&self) -> &[UiCommand] {
        self.recorder.commands()
    }

    pub fn take_commands(&mut self) -> Vec<UiCommand> {
        self.recorder.take_commands()
    }

    pub fn faults(&self) -> &[NativeFault] {
        &self.faults
    }

    pub fn take_faults(&mut self) -> Vec<NativeFault> {
        std::mem::take(&mut self.faults)
    }

    pub fn dump_tree(&self, root: Tag) -> String {
        let mut output = String::new();
        self.dump_view(&mut output, root, 0);
        output
    }

    fn dump_view(&self, output: &mut String, tag: Tag, depth: usize) {
        let indent = "  ".repeat(depth);
        match self.views.get(&tag) {
            Some(view) => {
                let _ = writeln!(output, "{indent}[{}] {}", tag.get(), view.class_name);
                for child in &view.children {
                    self.dump_view(output, *child, depth + 1);
                }
            }
            None => {
                let _ = writeln!(output, "{indent}[{}] (missing)", tag.get());
            }
        }
    }

    fn fault(&mut self, fault: NativeFault) {
        log::error!("native command rejected: {fault}");
        self.faults.push(fault);
    }

    fn parent_mut(&mut self, tag: Tag) -> Option<&mut NativeView> {
        if tag.is_root() {
            return Some(self.views.entry(tag).or_insert_with(|| NativeView {
                class_name: ROOT_CLASS.to_owned(),
                root_tag: tag,
                props: Payload::new(),
                children: Vec::new(),
            }));
        }
        self.views.get_mut(&tag)
    }

    fn apply_manage_children(&mut self, tag: Tag, ops: &ManageChildren) -> Result<(), NativeFault> {
        if ops.move_from.len() != ops.move_to.len()
            || ops.add_child_tags.len() != ops.add_at_indices.len()
        {
            return Err(NativeFault::MismatchedLengths { parent: tag });
        }
        if let Some(missing) = ops
            .add_child_tags
            .iter()
            .find(|child| !self.views.contains_key(*child))
        {
            return Err(NativeFault::UnknownView { tag: *missing });
        }
        let parent = self
            .parent_mut(tag)
            .ok_or(NativeFault::UnknownView { tag })?;

        let len = parent.children.len();
        let mut removals: Vec<(usize, Option<usize>)> = ops
            .move_from
            .iter()
            .enumerate()
            .map(|(slot, index)| (*index, Some(slot)))
            .chain(ops.remove_at_indices.iter().map(|index| (*index, None)))
            .collect();
        if let Some((index, _)) = removals.iter().find(|(index, _)| *index >= len) {
            return Err(NativeFault::IndexOutOfRange {
                parent: tag,
                index: *index,
                len,
            });
        }
        removals.sort_by(|a, b| b.0.cmp(&a.0));
        if let Some(pair) = removals.windows(2).find(|pair| pair[0].0 == pair[1].0) {
            return Err(NativeFault::DuplicateIndex {
                parent: tag,
                index: pair[0].0,
            });
        }

        let mut moved: Vec<Option<Tag>> = vec![None; ops.move_from.len()];
        for (index, slot) in removals {
            let child = parent.children.remove(index);
            if let Some(slot) = slot {
                moved[slot] = Some(child);
            }
        }

        let mut insertions: Vec<(usize, Tag)> = moved
            .into_iter()
            .zip(&ops.move_to)
            .filter_map(|(child, to)| child.map(|child| (*to, child)))
            .chain(
                ops.add_at_indices
                    .iter()
                    .copied()
                    .zip(ops.add_child_tags.iter().copied()),
            )
            .collect();
        insertions.sort_by_key(|(index, _)| *index);
        for (index, child) in insertions {
            if index > parent.children.len() {
                return Err(NativeFault::IndexOutOfRange {
                    parent: tag,
                    index,
                    len: parent.children.len(),
                });
            }
            parent.children.insert(index, child);
        }
        Ok(())
    }
}

impl ViewManager for MemoryViewManager {
    fn create_view(&mut self, tag: Tag, class_name: &str, root_tag: Tag, payload: &Payload) {
        self.recorder.create_view(tag, class_name, root_tag, payload);
        if self.views.contains_key(&tag) {
            self.fault(NativeFault::DuplicateView { tag });
            return;
        }
        self.views.insert(
            tag,
            NativeView {
                class_name: class_name.to_owned(),
                root_tag,
                props: payload.clone(),
                children: Vec::new(),
            },
        );
    }

    fn update_view(&mut self, tag: Tag, class_name: &str, payload: &Payload) {
        self.recorder.update_view(tag, class_name, payload);
        let Some(view) = self.views.get_mut(&tag) else {
            self.fault(NativeFault::UnknownView { tag });
            return;
        };
        for (name, value) in payload {
            if value.is_null() {
                view.props.remove(name);
            } else {
                view.props.insert(name.clone(), value.clone());
            }
        }
    }

    fn set_children(&mut self, tag: Tag, children: &[Tag]) {
        self.recorder.set_children(tag, children);
        if let Some(missing) = children.iter().find(|child| !self.views.contains_key(*child)) {
            let missing = *missing;
            self.fault(NativeFault::UnknownView { tag: missing });
            return;
        }
        match self.parent_mut(tag) {
            Some(parent) => parent.children = children.to_vec(),
            None => self.fault(NativeFault::UnknownView { tag }),
        }
    }

    fn remove_children(&mut self, tag: Tag, children: &[Tag]) {
        self.recorder.remove_children(tag, children);
        let mut faults = Vec::new();
        match self.parent_mut(tag) {
            Some(parent) => {
                for child in children {
                    match parent.children.iter().position(|existing| existing == child) {
                        Some(index) => {
                            parent.children.remove(index);
                        }
                        None => faults.push(NativeFault::MissingChild {
                            parent: tag,
                            child: *child,
                        }),
                    }
                }
            }
            None => faults.push(NativeFault::UnknownView { tag }),
        }
        for fault in faults {
            self.fault(fault);
        }
    }

    fn manage_children(&mut self, tag: Tag, ops: &ManageChildren) {
        self.recorder.manage_children(tag, ops);
        if let Err(fault) = self.apply_manage_children(tag, ops) {
            self.fault(fault);
        }
    }
}

#[cfg(test)]
#[path = "tests/view_manager_tests.rs"]
mod tests;
