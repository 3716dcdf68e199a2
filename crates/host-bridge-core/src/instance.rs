use crate::node::LeafKind;
use crate::tag::Tag;
use crate::view_config::ViewType;

/// Native class used for raw text instances.
pub const RAW_TEXT_CLASS: &str = "RCTRawText";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewInstance {
    pub tag: Tag,
    pub view_type: ViewType,
    /// Child tags in render order.
    pub children: Vec<Tag>,
    /// Raw text child synthesized from scalar `children` props.
    pub text_child: Option<Tag>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextInstance {
    pub tag: Tag,
    pub text: String,
}

/// In-memory record mirroring one created native view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostInstance {
    View(ViewInstance),
    Text(TextInstance),
}

impl HostInstance {
    pub fn tag(&self) -> Tag {
        match self {
            HostInstance::View(view) => view.tag,
            HostInstance::Text(text) => text.tag,
        }
    }

    pub fn kind(&self) -> LeafKind {
        match self {
            HostInstance::View(_) => LeafKind::View,
            HostInstance::Text(_) => LeafKind::Text,
        }
    }

    pub fn class_name(&self) -> &str {
        match self {
            HostInstance::View(view) => view.view_type.as_str(),
            HostInstance::Text(_) => RAW_TEXT_CLASS,
        }
    }

    /// Child tags; text instances never have children.
    pub fn children(&self) -> &[Tag] {
        match self {
            HostInstance::View(view) => &view.children,
            HostInstance::Text(_) => &[],
        }
    }

    pub fn as_view(&self) -> Option<&ViewInstance> {
        match self {
            HostInstance::View(view) => Some(view),
            HostInstance::Text(_) => None,
        }
    }

    pub fn as_view_mut(&mut self) -> Option<&mut ViewInstance> {
        match self {
            HostInstance::View(view) => Some(view),
            HostInstance::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextInstance> {
        match self {
            HostInstance::Text(text) => Some(text),
            HostInstance::View(_) => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextInstance> {
        match self {
            HostInstance::Text(text) => Some(text),
            HostInstance::View(_) => None,
        }
    }
}
