use thiserror::Error;

use crate::tag::Tag;

/// Failures surfaced by bridge operations.
///
/// None of these are retried; they indicate either a configuration mistake
/// (an unregistered view type) or a reconciler driving the bridge with
/// handles that do not match its bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("{type_name} does not have a view config registered")]
    TypeNotRegistered { type_name: String },
    #[error("all native instances should have a tag")]
    MissingTag,
    #[error("no host instance registered for tag {tag}")]
    UnknownInstance { tag: Tag },
    #[error("instance {tag} is not a view")]
    NotAView { tag: Tag },
    #[error("instance {tag} is not a text instance")]
    NotText { tag: Tag },
    #[error("instance {child} is not a child of {parent}")]
    ChildNotFound { parent: Tag, child: Tag },
    #[error("invalid prop `{prop}` supplied to {type_name}: expected {expected}")]
    InvalidProp {
        type_name: String,
        prop: String,
        expected: String,
    },
    #[error("no tree is mounted in container {container}")]
    ContainerNotMounted { container: Tag },
}
