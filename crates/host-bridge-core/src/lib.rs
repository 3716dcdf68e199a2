#![doc = r"Host-instance bridge between a tree reconciler and a native view manager."]

pub mod attributes;
pub mod bridge;
mod collections;
pub mod error;
pub mod instance;
pub mod node;
pub mod platform;
pub mod props;
pub mod protocol;
pub mod registry;
pub mod tag;
pub mod view_config;
pub mod view_manager;

pub use attributes::{AttributeConfig, AttributeDiffer, PayloadDiffer, ValidAttributes};
pub use bridge::{BridgeConfig, HostBridge, PropValidation};
pub use error::BridgeError;
pub use instance::{HostInstance, TextInstance, ViewInstance, RAW_TEXT_CLASS};
pub use node::{flatten_children, flatten_leaves, HostLeaf, HostNode, LeafKind};
pub use platform::{HostScheduler, IdleDeadline, ImmediateScheduler};
pub use props::{Payload, Props};
pub use protocol::{BatchingViewManager, CommandBatch};
pub use registry::{tag_from_handle, InstanceRegistry, TaggedHandle};
pub use tag::{RootTagAllocator, Tag, TagAllocator};
pub use view_config::{PropValidator, ViewConfig, ViewConfigRegistry, ViewType};
pub use view_manager::{
    LoggingViewManager, ManageChildren, MemoryViewManager, NativeFault, RecordingViewManager,
    UiCommand, ViewManager,
};
