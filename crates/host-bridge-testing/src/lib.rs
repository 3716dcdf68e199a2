//! Testing utilities and harness for host-bridge

pub mod testing;

pub use testing::*;

pub mod prelude {
    pub use crate::testing::*;
    pub use host_bridge_core::{HostNode, Props, Tag, UiCommand};
}
