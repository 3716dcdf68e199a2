use host_bridge_core::{
    BridgeConfig, BridgeError, HostBridge, HostNode, MemoryViewManager, Props, Tag, TaggedHandle,
    UiCommand, ValidAttributes, ViewConfig,
};
use serde_json::Value;

/// Stand-in for a reconciler node: an id plus the tag of the host instance
/// it owns, once created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TestHandle {
    pub id: usize,
    pub tag: Option<Tag>,
}

impl TaggedHandle for TestHandle {
    fn tag(&self) -> Option<Tag> {
        self.tag
    }
}

/// Headless harness for driving a [`HostBridge`] the way a reconciler would.
///
/// The rule owns a bridge backed by [`MemoryViewManager`], hands out
/// [`TestHandle`]s for every created instance and exposes the resulting
/// native tree and command log for assertions.
pub struct BridgeTestRule {
    bridge: HostBridge<MemoryViewManager, TestHandle>,
    next_handle: usize,
}

impl BridgeTestRule {
    /// Create a rule with `View` and `Text` registered and the experimental
    /// warning silenced.
    pub fn new() -> Self {
        Self::with_config(BridgeConfig::default().with_warn_experimental(false))
    }

    pub fn with_config(config: BridgeConfig) -> Self {
        let mut bridge = HostBridge::with_config(MemoryViewManager::new(), config);
        bridge.register_view_type(
            ViewConfig::new("View")
                .with_attributes(ValidAttributes::plain(["style", "opacity", "testID"])),
        );
        bridge.register_view_type(
            ViewConfig::new("Text")
                .with_attributes(ValidAttributes::plain(["style", "numberOfLines"])),
        );
        Self {
            bridge,
            next_handle: 0,
        }
    }

    pub fn register(&mut self, config: ViewConfig) -> &mut Self {
        self.bridge.register_view_type(config);
        self
    }

    pub fn create(
        &mut self,
        view_type: &str,
        props: &Props,
        children: &[HostNode],
    ) -> Result<Tag, BridgeError> {
        let handle = self.next_handle();
        self.bridge.create_instance(view_type, props, children, handle)
    }

    /// Creates a view whose flattened children are `children`.
    pub fn view(&mut self, children: &[Tag]) -> Result<Tag, BridgeError> {
        let nodes: Vec<HostNode> = children.iter().copied().map(HostNode::View).collect();
        self.create("View", &Props::new(), &nodes)
    }

    pub fn text(&mut self, text: &str) -> Tag {
        let handle = self.next_handle();
        self.bridge.create_text_instance(text, handle)
    }

    /// Mounts `children` in the default root container.
    pub fn mount(&mut self, children: &[HostNode]) -> Result<(), BridgeError> {
        self.bridge
            .render_root(Tag::DEFAULT_ROOT, children)
            .map(|_| ())
    }

    /// The handle cached for `tag`, carrying the tag as a reconciler node
    /// would after creation.
    pub fn handle(&self, tag: Tag) -> Option<TestHandle> {
        self.bridge.instance_from_tag(tag).map(|handle| TestHandle {
            tag: Some(tag),
            ..*handle
        })
    }

    pub fn bridge(&mut self) -> &mut HostBridge<MemoryViewManager, TestHandle> {
        &mut self.bridge
    }

    pub fn native(&self) -> &MemoryViewManager {
        self.bridge.view_manager()
    }

    pub fn dump(&self) -> String {
        self.native().dump_tree(Tag::DEFAULT_ROOT)
    }

    /// Drains the command log, returning what was issued since the last call.
    pub fn take_commands(&mut self) -> Vec<UiCommand> {
        self.bridge.view_manager_mut().take_commands()
    }

    pub fn command_names(&mut self) -> Vec<&'static str> {
        self.take_commands().iter().map(UiCommand::name).collect()
    }

    /// Panics with the native faults if any command could not be applied.
    pub fn assert_no_faults(&self) {
        let faults = self.native().faults();
        assert!(faults.is_empty(), "native faults: {faults:?}");
    }

    pub fn assert_children(&self, parent: Tag, expected: &[Tag]) {
        assert_eq!(
            self.native().children_of(parent),
            Some(expected),
            "native children of {parent}"
        );
        if !parent.is_root() {
            assert_eq!(
                self.bridge.instance(parent).map(|instance| instance.children()),
                Some(expected),
                "host children of {parent}"
            );
        }
    }

    fn next_handle(&mut self) -> TestHandle {
        let id = self.next_handle;
        self.next_handle += 1;
        TestHandle { id, tag: None }
    }
}

impl Default for BridgeTestRule {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds props from a JSON object literal. Anything else yields empty props.
pub fn props(value: Value) -> Props {
    match value {
        Value::Object(map) => map,
        _ => Props::new(),
    }
}

/// Convenience helper for tests that only need temporary access to a
/// `BridgeTestRule`.
pub fn run_test_bridge<R>(f: impl FnOnce(&mut BridgeTestRule) -> R) -> R {
    let mut rule = BridgeTestRule::new();
    f(&mut rule)
}
