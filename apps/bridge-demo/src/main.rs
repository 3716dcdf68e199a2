use std::rc::Rc;
use std::time::Duration;

use host_bridge_core::{
    AttributeConfig, BatchingViewManager, BridgeConfig, BridgeError, HostBridge, HostNode,
    LoggingViewManager, MemoryViewManager, Props, Tag, ValidAttributes, ViewConfig,
};
use host_bridge_runtime_std::StdHostScheduler;
use serde_json::{json, Value};

type DemoBridge = HostBridge<LoggingViewManager<MemoryViewManager>, &'static str>;

fn props(value: Value) -> Props {
    match value {
        Value::Object(map) => map,
        _ => Props::new(),
    }
}

fn style() -> AttributeConfig {
    AttributeConfig::Nested(ValidAttributes::plain([
        "flex",
        "padding",
        "color",
        "backgroundColor",
        "fontSize",
    ]))
}

fn view_configs() -> [ViewConfig; 2] {
    [
        ViewConfig::new("View").with_attributes(
            ValidAttributes::plain(["testID", "opacity"]).with("style", style()),
        ),
        ViewConfig::new("Text").with_attributes(ValidAttributes::new().with("style", style())),
    ]
}

fn counter_row(bridge: &mut DemoBridge, count: u32) -> Result<(Tag, Tag), BridgeError> {
    let label = bridge.create_instance(
        "Text",
        &props(json!({"children": count, "style": {"fontSize": 18}})),
        &[],
        "label",
    )?;
    let row = bridge.create_instance(
        "View",
        &props(json!({"testID": "counter", "style": [{"flex": 1}, {"padding": 8}]})),
        &[HostNode::composite([HostNode::View(label)])],
        "row",
    )?;
    Ok((row, label))
}

fn run_tree_demo(scheduler: Rc<StdHostScheduler>) -> Result<(), BridgeError> {
    let mut bridge: DemoBridge = HostBridge::with_config(
        LoggingViewManager::new(MemoryViewManager::new()),
        BridgeConfig::default(),
    )
    .with_scheduler(scheduler.clone());
    for config in view_configs() {
        bridge.register_view_type(config);
    }

    let (row, label) = counter_row(&mut bridge, 0)?;
    bridge.render_root(Tag::DEFAULT_ROOT, &[HostNode::View(row)])?;
    println!("Mounted:");
    print!("{}", bridge.view_manager().inner().dump_tree(Tag::DEFAULT_ROOT));

    for count in 1..=3_u32 {
        bridge.schedule_animation_callback(move |frame| {
            log::info!("frame {frame}: count is now {count}");
        });
        bridge.commit_update(
            label,
            &props(json!({"children": count - 1, "style": {"fontSize": 18}})),
            &props(json!({"children": count, "style": {"fontSize": 18 + count}})),
        )?;
        scheduler.run_frame(scheduler.now_nanos());
    }

    let footer = bridge.create_text_instance("done", "footer");
    bridge.append_child(row, footer)?;
    println!("After updates:");
    print!("{}", bridge.view_manager().inner().dump_tree(Tag::DEFAULT_ROOT));
    println!(
        "Commands issued: {}",
        bridge.view_manager().inner().commands().len()
    );

    bridge.schedule_deferred_callback(|deadline| {
        log::info!("idle work with {:.1}ms left", deadline.time_remaining());
    });
    scheduler.run_idle(Duration::from_millis(16));

    let released = bridge.unmount_container(Tag::DEFAULT_ROOT)?;
    println!("Unmounted {released} instance(s)");
    Ok(())
}

fn run_batch_demo() -> Result<(), Box<dyn std::error::Error>> {
    let mut bridge: HostBridge<BatchingViewManager, ()> = HostBridge::with_config(
        BatchingViewManager::new(),
        BridgeConfig::default().with_warn_experimental(false),
    );
    for config in view_configs() {
        bridge.register_view_type(config);
    }
    let greeting = bridge.create_instance(
        "Text",
        &props(json!({"children": "Hello from the bridge"})),
        &[],
        (),
    )?;
    bridge.render_root(Tag::DEFAULT_ROOT, &[HostNode::View(greeting)])?;

    let mut wire = Vec::new();
    let flushed = bridge.view_manager_mut().flush(&mut wire)?;
    println!("Flushed {flushed} command(s) in a {} byte frame", wire.len());

    let batch = host_bridge_core::protocol::read_batch(&mut wire.as_slice())?;
    let mut native = MemoryViewManager::new();
    batch.apply_to(&mut native);
    print!("{}", native.dump_tree(Tag::DEFAULT_ROOT));
    Ok(())
}

fn main() {
    env_logger::init();

    println!("=== Host Bridge Demo ===");
    println!();

    let scheduler = Rc::new(StdHostScheduler::new());
    if let Err(err) = run_tree_demo(scheduler) {
        log::error!("tree demo failed: {err}");
    }
    println!();
    if let Err(err) = run_batch_demo() {
        log::error!("batch demo failed: {err}");
    }
}
