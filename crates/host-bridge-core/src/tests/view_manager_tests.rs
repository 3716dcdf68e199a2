use super::*;
use serde_json::json;

fn payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn tree_with_children(count: u32) -> MemoryViewManager {
    let mut native = MemoryViewManager::new();
    native.create_view(Tag(2), "RCTView", Tag(1), &Payload::new());
    let children: Vec<Tag> = (0..count).map(|i| Tag(10 + i * 10 + 2)).collect();
    for child in &children {
        native.create_view(*child, "RCTView", Tag(1), &Payload::new());
    }
    native.set_children(Tag(2), &children);
    native
}

#[test]
fn recording_keeps_submission_order() {
    let mut recorder = RecordingViewManager::new();
    recorder.create_view(Tag(2), "RCTView", Tag(1), &Payload::new());
    recorder.set_children(Tag(2), &[]);
    recorder.manage_children(Tag(2), &ManageChildren::remove(0));
    let names: Vec<&str> = recorder.commands().iter().map(UiCommand::name).collect();
    assert_eq!(names, vec!["create_view", "set_children", "manage_children"]);
    assert_eq!(recorder.take_commands().len(), 3);
    assert!(recorder.is_empty());
}

#[test]
fn update_merges_and_null_clears() {
    let mut native = MemoryViewManager::new();
    native.create_view(
        Tag(2),
        "RCTView",
        Tag(1),
        &payload(json!({"color": "red", "opacity": 1})),
    );
    native.update_view(
        Tag(2),
        "RCTView",
        &payload(json!({"color": "blue", "opacity": null})),
    );
    assert_eq!(native.prop(Tag(2), "color"), Some(&json!("blue")));
    assert_eq!(native.prop(Tag(2), "opacity"), None);
    assert!(native.faults().is_empty());
}

#[test]
fn manage_children_add_remove_and_move() {
    let mut native = tree_with_children(3);
    let [a, b, c] = [Tag(12), Tag(22), Tag(32)];
    native.create_view(Tag(42), "RCTView", Tag(1), &Payload::new());

    native.manage_children(Tag(2), &ManageChildren::add(Tag(42), 1));
    assert_eq!(native.children_of(Tag(2)), Some(&[a, Tag(42), b, c][..]));

    native.manage_children(Tag(2), &ManageChildren::move_child(3, 0));
    assert_eq!(native.children_of(Tag(2)), Some(&[c, a, Tag(42), b][..]));

    native.manage_children(Tag(2), &ManageChildren::remove(2));
    assert_eq!(native.children_of(Tag(2)), Some(&[c, a, b][..]));
    assert!(native.faults().is_empty());
}

#[test]
fn out_of_range_removal_is_a_fault_and_leaves_children_alone() {
    let mut native = tree_with_children(2);
    native.manage_children(Tag(2), &ManageChildren::remove(5));
    assert_eq!(
        native.take_faults(),
        vec![NativeFault::IndexOutOfRange {
            parent: Tag(2),
            index: 5,
            len: 2
        }]
    );
    assert_eq!(native.children_of(Tag(2)).map(<[Tag]>::len), Some(2));
}

#[test]
fn duplicate_removal_is_rejected() {
    let mut native = tree_with_children(3);
    let ops = ManageChildren {
        remove_at_indices: vec![1, 1],
        ..ManageChildren::default()
    };
    native.manage_children(Tag(2), &ops);
    assert_eq!(
        native.faults(),
        &[NativeFault::DuplicateIndex {
            parent: Tag(2),
            index: 1
        }]
    );
}

#[test]
fn root_containers_appear_on_first_set_children() {
    let mut native = MemoryViewManager::new();
    native.create_view(Tag(2), "RCTView", Tag(1), &Payload::new());
    native.set_children(Tag(1), &[Tag(2)]);
    assert_eq!(native.children_of(Tag(1)), Some(&[Tag(2)][..]));
    assert_eq!(native.view(Tag(1)).map(|view| view.class_name.as_str()), Some(ROOT_CLASS));

    native.remove_children(Tag(1), &[Tag(2)]);
    assert_eq!(native.children_of(Tag(1)), Some(&[][..]));
    assert_eq!(native.dump_tree(Tag(1)), "[1] RCTRootView\n");
}

#[test]
fn unknown_targets_are_faults() {
    let mut native = MemoryViewManager::new();
    native.update_view(Tag(9), "RCTView", &Payload::new());
    native.set_children(Tag(4), &[]);
    native.create_view(Tag(2), "RCTView", Tag(1), &Payload::new());
    native.create_view(Tag(2), "RCTView", Tag(1), &Payload::new());
    assert_eq!(
        native.faults(),
        &[
            NativeFault::UnknownView { tag: Tag(9) },
            NativeFault::UnknownView { tag: Tag(4) },
            NativeFault::DuplicateView { tag: Tag(2) },
        ]
    );
    assert_eq!(native.commands().len(), 4);
}

#[test]
fn commands_replay_onto_another_manager() {
    let mut source = tree_with_children(2);
    source.manage_children(Tag(2), &ManageChildren::move_child(0, 1));
    let mut replica = MemoryViewManager::new();
    for command in source.commands() {
        command.apply_to(&mut replica);
    }
    assert_eq!(replica.children_of(Tag(2)), source.children_of(Tag(2)));
    assert_eq!(replica.dump_tree(Tag(2)), source.dump_tree(Tag(2)));
}

#[test]
fn manage_children_serializes_flat() {
    let command = UiCommand::ManageChildren {
        tag: Tag(2),
        ops: ManageChildren::add(Tag(3), 0),
    };
    let value = serde_json::to_value(&command).expect("serialize");
    assert_eq!(value["op"], "manage_children");
    assert_eq!(value["tag"], 2);
    assert_eq!(value["add_child_tags"], json!([3]));
    assert_eq!(value["add_at_indices"], json!([0]));
}
