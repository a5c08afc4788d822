//! Attachable lifecycle tests
//!
//! Tests for:
//! - Mount → Ready with character and model present
//! - Waiting for a late character / model
//! - Skinned content rejection (record deleted, never Ready)
//! - Store update dispatch and echo suppression
//! - Rebinding through the store, losing the character, model changes
//! - Gizmo write-back and idempotent teardown

mod common;

use std::sync::Arc;

use common::{World, default_rig, quat_approx, skinned_model, spawn_character, static_model, vec3_approx};
use glam::{Quat, Vec3};
use myth_attach::attach::control::SurfaceId;
use myth_attach::attach::frame;
use myth_attach::attach::{AttachEvent, AttachableLifecycle, LifecycleState, TransformSynchronizer};
use myth_attach::errors::AttachError;
use myth_attach::settings::AttachSettings;
use myth_attach::store::{AttachableRecord, ObjectId, Rotation};
use std::f32::consts::FRAC_PI_2;

fn hat_record() -> AttachableRecord {
    let mut record = AttachableRecord::new("hat", "bob", "Head");
    record.x = 0.0;
    record.y = 2.3;
    record.z = 0.1;
    record.rotation = Rotation::new(0.2, 0.0, 0.0);
    record
}

fn lifecycle(world: &mut World, record: AttachableRecord) -> AttachableLifecycle {
    world.store.insert(record.clone());
    AttachableLifecycle::new(record, Arc::new(AttachSettings::default()), world.camera, SurfaceId(1))
}

fn hat_id() -> ObjectId {
    ObjectId::from("hat")
}

/// Lifecycle mounted on "bob" and ready.
fn ready_hat(world: &mut World) -> AttachableLifecycle {
    spawn_character(&mut world.scene, "bob", Vec3::ZERO, 1.0, &default_rig());
    let mut hat = lifecycle(world, hat_record());
    hat.mount(&mut world.env(), Some(Arc::new(static_model())));
    assert_eq!(hat.state(), LifecycleState::Ready);
    world.store.take_updates();
    hat
}

// ============================================================================
// Mount
// ============================================================================

#[test]
fn mount_with_character_and_model_becomes_ready() {
    let mut world = World::new();
    let bob = spawn_character(&mut world.scene, "bob", Vec3::ZERO, 1.0, &default_rig());
    let mut hat = lifecycle(&mut world, hat_record());

    hat.mount(&mut world.env(), Some(Arc::new(static_model())));

    assert_eq!(hat.state(), LifecycleState::Ready);
    let node = hat.node().unwrap();
    assert_eq!(world.scene.parent_of(node.container()), Some(bob.bone(&world.scene, "Head")));
    assert_eq!(node.content().len(), 1);
    assert!(world.registry.contains(&ObjectId::from("bob"), &hat_id()));
    assert!(world.store.get(&hat_id()).unwrap().loaded);
    assert!(hat.record().loaded);

    // Stored world pose is applied on entering Ready.
    let container = node.container();
    assert!(vec3_approx(world.world_position(container), Vec3::new(0.0, 2.3, 0.1)));

    // The control was built with can_switch off and a write-back callback.
    let control = world.control();
    assert_eq!(control.created.len(), 1);
    assert_eq!(control.created[0].character, bob.handle);
    assert!(!control.can_switch);
    assert!(control.callback.is_some());
}

#[test]
fn mount_without_character_waits_then_initializes() {
    let mut world = World::new();
    let mut hat = lifecycle(&mut world, hat_record());

    hat.mount(&mut world.env(), Some(Arc::new(static_model())));
    assert_eq!(hat.state(), LifecycleState::AwaitingCharacter);
    assert!(world.registry.is_empty());
    assert!(!hat.node().unwrap().has_content());

    spawn_character(&mut world.scene, "bob", Vec3::ZERO, 1.0, &default_rig());
    hat.scene_changed(&mut world.env());

    assert_eq!(hat.state(), LifecycleState::Ready);
}

#[test]
fn mount_without_model_waits_for_model() {
    let mut world = World::new();
    spawn_character(&mut world.scene, "bob", Vec3::ZERO, 1.0, &default_rig());
    let mut hat = lifecycle(&mut world, hat_record());

    hat.mount(&mut world.env(), None);
    assert_eq!(hat.state(), LifecycleState::AwaitingCharacter);

    hat.set_model(&mut world.env(), Some(Arc::new(static_model())));
    assert_eq!(hat.state(), LifecycleState::Ready);
}

#[test]
fn missing_bone_waits() {
    let mut world = World::new();
    spawn_character(&mut world.scene, "bob", Vec3::ZERO, 1.0, &default_rig());
    let mut hat = lifecycle(&mut world, AttachableRecord::new("hat", "bob", "Tail"));

    hat.mount(&mut world.env(), Some(Arc::new(static_model())));
    assert_eq!(hat.state(), LifecycleState::AwaitingCharacter);

    let mut record = hat.record().clone();
    record.bind_bone_name = "Head".into();
    hat.update(&mut world.env(), record);
    assert_eq!(hat.state(), LifecycleState::Ready);
}

#[test]
fn skinned_model_deletes_record_and_never_readies() {
    let mut world = World::new();
    spawn_character(&mut world.scene, "bob", Vec3::ZERO, 1.0, &default_rig());
    let mut hat = lifecycle(&mut world, hat_record());

    hat.mount(&mut world.env(), Some(Arc::new(skinned_model())));

    assert_ne!(hat.state(), LifecycleState::Ready);
    assert_eq!(world.store.deleted(), &[hat_id()]);
    assert!(world.store.get(&hat_id()).is_none());
    assert!(world.registry.is_empty());
    assert!(!hat.node().unwrap().has_content());
    assert!(world.scene.parent_of(hat.node().unwrap().container()).is_none());

    // Further scene changes do not retry the rejected model.
    hat.scene_changed(&mut world.env());
    assert_ne!(hat.state(), LifecycleState::Ready);
    assert_eq!(world.store.deleted().len(), 1);
}

// ============================================================================
// Store updates
// ============================================================================

#[test]
fn rotation_update_sets_world_rotation() {
    let mut world = World::new();
    let mut hat = ready_hat(&mut world);

    let mut record = hat.record().clone();
    record.rotation = Rotation::new(0.0, FRAC_PI_2, 0.0);
    hat.update(&mut world.env(), record);

    let pose = TransformSynchronizer::world_pose(&mut world.scene, hat.node().unwrap()).unwrap();
    assert!(quat_approx(pose.rotation, frame::quat_from_euler(Vec3::new(0.0, FRAC_PI_2, 0.0))));
}

#[test]
fn position_update_moves_node_in_world_space() {
    let mut world = World::new();
    let mut hat = ready_hat(&mut world);

    hat.handle(&mut world.env(), AttachEvent::PositionChanged(Vec3::new(1.0, 1.0, 1.0)));

    let container = hat.node().unwrap().container();
    assert!(vec3_approx(world.world_position(container), Vec3::ONE));
    assert_eq!(hat.record().position(), Vec3::ONE);
}

#[test]
fn updates_before_ready_are_deferred() {
    let mut world = World::new();
    let mut hat = lifecycle(&mut world, hat_record());
    hat.mount(&mut world.env(), Some(Arc::new(static_model())));

    let mut record = hat.record().clone();
    record.x = 7.0;
    hat.update(&mut world.env(), record);
    assert_eq!(hat.state(), LifecycleState::AwaitingCharacter);

    spawn_character(&mut world.scene, "bob", Vec3::ZERO, 1.0, &default_rig());
    hat.scene_changed(&mut world.env());

    let container = hat.node().unwrap().container();
    assert!((world.world_position(container).x - 7.0).abs() < 1e-4);
}

#[test]
fn echoed_store_writes_are_not_reapplied() {
    let mut world = World::new();
    let mut hat = ready_hat(&mut world);

    hat.save_to_store(&mut world.env()).unwrap();
    assert_eq!(world.store.take_updates().len(), 1);

    let echoed = world.store.get(&hat_id()).unwrap().clone();
    assert_eq!(&echoed, hat.record());
    hat.update(&mut world.env(), echoed);

    assert!(world.store.updates().is_empty());
}

#[test]
fn size_update_on_scaled_character() {
    let mut world = World::new();
    spawn_character(&mut world.scene, "giant", Vec3::ZERO, 2.0, &default_rig());
    let mut hat = lifecycle(&mut world, AttachableRecord::new("hat", "giant", "Head"));
    hat.mount(&mut world.env(), Some(Arc::new(static_model())));

    let mut record = hat.record().clone();
    record.size = 3.0;
    hat.update(&mut world.env(), record);
    hat.handle(&mut world.env(), AttachEvent::SizeChanged(1.0));

    assert!((hat.node().unwrap().scale() - 0.5).abs() < 1e-6);
}

// ============================================================================
// Rebinding
// ============================================================================

#[test]
fn new_character_in_store_rebinds_preserving_world_position() {
    let mut world = World::new();
    let mut hat = ready_hat(&mut world);
    let alice = spawn_character(&mut world.scene, "alice", Vec3::new(4.0, 0.0, 0.0), 2.0, &default_rig());
    let container = hat.node().unwrap().container();
    let before = world.world_position(container);

    let mut record = hat.record().clone();
    record.attach_to_id = ObjectId::from("alice");
    world.store.insert(record.clone());
    hat.update(&mut world.env(), record);

    assert_eq!(hat.state(), LifecycleState::Ready);
    assert_eq!(world.scene.parent_of(container), Some(alice.bone(&world.scene, "Head")));
    assert!(vec3_approx(world.world_position(container), before));
    assert!(world.registry.contains(&ObjectId::from("alice"), &hat_id()));
    assert!(!world.registry.contains(&ObjectId::from("bob"), &hat_id()));
    assert!((hat.node().unwrap().scale() - 0.5).abs() < 1e-6);

    // The rebind wrote the position back, and the echo is a no-op.
    assert!(!world.store.updates().is_empty());
    world.store.take_updates();
    let echoed = world.store.get(&hat_id()).unwrap().clone();
    hat.update(&mut world.env(), echoed);
    assert!(world.store.updates().is_empty());

    // A control for the new character replaced the old one.
    assert_eq!(world.control().created.last().unwrap().character, alice.handle);
}

#[test]
fn new_bone_on_same_character_rebinds() {
    let mut world = World::new();
    let mut hat = ready_hat(&mut world);
    let bob = hat.node().unwrap().character().unwrap().handle;
    let spine = world
        .scene
        .find_in_subtree(bob, |h| world.scene.get_name(h) == Some("Spine"))
        .unwrap();

    let mut record = hat.record().clone();
    record.bind_bone_name = "Spine".into();
    hat.update(&mut world.env(), record);

    let container = hat.node().unwrap().container();
    assert_eq!(world.scene.parent_of(container), Some(spine));
    assert_eq!(hat.node().unwrap().bind_bone_name(), "Spine");
    assert_eq!(world.registry.attachable_count(&ObjectId::from("bob")), 1);
}

#[test]
fn missing_bone_keeps_current_binding() {
    let mut world = World::new();
    let mut hat = ready_hat(&mut world);
    let container = hat.node().unwrap().container();
    let parent = world.scene.parent_of(container);

    let mut record = hat.record().clone();
    record.bind_bone_name = "Tail".into();
    hat.update(&mut world.env(), record);

    assert_eq!(hat.state(), LifecycleState::Ready);
    assert_eq!(world.scene.parent_of(container), parent);
}

#[test]
fn unknown_character_drops_back_to_awaiting() {
    let mut world = World::new();
    let mut hat = ready_hat(&mut world);

    let mut record = hat.record().clone();
    record.attach_to_id = ObjectId::from("nobody");
    hat.update(&mut world.env(), record);

    assert_eq!(hat.state(), LifecycleState::AwaitingCharacter);
    assert!(!world.store.get(&hat_id()).unwrap().loaded);
    assert!(world.registry.is_empty());
}

#[test]
fn host_rebind_requires_ready() {
    let mut world = World::new();
    let mut hat = lifecycle(&mut world, hat_record());
    let err = hat.rebind(&mut world.env(), 1.0).unwrap_err();
    assert!(matches!(err, AttachError::NotBound(_)));
}

#[test]
fn host_rebind_applies_explicit_scale() {
    let mut world = World::new();
    let mut hat = ready_hat(&mut world);
    hat.rebind(&mut world.env(), 4.0).unwrap();
    assert!((hat.node().unwrap().scale() - 0.25).abs() < 1e-6);
}

// ============================================================================
// Character / model availability
// ============================================================================

#[test]
fn deleted_character_invalidates_ready() {
    let mut world = World::new();
    let mut hat = ready_hat(&mut world);
    let character = hat.node().unwrap().character().unwrap().handle;

    world.scene.remove_node(character);
    hat.scene_changed(&mut world.env());

    assert_eq!(hat.state(), LifecycleState::AwaitingCharacter);
    assert!(!world.store.get(&hat_id()).unwrap().loaded);
    assert!(!hat.record().loaded);
    assert!(world.registry.is_empty());
    assert!(!hat.has_rotation_control());

    // The character comes back.
    spawn_character(&mut world.scene, "bob", Vec3::ZERO, 1.0, &default_rig());
    hat.scene_changed(&mut world.env());
    assert_eq!(hat.state(), LifecycleState::Ready);
    assert!(world.scene.contains(hat.node().unwrap().container()));
    assert_eq!(world.registry.attachable_count(&ObjectId::from("bob")), 1);
}

#[test]
fn retarget_after_old_character_removed_rebuilds_on_new_one() {
    let mut world = World::new();
    let mut hat = ready_hat(&mut world);
    let bob = hat.node().unwrap().character().unwrap().handle;
    let old_container = hat.node().unwrap().container();
    let alice = spawn_character(&mut world.scene, "alice", Vec3::new(4.0, 0.0, 0.0), 1.0, &default_rig());

    // The container goes down with bob before the scene notification arrives.
    world.scene.remove_node(bob);
    assert!(!world.scene.contains(old_container));

    let mut record = hat.record().clone();
    record.attach_to_id = ObjectId::from("alice");
    world.store.insert(record.clone());
    hat.update(&mut world.env(), record);

    assert_eq!(hat.state(), LifecycleState::Ready);
    let container = hat.node().unwrap().container();
    assert!(world.scene.contains(container));
    assert_eq!(world.scene.parent_of(container), Some(alice.bone(&world.scene, "Head")));
    assert_eq!(hat.node().unwrap().character().unwrap().handle, alice.handle);
    assert_eq!(world.registry.character_of(&hat_id()), Some(&ObjectId::from("alice")));
    assert_eq!(world.registry.attachable_count(&ObjectId::from("bob")), 0);
    assert!(world.store.get(&hat_id()).unwrap().loaded);
    assert!(hat.has_rotation_control());
}

#[test]
fn model_change_rebuilds_content() {
    let mut world = World::new();
    let mut hat = ready_hat(&mut world);
    let old_content = hat.node().unwrap().content().to_vec();

    hat.set_model(&mut world.env(), Some(Arc::new(static_model())));

    assert_eq!(hat.state(), LifecycleState::Ready);
    let new_content = hat.node().unwrap().content();
    assert_eq!(new_content.len(), 1);
    assert!(old_content.iter().all(|&h| !world.scene.contains(h)));
}

#[test]
fn clearing_model_leaves_ready() {
    let mut world = World::new();
    let mut hat = ready_hat(&mut world);

    hat.set_model(&mut world.env(), None);

    assert_eq!(hat.state(), LifecycleState::AwaitingCharacter);
    assert!(!hat.node().unwrap().has_content());
    assert!(!world.store.get(&hat_id()).unwrap().loaded);
}

#[test]
fn same_model_is_not_a_change() {
    let mut world = World::new();
    spawn_character(&mut world.scene, "bob", Vec3::ZERO, 1.0, &default_rig());
    let model = Arc::new(static_model());
    let mut hat = lifecycle(&mut world, hat_record());
    hat.mount(&mut world.env(), Some(Arc::clone(&model)));
    let content = hat.node().unwrap().content().to_vec();

    hat.set_model(&mut world.env(), Some(model));
    assert_eq!(hat.node().unwrap().content(), content.as_slice());
}

// ============================================================================
// Gizmo write-back
// ============================================================================

#[test]
fn gizmo_drag_is_written_to_store_on_pump() {
    let mut world = World::new();
    let mut hat = ready_hat(&mut world);

    let rotation = Quat::from_euler(glam::EulerRot::XYZ, 0.2, 0.4, 0.1);
    world.control().drag("hat", rotation);
    assert!(world.store.updates().is_empty());

    assert_eq!(hat.pump(&mut world.env()), 1);

    let (written_id, update) = world.store.updates().last().unwrap();
    assert_eq!(written_id, &hat_id());
    let stored = update.rotation.unwrap();
    assert!(quat_approx(frame::quat_from_euler(stored.to_vec3()), rotation));
    assert_eq!(hat.record().rotation, stored);

    let pose = TransformSynchronizer::world_pose(&mut world.scene, hat.node().unwrap()).unwrap();
    assert!(quat_approx(pose.rotation, rotation));
}

#[test]
fn camera_change_is_forwarded_while_ready() {
    let mut world = World::new();
    let mut hat = ready_hat(&mut world);
    let camera = world.scene.add_node(myth_attach::scene::Node::new());

    hat.set_camera(&mut world.env(), camera);

    assert!(world.control().calls.contains(&common::ControlCall::SetCamera(camera)));
}

// ============================================================================
// Teardown
// ============================================================================

#[test]
fn teardown_is_idempotent() {
    let mut world = World::new();
    let mut hat = ready_hat(&mut world);
    hat.set_selected(&mut world.env(), true);
    let container = hat.node().unwrap().container();

    hat.teardown(&mut world.env());
    hat.teardown(&mut world.env());

    assert_eq!(hat.state(), LifecycleState::Unmounted);
    assert!(!world.scene.contains(container));
    assert!(world.registry.is_empty());
    assert_eq!(world.keyboard.listener_count(), 0);
    assert!(!hat.has_rotation_control());
    assert!(!world.store.get(&hat_id()).unwrap().loaded);
}

#[test]
fn teardown_before_ready_discards_everything() {
    let mut world = World::new();
    let mut hat = lifecycle(&mut world, hat_record());
    hat.mount(&mut world.env(), Some(Arc::new(static_model())));
    let container = hat.node().unwrap().container();

    hat.teardown(&mut world.env());

    assert!(!world.scene.contains(container));
    assert!(hat.node().is_none());
}
