//! # Dependency Gating Tests
//!
//! Components requiring siblings stay out of the tick until every required
//! type is attached to the same owner.
//!
//! Run with: cargo test -p arbor_core --test dependency_test

use std::sync::Arc;

use arbor_core::{
    Behavior, CallbackResult, Callbacks, Context, EntityId, Owner, SceneRoot, TypeKey, World,
};
use parking_lot::Mutex;

#[derive(Default)]
struct Transform;

impl Behavior for Transform {}

#[derive(Default)]
struct Renderer;

impl Behavior for Renderer {}

trait Collider {}

#[derive(Default)]
struct BoxCollider;

impl Behavior for BoxCollider {
    fn provides(&self) -> Vec<TypeKey> {
        vec![TypeKey::of::<dyn Collider>()]
    }
}

#[derive(Default)]
struct SphereCollider;

impl Behavior for SphereCollider {
    fn provides(&self) -> Vec<TypeKey> {
        vec![TypeKey::of::<dyn Collider>()]
    }
}

/// Requires a [`Transform`] and logs activation changes.
#[derive(Default)]
struct Mover {
    updates: u32,
    activations: Arc<Mutex<Vec<bool>>>,
}

impl Behavior for Mover {
    fn callbacks(&self) -> Callbacks {
        Callbacks::UPDATE | Callbacks::LATE_UPDATE
    }

    fn update(&mut self, _cx: &mut Context<'_>, _dt: f32) -> CallbackResult {
        self.updates += 1;
        Ok(())
    }

    fn dependencies(&self) -> Vec<TypeKey> {
        vec![TypeKey::of::<Transform>()]
    }

    fn on_activation_changed(&mut self, _cx: &mut Context<'_>, active: bool) -> CallbackResult {
        self.activations.lock().push(active);
        Ok(())
    }
}

/// Requires any [`Collider`] and a [`Renderer`].
#[derive(Default)]
struct Physics {
    updates: u32,
}

impl Behavior for Physics {
    fn callbacks(&self) -> Callbacks {
        Callbacks::UPDATE
    }

    fn update(&mut self, _cx: &mut Context<'_>, _dt: f32) -> CallbackResult {
        self.updates += 1;
        Ok(())
    }

    fn dependencies(&self) -> Vec<TypeKey> {
        vec![TypeKey::of::<dyn Collider>(), TypeKey::of::<Renderer>()]
    }
}

/// Requires a [`Transform`] and removes it from its own owner on update.
#[derive(Default)]
struct Shedder {
    updates: u32,
    activations: Arc<Mutex<Vec<bool>>>,
}

impl Behavior for Shedder {
    fn callbacks(&self) -> Callbacks {
        Callbacks::UPDATE
    }

    fn update(&mut self, cx: &mut Context<'_>, _dt: f32) -> CallbackResult {
        self.updates += 1;
        if let Some(Owner::ComponentOf(owner)) = cx.owner_of(cx.entity()) {
            cx.remove_component::<Transform>(owner);
        }
        Ok(())
    }

    fn dependencies(&self) -> Vec<TypeKey> {
        vec![TypeKey::of::<Transform>()]
    }

    fn on_activation_changed(&mut self, _cx: &mut Context<'_>, active: bool) -> CallbackResult {
        self.activations.lock().push(active);
        Ok(())
    }
}

fn setup() -> (World, EntityId) {
    let mut world = World::new();
    let scene = world.add_scene("main", SceneRoot).unwrap();
    let unit = world.add_child::<Transform>(scene, false).unwrap();
    (world, unit)
}

fn tick(world: &mut World) {
    world.update(0.016, 0.016);
    world.late_update();
}

fn mover_updates(world: &World, owner: EntityId) -> u32 {
    world.get::<Mover>(owner).unwrap().updates
}

#[test]
fn test_dependent_waits_for_required_sibling() {
    let (mut world, unit) = setup();
    world.add_component::<Mover>(unit, false).unwrap();
    assert!(!world.dependencies_met::<Mover>(unit));

    tick(&mut world);
    tick(&mut world);
    assert_eq!(mover_updates(&world, unit), 0);

    world.add_component::<Transform>(unit, false).unwrap();
    assert!(world.dependencies_met::<Mover>(unit));
    tick(&mut world);
    tick(&mut world);
    assert_eq!(mover_updates(&world, unit), 2);
}

#[test]
fn test_dependent_suppressed_after_removal() {
    let (mut world, unit) = setup();
    world.add_component::<Transform>(unit, false).unwrap();
    world.add_component::<Mover>(unit, false).unwrap();
    assert!(world.dependencies_met::<Mover>(unit));

    tick(&mut world);
    assert_eq!(mover_updates(&world, unit), 1);

    assert!(world.remove_component::<Transform>(unit));
    assert!(!world.dependencies_met::<Mover>(unit));
    tick(&mut world);
    tick(&mut world);
    assert_eq!(mover_updates(&world, unit), 1);

    // Reattaching resumes updates.
    world.add_component::<Transform>(unit, false).unwrap();
    tick(&mut world);
    assert_eq!(mover_updates(&world, unit), 2);
}

#[test]
fn test_activation_changes_reported_on_transition() {
    let (mut world, unit) = setup();
    let log = Arc::new(Mutex::new(Vec::new()));
    world
        .add_component_value(
            unit,
            Mover {
                updates: 0,
                activations: Arc::clone(&log),
            },
        )
        .unwrap();
    assert!(log.lock().is_empty());

    world.add_component::<Transform>(unit, false).unwrap();
    assert!(world.remove_component::<Transform>(unit));
    assert_eq!(*log.lock(), vec![true, false]);

    // Unrelated siblings do not re-trigger the callback.
    world.add_component::<Renderer>(unit, false).unwrap();
    assert!(world.remove_component::<Renderer>(unit));
    assert_eq!(*log.lock(), vec![true, false]);
}

#[test]
fn test_satisfied_at_attach_reports_activation() {
    let (mut world, unit) = setup();
    world.add_component::<Transform>(unit, false).unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    world
        .add_component_value(
            unit,
            Mover {
                updates: 0,
                activations: Arc::clone(&log),
            },
        )
        .unwrap();
    assert_eq!(*log.lock(), vec![true]);
}

#[test]
fn test_role_dependency() {
    let (mut world, unit) = setup();
    world.add_component::<Physics>(unit, false).unwrap();
    world.add_component::<Renderer>(unit, false).unwrap();
    assert!(!world.dependencies_met::<Physics>(unit));

    world.add_component::<BoxCollider>(unit, false).unwrap();
    assert!(world.dependencies_met::<Physics>(unit));
    tick(&mut world);
    assert_eq!(world.get::<Physics>(unit).unwrap().updates, 1);
}

#[test]
fn test_role_dependency_survives_while_any_provider_remains() {
    let (mut world, unit) = setup();
    world.add_component::<Renderer>(unit, false).unwrap();
    world.add_component::<BoxCollider>(unit, false).unwrap();
    world.add_component::<SphereCollider>(unit, false).unwrap();
    world.add_component::<Physics>(unit, false).unwrap();
    assert!(world.dependencies_met::<Physics>(unit));

    assert!(world.remove_component::<BoxCollider>(unit));
    assert!(world.dependencies_met::<Physics>(unit));

    assert!(world.remove_component::<SphereCollider>(unit));
    assert!(!world.dependencies_met::<Physics>(unit));
}

#[test]
fn test_dependencies_are_per_owner() {
    let (mut world, unit) = setup();
    let scene = world.get_scene("main").unwrap();
    let other = world.add_child::<Transform>(scene, false).unwrap();
    world.add_component::<Mover>(unit, false).unwrap();
    world.add_component::<Transform>(other, false).unwrap();
    assert!(!world.dependencies_met::<Mover>(unit));

    tick(&mut world);
    assert_eq!(mover_updates(&world, unit), 0);
}

#[test]
fn test_disposing_dependent_unregisters_it() {
    let (mut world, unit) = setup();
    world.add_component::<Mover>(unit, false).unwrap();
    assert_eq!(world.registry().len(), 1);

    assert!(world.remove_component::<Mover>(unit));
    assert!(world.registry().is_empty());

    world.add_component::<Mover>(unit, false).unwrap();
    world.dispose(unit);
    assert!(world.registry().is_empty());
}

#[test]
fn test_components_without_dependencies_always_met() {
    let (mut world, unit) = setup();
    world.add_component::<Renderer>(unit, false).unwrap();
    assert!(world.dependencies_met::<Renderer>(unit));
    assert!(!world.dependencies_met::<Transform>(unit));
}

#[test]
fn test_activation_change_during_own_update_is_delivered() {
    let (mut world, unit) = setup();
    let activations = Arc::new(Mutex::new(Vec::new()));
    world.add_component::<Transform>(unit, false).unwrap();
    world
        .add_component_value(
            unit,
            Shedder {
                updates: 0,
                activations: Arc::clone(&activations),
            },
        )
        .unwrap();
    assert_eq!(*activations.lock(), vec![true]);

    tick(&mut world);
    assert!(world.get::<Transform>(unit).is_none());
    assert!(!world.dependencies_met::<Shedder>(unit));
    assert_eq!(*activations.lock(), vec![true, false]);

    tick(&mut world);
    assert_eq!(world.get::<Shedder>(unit).unwrap().updates, 1);
}
