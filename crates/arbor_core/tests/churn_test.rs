//! # Churn Tests
//!
//! Seeded random sequences of tree mutations and ticks. After every step
//! the tree must stay consistent: owners list their members, binding
//! follows the owner, and dependency gating matches the components present.
//!
//! Run with: cargo test -p arbor_core --test churn_test

use arbor_core::{
    Behavior, CallbackResult, Callbacks, Context, EntityId, Owner, SceneRoot, TypeKey, World,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[derive(Default)]
struct Node {
    updates: u32,
}

impl Behavior for Node {
    fn callbacks(&self) -> Callbacks {
        Callbacks::UPDATE
    }

    fn update(&mut self, _cx: &mut Context<'_>, _dt: f32) -> CallbackResult {
        self.updates += 1;
        Ok(())
    }

    fn reset(&mut self) {
        self.updates = 0;
    }
}

#[derive(Default)]
struct Anchor;

impl Behavior for Anchor {}

#[derive(Default)]
struct Follower;

impl Behavior for Follower {
    fn callbacks(&self) -> Callbacks {
        Callbacks::UPDATE | Callbacks::LATE_UPDATE
    }

    fn dependencies(&self) -> Vec<TypeKey> {
        vec![TypeKey::of::<Anchor>()]
    }
}

struct Churn {
    world: World,
    scene: EntityId,
    tracked: Vec<EntityId>,
    rng: ChaCha8Rng,
}

impl Churn {
    fn new(seed: u64) -> Self {
        let mut world = World::new();
        let scene = world.add_scene("churn", SceneRoot).unwrap();
        Self {
            world,
            scene,
            tracked: vec![scene],
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    fn pick(&mut self) -> EntityId {
        let index = self.rng.gen_range(0..self.tracked.len());
        self.tracked[index]
    }

    /// Any tracked entity except the scene root.
    fn pick_member(&mut self) -> Option<EntityId> {
        if self.tracked.len() < 2 {
            return None;
        }
        let index = self.rng.gen_range(1..self.tracked.len());
        Some(self.tracked[index])
    }

    fn step(&mut self) {
        match self.rng.gen_range(0..100) {
            0..=29 => {
                let parent = self.pick();
                let from_pool = self.rng.gen_bool(0.5);
                if let Ok(child) = self.world.add_child::<Node>(parent, from_pool) {
                    self.tracked.push(child);
                }
            }
            30..=44 => {
                let owner = self.pick();
                let added = if self.rng.gen_bool(0.5) {
                    self.world.add_component::<Anchor>(owner, true)
                } else {
                    self.world.add_component::<Follower>(owner, true)
                };
                if let Ok(component) = added {
                    self.tracked.push(component);
                }
            }
            45..=54 => {
                let loose = self.world.create::<Node>(true);
                self.tracked.push(loose);
            }
            55..=69 => {
                if let Some(entity) = self.pick_member() {
                    let parent = self.pick();
                    // Cycles, duplicates and unbound parents are rejected.
                    let _ = self.world.set_parent(entity, parent);
                }
            }
            70..=84 => {
                if let Some(entity) = self.pick_member() {
                    self.world.dispose(entity);
                }
            }
            _ => {
                self.world.update(0.016, 0.016);
                self.world.late_update();
            }
        }
        let world = &self.world;
        self.tracked.retain(|entity| !world.is_disposed(*entity));
    }

    fn check(&self) {
        let world = &self.world;
        assert_eq!(world.entity_count(), self.tracked.len());
        assert!(!world.is_disposed(self.scene));

        for &entity in &self.tracked {
            assert_eq!(world.is_bound(entity), world.instance_id(entity) != 0);

            match world.owner_of(entity).unwrap() {
                Owner::Detached => {}
                Owner::ChildOf(parent) => {
                    assert!(!world.is_disposed(parent));
                    assert!(world.children(parent).contains(&entity));
                    self.check_binding(entity, parent);
                }
                Owner::ComponentOf(owner) => {
                    assert!(!world.is_disposed(owner));
                    assert!(world.components(owner).contains(&entity));
                    self.check_binding(entity, owner);
                }
            }

            for child in world.children(entity) {
                assert_eq!(world.owner_of(child), Some(Owner::ChildOf(entity)));
            }
            for component in world.components(entity) {
                assert_eq!(world.owner_of(component), Some(Owner::ComponentOf(entity)));
                if world.get_entity::<Follower>(component).is_some() {
                    let anchored = world.component(entity, TypeKey::of::<Anchor>()).is_some();
                    assert_eq!(world.registry().is_satisfied(component), anchored);
                }
            }
        }
    }

    fn check_binding(&self, entity: EntityId, owner: EntityId) {
        let world = &self.world;
        assert_eq!(world.is_bound(entity), world.is_bound(owner));
        if world.is_bound(entity) {
            assert_eq!(world.scene_of(entity), world.scene_of(owner));
        }
    }
}

fn run(seed: u64, steps: usize) -> Churn {
    let mut churn = Churn::new(seed);
    for _ in 0..steps {
        churn.step();
        churn.check();
    }
    churn
}

#[test]
fn test_random_churn_keeps_tree_consistent() {
    for seed in 0..8 {
        run(seed, 400);
    }
}

#[test]
fn test_churn_is_deterministic() {
    let a = run(42, 300);
    let b = run(42, 300);
    assert_eq!(a.tracked, b.tracked);
}

#[test]
fn test_shutdown_after_churn_empties_world() {
    let mut churn = run(7, 300);
    churn.world.shutdown();
    assert_eq!(churn.world.entity_count(), 0);
    assert!(churn.world.registry().is_empty());
    assert_eq!(churn.world.system().registered(arbor_core::Phase::Update), 0);
}
