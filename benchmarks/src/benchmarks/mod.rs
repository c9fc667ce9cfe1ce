//! Benchmark suites and shared fixtures

pub mod level;
pub mod resolution;
pub mod serialization;

use levelkit_core::{Level, ObjectInstance, TemplateRegistry, Transform, Value, Vector3};
use rand::Rng;

const KEYS: &[&str] = &[
    "StaticPlatform",
    "MovingPlatform",
    "Jumper",
    "Bumper",
    "Blower",
    "Launcher",
    "Checkpoint",
];

/// Level with one start, one finish and `count` random objects
pub fn random_level(registry: &TemplateRegistry, count: usize) -> Level {
    let mut rng = rand::thread_rng();
    let mut level = Level::new("Benchmark");

    for (key, z) in [("StartArea", 0.0), ("FinishArea", 500.0)] {
        if let Some(template) = registry.resolve(key) {
            level.add_object(ObjectInstance::new(template, Transform::at(Vector3::new(0.0, 0.0, z))));
        }
    }

    for _ in 0..count {
        let key = KEYS[rng.gen_range(0..KEYS.len())];
        let Some(template) = registry.resolve(key) else {
            continue;
        };
        let position = Vector3::new(
            rng.gen_range(-50.0..50.0),
            rng.gen_range(0.0..20.0),
            rng.gen_range(0.0..500.0),
        );
        let mut instance = ObjectInstance::new(template, Transform::at(position));
        if rng.gen_bool(0.5) {
            let scale = rng.gen_range(0.5..3.0);
            instance.set_override_value("_visualScale", &Value::Vector3(Vector3::new(scale, scale, scale)));
        }
        level.add_object(instance);
    }
    level
}
