//! Serialization benchmarks

use crate::{BenchmarkResult, Suite};
use levelkit_core::{deserialize, serialize, BuiltinContent, SaveStore, TemplateRegistry};
use tempfile::TempDir;

pub fn run_all() -> Vec<BenchmarkResult> {
    let registry = TemplateRegistry::new(BuiltinContent);
    let mut suite = Suite::new("Serialization", 100);

    for count in [10, 1000] {
        let level = super::random_level(&registry, count);
        let bytes = serialize(&level).map(|json| json.len()).unwrap_or(0);
        let iterations = if count >= 1000 { 10 } else { 100 };

        suite
            .run_n(&format!("Serialize level ({} objects)", count), iterations, || {
                std::hint::black_box(serialize(&level).unwrap());
            })
            .per_object(level.objects.len())
            .per_byte(bytes);
    }

    let level = super::random_level(&registry, 1000);
    let json = serialize(&level).unwrap();
    suite
        .run_n("Deserialize level", 10, || {
            std::hint::black_box(deserialize(&json).unwrap());
        })
        .per_object(level.objects.len())
        .per_byte(json.len());

    let temp_dir = TempDir::new().unwrap();
    let store = SaveStore::new(temp_dir.path());
    suite
        .run_n("Save level", 10, || {
            std::hint::black_box(store.save("Benchmark", &level).unwrap());
        })
        .per_object(level.objects.len())
        .per_byte(json.len());

    suite
        .run_n("Load and relink level", 10, || {
            std::hint::black_box(store.load_level("Benchmark", &registry).unwrap());
        })
        .per_object(level.objects.len())
        .per_byte(json.len());

    suite.finish()
}
