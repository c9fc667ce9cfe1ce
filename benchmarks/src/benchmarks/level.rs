//! Level validation benchmarks

use crate::{BenchmarkResult, Suite};
use levelkit_core::{BuiltinContent, TemplateRegistry};

const OBJECTS: usize = 5000;

pub fn run_all() -> Vec<BenchmarkResult> {
    let registry = TemplateRegistry::new(BuiltinContent);
    let mut suite = Suite::new("Level", 50);

    let level = super::random_level(&registry, OBJECTS);
    suite
        .run("Validate level", || {
            std::hint::black_box(level.validate().is_ok());
        })
        .per_object(level.objects.len());

    let mut indexed = level.clone();
    suite
        .run("Checkpoint indices", || {
            std::hint::black_box(indexed.calculate_checkpoint_indices());
        })
        .per_object(level.objects.len());

    let mut relinked = level.clone();
    suite
        .run("Relink level", || {
            std::hint::black_box(relinked.relink(&registry));
        })
        .per_object(level.objects.len());

    suite.finish()
}
