//! Override resolution benchmarks

use crate::{BenchmarkResult, Suite};
use levelkit_core::{
    BuiltinContent, OverrideResolver, ParameterSchema, TemplateRegistry, TemplateType, ValueCodec, ValueType,
};

pub fn run_all() -> Vec<BenchmarkResult> {
    let mut suite = Suite::new("Resolution", 100);

    suite.run("Schema discovery (all types, cold)", || {
        let schema = ParameterSchema::new();
        for ty in TemplateType::ALL {
            std::hint::black_box(schema.editable_fields(*ty));
        }
    });

    let schema = ParameterSchema::new();
    suite.run("Schema lookup (all types, cached)", || {
        for ty in TemplateType::ALL {
            std::hint::black_box(schema.editable_fields(*ty));
        }
    });

    let codec = ValueCodec::new();
    let inputs: Vec<String> = (0..1000)
        .map(|i| format!("({}.5, -{}.25, {})", i, i, i * 2))
        .collect();
    suite.run("Decode 1000 vector3 values", || {
        for input in &inputs {
            std::hint::black_box(codec.decode(input, ValueType::Vector3).ok());
        }
    });

    let registry = TemplateRegistry::new(BuiltinContent);
    let level = super::random_level(&registry, 1000);
    let resolver = OverrideResolver::default();
    suite
        .run_n("Resolve all fields", 50, || {
            for instance in &level.objects {
                if let Some(template) = instance.template() {
                    std::hint::black_box(resolver.resolve_all(instance, template));
                }
            }
        })
        .per_object(level.objects.len());

    suite.finish()
}
