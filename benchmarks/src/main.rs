//! Levelkit Benchmark Runner

use anyhow::Result;
use serde::Serialize;
use std::fs;
use std::time::Instant;

mod benchmarks;

#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkResult {
    pub name: String,
    pub category: String,
    pub iterations: u32,
    /// Objects in the level under test, when the benchmark works on one
    pub objects: Option<usize>,
    pub mean_ms: f64,
    pub median_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub throughput: Vec<Throughput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Throughput {
    pub value: f64,
    pub unit: String,
}

impl Throughput {
    fn per_second(amount: f64, mean_ms: f64, unit: &str) -> Self {
        Self {
            value: amount * 1000.0 / mean_ms,
            unit: unit.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BenchmarkReport {
    pub timestamp: String,
    pub version: String,
    pub system_info: SystemInfo,
    pub results: Vec<BenchmarkResult>,
    pub summary: BenchmarkSummary,
}

#[derive(Debug, Serialize)]
pub struct SystemInfo {
    pub os: String,
    pub arch: String,
}

#[derive(Debug, Serialize)]
pub struct BenchmarkSummary {
    pub total_benchmarks: usize,
    pub categories: Vec<CategorySummary>,
}

#[derive(Debug, Serialize)]
pub struct CategorySummary {
    pub name: String,
    pub benchmark_count: usize,
    pub total_time_ms: f64,
}

/// Results of one benchmark category
pub struct Suite {
    category: &'static str,
    iterations: u32,
    results: Vec<BenchmarkResult>,
}

impl Suite {
    pub fn new(category: &'static str, iterations: u32) -> Self {
        Self {
            category,
            iterations,
            results: Vec::new(),
        }
    }

    /// Time `f` after one warmup call
    pub fn run<F: FnMut()>(&mut self, name: &str, f: F) -> &mut BenchmarkResult {
        let iterations = self.iterations;
        self.run_n(name, iterations, f)
    }

    /// Like [`Suite::run`] with an explicit iteration count
    pub fn run_n<F: FnMut()>(&mut self, name: &str, iterations: u32, mut f: F) -> &mut BenchmarkResult {
        f();
        let mut times_ms: Vec<f64> = (0..iterations.max(1))
            .map(|_| {
                let start = Instant::now();
                f();
                start.elapsed().as_secs_f64() * 1000.0
            })
            .collect();
        times_ms.sort_by(f64::total_cmp);

        let mean_ms = times_ms.iter().sum::<f64>() / times_ms.len() as f64;
        self.results.push(BenchmarkResult {
            name: name.to_string(),
            category: self.category.to_string(),
            iterations: times_ms.len() as u32,
            objects: None,
            mean_ms,
            median_ms: times_ms[times_ms.len() / 2],
            min_ms: times_ms[0],
            max_ms: times_ms[times_ms.len() - 1],
            throughput: Vec::new(),
        });
        let last = self.results.len() - 1;
        &mut self.results[last]
    }

    pub fn finish(self) -> Vec<BenchmarkResult> {
        self.results
    }
}

impl BenchmarkResult {
    /// Record the level size and report objects per second
    pub fn per_object(&mut self, objects: usize) -> &mut Self {
        self.objects = Some(objects);
        self.throughput
            .push(Throughput::per_second(objects as f64, self.mean_ms, "objects/s"));
        self
    }

    /// Report document bytes per second, in MB/s
    pub fn per_byte(&mut self, bytes: usize) -> &mut Self {
        let megabytes = bytes as f64 / (1024.0 * 1024.0);
        self.throughput
            .push(Throughput::per_second(megabytes, self.mean_ms, "MB/s"));
        self
    }
}

fn print_report(report: &BenchmarkReport) {
    println!("\n======== Levelkit Benchmark Report ========");
    println!("Version: {} | {} ({})", report.version, report.system_info.os, report.system_info.arch);
    println!();
    let mut current_cat = "";
    for r in &report.results {
        if r.category != current_cat {
            current_cat = &r.category;
            println!("--- {} ---", current_cat);
        }
        print!(
            "  {:<40} {:>8.3}ms median {:>8.3}ms [{:.3}..{:.3}]",
            r.name, r.mean_ms, r.median_ms, r.min_ms, r.max_ms
        );
        for tp in &r.throughput {
            print!(" {:.2} {}", tp.value, tp.unit);
        }
        println!();
    }
    println!();
    for c in &report.summary.categories {
        println!("  {:<20} {:>3} benchmarks {:>10.3}ms", c.name, c.benchmark_count, c.total_time_ms);
    }
    println!("\nTotal: {} benchmarks", report.summary.total_benchmarks);
}

/// Group results per category, in first-seen order
fn summarize(results: &[BenchmarkResult]) -> BenchmarkSummary {
    let mut categories: Vec<CategorySummary> = Vec::new();
    for r in results {
        match categories.iter_mut().find(|c| c.name == r.category) {
            Some(c) => {
                c.benchmark_count += 1;
                c.total_time_ms += r.mean_ms;
            }
            None => categories.push(CategorySummary {
                name: r.category.clone(),
                benchmark_count: 1,
                total_time_ms: r.mean_ms,
            }),
        }
    }
    BenchmarkSummary {
        total_benchmarks: results.len(),
        categories,
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let json_only = args.iter().any(|a| a == "--json-only");
    let only: Option<String> = args
        .iter()
        .position(|a| a == "--only")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.to_lowercase());
    let wants = |suite: &str| only.as_deref().map_or(true, |o| o == suite);

    println!("Running Levelkit benchmarks...\n");
    let mut results = Vec::new();

    if wants("resolution") {
        println!("Resolution benchmarks...");
        results.extend(benchmarks::resolution::run_all());
    }
    if wants("serialization") {
        println!("Serialization benchmarks...");
        results.extend(benchmarks::serialization::run_all());
    }
    if wants("level") {
        println!("Level benchmarks...");
        results.extend(benchmarks::level::run_all());
    }

    let report = BenchmarkReport {
        timestamp: chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        system_info: SystemInfo { os: std::env::consts::OS.to_string(), arch: std::env::consts::ARCH.to_string() },
        summary: summarize(&results),
        results,
    };

    if json_only {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
        fs::create_dir_all("benchmarks/results")?;
        let ts = chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string();
        fs::write(format!("benchmarks/results/levelkit-{}.json", ts), serde_json::to_string_pretty(&report)?)?;
        println!("\nResults saved to benchmarks/results/");
    }
    Ok(())
}
