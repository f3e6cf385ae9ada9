//! Benchmarks for batch extraction through the parser pool.

#![allow(missing_docs)]

mod common;

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use proteus::{ExtractorSet, ParserPool, PoolOptions};

// === Generators ===

fn go_file(i: usize) -> String {
    let mut content = format!("package pkg{i}\n\nimport \"fmt\"\n\ntype Service{i} struct {{\n\tName string\n}}\n\n");
    for f in 0..10 {
        content.push_str(&format!(
            "// Handle{f} handles request {f}.\nfunc (s *Service{i}) Handle{f}() {{\n\tfmt.Println(s.Name)\n\thelper{f}()\n}}\n\nfunc helper{f}() {{}}\n\n"
        ));
    }
    content
}

fn python_file(i: usize) -> String {
    let mut content = format!("import os\nfrom typing import List\n\n\nclass Model{i}:\n    \"\"\"Model {i}.\"\"\"\n\n");
    for f in 0..10 {
        content.push_str(&format!("    def method_{f}(self, items: List[str]) -> int:\n        return len(os.listdir(items[{f}]))\n\n"));
    }
    content
}

fn cpp_pair(i: usize) -> (String, String) {
    let mut header = format!("#pragma once\n#include <vector>\n\nclass Widget{i} {{\npublic:\n");
    let mut source = format!("#include \"widget{i}.h\"\n\n");
    for f in 0..10 {
        header.push_str(&format!("    int compute{f}(int value) const;\n"));
        source.push_str(&format!(
            "int Widget{i}::compute{f}(int value) const {{\n    std::vector<int> v(value);\n    return static_cast<int>(v.size()) + {f};\n}}\n\n"
        ));
    }
    header.push_str("};\n");
    (header, source)
}

/// A mixed batch of roughly `count` files.
fn mixed_batch(count: usize) -> Vec<(String, &'static str, String)> {
    let mut files = Vec::with_capacity(count);
    let mut i = 0;
    while files.len() < count {
        files.push((format!("go/pkg{i}/service.go"), "go", go_file(i)));
        files.push((format!("py/model{i}.py"), "python", python_file(i)));
        let (header, source) = cpp_pair(i);
        files.push((format!("cpp/widget{i}.h"), "cpp", header));
        files.push((format!("cpp/widget{i}.cpp"), "cpp", source));
        i += 1;
    }
    files.truncate(count);
    files
}

// === Benchmarks ===

fn bench_pool_workers(c: &mut Criterion) {
    let files = mixed_batch(200);
    let (_dir, scanned) = common::create_workspace(&files);

    let mut group = c.benchmark_group("pool_workers");
    group.throughput(Throughput::Elements(scanned.len() as u64));
    group.sample_size(10);

    for workers in [1, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(workers), &workers, |b, &workers| {
            let pool = ParserPool::with_options(PoolOptions::default().with_workers(workers));
            b.iter(|| black_box(pool.process(black_box(&scanned))));
        });
    }

    group.finish();
}

fn bench_single_file(c: &mut Criterion) {
    let files = mixed_batch(4);
    let (_dir, scanned) = common::create_workspace(&files);
    let mut extractors = ExtractorSet::new().expect("failed to build extractors");

    let mut group = c.benchmark_group("single_file");
    for file in &scanned {
        group.bench_with_input(
            BenchmarkId::from_parameter(file.path.display()),
            file,
            |b, file| b.iter(|| black_box(extractors.extract(black_box(file)))),
        );
    }
    group.finish();
}

criterion_group!(benches, bench_pool_workers, bench_single_file);
criterion_main!(benches);
