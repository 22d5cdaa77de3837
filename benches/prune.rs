//! Benchmarks for network assembly and pruning.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use retrograph::graph::prune::prune;
use retrograph::graph::{EDGE_SEPARATOR, RetroGraph};
use retrograph::reaction::{RawReaction, Transformation};
use retrograph::registry::StructureRegistry;

/// Layered network: every compound of layer `l + 1` is made from two
/// compounds of layer `l`. Layer 0 is the sink set, the last layer holds
/// the single target.
fn layered(layers: usize, width: usize) -> (StructureRegistry, Vec<Transformation>) {
    let name = |l: usize, i: usize| format!("C{l}x{i}");
    let mut reg = StructureRegistry::new();
    let mut reactions = Vec::new();
    for l in 0..layers {
        let here = if l + 1 == layers { 1 } else { width };
        for i in 0..here {
            let a = name(l, i % width);
            let b = name(l, (i + 1) % width);
            let product = if l + 1 == layers {
                "TGT".to_string()
            } else {
                name(l + 1, i)
            };
            reactions.push((format!("R{l}x{i}"), format!("{a}.{b}>>{product}")));
        }
    }
    for (_, smiles) in &reactions {
        let (left, right) = smiles.split_once(">>").unwrap_or_default();
        for s in left.split('.').chain(right.split('.')) {
            reg.get_or_create(s);
        }
    }
    reg.promote_to_target("TGT");
    for i in 0..width {
        if let Some(uid) = reg.lookup(&name(0, i)).map(str::to_string) {
            reg.mark_sink(&uid);
        }
    }
    let transformations = reactions
        .into_iter()
        .map(|(id, smiles)| {
            let raw = RawReaction {
                id,
                smiles,
                ..Default::default()
            };
            Transformation::new(raw, &reg, false).unwrap()
        })
        .collect();
    (reg, transformations)
}

fn bench_build(c: &mut Criterion) {
    let (reg, ts) = layered(8, 64);
    c.bench_function("build_8x64", |b| {
        b.iter(|| black_box(RetroGraph::build(&reg, &ts, EDGE_SEPARATOR).unwrap()))
    });
}

fn bench_prune(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_and_prune");
    for width in [16, 64, 256] {
        let (reg, ts) = layered(8, width);
        let excluded = vec!["C3x0".to_string()];
        group.bench_with_input(BenchmarkId::from_parameter(width), &width, |b, _| {
            b.iter(|| {
                let mut graph = RetroGraph::build(&reg, &ts, EDGE_SEPARATOR).unwrap();
                black_box(prune(&mut graph, "TARGET_0000000001", &excluded))
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build, bench_prune);
criterion_main!(benches);
