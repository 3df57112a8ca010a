//! Simplifier benchmarks.
//!
//! Run with:
//! ```bash
//! cargo bench --bench simplify
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use zen_rs::error::Result;
use zen_rs::reference::ExprRef;
use zen_rs::types::{IntType, Type};
use zen_rs::zen::{Zen, ZenConfig};

fn sum_list(zen: &Zen, list: ExprRef) -> Result<ExprRef> {
    zen.list_match(list, zen.int(0u64), |z, head, tail| z.sum(head, sum_list(z, tail)?))
}

/// Random conjunction-heavy formula over `num_vars` variables.
fn build_random_formula(zen: &Zen, num_vars: usize, num_ops: usize, seed: u64) -> ExprRef {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let vars: Vec<ExprRef> = (0..num_vars).map(|i| zen.arbitrary(&format!("x{}", i), Type::Bool)).collect();
    let mut nodes = vars.clone();
    nodes.push(zen.bool(true));
    nodes.push(zen.bool(false));

    for _ in 0..num_ops {
        let i = rng.random_range(0..nodes.len());
        let j = rng.random_range(0..nodes.len());
        let (a, b) = (nodes[i], nodes[j]);
        let result = match rng.random_range(0..4) {
            0 => zen.and(a, b),
            1 => zen.or(a, b),
            2 => zen.not(a),
            _ => zen.ite(a, b, nodes[rng.random_range(0..nodes.len())]),
        };
        nodes[i] = result.unwrap();
    }
    zen.and_many(nodes).unwrap()
}

// ============================================================================
// Benchmark: Unrolling a list match over a deep list
// ============================================================================

fn bench_list_unrolling(c: &mut Criterion) {
    let mut group = c.benchmark_group("simplify/list_unrolling");
    group.sample_size(10);

    for len in [1_000u64, 10_000, 50_000] {
        group.throughput(Throughput::Elements(len));
        group.bench_with_input(BenchmarkId::new("sum", len), &len, |b, &len| {
            b.iter(|| {
                let zen = Zen::default();
                let items: Vec<ExprRef> = (0..len).map(|i| zen.int(i)).collect();
                let list = zen.list(Type::Int(IntType::U64), &items).unwrap();
                let e = sum_list(&zen, list).unwrap();
                zen.simplify(e).unwrap()
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Heavily shared DAG (each level used twice)
// ============================================================================

fn bench_shared_dag(c: &mut Criterion) {
    let mut group = c.benchmark_group("simplify/shared_dag");

    for depth in [100usize, 1_000, 10_000] {
        group.bench_with_input(BenchmarkId::new("depth", depth), &depth, |b, &depth| {
            b.iter(|| {
                let zen = Zen::default();
                let mut e = zen.arbitrary("x", Type::Int(IntType::U32));
                let zero = zen.int(0u32);
                for _ in 0..depth {
                    let plus_zero = zen.sum(e, zero).unwrap();
                    e = zen.max(plus_zero, e).unwrap();
                }
                zen.simplify(e).unwrap()
            });
        });
    }

    group.finish();
}

// ============================================================================
// Benchmark: Random formulas with different cache sizes
// ============================================================================

fn bench_random_formula(c: &mut Criterion) {
    let mut group = c.benchmark_group("simplify/random_formula");

    let num_vars = 20;
    let num_ops = 2_000;
    let seed = 42;

    for cache_bits in [8, 12, 16] {
        let config = ZenConfig::default().with_cache_bits(cache_bits);

        group.bench_with_input(
            BenchmarkId::new("v=20,ops=2000", format!("2^{}", cache_bits)),
            &config,
            |b, config| {
                b.iter(|| {
                    let zen = Zen::with_config(config.clone());
                    let f = build_random_formula(&zen, num_vars, num_ops, seed);
                    zen.simplify(f).unwrap()
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_list_unrolling, bench_shared_dag, bench_random_formula);

criterion_main!(benches);
