//! # Validation Benchmarks
//!
//! | Benchmark | Measures |
//! |-----------|----------|
//! | `signing_hash` | bincode encoding plus double SHA-256 of a batch |
//! | `validate_batch` | full six-phase pass against the in-memory repository |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use dp_01_transition_validation::fixtures;
use dp_01_transition_validation::prelude::*;

const OWNER: Identifier = Identifier::new([0xB1; 32]);

fn batch(contract: &DataContract, size: usize) -> StateTransition {
    let transitions = (0..size)
        .map(|i| {
            let mut entropy = [0u8; 32];
            entropy[..8].copy_from_slice(&(i as u64).to_be_bytes());
            fixtures::create_transition(
                contract.id,
                OWNER,
                "profile",
                entropy,
                fixtures::data(&[("email", json!(format!("user{i}@example.com")))]),
            )
        })
        .collect();
    fixtures::documents_batch(OWNER, transitions)
}

// ============================================================================
// Signing hash
// ============================================================================

fn bench_signing_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("dp-01-signing-hash");
    let contract = fixtures::profile_contract(OWNER, [1; 32]);

    for size in [1, 10, 100] {
        let transition = batch(&contract, size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("signing_hash", size), &transition, |b, t| {
            b.iter(|| black_box(t.signing_hash().unwrap()))
        });
    }
    group.finish();
}

// ============================================================================
// Full validation pass
// ============================================================================

fn bench_validate_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dp-01-validate-batch");
    group.measurement_time(Duration::from_secs(10));

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let key = fixtures::signing_key(7).unwrap();
    let repository = Arc::new(InMemoryStateRepository::new());
    repository.insert_identity(fixtures::identity(OWNER, &key));
    let contract = fixtures::profile_contract(OWNER, [1; 32]);
    repository.insert_data_contract(contract.clone());
    let validator = BatchValidator::new(
        repository,
        Arc::new(EcdsaSigner::new()),
        ServiceConfig::default(),
    )
    .unwrap();

    for size in [1, 10, 100] {
        let mut transition = batch(&contract, size);
        fixtures::sign(&mut transition, &key).unwrap();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("validate_batch", size), &transition, |b, t| {
            b.iter(|| {
                let result = runtime.block_on(validator.validate_transition(t)).unwrap();
                black_box(result.is_valid())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_signing_hash, bench_validate_batch);
criterion_main!(benches);
