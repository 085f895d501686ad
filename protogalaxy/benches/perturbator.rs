use ark_ff::UniformRand;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use protogalaxy::{
    ceil_log2, compute_perturbator, Accumulator, FoldingParameters, ProverInstance,
    RelationEvaluator, RelationParameters, Witness,
};
use rand::{rngs::StdRng, SeedableRng};

type Fp = ark_bn254::Fr;

struct MulRelation;

impl RelationEvaluator<Fp> for MulRelation {
    fn witness_columns(&self) -> &'static [&'static str] {
        &["a", "b", "c"]
    }

    fn evaluate_residual(
        &self,
        witness: &Witness<Fp>,
        row: usize,
        _parameters: &RelationParameters<Fp>,
        alpha: Fp,
    ) -> Fp {
        let a = witness.col("a")[row];
        let b = witness.col("b")[row];
        let c = witness.col("c")[row];
        alpha * (a * b - c)
    }
}

fn dense_accumulator(rng: &mut StdRng, circuit_size: usize) -> Accumulator<Fp> {
    let witness: Witness<Fp> = ["a", "b", "c"]
        .into_iter()
        .map(|name| {
            (
                name.to_string(),
                (0..circuit_size).map(|_| Fp::rand(rng)).collect(),
            )
        })
        .collect();
    let betas: Vec<Fp> = (0..ceil_log2(circuit_size)).map(|_| Fp::rand(rng)).collect();
    let alpha = Fp::rand(rng);
    let mut accumulator = Accumulator {
        instance: ProverInstance::new(circuit_size, Vec::new(), 0, witness),
        folding_parameters: FoldingParameters {
            betas,
            target_sum: Fp::from(0u64),
            alpha,
        },
    };
    let target_sum = protogalaxy::relation::batched_residual_sum(
        &MulRelation,
        &accumulator.instance.witness,
        &accumulator.instance.relation_parameters,
        accumulator.folding_parameters.alpha,
        &accumulator.folding_parameters.betas,
    );
    accumulator.folding_parameters.target_sum = target_sum;
    accumulator
}

pub fn bench_perturbator(c: &mut Criterion) {
    let mut group = c.benchmark_group("perturbator");
    for log_size in [10, 12, 14] {
        let mut rng = StdRng::seed_from_u64(42);
        let circuit_size = 1 << log_size;
        let accumulator = dense_accumulator(&mut rng, circuit_size);
        let deltas: Vec<Fp> = (0..log_size).map(|_| Fp::rand(&mut rng)).collect();
        group.bench_function(format!("compute_perturbator 2^{log_size}"), |b| {
            b.iter(|| {
                black_box(
                    compute_perturbator(
                        black_box(&accumulator),
                        black_box(&deltas),
                        &MulRelation,
                    )
                    .unwrap(),
                )
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_perturbator);
criterion_main!(benches);
