use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use deepq::agent::DqnAgent;
use deepq::config::AgentConfig;
use ndarray::Array1;

fn filled_agent(state_size: usize, batch_size: usize) -> DqnAgent {
    let config = AgentConfig {
        batch_size,
        seed: Some(1),
        ..AgentConfig::lunar_lander()
    };
    let mut agent = DqnAgent::from_config(state_size, 4, &config).unwrap();
    for i in 0..2000 {
        let state = Array1::from_shape_fn(state_size, |j| ((i * 7 + j) % 13) as f32 / 13.0);
        let next_state = state.mapv(|v| 1.0 - v);
        agent.remember(state, i % 4, (i % 3) as f32 - 1.0, next_state, i % 50 == 0).unwrap();
    }
    agent
}

fn bench_train_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("train_step");
    for batch_size in [16, 64] {
        let mut agent = filled_agent(8, batch_size);
        group.bench_with_input(BenchmarkId::from_parameter(batch_size), &batch_size, |b, _| {
            b.iter(|| black_box(agent.train_step().unwrap()))
        });
    }
    group.finish();
}

fn bench_select_action(c: &mut Criterion) {
    let mut agent = filled_agent(8, 16);
    agent.policy_mut().force_min();
    let state = Array1::from_elem(8, 0.5);
    c.bench_function("select_action", |b| {
        b.iter(|| black_box(agent.select_action(state.view(), None).unwrap()))
    });
}

criterion_group!(benches, bench_train_step, bench_select_action);
criterion_main!(benches);
