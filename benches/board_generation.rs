use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mines_engine::{
    games::board::generate_mine_positions,
    games::fairness::{game_digest, ServerSeed},
    games::multiplier::MultiplierCalculator,
    Amount, EngineConfig, MinesEngine, PlayerId, StartGameRequest,
};

fn bench_board_generation(c: &mut Criterion) {
    let seed = ServerSeed::from_bytes([9u8; 32]);
    let mut group = c.benchmark_group("board_generation");

    for (tiles, mines) in [(25u32, 5u32), (25, 24), (100, 50)] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}t_{}m", tiles, mines)),
            &(tiles, mines),
            |b, &(tiles, mines)| {
                let mut nonce = 0u64;
                b.iter(|| {
                    nonce += 1;
                    let digest = game_digest(&seed, b"bench", nonce);
                    black_box(generate_mine_positions(&digest, tiles, mines))
                })
            },
        );
    }
    group.finish();
}

fn bench_multiplier(c: &mut Criterion) {
    let calc = MultiplierCalculator::default();
    c.bench_function("multiplier_25t_5m_k10", |b| {
        b.iter(|| black_box(calc.multiplier(black_box(25), black_box(5), black_box(10))))
    });
    c.bench_function("multiplier_100t_50m_perfect", |b| {
        b.iter(|| black_box(calc.multiplier(black_box(100), black_box(50), black_box(50))))
    });
}

fn bench_game_round(c: &mut Criterion) {
    let engine = MinesEngine::new(EngineConfig::testing()).expect("valid config");
    let player = PlayerId::from("bench");

    c.bench_function("start_reveal_settle", |b| {
        b.iter(|| {
            let _ = engine.deposit(&player, Amount::tokens(1));
            let _ = engine.start_game(&player, StartGameRequest::new(25, 24, Amount::tokens(1), "bench"));
            // 24 mines: the first reveal always ends the game
            black_box(engine.reveal_tile(&player, 0))
        })
    });
}

criterion_group!(benches, bench_board_generation, bench_multiplier, bench_game_round);
criterion_main!(benches);
