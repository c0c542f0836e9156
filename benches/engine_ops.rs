use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use rand::{rngs::StdRng, SeedableRng};
use std::hint::black_box;
use twenty48::engine::{Game, Move};

fn corpus() -> Vec<Game> {
    let mut rng = StdRng::seed_from_u64(42);
    let mut games = Vec::new();
    // Empty and fresh two-tile starts
    games.push(Game::empty());
    let mut game = Game::new(&mut rng);
    games.push(game.clone());
    // Derive a variety of densities deterministically
    let seq = [Move::Left, Move::Up, Move::Right, Move::Down];
    for i in 0..20 {
        game.apply_move(seq[i % seq.len()], &mut rng);
        games.push(game.clone());
    }
    games
}

fn bench_apply_move(c: &mut Criterion) {
    let dirs = [
        ("apply_move/left", Move::Left),
        ("apply_move/right", Move::Right),
        ("apply_move/up", Move::Up),
        ("apply_move/down", Move::Down),
    ];
    for (name, dir) in dirs {
        c.bench_function(name, |bch| {
            let games = corpus();
            let mut rng = StdRng::seed_from_u64(7);
            bch.iter_batched(
                || games.clone(),
                |mut batch| {
                    let mut acc = 0u64;
                    for game in &mut batch {
                        acc ^= u64::from(game.apply_move(dir, &mut rng).changed);
                    }
                    black_box(acc)
                },
                BatchSize::SmallInput,
            )
        });
    }
}

fn bench_queries(c: &mut Criterion) {
    c.bench_function("is_game_over", |bch| {
        let games = corpus();
        bch.iter(|| {
            let mut over = 0u32;
            for game in &games {
                over += u32::from(game.is_game_over());
            }
            black_box(over)
        })
    });
    c.bench_function("available_moves", |bch| {
        let games = corpus();
        bch.iter(|| {
            let mut count = 0usize;
            for game in &games {
                count += game.available_moves().len();
            }
            black_box(count)
        })
    });
    c.bench_function("snapshot", |bch| {
        let games = corpus();
        bch.iter(|| {
            let mut cells = 0usize;
            for game in &games {
                cells += game.snapshot().cells.len();
            }
            black_box(cells)
        })
    });
}

criterion_group!(benches, bench_apply_move, bench_queries);
criterion_main!(benches);
