use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use crochet::search::rank;
use crochet::Product;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const WORDS: &[&str] = &[
    "amigurumi", "bear", "beanie", "blanket", "blue", "bunny", "cardigan", "coaster",
    "cotton", "doily", "granny", "hat", "lace", "mini", "pastel", "pouch", "red", "scarf",
    "shawl", "sock", "square", "tote", "wool", "yarn",
];

/// Catalog of 2-4 word product names; seeded so every run ranks the same data
fn synthetic_catalog(size: usize) -> Vec<Product> {
    let mut rng = StdRng::seed_from_u64(0x5EED_C0C0);

    (0..size)
        .map(|i| {
            let words = rng.gen_range(2..=4);
            let name = (0..words)
                .map(|_| WORDS[rng.gen_range(0..WORDS.len())])
                .collect::<Vec<_>>()
                .join(" ");
            Product {
                id: format!("p{}", i),
                name,
                price_rupiah: 5_000 + rng.gen_range(0..200u64) * 1_000,
                ..Default::default()
            }
        })
        .collect()
}

fn bench_rank(c: &mut Criterion) {
    let catalog = synthetic_catalog(10_000);

    // One query per keystroke of typing "granny square"
    let typed = "granny square";
    let keystrokes: Vec<&str> = (1..=typed.len()).map(|end| &typed[..end]).collect();

    let mut group = c.benchmark_group("rank");
    group.sample_size(20);

    let queries = [
        ("empty", ""),
        ("short", "hat"),
        ("two_words", "Blue Hat"),
        ("no_match", "zzz"),
        ("padded_upper", "  WOOL  "),
    ];
    for (label, query) in queries {
        group.bench_with_input(BenchmarkId::new("query", label), query, |b, q| {
            b.iter(|| rank(black_box(&catalog), black_box(q)))
        });
    }

    group.bench_function("typing_granny_square", |b| {
        b.iter(|| {
            for q in &keystrokes {
                black_box(rank(&catalog, q));
            }
        })
    });

    group.finish();
}

criterion_group!(benches, bench_rank);
criterion_main!(benches);
