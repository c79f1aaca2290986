//! Benchmarks for tokenizing and typesetting throughput.
//!
//! Run with: cargo bench
//!
//! The input is synthetic chapter markup with verse numbers, footnotes and
//! cross-references.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use versepage::{CrossReferenceTable, LexerOptions, Versepage};

/// Creates synthetic markup with the given number of chapters.
fn create_test_markup(chapters: usize) -> String {
    let mut src = String::new();
    for c in 1..=chapters {
        src.push_str(&format!("\\heading{{Chapter {}}}\n\n\\chapter{{{}}}", c, c));
        for v in 1..=30 {
            src.push_str(&format!(
                "\\v{{{}}} And it came to pass, as they journeyed from the east,\
                 that they found a plain\\xref{{{}:{}}} in the land of Shinar;",
                v, c, v
            ));
            if v % 5 == 0 {
                src.push_str("\\fn{Or, \\v{2} a valley; see the note.}");
            }
            src.push_str(" and they dwelt there.\n");
            if v % 10 == 0 {
                src.push('\n');
            }
        }
        src.push_str("\n\n");
    }
    src
}

fn create_crossrefs(chapters: usize) -> CrossReferenceTable {
    let mut table = CrossReferenceTable::new(8.4);
    for c in 1..=chapters {
        for v in (1..=30).step_by(3) {
            table.insert(
                format!("{}:{}", c, v),
                vec![format!("Gen {}:{}", c + 10, v), "Isa 2:3".to_string()],
            );
        }
    }
    table
}

/// Benchmark the lexer alone.
fn bench_tokenize(c: &mut Criterion) {
    let src = create_test_markup(10);
    let options = LexerOptions::default();

    c.bench_function("tokenize_10_chapters", |b| {
        b.iter(|| versepage::lexer::tokenize_str(black_box(&src), &options).unwrap());
    });
}

/// Benchmark the full pipeline at various sizes.
fn bench_typeset(c: &mut Criterion) {
    let mut group = c.benchmark_group("typeset");

    for chapters in [1, 5, 20].iter() {
        let src = create_test_markup(*chapters);
        let vp = Versepage::new().with_crossrefs(create_crossrefs(*chapters));

        group.bench_function(format!("{}_chapters", chapters), |b| {
            b.iter(|| vp.typeset_str(black_box(&src)).unwrap());
        });
    }

    group.finish();
}

criterion_group!(benches, bench_tokenize, bench_typeset);
criterion_main!(benches);
