//! Benchmarks for dispatch tokenization and registry lookup.
//!
//! Run with: cargo bench -p ftui-syntax

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use ftui_syntax::{
    DispatchTokenizer, Segment, TokenEmitter, TokenKind, TokenizedText, TokenizerRegistry,
};
use std::hint::black_box;

// =============================================================================
// Test Data
// =============================================================================

fn source_line(len: usize) -> String {
    "let value = compute(x, y); // note "
        .chars()
        .cycle()
        .take(len)
        .collect()
}

fn source_lines(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            if i % 10 == 3 {
                "/* block comment opens".to_string()
            } else if i % 10 == 5 {
                "   closes here */ after".to_string()
            } else {
                source_line(60)
            }
        })
        .collect()
}

fn split_words(out: &mut TokenEmitter<'_>, segment: Segment<'_>, _: TokenKind, _: usize) {
    let bytes = segment.as_bytes();
    let mut pos = 0;
    while pos < bytes.len() {
        let ws = bytes[pos].is_ascii_whitespace();
        let start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_whitespace() == ws {
            pos += 1;
        }
        let kind = if ws {
            TokenKind::Whitespace
        } else {
            TokenKind::Identifier
        };
        out.add_token(start..pos, kind);
    }
}

fn block_comments(out: &mut TokenEmitter<'_>, segment: Segment<'_>, initial: TokenKind, _: usize) {
    let text = segment.as_str();
    let (kind, close) = if initial == TokenKind::CommentBlock {
        (TokenKind::CommentBlock, text.find("*/").map(|i| i + 2))
    } else {
        match text.find("/*") {
            Some(0) => (TokenKind::CommentBlock, None),
            Some(i) => {
                out.add_token(0..i, TokenKind::Text);
                out.add_token(i..text.len(), TokenKind::CommentBlock);
                return;
            }
            None => (TokenKind::Text, Some(text.len())),
        }
    };
    match close {
        Some(end) => {
            out.add_token(0..end, kind);
            if end < text.len() {
                out.add_token(end..text.len(), TokenKind::Text);
            }
            out.add_null_token();
        }
        None => out.add_token(0..text.len(), kind),
    }
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_identity_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch/identity");
    let mut tokenizer = DispatchTokenizer::new();

    for len in [16, 128, 1024] {
        let line = source_line(len);
        group.throughput(Throughput::Bytes(line.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &line, |b, line| {
            b.iter(|| {
                let list = tokenizer.analyze(Segment::whole(black_box(line)), TokenKind::Null, 0);
                black_box(list.len())
            })
        });
    }

    group.finish();
}

fn bench_callback_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch/split_words");
    let mut tokenizer = DispatchTokenizer::from_fn(split_words);

    for len in [16, 128, 1024] {
        let line = source_line(len);
        group.throughput(Throughput::Bytes(line.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(len), &line, |b, line| {
            b.iter(|| {
                let list = tokenizer.analyze(Segment::whole(black_box(line)), TokenKind::Null, 0);
                black_box(list.len())
            })
        });
    }

    group.finish();
}

fn bench_registry_resolve(c: &mut Criterion) {
    let registry = TokenizerRegistry::builder()
        .named("text/plain", "PlainTokenizer")
        .dispatch_fn("text/x-words", 1, split_words)
        .build();

    c.bench_function("registry/resolve_dispatch", |b| {
        b.iter(|| black_box(registry.resolve(black_box("text/x-words"))))
    });
    c.bench_function("registry/resolve_missing", |b| {
        b.iter(|| black_box(registry.resolve(black_box("text/x-missing"))))
    });
}

fn bench_incremental_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental");
    let mut tokenizer = DispatchTokenizer::from_fn(block_comments);

    for count in [100, 1000] {
        let owned = source_lines(count);
        let lines: Vec<&str> = owned.iter().map(String::as_str).collect();

        group.bench_with_input(BenchmarkId::new("full", count), &lines, |b, lines| {
            b.iter(|| black_box(TokenizedText::from_lines(&mut tokenizer, lines)))
        });

        let cached = TokenizedText::from_lines(&mut tokenizer, &lines);
        group.bench_with_input(BenchmarkId::new("edit_one", count), &lines, |b, lines| {
            b.iter(|| {
                let mut text = cached.clone();
                text.update_line(&mut tokenizer, lines, count / 2);
                black_box(text.lines().len())
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_identity_pass,
    bench_callback_split,
    bench_registry_resolve,
    bench_incremental_update,
);
criterion_main!(benches);
