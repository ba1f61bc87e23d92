use criterion::{Criterion, black_box, criterion_group, criterion_main};
use symdiff::html::{html_diff, DefaultFormatter};
use symdiff::parser::parse_chars;
use symdiff::Dmp;

const SHORT_A: &str = "The quick brown fox jumps over the lazy dog.";
const SHORT_B: &str = "That quick brown fox jumped over a lazy dog.";

fn generate_text(lines: usize) -> String {
    let mut text = String::new();
    for i in 0..lines {
        if i % 3 == 0 {
            text.push_str(&format!("this is changed line number {i}\n"));
        } else {
            text.push_str(&format!("this is context line number {i}\n"));
        }
    }
    text
}

fn generate_text_variant(lines: usize) -> String {
    let mut text = String::new();
    for i in 0..lines {
        if i % 3 == 0 {
            text.push_str(&format!("this is edited line number {i}\n"));
        } else {
            text.push_str(&format!("this is context line number {i}\n"));
        }
    }
    text
}

fn bench_diff_main(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff_main");
    let dmp = Dmp::new();

    let short_a = parse_chars(SHORT_A);
    let short_b = parse_chars(SHORT_B);
    group.bench_function("short_strings", |b| {
        b.iter(|| dmp.diff_main(black_box(&short_a), black_box(&short_b)))
    });

    let large_a = parse_chars(&generate_text(200));
    let large_b = parse_chars(&generate_text_variant(200));
    group.bench_function("large_text_200_lines", |b| {
        b.iter(|| dmp.diff_main(black_box(&large_a), black_box(&large_b)))
    });

    group.finish();
}

fn bench_diff_cleanup(c: &mut Criterion) {
    let mut group = c.benchmark_group("diff_cleanup");
    let dmp = Dmp::new();

    let a = parse_chars(&generate_text(100));
    let b = parse_chars(&generate_text_variant(100));

    group.bench_function("semantic", |bch| {
        bch.iter(|| {
            let mut diffs = dmp.diff_main(&a, &b);
            dmp.diff_cleanup_semantic(black_box(&mut diffs));
        })
    });

    group.bench_function("efficiency", |bch| {
        bch.iter(|| {
            let mut diffs = dmp.diff_main(&a, &b);
            dmp.diff_cleanup_efficiency(black_box(&mut diffs));
        })
    });

    group.finish();
}

fn bench_match_main(c: &mut Criterion) {
    let mut group = c.benchmark_group("match_main");
    let dmp = Dmp::new();

    let haystack = parse_chars(&generate_text(200));
    let needle = parse_chars("this is changed line number 150");

    group.bench_function("bitap_in_large_text", |b| {
        b.iter(|| dmp.match_main(black_box(&haystack), black_box(&needle), black_box(5400)))
    });

    group.finish();
}

fn bench_patch_make_and_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("patch");
    let dmp = Dmp::new();

    let short_a = parse_chars(SHORT_A);
    let short_b = parse_chars(SHORT_B);
    group.bench_function("make_short", |b| {
        b.iter(|| dmp.patch_make_from_texts(black_box(&short_a), black_box(&short_b)))
    });

    let patches = dmp.patch_make_from_texts(&short_a, &short_b);
    group.bench_function("apply_short", |b| {
        b.iter(|| dmp.patch_apply(black_box(&patches), black_box(&short_a)))
    });

    let large_a = parse_chars(&generate_text(200));
    let large_b = parse_chars(&generate_text_variant(200));
    group.bench_function("make_large", |b| {
        b.iter(|| dmp.patch_make_from_texts(black_box(&large_a), black_box(&large_b)))
    });

    let large_patches = dmp.patch_make_from_texts(&large_a, &large_b);
    group.bench_function("apply_large", |b| {
        b.iter(|| dmp.patch_apply(black_box(&large_patches), black_box(&large_a)))
    });

    group.finish();
}

fn bench_html_diff(c: &mut Criterion) {
    let mut group = c.benchmark_group("html_diff");
    let dmp = Dmp::new();

    let small_a = "<p>Hello world</p>";
    let small_b = "<p>Hello brave world</p>";
    group.bench_function("small_paragraph", |b| {
        b.iter(|| html_diff(black_box(&dmp), black_box(small_a), black_box(small_b), &DefaultFormatter))
    });

    let mut large_a = String::from("<div>");
    let mut large_b = String::from("<div>");
    for i in 0..100 {
        large_a.push_str(&format!("<p>Item number {i} in the list</p>"));
        large_b.push_str(&format!("<p>Item number {i} in the updated list</p>"));
    }
    large_a.push_str("</div>");
    large_b.push_str("</div>");
    group.bench_function("large_document", |b| {
        b.iter(|| html_diff(black_box(&dmp), black_box(&large_a), black_box(&large_b), &DefaultFormatter))
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_diff_main,
    bench_diff_cleanup,
    bench_match_main,
    bench_patch_make_and_apply,
    bench_html_diff,
);
criterion_main!(benches);
