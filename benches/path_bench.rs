#![allow(clippy::expect_used)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::fmt::Write;

use elemtree::{Document, Path};

// ---------------------------------------------------------------------------
// Document generators
// ---------------------------------------------------------------------------

/// Generates a catalog document with `books` book elements.
fn make_catalog_xml(books: usize) -> String {
    let mut xml = String::from("<?xml version=\"1.0\"?><catalog xmlns:p=\"urn:prices\">");
    for i in 0..books {
        let _ = write!(
            xml,
            "<book id=\"bk{i}\" category=\"{}\"><title>Title {i}</title>\
             <author>Author {i}</author>\
             <p:price>{}.99</p:price></book>",
            if i % 3 == 0 { "WEB" } else { "PRINT" },
            10 + i
        );
    }
    xml.push_str("</catalog>");
    xml
}

/// Generates a document nested `depth` elements deep.
fn make_nested_xml(depth: usize) -> String {
    let mut xml = String::new();
    for i in 0..depth {
        let _ = write!(xml, "<level{i}>");
    }
    xml.push_str("<leaf>found</leaf>");
    for i in (0..depth).rev() {
        let _ = write!(xml, "</level{i}>");
    }
    xml
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("compile");

    for (name, path) in [
        ("simple", "./catalog/book/title"),
        ("filtered", ".//book[@category='WEB']/p:price"),
        ("union", "./catalog/book[@category='WEB']/(title|author)"),
    ] {
        group.bench_function(name, |b| {
            b.iter(|| Path::compile(black_box(path)).expect("path compiles"));
        });
    }

    group.finish();
}

fn bench_evaluate(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate");

    let child_path = Path::must_compile("./catalog/book/title");
    let filter_path = Path::must_compile(".//book[@category='WEB']/p:price");
    let function_path = Path::must_compile("//*[namespace-prefix()='p']");

    for size in [10usize, 100, 1000] {
        let doc = Document::parse_str(&make_catalog_xml(size)).expect("catalog parses");
        let root = doc.root();

        group.bench_with_input(BenchmarkId::new("children", size), &size, |b, _| {
            b.iter(|| black_box(doc.find_elements_path(root, &child_path)));
        });
        group.bench_with_input(BenchmarkId::new("descendant_filter", size), &size, |b, _| {
            b.iter(|| black_box(doc.find_elements_path(root, &filter_path)));
        });
        group.bench_with_input(BenchmarkId::new("function_filter", size), &size, |b, _| {
            b.iter(|| black_box(doc.find_elements_path(root, &function_path)));
        });
    }

    group.finish();
}

fn bench_deep_descent(c: &mut Criterion) {
    let doc = Document::parse_str(&make_nested_xml(64)).expect("nested doc parses");
    let root = doc.root();
    let path = Path::must_compile("//leaf");

    c.bench_function("deep_descent", |b| {
        b.iter(|| black_box(doc.find_elements_path(root, &path)));
    });
}

criterion_group!(benches, bench_compile, bench_evaluate, bench_deep_descent);
criterion_main!(benches);
