//! Benchmarks for the parse/validate hot path.

use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use sift_query::parsers::{FilterParser, PageDefaults, PageParser, SortOrder, SortParser};
use sift_query::raw::RawQuery;
use sift_query::schema::Schema;
use sift_query::value::QueryValue;

fn schema() -> Schema {
    let mut schema = Schema::new();
    schema
        .filter("age", ">")
        .filter("age", "<")
        .filter("name", "=")
        .filter("name", "like")
        .filter("status", "in")
        .sort("name")
        .sort("age")
        .page(true);
    schema
}

fn bench_bracket_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("bracket_parsing");

    group.bench_function("simple", |b| {
        b.iter(|| black_box(RawQuery::from_query_str(black_box("filter[name]=alice&page=2"))))
    });

    group.bench_function("nested", |b| {
        b.iter(|| {
            black_box(RawQuery::from_query_str(black_box(
                "filter[age][>]=21&filter[age][<]=65&sort[]=name&sort[]=age&page[size]=10&page[number]=3",
            )))
        })
    });

    group.finish();
}

fn bench_filter_parse(c: &mut Criterion) {
    let schema = schema();
    let parser = FilterParser::new(&schema, "=");
    let raw = RawQuery::from_query_str("filter[age][>]=21&filter[name]=alice");
    let query = raw.filter.unwrap();

    c.bench_function("filter_parse", |b| {
        b.iter(|| black_box(parser.parse(Some(black_box(&query))).unwrap()))
    });
}

fn bench_sort_parse(c: &mut Criterion) {
    let schema = schema();
    let parser = SortParser::new(&schema, SortOrder::Asc);
    let query = QueryValue::from(vec!["name", "age"]);

    c.bench_function("sort_parse", |b| {
        b.iter(|| black_box(parser.parse(Some(black_box(&query))).unwrap()))
    });
}

fn bench_page_parse(c: &mut Criterion) {
    let parser = PageParser::new(PageDefaults::default());
    let query = QueryValue::from("7");

    c.bench_function("page_parse", |b| {
        b.iter(|| black_box(parser.parse(Some(black_box(&query))).unwrap()))
    });
}

criterion_group!(
    benches,
    bench_bracket_parsing,
    bench_filter_parse,
    bench_sort_parse,
    bench_page_parse
);
criterion_main!(benches);
