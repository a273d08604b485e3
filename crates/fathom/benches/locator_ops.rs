//! Locator Operations Benchmarks
//!
//! Benchmarks for path expression building, serialization and element
//! resolution against the in-memory backend.
//!
//! Run with: `cargo bench --bench locator_ops`

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fathom::mock::{MockBackend, MockElement, Scope};
use fathom::prelude::*;

fn bench_path_building(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_building");

    for depth in [1, 2, 5, 10] {
        group.bench_with_input(
            BenchmarkId::from_parameter(format!("select_depth_{depth}")),
            &depth,
            |bench, &d| {
                bench.iter(|| {
                    let mut xpath = XPath::at("body");
                    for i in 0..d {
                        xpath = xpath.select("div").attribute("data-level").be(&i.to_string());
                    }
                    black_box(xpath);
                });
            },
        );
    }

    group.finish();
}

fn bench_path_serialization(c: &mut Criterion) {
    let mut group = c.benchmark_group("path_serialization");

    let paths = vec![
        ("simple", XPath::at("button")),
        ("predicate", XPath::at("button").attribute("type").be("submit")),
        (
            "classes",
            XPath::at("nav").classes(&["navbar", "navbar-expand", "fixed-top"]),
        ),
        (
            "enclosure",
            XPath::at("tr")
                .encloses("td")
                .text()
                .be("Total")
                .select_nth("td", -1),
        ),
        (
            "siblings",
            XPath::at("label").text().be("Name").following("input"),
        ),
    ];

    for (name, xpath) in paths {
        group.bench_with_input(BenchmarkId::from_parameter(name), &xpath, |bench, path| {
            bench.iter(|| {
                let serialized = black_box(path).to_string();
                black_box(serialized);
            });
        });
    }

    group.finish();
}

fn bench_locator_creation(c: &mut Criterion) {
    let mut group = c.benchmark_group("locator_creation");

    let cases = vec!["id", "name", "css", "xpath", "unique", "displayed"];

    for kind in cases {
        group.bench_with_input(BenchmarkId::from_parameter(kind), &kind, |bench, k| {
            bench.iter(|| {
                let locator = match *k {
                    "id" => Locator::id("submit"),
                    "name" => Locator::name("email"),
                    "xpath" => Locator::xpath("//form//button[@type='submit']"),
                    "unique" => Locator::css("#main").unique(),
                    "displayed" => Locator::css(".row").displayed(),
                    _ => Locator::css("div.card > h2"),
                };
                black_box(locator);
            });
        });
    }

    group.finish();
}

fn bench_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolution");

    let backend = Arc::new(MockBackend::new());
    backend.add_element("frame", MockElement::new("iframe"));
    backend.add_element("form", MockElement::new("form"));
    backend.add_element("btn", MockElement::new("button"));
    backend.respond(Scope::Document, SelectorKind::Id, "frame", &["frame"]);
    backend.respond(Scope::Document, SelectorKind::Css, "form", &["form"]);
    backend.respond(Scope::Frame("frame".into()), SelectorKind::Css, "form", &["form"]);
    backend.respond(Scope::Context("form".into()), SelectorKind::Css, "button", &["btn"]);
    let session = Session::builder(backend.clone())
        .settings(Settings::default())
        .build();

    let chains = vec![
        ("root", session.find("form")),
        ("child", session.find("form").find("button")),
        (
            "through_frame",
            session.find(Locator::id("frame")).find("form").find("button"),
        ),
    ];

    for (name, element) in chains {
        group.bench_with_input(BenchmarkId::from_parameter(name), &element, |bench, el| {
            bench.iter(|| {
                let handle = el.resolve().unwrap();
                backend.clear_history();
                black_box(handle);
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_path_building,
    bench_path_serialization,
    bench_locator_creation,
    bench_resolution,
);

criterion_main!(benches);
