//! Tree-walk lookups vs the index cache

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use markup_dom::Document;

fn sample_markup(sections: usize) -> String {
    let mut out = String::from("<html><body>");
    for i in 0..sections {
        out.push_str(&format!(
            r#"<section id="s{i}" class="card {}"><h2>Title {i}</h2><p class="body">Text {i}</p><a href="/{i}">more</a></section>"#,
            if i % 2 == 0 { "even" } else { "odd" }
        ));
    }
    out.push_str("</body></html>");
    out
}

fn bench_lookups(c: &mut Criterion) {
    let markup = sample_markup(2_000);
    let mut doc = Document::parse(&markup);
    doc.build_cache().unwrap();

    c.bench_function("parse 2k sections", |b| {
        b.iter(|| Document::parse(black_box(&markup)))
    });
    c.bench_function("get_element_by_id walk", |b| {
        b.iter(|| doc.get_element_by_id(black_box("s1999")))
    });
    c.bench_function("get_element_by_id cached", |b| {
        b.iter(|| doc.get_element_by_id_fast(black_box("s1999")))
    });
    c.bench_function("tag walk", |b| {
        b.iter(|| doc.get_elements_by_tag_name(black_box("p")))
    });
    c.bench_function("tag cached", |b| {
        b.iter(|| doc.get_elements_by_tag_name_fast(black_box("p")))
    });
    c.bench_function("selector .even", |b| {
        b.iter(|| doc.query_selector_all(black_box("section .even")))
    });
}

criterion_group!(benches, bench_lookups);
criterion_main!(benches);
