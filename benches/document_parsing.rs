//! Fulltext Document Parsing Benchmarks
//!
//! Streaming parser throughput for annotation pages of increasing size, plus
//! the ETag and precondition path every request goes through.
//!
//! Run with: `cargo bench --bench document_parsing`

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::time::Duration;

use fulltext_server::cache::{evaluate, generate_etag};
use fulltext_server::loader::{ParserSettings, XmlParser};

const RESOURCE_BASE_URL: &str = "http://data.europeana.eu/fulltext/";

/// Annotation page with one page annotation and `words` word annotations
fn create_document(words: usize) -> Vec<u8> {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE rdf:RDF [
    <!ENTITY img "https://iiif.europeana.eu/image/9200396/bench/1">
    <!ENTITY text "http://data.europeana.eu/fulltext/9200396/bench/ft1">
]>
<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"
         xmlns:edm="http://www.europeana.eu/schemas/edm/"
         xmlns:oa="http://www.w3.org/ns/oa#"
         xmlns:dc="http://purl.org/dc/elements/1.1/">
  <edm:FullTextResource rdf:about="&text;">
    <dc:language>en</dc:language>
    <rdf:value>"#,
    );
    for _ in 0..words {
        xml.push_str("word ");
    }
    xml.push_str(
        r#"</rdf:value>
  </edm:FullTextResource>
  <oa:Annotation rdf:ID="/page">
    <dc:type>Page</dc:type>
    <oa:hasBody rdf:resource="&text;"/>
    <oa:hasTarget rdf:resource="&img;"/>
  </oa:Annotation>
"#,
    );
    for i in 0..words {
        let from = i * 5;
        xml.push_str(&format!(
            r#"  <oa:Annotation rdf:ID="/w{i}">
    <dc:type>Word</dc:type>
    <oa:motivatedBy rdf:resource="http://www.w3.org/ns/oa#transcribing"/>
    <oa:hasBody>
      <oa:SpecificResource rdf:about="&text;#char={from},{to}"/>
    </oa:hasBody>
    <oa:hasTarget rdf:resource="&img;#xywh={x},{y},40,12"/>
  </oa:Annotation>
"#,
            to = from + 4,
            x = (i % 20) * 45,
            y = (i / 20) * 15,
        ));
    }
    xml.push_str("</rdf:RDF>\n");
    xml.into_bytes()
}

/// Benchmark fulltext document parsing
fn bench_document_parsing(c: &mut Criterion) {
    let parser = XmlParser::new(ParserSettings {
        resource_base_url: RESOURCE_BASE_URL.to_string(),
    });
    let modified = Utc.with_ymd_and_hms(2018, 10, 18, 12, 0, 0).unwrap();

    let mut group = c.benchmark_group("document_parsing");
    group.measurement_time(Duration::from_secs(10));

    for words in [10, 500, 5000] {
        let document = create_document(words);
        group.throughput(Throughput::Bytes(document.len() as u64));
        group.bench_with_input(BenchmarkId::new("words", words), &document, |b, data| {
            b.iter(|| {
                let page = parser
                    .parse("1", black_box(data.as_slice()), "bench.xml", Some(modified), None)
                    .expect("Failed to parse document");
                black_box(page)
            })
        });
    }

    group.finish();
}

/// Benchmark ETag generation and precondition evaluation
fn bench_conditional(c: &mut Criterion) {
    let modified = Utc.with_ymd_and_hms(2018, 10, 18, 12, 0, 0).unwrap();
    let etag = generate_etag("9200396bench1", modified, "3", "0.5.0", true);
    let if_none_match = format!("W/\"a\", W/\"b\", {}", etag);

    let mut group = c.benchmark_group("conditional");

    group.bench_function("generate_etag", |b| {
        b.iter(|| generate_etag(black_box("9200396bench1"), modified, "3", "0.5.0", true))
    });
    group.bench_function("evaluate", |b| {
        b.iter(|| evaluate(black_box(etag.as_str()), None, Some(black_box(if_none_match.as_str()))))
    });

    group.finish();
}

criterion_group!(benches, bench_document_parsing, bench_conditional);
criterion_main!(benches);
