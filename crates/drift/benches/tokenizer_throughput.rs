//! Dump tokenizer throughput benchmarks.
//!
//! Measures single-core throughput for the page-extraction path:
//! (optionally bzip2-compressed) XML → page records.

use std::io::Write;
use std::path::Path;

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};

use drift::source::{CompressionFormat, DumpTokenizer, PageStream};
use drift::Language;

fn generate_dump_xml(page_count: usize) -> String {
    let mut xml = String::from("<mediawiki>");
    for id in 1..=page_count {
        let ns = match id % 10 {
            0 => 14,
            1..=7 => 0,
            _ => 2,
        };
        xml.push_str(&format!(
            "<page>\
             <title>Benchmark page {id}</title>\
             <ns>{ns}</ns>\
             <id>{id}</id>\
             <revision><id>9999</id><text>Some wikitext body for page {id}. \
             It mentions [[another page]] and carries a bit of markup \
             so the tokenizer has realistic text to copy.</text></revision>\
             </page>"
        ));
    }
    xml.push_str("</mediawiki>");
    xml
}

fn write_plain_dump(dir: &Path, page_count: usize) -> std::path::PathBuf {
    let path = dir.join("enwiki-bench.xml");
    std::fs::write(&path, generate_dump_xml(page_count)).unwrap();
    path
}

fn write_bzip2_dump(dir: &Path, page_count: usize) -> std::path::PathBuf {
    let path = dir.join("enwiki-bench.xml.bz2");
    let file = std::fs::File::create(&path).unwrap();
    let mut encoder = bzip2::write::BzEncoder::new(file, bzip2::Compression::fast());
    encoder
        .write_all(generate_dump_xml(page_count).as_bytes())
        .unwrap();
    encoder.finish().unwrap();
    path
}

fn drain(path: &Path) -> usize {
    let mut tokenizer = DumpTokenizer::open(
        path,
        Language::new("en").unwrap(),
        CompressionFormat::Auto,
    )
    .unwrap();
    let mut pages = 0usize;
    while let Some(result) = tokenizer.next_page() {
        result.unwrap();
        pages += 1;
    }
    pages
}

fn tokenizer_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("tokenizer");

    for page_count in [1_000, 10_000] {
        let dir = tempfile::tempdir().unwrap();
        let plain = write_plain_dump(dir.path(), page_count);
        let compressed = write_bzip2_dump(dir.path(), page_count);

        group.throughput(Throughput::Elements(page_count as u64));
        group.sample_size(10);

        group.bench_with_input(BenchmarkId::new("plain_xml", page_count), &plain, |b, path| {
            b.iter(|| drain(path));
        });

        group.bench_with_input(
            BenchmarkId::new("bzip2_xml", page_count),
            &compressed,
            |b, path| {
                b.iter(|| drain(path));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, tokenizer_throughput);
criterion_main!(benches);
