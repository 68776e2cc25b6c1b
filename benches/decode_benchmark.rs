//! Benchmarks for wordloom decoding and encoding.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::io::Cursor;
use wordloom::{Block, DecodeOptions, DocumentModel, EncodeOptions, Run};

/// Creates a synthetic DOCX document with the given number of paragraphs.
/// Every tenth paragraph is a styled heading.
fn create_test_docx(paragraph_count: usize) -> Vec<u8> {
    use std::io::Write;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    let mut buffer = Vec::new();
    let mut zip = ZipWriter::new(Cursor::new(&mut buffer));

    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    zip.start_file("[Content_Types].xml", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>
</Types>"#,
    )
    .unwrap();

    zip.start_file("_rels/.rels", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
</Relationships>"#,
    )
    .unwrap();

    zip.start_file("word/_rels/document.xml.rels", options)
        .unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>
</Relationships>"#,
    )
    .unwrap();

    zip.start_file("word/styles.xml", options).unwrap();
    zip.write_all(
        br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style>
  <w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/>
    <w:pPr><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style>
</w:styles>"#,
    )
    .unwrap();

    let mut content = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>"#,
    );

    for i in 0..paragraph_count {
        if i % 10 == 0 {
            content.push_str(&format!(
                r#"
    <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Section {}</w:t></w:r></w:p>"#,
                i / 10
            ));
        }
        content.push_str(&format!(
            r#"
    <w:p>
      <w:pPr><w:jc w:val="both"/></w:pPr>
      <w:r><w:rPr><w:color w:val="1F3864"/></w:rPr><w:t xml:space="preserve">This is paragraph {} </w:t></w:r>
      <w:r><w:rPr><w:b/></w:rPr><w:t>with some test content for benchmarking purposes.</w:t></w:r>
    </w:p>"#,
            i
        ));
    }

    content.push_str(
        r#"
  </w:body>
</w:document>"#,
    );

    zip.start_file("word/document.xml", options).unwrap();
    zip.write_all(content.as_bytes()).unwrap();

    zip.finish().unwrap();
    buffer
}

fn create_test_model(paragraph_count: usize) -> DocumentModel {
    let blocks = (0..paragraph_count)
        .map(|i| {
            Block::paragraph(vec![Run::text(format!(
                "This is paragraph {} with some test content for benchmarking purposes.",
                i
            ))])
        })
        .collect();
    DocumentModel::with_blocks(blocks)
}

/// Benchmark package decoding at various sizes.
fn bench_docx_decoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("docx_decoding");
    let options = DecodeOptions::default();

    for para_count in [10, 100, 500, 1000].iter() {
        let data = create_test_docx(*para_count);
        let size = data.len() as u64;

        group.throughput(Throughput::Bytes(size));
        group.bench_with_input(
            BenchmarkId::new("paragraphs", para_count),
            &data,
            |b, data| {
                b.iter(|| {
                    let _ = wordloom::decode_with_options(black_box(data), None, &options);
                });
            },
        );
    }

    group.finish();
}

/// Benchmark HTML to model mapping.
fn bench_html_mapping(c: &mut Criterion) {
    let mut group = c.benchmark_group("html_mapping");

    for para_count in [10, 100, 500].iter() {
        let data = create_test_docx(*para_count);
        let html = wordloom::decode(&data).unwrap().html;

        group.bench_with_input(
            BenchmarkId::new("paragraphs", para_count),
            &html,
            |b, html| {
                b.iter(|| {
                    let _ = wordloom::from_html(black_box(html));
                });
            },
        );
    }

    group.finish();
}

/// Benchmark package encoding.
fn bench_encoding(c: &mut Criterion) {
    let mut group = c.benchmark_group("encoding");
    let options = EncodeOptions::default();

    for para_count in [10, 100, 500, 1000].iter() {
        let model = create_test_model(*para_count);

        group.bench_with_input(
            BenchmarkId::new("paragraphs", para_count),
            &model,
            |b, model| {
                b.iter(|| {
                    let _ = wordloom::encode(black_box(model), &options);
                });
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_docx_decoding, bench_html_mapping, bench_encoding,);
criterion_main!(benches);
