// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for the ocrlayer-document crate: hOCR parsing and the
// full page walk onto a recording canvas and into PDF bytes.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use ocrlayer_core::ConvertOptions;
use ocrlayer_document::{Converter, HocrDocument, RecordingCanvas};

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A synthetic hOCR document: `pages` pages of 40 lines with 8 words each.
fn synthetic_hocr(pages: usize) -> String {
    let mut out = String::from(
        "<?xml version='1.0' encoding='UTF-8'?>\n\
         <html xmlns='http://www.w3.org/1999/xhtml'><head><title/></head><body>\n",
    );
    for page in 0..pages {
        out.push_str(&format!(
            "<div class='ocr_page' id='page_{page}' title='bbox 0 0 2480 3508; ppageno {page}'>\n\
             <div class='ocr_carea' title='bbox 100 100 2380 3400'>\n\
             <p class='ocr_par' title='bbox 100 100 2380 3400'>\n"
        ));
        for line in 0..40 {
            let y = 100 + line * 80;
            out.push_str(&format!(
                "<span class='ocr_line' title='bbox 100 {y} 2380 {}'>",
                y + 60
            ));
            for word in 0..8 {
                let x = 100 + word * 285;
                out.push_str(&format!(
                    "<span class='ocrx_word' title='bbox {x} {y} {} {}; x_wconf 95'>word{word}</span> ",
                    x + 250,
                    y + 60
                ));
            }
            out.push_str("</span>\n");
        }
        out.push_str("</p></div></div>\n");
    }
    out.push_str("</body></html>\n");
    out
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn bench_parse(c: &mut Criterion) {
    let source = synthetic_hocr(10);
    c.bench_function("hocr_parse (10 pages)", |b| {
        b.iter(|| black_box(HocrDocument::parse(black_box(&source)).unwrap()));
    });
}

fn bench_compose(c: &mut Criterion) {
    let document = HocrDocument::parse(&synthetic_hocr(10)).unwrap();
    let options = ConvertOptions {
        multi_page: true,
        full_line_text: true,
        bounding_boxes: true,
        ..ConvertOptions::default()
    };
    let converter = Converter::new(options).with_document(document);

    c.bench_function("compose_recording (10 pages)", |b| {
        b.iter(|| {
            let mut canvas = RecordingCanvas::new();
            black_box(converter.run(&mut canvas).unwrap());
        });
    });

    c.bench_function("compose_pdf (10 pages)", |b| {
        b.iter(|| black_box(converter.convert_to_bytes().unwrap()));
    });
}

criterion_group!(benches, bench_parse, bench_compose);
criterion_main!(benches);
