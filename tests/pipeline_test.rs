//! End-to-end tests of the page pipeline over synthetic pages.

mod common;

use relayout::convert::Orchestrator;
use relayout::model::TableSection;
use relayout::{
    convert_source, Error, FootnoteNumbering, LayoutOptions, MemoryPageSource, Relayout, ZoneKind,
};

const TITLE_PAGE: &str = "<heading data-font=\"Times-Roman|8\">The State of Trade</heading>\n\
<p>Exports rose sharply.<footnote data-index=\"1\">First note.</footnote></p>\n\
<p>Imports fell.</p>";

#[test]
fn test_two_page_document() {
    let doc = convert_source(&common::two_page_source(), LayoutOptions::default()).unwrap();

    assert_eq!(doc.page_count(), 2);
    assert!(doc.skipped_pages.is_empty());
    assert_eq!(doc.pages[0].html, TITLE_PAGE);
    assert_eq!(
        doc.pages[1].html,
        "<p>Trade grew in typical fashion across the region.\
         <footnote data-index=\"2\">See also page 12. Source: survey.</footnote></p>\n\
         <p>Prices were stable.</p>"
    );
}

#[test]
fn test_page_numerals() {
    let doc = convert_source(&common::two_page_source(), LayoutOptions::default()).unwrap();
    // No numeral on the title page; the running header of page 2 prints 17
    assert_eq!(doc.pages[0].numeral, 1);
    assert_eq!(doc.pages[1].numeral, 17);

    let html = doc.to_html();
    assert!(html.starts_with("<hr class=\"page-break\" data-start=\"1\"/>\n<heading"));
    assert!(html.contains("<hr class=\"page-break\" data-start=\"17\"/>\n<p>Trade grew"));
}

#[test]
fn test_numeral_carried_forward() {
    let mut third = common::body_page();
    // Drop the running header runs: no numeral on the third page
    third.runs.retain(|r| r.text != "17" && r.text != "Annual Review");
    let source = common::two_page_source().with_page(third, common::two_column_bitmap());

    let doc = convert_source(&source, LayoutOptions::default()).unwrap();
    let numerals: Vec<u32> = doc.pages.iter().map(|p| p.numeral).collect();
    assert_eq!(numerals, vec![1, 17, 18]);
}

#[test]
fn test_statistics() {
    let doc = convert_source(&common::two_page_source(), LayoutOptions::default()).unwrap();
    let stats = &doc.stats;
    assert_eq!(stats.page_count, 2);
    assert_eq!(stats.heading_count, 1);
    assert_eq!(stats.paragraph_count, 4);
    assert_eq!(stats.footnotes_resolved, 2);
    assert_eq!(stats.footnotes_unresolved, 0);
    assert_eq!(stats.footnotes_unreferenced, 0);
    assert_eq!(stats.items_dropped, 0);
}

#[test]
fn test_continuous_numbering_keeps_printed_index() {
    let options = LayoutOptions::default().with_footnote_numbering(FootnoteNumbering::Continuous);
    let doc = convert_source(&common::two_page_source(), options).unwrap();
    assert!(doc.pages[1]
        .html
        .contains("<footnote data-index=\"1\">See also page 12. Source: survey.</footnote>"));
}

#[test]
fn test_parallel_and_sequential_agree() {
    let parallel = convert_source(&common::two_page_source(), LayoutOptions::default()).unwrap();
    let sequential =
        convert_source(&common::two_page_source(), LayoutOptions::default().sequential()).unwrap();
    assert_eq!(parallel.to_html(), sequential.to_html());
    assert_eq!(parallel.stats, sequential.stats);
}

#[test]
fn test_lenient_skips_broken_page() {
    let mut source = common::two_page_source();
    source.push(common::body_page(), None);

    let doc = Relayout::new().lenient().convert_source(&source).unwrap();
    assert_eq!(doc.page_count(), 2);
    assert_eq!(doc.skipped_pages, vec![2]);
    assert_eq!(doc.pages[0].html, TITLE_PAGE);

    let strict = Relayout::new().convert_source(&source);
    assert!(matches!(strict, Err(Error::Render { page: 2, .. })));
}

#[test]
fn test_page_zones() {
    let orchestrator = Orchestrator::new(LayoutOptions::default()).unwrap();
    let zones = orchestrator
        .page_zones(&common::two_page_source(), 1)
        .unwrap();

    let kinds: Vec<ZoneKind> = zones.iter().map(|z| z.kind).collect();
    assert_eq!(
        kinds,
        vec![ZoneKind::Header, ZoneKind::Body, ZoneKind::Body, ZoneKind::Footer]
    );
    assert_eq!(zones[0].lines.len(), 1);
    assert_eq!(zones[1].lines.len(), 2);
    assert_eq!(zones[3].lines.len(), 2);

    let err = orchestrator
        .page_zones(&MemoryPageSource::new(), 0)
        .unwrap_err();
    assert!(matches!(err, Error::PageOutOfRange(0, 0)));
}

#[test]
fn test_table_with_caption_and_notes() {
    let doc = convert_source(&common::table_source(), LayoutOptions::default()).unwrap();

    assert_eq!(doc.page_count(), 2);
    assert!(doc.pages[1].html.starts_with(
        "<table><caption>Table 1 Trade</caption>\
         <thead><tr><th>Country</th><th>GDP</th></tr></thead>\
         <tbody><tr><td>France</td><td>2.1</td></tr></tbody>\
         <tfoot><tr><td colspan=\"2\"><p>Source: survey.</p></td></tr></tfoot></table>"
    ));
    assert_eq!(doc.stats.items_dropped, 0);
}

#[test]
fn test_table_page_zones() {
    let orchestrator = Orchestrator::new(LayoutOptions::default()).unwrap();
    let zones = orchestrator.page_zones(&common::table_source(), 1).unwrap();

    let sections: Vec<TableSection> = zones.iter().filter_map(|z| z.table.map(|t| t.section)).collect();
    assert_eq!(sections.first(), Some(&TableSection::Caption));
    assert_eq!(sections.last(), Some(&TableSection::Notes));
    assert_eq!(sections.iter().filter(|s| **s == TableSection::Header).count(), 2);
    assert_eq!(sections.iter().filter(|s| **s == TableSection::Body).count(), 2);
    assert_eq!(zones.first().map(|z| z.kind), Some(ZoneKind::Header));
    assert_eq!(zones.last().map(|z| z.kind), Some(ZoneKind::Footer));
}

#[test]
fn test_progress_callback() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let seen = Arc::new(AtomicUsize::new(0));
    let counter = seen.clone();
    let orchestrator = Orchestrator::new(LayoutOptions::default())
        .unwrap()
        .on_progress(move |done, total| {
            assert!(done <= total);
            counter.fetch_add(1, Ordering::SeqCst);
        });
    orchestrator.run(&common::two_page_source()).unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}
