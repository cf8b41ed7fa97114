use std::num::NonZeroUsize;

use log_watcher::extractor::TraceExtractor;

fn extractor(n: usize) -> TraceExtractor {
    TraceExtractor::new(NonZeroUsize::new(n).unwrap())
}

/// A log with `errors` NullPointerException traces of `depth` frames each,
/// separated by `gap` info lines.
fn synthetic_log(errors: usize, depth: usize, gap: usize) -> String {
    let mut out = String::new();
    for e in 0..errors {
        for g in 0..gap {
            out.push_str(&format!("INFO request {e}-{g} ok\n"));
        }
        out.push_str(&format!("ERROR java.lang.NullPointerException: case {e}\n"));
        for d in 0..depth {
            out.push_str(&format!("\tat com.example.Frame{d}.call(Frame{d}.java:{d})\n"));
        }
    }
    out
}

#[test]
fn scenario_single_trace_window() {
    let mut lines = vec!["a".to_string(), "NullPointerException".to_string()];
    lines.extend((1..=9).map(|i| format!("x{i}")));
    lines.push("b".to_string());

    let blocks: Vec<_> = extractor(10).blocks(&lines, "NullPointerException").collect();

    assert_eq!(blocks.len(), 1);
    let expected: Vec<String> = std::iter::once("NullPointerException".to_string())
        .chain((1..=9).map(|i| format!("x{i}")))
        .collect();
    assert_eq!(blocks[0].lines(), expected.as_slice());
}

#[test]
fn scenario_too_few_trailing_lines() {
    let content = "boot\nNullPointerException\nat A\nat B\n";
    assert!(extractor(10)
        .extract_all(content, &["NullPointerException"])
        .is_empty());
}

#[test]
fn scenario_two_traces_in_file_order() {
    let content = synthetic_log(2, 9, 3);
    let matches = extractor(10).extract_all(&content, &["NullPointerException"]);

    assert_eq!(matches.len(), 2);
    assert!(matches[0].block.lines()[0].ends_with("case 0"));
    assert!(matches[1].block.lines()[0].ends_with("case 1"));
}

#[test]
fn blocks_always_have_exact_length() {
    for count in 1..=12 {
        for depth in 0..=12 {
            for gap in 0..=2 {
                let content = synthetic_log(3, depth, gap);
                let matches = extractor(count).extract_all(&content, &["NullPointerException", "Frame1"]);
                assert!(
                    matches.iter().all(|m| m.block.len() == count),
                    "count={count} depth={depth} gap={gap}"
                );
            }
        }
    }
}

#[test]
fn no_signature_no_blocks() {
    let content = synthetic_log(4, 5, 2);
    assert!(extractor(3)
        .extract_all(&content, &["InvalidItemStateException"])
        .is_empty());
}

#[test]
fn signatures_do_not_share_state() {
    // "Alpha" starts a capture that would still be open when "Beta" appears.
    let content = "Alpha\n1\nBeta\n2\n3\n";
    let ex = extractor(3);

    let alone = ex.extract_all(content, &["Beta"]);
    let together = ex.extract_all(content, &["Alpha", "Beta"]);

    assert_eq!(together.len(), 2);
    assert_eq!(together[1], alone[0]);
    assert_eq!(together[1].block.lines(), ["Beta", "2", "3"]);
}

#[test]
fn extraction_is_idempotent() {
    let content = synthetic_log(5, 11, 1);
    let signatures = ["NullPointerException", "InvalidItemStateException"];
    let ex = extractor(10);

    assert_eq!(
        ex.extract_all(&content, &signatures),
        ex.extract_all(&content, &signatures)
    );
}

#[test]
fn output_follows_signature_order() {
    let content = "B first\nx\nA second\ny\n";
    let matches = extractor(2).extract_all(content, &["A", "B"]);
    let order: Vec<_> = matches.iter().map(|m| m.signature.as_str()).collect();
    assert_eq!(order, ["A", "B"]);
}
