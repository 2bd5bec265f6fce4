//! End-to-end library tests: load, strip with the built-in plan, write back.

use legacy_stripper::config;
use legacy_stripper::{strip, DecodeMode, GapPolicy, SourceDocument, StripError};
use std::fs;
use tempfile::TempDir;

const INDEX_HTML: &str = r#"<!DOCTYPE html>
<html>
<head><title>Brooklyn CDL</title></head>
<body>
  <div id="content"></div>
  <script>
    const API_BASE = '/api';

    const quizRegistry = {
        'section-1': {
            title: 'General Knowledge',
            questions: [{ q: 'Stop?', a: ['yes', 'no'], correct: 0 }]
        },
        'section-2': { title: 'Air Brakes', questions: [] }
    };

    let sectionScores = {
        'section-1': { correct: 0, total: 0 },
        'section-2': { correct: 0, total: 0 }
    };

    function getContentForSection(id) {
        if (quizRegistry[id]) {
            return quizRegistry[id];
        }
        return { title: 'Missing', questions: [] };
    }

    async function showDatabaseContent(id) {
        const res = await fetch(`${API_BASE}/sections/${id}`);
        return res.json();
    }
  </script>
</body>
</html>
"#;

fn write_index(contents: &[u8]) -> (TempDir, std::path::PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("index.html");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
fn test_builtin_plan_strips_index_html() {
    let (_dir, path) = write_index(INDEX_HTML.as_bytes());
    let plan = config::builtin().unwrap();

    let doc = SourceDocument::load(&path).unwrap();
    let outcome = strip(doc.text(), &plan.anchors, &plan.template, plan.gaps).unwrap();
    doc.write_back(&outcome.text).unwrap();

    let written = fs::read_to_string(&path).unwrap();
    // The prefix keeps the indentation in front of the first block, so the
    // first comment line ends up indented twice.
    assert!(written.contains(&format!(
        "const API_BASE = '/api';\n\n    {}async function showDatabaseContent(id) {{",
        plan.template
    )));
    assert!(written.contains(
        "\n        // Legacy quizRegistry removed - all quiz content now loads from database via server API\n"
    ));
    assert!(!written.contains("quizRegistry = {"));
    assert!(!written.contains("sectionScores = {"));
    assert!(!written.contains("function getContentForSection"));
    assert!(written.ends_with("  </script>\n</body>\n</html>\n"));
}

#[test]
fn test_region_line_ranges() {
    let plan = config::builtin().unwrap();
    let outcome = strip(INDEX_HTML, &plan.anchors, &plan.template, GapPolicy::Preserve).unwrap();

    let ranges: Vec<_> = outcome
        .regions
        .iter()
        .map(|r| r.region.line_range(INDEX_HTML))
        .collect();
    assert_eq!(ranges, [(9, 17), (17, 22), (22, 29)]);
}

#[test]
fn test_prefix_and_suffix_are_untouched() {
    let plan = config::builtin().unwrap();
    let outcome = strip(INDEX_HTML, &plan.anchors, &plan.template, GapPolicy::Preserve).unwrap();
    let span = outcome.removed_span();

    assert_eq!(
        outcome.text,
        format!(
            "{}{}{}",
            &INDEX_HTML[..span.start],
            plan.template,
            &INDEX_HTML[span.end..]
        )
    );
}

#[test]
fn test_missing_section_scores_leaves_file_unchanged() {
    let broken = INDEX_HTML.replace("let sectionScores = {", "let scores = {");
    let (_dir, path) = write_index(broken.as_bytes());
    let plan = config::builtin().unwrap();

    let doc = SourceDocument::load(&path).unwrap();
    let err = strip(doc.text(), &plan.anchors, &plan.template, plan.gaps).unwrap_err();

    assert!(matches!(err, StripError::AnchorNotFound { ref anchor, .. } if anchor == "sectionScores"));
    assert_eq!(fs::read_to_string(&path).unwrap(), broken);
}

#[test]
fn test_second_run_fails_on_patched_file() {
    let (_dir, path) = write_index(INDEX_HTML.as_bytes());
    let plan = config::builtin().unwrap();

    let doc = SourceDocument::load(&path).unwrap();
    let outcome = strip(doc.text(), &plan.anchors, &plan.template, plan.gaps).unwrap();
    doc.write_back(&outcome.text).unwrap();

    let patched = SourceDocument::load(&path).unwrap();
    let err = strip(patched.text(), &plan.anchors, &plan.template, plan.gaps).unwrap_err();
    assert!(matches!(err, StripError::AnchorNotFound { ref anchor, .. } if anchor == "quizRegistry"));
}

#[test]
fn test_latin1_input_decodes_lossily_and_proceeds() {
    let latin1 = INDEX_HTML
        .replace("Brooklyn CDL", "Brooklyn CDL caf\u{0}")
        .into_bytes()
        .into_iter()
        .map(|b| if b == 0 { 0xE9 } else { b })
        .collect::<Vec<u8>>();
    let (_dir, path) = write_index(&latin1);
    let plan = config::builtin().unwrap();

    let doc = SourceDocument::load(&path).unwrap();
    assert_eq!(doc.decode_mode(), DecodeMode::Lossy { dropped_bytes: 1 });
    assert!(doc.text().contains("Brooklyn CDL caf</title>"));

    let outcome = strip(doc.text(), &plan.anchors, &plan.template, plan.gaps).unwrap();
    assert_eq!(outcome.regions.len(), 3);
}
