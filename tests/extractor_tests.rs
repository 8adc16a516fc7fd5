//! End-to-end tests for the extractor: splitting, decoding, naming, writing,
//! and link rewriting over synthesized archives.

use std::path::{Path, PathBuf};

use mhtml_extract::extract::filename::resolve_filename;
use mhtml_extract::extractor::{ExtractOptions, Extractor};
use mhtml_extract::model::part::PartCategory;

fn write_archive(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("archive.mhtml");
    std::fs::write(&path, contents).unwrap();
    path
}

fn options_for(output_dir: &Path) -> ExtractOptions {
    ExtractOptions {
        output_dir: output_dir.to_path_buf(),
        ..ExtractOptions::default()
    }
}

fn list_filenames(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// An archive with boundary XYZ: one envelope, one HTML part referencing an
/// image, and one base64-encoded PNG part.
const SAMPLE: &str = "From: <Saved by mhtml-extract tests>\n\
    MIME-Version: 1.0\n\
    Content-Type: multipart/related; boundary=\"XYZ\"\n\
    \n\
    --XYZ\n\
    Content-Type: text/html; charset=utf-8\n\
    Content-Location: http://ex/page.html\n\
    \n\
    <html><img src=\"http://ex/pic.png\"></html>\n\
    --XYZ\n\
    Content-Type: image/png\n\
    Content-Transfer-Encoding: base64\n\
    Content-Location: http://ex/pic.png\n\
    \n\
    iVBORw0KGgo=\n\
    --XYZ--\n";

// ─── Test 1: End-to-end extraction with link rewriting ──────────────

#[test]
fn test_end_to_end_extraction() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    let archive = write_archive(tmp.path(), SAMPLE);

    let extractor = Extractor::new(&archive, options_for(&out)).unwrap();
    let stats = extractor.run(None).unwrap();

    assert_eq!(stats.parts_seen, 2);
    assert_eq!(stats.html_count, 1);
    assert_eq!(stats.image_count, 1);
    assert_eq!(stats.skipped_count, 0);

    let names = list_filenames(&out);
    assert_eq!(names.len(), 2, "expected two extracted files, got {names:?}");

    let html_name = names.iter().find(|n| n.ends_with(".html")).unwrap();
    let png_name = names.iter().find(|n| n.ends_with(".png")).unwrap();

    // The PNG body was base64-decoded to its original bytes.
    let png_bytes = std::fs::read(out.join(png_name)).unwrap();
    assert_eq!(png_bytes, [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]);

    // The HTML no longer references the original locator, but the
    // extracted image's resolved name.
    let html = std::fs::read_to_string(out.join(html_name)).unwrap();
    assert!(!html.contains("http://ex/pic.png"), "got: {html}");
    assert!(html.contains(png_name.as_str()), "got: {html}");
}

// ─── Test 2: Category counts add up ─────────────────────────────────

#[test]
fn test_count_identity_with_malformed_parts() {
    let archive_text = "Content-Type: multipart/related; boundary=\"B\"\n\
        \n\
        --B\n\
        Content-Type: text/html\n\
        Content-Location: http://ex/index.html\n\
        \n\
        <html></html>\n\
        --B\n\
        Content-Type: text/css\n\
        Content-Location: http://ex/style.css\n\
        \n\
        body {}\n\
        --B\n\
        Content-Type: application/json\n\
        \n\
        {}\n\
        --B\n\
        Content-Location: http://ex/no-type\n\
        \n\
        mystery\n\
        --B\n\
        Content-Type: text/plain (no separator follows)\n\
        --B--\n";

    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    let archive = write_archive(tmp.path(), archive_text);

    let extractor = Extractor::new(&archive, options_for(&out)).unwrap();
    let stats = extractor.run(None).unwrap();

    assert_eq!(stats.parts_seen, 5);
    assert_eq!(stats.html_count, 1);
    assert_eq!(stats.css_count, 1);
    assert_eq!(stats.other_count, 1);
    // One part with no content type, one with no header/body separator.
    assert_eq!(stats.skipped_count, 2);
    assert_eq!(
        stats.html_count
            + stats.css_count
            + stats.image_count
            + stats.other_count
            + stats.skipped_count,
        stats.parts_seen
    );
}

// ─── Test 3: Dry run writes nothing ─────────────────────────────────

#[test]
fn test_dry_run_creates_no_files() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    std::fs::create_dir(&out).unwrap();
    let archive = write_archive(tmp.path(), SAMPLE);

    let options = ExtractOptions {
        dry_run: true,
        ..options_for(&out)
    };
    let extractor = Extractor::new(&archive, options).unwrap();
    let stats = extractor.run(None).unwrap();

    assert_eq!(stats.parts_seen, 2);
    assert_eq!(stats.extracted_count(), 2);
    assert_eq!(list_filenames(&out).len(), 0);
}

// ─── Test 4: HTML-only mode skips the rewrite pass ──────────────────

#[test]
fn test_html_only_extracts_html_and_skips_rewrite() {
    let archive_text = "Content-Type: multipart/related; boundary=\"B\"\n\
        \n\
        --B\n\
        Content-Type: text/html\n\
        Content-Location: http://ex/index.html\n\
        \n\
        <link href=\"http://ex/style.css\">\n\
        --B\n\
        Content-Type: text/css\n\
        Content-Location: http://ex/style.css\n\
        \n\
        body {}\n\
        --B--\n";

    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    let archive = write_archive(tmp.path(), archive_text);

    let options = ExtractOptions {
        html_only: true,
        ..options_for(&out)
    };
    let extractor = Extractor::new(&archive, options).unwrap();
    let stats = extractor.run(None).unwrap();

    assert_eq!(stats.html_count, 1);
    assert_eq!(stats.skipped_count, 1);

    let names = list_filenames(&out);
    assert_eq!(names.len(), 1);
    assert!(names[0].ends_with(".html"));

    // No rewrite pass: the CSS reference is untouched.
    let html = std::fs::read_to_string(out.join(&names[0])).unwrap();
    assert!(html.contains("http://ex/style.css"));
}

// ─── Test 5: Colliding locators get distinct filenames ──────────────

#[test]
fn test_collision_yields_numeric_suffix() {
    let archive_text = "Content-Type: multipart/related; boundary=\"B\"\n\
        \n\
        --B\n\
        Content-Type: image/png\n\
        Content-Transfer-Encoding: base64\n\
        Content-Location: http://ex/pic.png\n\
        \n\
        iVBORw0KGgo=\n\
        --B\n\
        Content-Type: image/png\n\
        Content-Transfer-Encoding: base64\n\
        Content-Location: http://ex/pic.png\n\
        \n\
        aGVsbG8=\n\
        --B--\n";

    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    let archive = write_archive(tmp.path(), archive_text);

    let extractor = Extractor::new(&archive, options_for(&out)).unwrap();
    let stats = extractor.run(None).unwrap();

    assert_eq!(stats.image_count, 2);
    let names = list_filenames(&out);
    assert_eq!(names.len(), 2, "collision was not resolved: {names:?}");

    let plain = resolve_filename(Some("http://ex/pic.png"), "image/png", None);
    let stem = plain.strip_suffix(".png").unwrap();
    assert!(names.contains(&plain));
    assert!(names.contains(&format!("{stem}_1.png")));
}

// ─── Test 6: Longest locator is rewritten first ─────────────────────

#[test]
fn test_longest_match_first_rewrite() {
    let archive_text = "Content-Type: multipart/related; boundary=\"B\"\n\
        \n\
        --B\n\
        Content-Type: text/html\n\
        Content-Location: http://ex/index.html\n\
        \n\
        <img src=\"/a/b.png?x=1\">\n\
        --B\n\
        Content-Type: image/png\n\
        Content-Location: /a/b.png\n\
        \n\
        short\n\
        --B\n\
        Content-Type: image/png\n\
        Content-Location: /a/b.png?x=1\n\
        \n\
        long\n\
        --B--\n";

    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    let archive = write_archive(tmp.path(), archive_text);

    let extractor = Extractor::new(&archive, options_for(&out)).unwrap();
    extractor.run(None).unwrap();

    let html_name = resolve_filename(Some("http://ex/index.html"), "text/html", None);
    let long_name = resolve_filename(Some("/a/b.png?x=1"), "image/png", None);
    let html = std::fs::read_to_string(out.join(&html_name)).unwrap();

    // The full longer locator was replaced with its own resolved name;
    // the shorter locator's name never partially clobbered it.
    assert!(html.contains(&long_name), "got: {html}");
    assert!(!html.contains("?x=1"), "got: {html}");
}

// ─── Test 7: Two clean runs produce identical filenames ─────────────

#[test]
fn test_filenames_are_deterministic_across_runs() {
    let tmp = tempfile::tempdir().unwrap();
    let archive = write_archive(tmp.path(), SAMPLE);

    let out_a = tmp.path().join("a");
    let out_b = tmp.path().join("b");

    Extractor::new(&archive, options_for(&out_a))
        .unwrap()
        .run(None)
        .unwrap();
    Extractor::new(&archive, options_for(&out_b))
        .unwrap()
        .run(None)
        .unwrap();

    assert_eq!(list_filenames(&out_a), list_filenames(&out_b));
}

// ─── Test 8: Content-ID references are mapped and rewritten ─────────

#[test]
fn test_cid_reference_rewriting() {
    let archive_text = "Content-Type: multipart/related; boundary=\"B\"\n\
        \n\
        --B\n\
        Content-Type: text/html\n\
        Content-Location: http://ex/index.html\n\
        \n\
        <img src=\"cid:img1@archive\">\n\
        --B\n\
        Content-Type: image/gif\n\
        Content-ID: <img1@archive>\n\
        \n\
        GIF89a\n\
        --B--\n";

    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    let archive = write_archive(tmp.path(), archive_text);

    let extractor = Extractor::new(&archive, options_for(&out)).unwrap();
    extractor.run(None).unwrap();

    let html_name = resolve_filename(Some("http://ex/index.html"), "text/html", None);
    let html = std::fs::read_to_string(out.join(&html_name)).unwrap();
    assert!(!html.contains("cid:img1@archive"), "got: {html}");
    assert!(html.contains(".gif"), "got: {html}");
}

// ─── Test 9: Suppress flags skip parts and their references ─────────

#[test]
fn test_no_images_skips_part_and_reference() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    let archive = write_archive(tmp.path(), SAMPLE);

    let options = ExtractOptions {
        no_images: true,
        ..options_for(&out)
    };
    let extractor = Extractor::new(&archive, options).unwrap();
    let stats = extractor.run(None).unwrap();

    assert_eq!(stats.image_count, 0);
    assert_eq!(stats.skipped_count, 1);

    let names = list_filenames(&out);
    assert_eq!(names.len(), 1);

    // The image reference in the HTML is left untouched.
    let html = std::fs::read_to_string(out.join(&names[0])).unwrap();
    assert!(html.contains("http://ex/pic.png"));
}

// ─── Test 10: Allow-list restricts extraction, suppress wins ────────

#[test]
fn test_allow_list_with_suppress_precedence() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    let archive = write_archive(tmp.path(), SAMPLE);

    let options = ExtractOptions {
        allow: Some(vec![PartCategory::Image]),
        no_images: true,
        ..options_for(&out)
    };
    let extractor = Extractor::new(&archive, options).unwrap();
    let stats = extractor.run(None).unwrap();

    // Suppress-images beats the allow-list; the HTML part is not listed.
    assert_eq!(stats.extracted_count(), 0);
    assert_eq!(stats.skipped_count, 2);
    assert_eq!(list_filenames(&out).len(), 0);
}

// ─── Test 11: Missing source is fatal at construction ───────────────

#[test]
fn test_missing_source_is_fatal() {
    let tmp = tempfile::tempdir().unwrap();
    let result = Extractor::new(
        tmp.path().join("no-such.mhtml"),
        options_for(&tmp.path().join("out")),
    );
    assert!(result.is_err());
}

// ─── Test 12: Clear-output toggle empties the destination ───────────

#[test]
fn test_clear_output_dir_removes_stale_files() {
    let tmp = tempfile::tempdir().unwrap();
    let out = tmp.path().join("out");
    std::fs::create_dir(&out).unwrap();
    std::fs::write(out.join("stale.txt"), b"old").unwrap();
    let archive = write_archive(tmp.path(), SAMPLE);

    let options = ExtractOptions {
        clear_output_dir: true,
        ..options_for(&out)
    };
    Extractor::new(&archive, options).unwrap().run(None).unwrap();

    let names = list_filenames(&out);
    assert!(!names.contains(&"stale.txt".to_string()));
    assert_eq!(names.len(), 2);
}
