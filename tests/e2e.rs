//! End-to-end tests for the `wkhtmltopdf` process driver.
//!
//! `scripted_converter_round_trip` runs [`WkhtmltopdfEngine`] against a small
//! shell script that behaves like the converter (progress on stderr, PDF on
//! stdout, configurable exit code), so the process plumbing is covered on
//! every Unix CI run.
//!
//! `real_wkhtmltopdf` needs the real converter and is gated behind the
//! `E2E_ENABLED` environment variable.
//!
//! Run with:
//!   E2E_ENABLED=1 cargo test --test e2e -- --nocapture

use md2pdf::{
    convert_to_file, convert_to_file_with, CmarkRenderer, EngineFailure, FailurePolicy,
    PdfEngine, RunConfig, WkhtmltopdfEngine,
};
use std::path::{Path, PathBuf};

// ── Test helpers ─────────────────────────────────────────────────────────────

/// Write an executable script that mimics the converter and exits with `code`.
#[cfg(unix)]
fn fake_converter(dir: &Path, name: &str, code: i32) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = format!(
        r#"#!/bin/sh
if [ "$1" = "--version" ]; then
  echo "wkhtmltopdf 0.12.6 (fake)"
  exit 0
fi
printf 'Loading pages (1/6)\n' >&2
printf '[=====>      ] 50%%\r[============] 100%%\n' >&2
printf 'Warning: Failed to load file:///missing.png (ignore)\n' >&2
printf 'Printing pages (6/6)\n' >&2
printf 'Done\n' >&2
printf '%%PDF-1.4\n'
cat
printf '\nARGS: %s\n' "$*"
exit {code}
"#
    );
    let path = dir.join(name);
    std::fs::write(&path, script).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

// ── Scripted converter ───────────────────────────────────────────────────────

// One test function so no other thread forks while the scripts are being
// written (avoids ETXTBSY on exec).
#[cfg(unix)]
#[tokio::test]
async fn scripted_converter_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let ok = fake_converter(dir.path(), "wk-ok", 0);
    let broken = fake_converter(dir.path(), "wk-broken", 2);

    let input = dir.path().join("doc.md");
    std::fs::write(&input, "| a | b |\n|---|---|\n| 1 | 2 |\n").unwrap();

    // Version check used by the banner.
    let engine = WkhtmltopdfEngine::locate(Some(&ok)).unwrap();
    assert_eq!(
        engine.version().await.as_deref(),
        Some("wkhtmltopdf 0.12.6 (fake)")
    );

    // Successful run: HTML goes in on stdin, PDF comes back on stdout.
    let config = RunConfig::builder()
        .input(&input)
        .css("print.css")
        .build()
        .unwrap();
    let stats = convert_to_file_with(&config, &CmarkRenderer::default(), &engine)
        .await
        .unwrap();

    assert!(stats.succeeded());
    assert!(stats.written);
    assert_eq!(
        stats.warnings,
        vec!["Failed to load file:///missing.png (ignore)".to_string()]
    );

    let pdf = std::fs::read_to_string(dir.path().join("doc.md.pdf")).unwrap();
    assert!(pdf.starts_with("%PDF-1.4\n"), "{pdf}");
    assert!(pdf.contains("<table>"), "{pdf}");
    assert!(pdf.contains("--footer-center Page: [page] of [topage]"), "{pdf}");
    assert!(pdf.contains("--user-style-sheet print.css"), "{pdf}");
    assert!(pdf.contains("--encoding utf-8"), "{pdf}");
    assert!(pdf.trim_end().ends_with("- -"), "{pdf}");

    // Non-zero exit: reported, and the write follows the failure policy.
    let broken_engine = WkhtmltopdfEngine::new(&broken);
    let out = dir.path().join("broken.pdf");
    let skip = RunConfig::builder()
        .input(&input)
        .output(&out)
        .failure_policy(FailurePolicy::SkipWrite)
        .build()
        .unwrap();
    let stats = convert_to_file_with(&skip, &CmarkRenderer::default(), &broken_engine)
        .await
        .unwrap();
    assert_eq!(stats.engine_failure, Some(EngineFailure::Exited { code: 2 }));
    assert!(!stats.written);
    assert!(!out.exists());

    let best_effort = RunConfig::builder()
        .input(&input)
        .output(&out)
        .build()
        .unwrap();
    let stats = convert_to_file_with(&best_effort, &CmarkRenderer::default(), &broken_engine)
        .await
        .unwrap();
    assert_eq!(stats.engine_failure, Some(EngineFailure::Exited { code: 2 }));
    assert!(stats.written);
    assert!(std::fs::read_to_string(&out).unwrap().starts_with("%PDF-1.4"));
}

// ── Real converter ───────────────────────────────────────────────────────────

#[tokio::test]
async fn real_wkhtmltopdf() {
    if std::env::var("E2E_ENABLED").is_err() {
        println!("SKIP — set E2E_ENABLED=1 to run e2e tests");
        return;
    }
    if WkhtmltopdfEngine::locate(None).is_err() {
        println!("SKIP — wkhtmltopdf not found (set WKHTMLTOPDF_PATH)");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("README.md");
    std::fs::write(
        &input,
        "# md2pdf\n\nFirst line\nsecond line\n\n| col | val |\n|-----|-----|\n| a | 1 |\n",
    )
    .unwrap();

    let config = RunConfig::builder().input(&input).build().unwrap();
    let stats = convert_to_file(&config).await.unwrap();

    println!("{}", serde_json::to_string_pretty(&stats).unwrap());
    assert!(stats.succeeded(), "{:?}", stats.errors);
    let pdf = std::fs::read(dir.path().join("README.md.pdf")).unwrap();
    assert!(pdf.starts_with(b"%PDF-"));
}
