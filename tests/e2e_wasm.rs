#![cfg(target_arch = "wasm32")]

use js_sys::{Object, Reflect}; // Build option objects for wasm bindings.
use serde_json::Value as JsonValue;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

use devtools_core::{
    cron_next_executions, cron_report, describe_cron_expression, format_source_text,
    generate_text_diff, generate_unified_text_diff, minify_source_text, punycode_decode,
    punycode_decode_lossy, punycode_encode,
};

wasm_bindgen_test_configure!(run_in_browser);

fn js_to_json(value: JsValue) -> JsonValue {
    serde_wasm_bindgen::from_value(value).expect("JsValue -> JSON")
}

fn options(entries: &[(&str, JsValue)]) -> JsValue {
    let obj = Object::new();
    for (key, value) in entries {
        Reflect::set(&obj, &JsValue::from_str(key), value).expect("set option");
    }
    obj.into()
}

fn error_text(err: JsValue) -> String {
    err.as_string().expect("errors are strings")
}

#[wasm_bindgen_test]
fn punycode_encode_and_decode_domains() {
    assert_eq!(punycode_encode("münchen.de").unwrap(), "xn--mnchen-3ya.de");
    assert_eq!(punycode_decode("xn--mnchen-3ya.de").unwrap(), "münchen.de");
    assert_eq!(punycode_encode("example.com").unwrap(), "example.com");
}

#[wasm_bindgen_test]
fn punycode_decode_errors_are_strings() {
    let err = error_text(punycode_decode("xn--a-!.com").unwrap_err());
    assert!(err.contains("invalid"), "message: {err}");
    assert_eq!(punycode_decode_lossy("xn--a-!.com"), "xn--a-!.com");
}

#[wasm_bindgen_test]
fn text_diff_defaults_to_word_mode() {
    let result = js_to_json(
        generate_text_diff("hello world", "hello there", JsValue::UNDEFINED).unwrap(),
    );
    assert_eq!(result["mode"], "word");
    let parts = result["parts"].as_array().expect("parts array");
    assert_eq!(parts[0]["type"], "unchanged");
    assert_eq!(parts[0]["value"], "hello ");
    assert_eq!(result["stats"]["additions"], 1);
    assert_eq!(result["stats"]["deletions"], 1);
}

#[wasm_bindgen_test]
fn text_diff_accepts_options_object() {
    let opts = options(&[
        ("mode", JsValue::from_str("character")),
        ("ignoreCase", JsValue::TRUE),
    ]);
    let result = js_to_json(generate_text_diff("ABC", "abd", opts).unwrap());
    assert_eq!(result["mode"], "character");
    assert_eq!(result["parts"][0]["type"], "unchanged");
    assert_eq!(result["parts"][0]["value"], "ab");
}

#[wasm_bindgen_test]
fn text_diff_rejects_bad_options() {
    let opts = options(&[("mode", JsValue::from_str("paragraph"))]);
    let err = error_text(generate_text_diff("a", "b", opts).unwrap_err());
    assert!(err.starts_with("invalid options"), "message: {err}");
}

#[wasm_bindgen_test]
fn unified_diff_has_headers() {
    let patch = generate_unified_text_diff("one\ntwo\n", "one\n2\n", "a/x.txt", "b/x.txt");
    assert!(patch.starts_with("--- a/x.txt\n+++ b/x.txt\n"));
    assert!(patch.contains("-two\n+2\n"));
}

#[wasm_bindgen_test]
fn cron_description_and_runs() {
    assert_eq!(
        describe_cron_expression("0 * * * *").unwrap(),
        "At the start of every hour"
    );
    let runs = js_to_json(cron_next_executions("*/5 * * * *", 4).unwrap());
    let runs = runs.as_array().expect("run list");
    assert_eq!(runs.len(), 4);
    assert!(runs.iter().all(|run| run.as_str().is_some_and(|s| s.ends_with("Z"))));
}

#[wasm_bindgen_test]
fn cron_report_bundles_fields() {
    let report = js_to_json(cron_report("0 0 * * *", 2).unwrap());
    assert_eq!(report["description"], "At midnight every day");
    assert_eq!(report["nextRuns"].as_array().map(Vec::len), Some(2));
}

#[wasm_bindgen_test]
fn cron_errors_are_strings() {
    let err = error_text(describe_cron_expression("* * *").unwrap_err());
    assert_eq!(err, "cron expression must have 5 fields, found 3");
}

#[wasm_bindgen_test]
fn format_source_with_indent_option() {
    let opts = options(&[("indentWidth", JsValue::from_f64(4.0))]);
    assert_eq!(
        format_source_text("javascript", "if (a) { b(); }", opts).unwrap(),
        "if (a) {\n    b();\n}"
    );
    assert_eq!(
        format_source_text("html", "<ul><li>x</li></ul>", JsValue::NULL).unwrap(),
        "<ul>\n  <li>\n    x\n  </li>\n</ul>"
    );
}

#[wasm_bindgen_test]
fn minify_source_and_unknown_language() {
    assert_eq!(
        minify_source_text("graphql", "query Q {\n  a\n  b\n}").unwrap(),
        "query Q{a b}"
    );
    let err = error_text(minify_source_text("css", "a {}").unwrap_err());
    assert_eq!(err, "unsupported format language: css");
}
