use chrono::{DateTime, Utc};
use console_error_panic_hook::set_once as set_panic_hook;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use wasm_bindgen::prelude::*;

pub mod cron;
pub mod diff;
pub mod error;
pub mod format;
pub mod punycode;

use crate::cron::CronReport;
use crate::diff::{DEFAULT_CONTEXT_LINES, DiffOptions, DiffResult};
use crate::error::{Result, ToolError};
use crate::format::{FormatLanguage, FormatOptions};

#[wasm_bindgen(start)]
pub fn wasm_start() {
    set_panic_hook();
}

fn to_js_error(err: ToolError) -> JsValue {
    debug!(error = %err, "tool call failed");
    JsValue::from_str(&err.to_string())
}

fn to_js_value<T: Serialize>(value: &T) -> std::result::Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|err| to_js_error(ToolError::Serialize(err.to_string())))
}

/// Reads an optional options object; `undefined` and `null` mean defaults.
fn options_from_js<T: DeserializeOwned + Default>(value: JsValue) -> Result<T> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|err| ToolError::InvalidOptions(err.to_string()))
}

#[wasm_bindgen]
pub fn punycode_encode(domain: &str) -> std::result::Result<String, JsValue> {
    punycode_encode_internal(domain).map_err(to_js_error)
}

#[wasm_bindgen]
pub fn punycode_decode(domain: &str) -> std::result::Result<String, JsValue> {
    punycode_decode_internal(domain).map_err(to_js_error)
}

/// Decodes what it can and leaves malformed labels as typed.
#[wasm_bindgen]
pub fn punycode_decode_lossy(domain: &str) -> String {
    punycode::domain_to_unicode_lossy(domain)
}

fn punycode_encode_internal(domain: &str) -> Result<String> {
    Ok(punycode::domain_to_ascii(domain)?)
}

fn punycode_decode_internal(domain: &str) -> Result<String> {
    Ok(punycode::domain_to_unicode(domain)?)
}

#[wasm_bindgen]
pub fn generate_text_diff(
    old_text: &str,
    new_text: &str,
    options: JsValue,
) -> std::result::Result<JsValue, JsValue> {
    let options = options_from_js::<DiffOptions>(options).map_err(to_js_error)?;
    let result = generate_text_diff_internal(old_text, new_text, &options).map_err(to_js_error)?;
    to_js_value(&result)
}

#[wasm_bindgen]
pub fn generate_unified_text_diff(
    old_text: &str,
    new_text: &str,
    old_name: &str,
    new_name: &str,
) -> String {
    diff::unified_patch(
        old_text,
        new_text,
        label_or(old_name, "a/original"),
        label_or(new_name, "b/modified"),
        DEFAULT_CONTEXT_LINES,
    )
}

fn label_or<'a>(label: &'a str, fallback: &'a str) -> &'a str {
    let trimmed = label.trim();
    if trimmed.is_empty() { fallback } else { trimmed }
}

fn generate_text_diff_internal(
    old_text: &str,
    new_text: &str,
    options: &DiffOptions,
) -> Result<DiffResult> {
    Ok(diff::diff_texts(old_text, new_text, options)?)
}

#[wasm_bindgen]
pub fn describe_cron_expression(expr: &str) -> std::result::Result<String, JsValue> {
    describe_cron_internal(expr).map_err(to_js_error)
}

#[wasm_bindgen]
pub fn cron_next_executions(expr: &str, count: u32) -> std::result::Result<JsValue, JsValue> {
    let runs = cron_next_executions_internal(expr, count as usize, Utc::now()).map_err(to_js_error)?;
    to_js_value(&runs)
}

#[wasm_bindgen]
pub fn cron_report(expr: &str, count: u32) -> std::result::Result<JsValue, JsValue> {
    let report = cron_report_internal(expr, count as usize, Utc::now()).map_err(to_js_error)?;
    to_js_value(&report)
}

fn describe_cron_internal(expr: &str) -> Result<String> {
    Ok(crate::cron::describe_cron(expr)?)
}

fn cron_next_executions_internal(
    expr: &str,
    count: usize,
    after: DateTime<Utc>,
) -> Result<Vec<String>> {
    Ok(crate::cron::next_executions(expr, count, after)?)
}

fn cron_report_internal(expr: &str, count: usize, after: DateTime<Utc>) -> Result<CronReport> {
    Ok(crate::cron::cron_report(expr, count, after)?)
}

#[wasm_bindgen]
pub fn format_source_text(
    language: &str,
    input: &str,
    options: JsValue,
) -> std::result::Result<String, JsValue> {
    let options = options_from_js::<FormatOptions>(options).map_err(to_js_error)?;
    format_source_internal(language, input, &options).map_err(to_js_error)
}

#[wasm_bindgen]
pub fn minify_source_text(language: &str, input: &str) -> std::result::Result<String, JsValue> {
    minify_source_internal(language, input).map_err(to_js_error)
}

fn format_source_internal(language: &str, input: &str, options: &FormatOptions) -> Result<String> {
    let language = FormatLanguage::parse(language)?;
    Ok(format::format_source(language, input, options))
}

fn minify_source_internal(language: &str, input: &str) -> Result<String> {
    let language = FormatLanguage::parse(language)?;
    Ok(format::minify_source(language, input))
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
