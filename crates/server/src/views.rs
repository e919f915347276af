//! HTML rendering for the form pages
//!
//! Views are pure functions of the page, the form contents and the form
//! state; the router decides which one to call.

use gestation_lib::{Feature, FormState, InputForm, Outcome, Page};

const STYLE: &str = "\
body{margin:0;font-family:sans-serif;display:flex;min-height:100vh}\
nav{width:220px;background:#f0f2f6;padding:1.5rem}\
nav a{display:block;margin:.5rem 0}\
nav a.active{font-weight:bold}\
main{flex:1;padding:2rem 3rem}\
.columns{display:flex;gap:2rem}\
.column{flex:1}\
label{display:block;margin-top:1rem}\
input{width:100%;padding:.4rem}\
.hint{color:#666;font-size:.8rem}\
.success{background:#e6f4ea;padding:1rem;margin-top:1.5rem}\
.error{background:#fdecea;padding:1rem;margin-top:1.5rem}";

/// Escape text for use in element content and quoted attributes
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap page content in the shared layout with the navigation sidebar
fn layout(page: Page, content: &str) -> String {
    let nav: String = Page::ALL
        .iter()
        .map(|&target| {
            let class = if target == page { " class=\"active\"" } else { "" };
            format!(
                "<a href=\"{}\"{}>{}</a>",
                target.path(),
                class,
                target.nav_label()
            )
        })
        .collect();

    format!(
        "<!DOCTYPE html>\n<html lang=\"en\"><head><meta charset=\"utf-8\">\
<title>Fetal Age Predictor</title><style>{style}</style></head>\
<body><nav><h2>Navigation</h2>{nav}<hr><p>Built with Rust</p></nav>\
<main><h1>{title}</h1>{content}</main></body></html>",
        style = STYLE,
        nav = nav,
        title = page.title(),
        content = content,
    )
}

fn field_html(form: &InputForm, feature: Feature) -> String {
    let (min, max) = feature.hint_range();
    format!(
        "<label for=\"{key}\">{label}</label>\
<input type=\"text\" inputmode=\"decimal\" id=\"{key}\" name=\"{key}\" value=\"{value}\">\
<span class=\"hint\">Typical range {min}–{max}</span>",
        key = feature.key(),
        label = feature.label(),
        value = escape_html(form.value(feature)),
        min = min,
        max = max,
    )
}

fn outcome_html(outcome: &Outcome) -> String {
    let class = if outcome.is_success() { "success" } else { "error" };
    format!(
        "<div class=\"{}\" role=\"status\">{}</div>",
        class,
        escape_html(outcome.message())
    )
}

/// Predict page: the eight inputs, both actions and the output region
pub fn predict_page(form: &InputForm, state: &FormState) -> String {
    let features = Feature::ALL;
    let (left, right) = features.split_at(features.len() / 2);
    let column = |features: &[Feature]| -> String {
        features.iter().map(|f| field_html(form, *f)).collect()
    };

    let output = state.outcome().map(outcome_html).unwrap_or_default();

    let content = format!(
        "<p>Enter the 8 clinical and ultrasound measurements below to predict \
fetal gestational age in <strong>days</strong>.</p>\
<h2>Enter Input Features</h2>\
<form method=\"post\" action=\"{action}\">\
<div class=\"columns\"><div class=\"column\">{left}</div><div class=\"column\">{right}</div></div>\
<p><button type=\"submit\" name=\"action\" value=\"sample\">Use sample data</button> \
<button type=\"submit\" name=\"action\" value=\"predict\">Predict</button></p>\
</form>{output}",
        action = Page::Predict.path(),
        left = column(left),
        right = column(right),
        output = output,
    );
    layout(Page::Predict, &content)
}

/// About page describing the features and the model
pub fn about_page() -> String {
    let items: String = Feature::ALL
        .iter()
        .map(|f| format!("<li><strong>{}</strong>: {}</li>", f.code(), f.label()))
        .collect();

    let content = format!(
        "<p>This app predicts <strong>fetal gestational age (in days)</strong> based on \
8 ultrasound and maternal clinical features:</p><ul>{}</ul>\
<p>The model used is a trained <code>RandomForestRegressor</code>, exported to ONNX.</p>",
        items
    );
    layout(Page::About, &content)
}
