//! Server-rendered HTML for the prediction form and result panel

use predictor_lib::{
    presenter::{PieChart, Severity, Verdict},
    schema::{FieldSpec, PATIENT_SCHEMA},
    PatientRecord, PredictionResult,
};
use std::fmt::Write;

/// Pie chart edge length in pixels
const CHART_SIZE: u32 = 180;

/// Everything one render of the page needs
pub struct PageModel<'a> {
    pub record: &'a PatientRecord,
    pub result: Option<&'a PredictionResult>,
    pub error: Option<&'a str>,
}

const STYLE: &str = r#"<style>
body { font-family: sans-serif; margin: 0; display: flex; color: #2C3E50; }
aside { width: 240px; background: #F4F6F7; padding: 16px; min-height: 100vh; }
main { flex: 1; padding: 16px 32px; }
.main-title { text-align: center; font-size: 38px; font-weight: bold; }
.sub-title { text-align: center; font-size: 16px; color: #34495E; margin-bottom: 15px; }
.columns { display: flex; gap: 32px; }
.column { flex: 1; }
.field { margin-bottom: 12px; }
.field input { width: 100%; }
.result { display: flex; gap: 24px; margin-top: 24px; }
.result .text { flex: 2; }
.result .chart { flex: 1; }
.warning { background: #FDEDEC; border-left: 4px solid #FF4C4C; padding: 12px; }
.success { background: #EAFAF1; border-left: 4px solid #32CD32; padding: 12px; }
.error { background: #FEF5E7; border-left: 4px solid #E67E22; padding: 12px; }
footer { margin-top: 32px; border-top: 1px solid #D5D8DC; padding-top: 8px; font-size: 12px; }
</style>"#;

/// Render the full page
pub fn render_page(page: &PageModel<'_>) -> String {
    let mut html = String::with_capacity(8 * 1024);
    html.push_str("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">");
    html.push_str("<title>Diabetes Prediction App</title>");
    html.push_str(STYLE);
    html.push_str("</head><body>");

    render_summary(&mut html, page.record);

    html.push_str("<main>");
    html.push_str(r#"<div class="main-title">Diabetes Prediction System</div>"#);
    html.push_str(
        r#"<div class="sub-title">Predict the likelihood of diabetes using patient health details</div>"#,
    );

    render_form(&mut html, page.record);

    if let Some(message) = page.error {
        let _ = write!(html, r#"<div class="error" role="alert">{}</div>"#, escape_html(message));
    }
    if let Some(result) = page.result {
        render_result(&mut html, page.record, result);
    }

    html.push_str("<footer>Diabetes Predictor</footer>");
    html.push_str("</main></body></html>");
    html
}

fn render_summary(html: &mut String, record: &PatientRecord) {
    html.push_str("<aside><h2>Patient Summary</h2><dl>");
    for (spec, value) in record.summary() {
        let _ = write!(html, "<dt><strong>{}</strong></dt><dd>{}</dd>", spec.name, value);
    }
    html.push_str("</dl></aside>");
}

fn render_form(html: &mut String, record: &PatientRecord) {
    html.push_str("<h2>Enter Patient Details</h2>");
    html.push_str(r#"<form method="post" action="/predict"><div class="columns">"#);
    for column in PATIENT_SCHEMA.chunks(4) {
        html.push_str(r#"<div class="column">"#);
        for spec in column {
            let value = record.get(spec.name).unwrap_or(spec.default);
            render_slider(html, spec, value);
        }
        html.push_str("</div>");
    }
    html.push_str("</div>");
    html.push_str(r#"<button type="submit">Predict Diabetes Status</button></form>"#);
}

fn render_slider(html: &mut String, spec: &FieldSpec, value: f64) {
    let _ = write!(
        html,
        r#"<div class="field"><label for="{name}">{label}: <output id="{name}-value">{shown}</output></label><input type="range" id="{name}" name="{name}" min="{min}" max="{max}" step="{step}" value="{value}" oninput="document.getElementById('{name}-value').value=this.value"></div>"#,
        name = spec.name,
        label = escape_html(spec.label),
        shown = spec.display(value),
        min = spec.min,
        max = spec.max,
        step = spec.step,
        value = value,
    );
}

fn render_result(html: &mut String, record: &PatientRecord, result: &PredictionResult) {
    let verdict = Verdict::from_result(result);
    let class = match verdict.severity() {
        Severity::Warning => "warning",
        Severity::Success => "success",
    };
    let advice = verdict.advice();

    html.push_str("<h2>Prediction Result</h2>");
    html.push_str(r#"<div class="result"><div class="text">"#);
    let _ = write!(
        html,
        r#"<div class="{class}" role="status">{}</div>"#,
        verdict.headline()
    );
    let _ = write!(
        html,
        "<p><strong>Prediction Confidence:</strong> {:.2}%</p>",
        verdict.confidence_percent()
    );
    let _ = write!(html, "<h3>{}</h3><ul>", advice.title);
    for tip in advice.tips.iter() {
        let _ = write!(html, "<li>{}</li>", escape_html(tip));
    }
    html.push_str("</ul>");
    let _ = write!(
        html,
        r#"<p><a href="/report.csv?{}" download="{}">Download Patient Report</a></p>"#,
        report_query(record),
        predictor_lib::report::REPORT_FILE_NAME
    );
    html.push_str(r#"</div><div class="chart">"#);
    html.push_str(&PieChart::from_probabilities(result.probabilities).to_svg(CHART_SIZE));
    html.push_str("</div></div>");
}

/// Query string reproducing the record for the report download link
pub fn report_query(record: &PatientRecord) -> String {
    PATIENT_SCHEMA
        .iter()
        .zip(record.values())
        .map(|(spec, value)| format!("{}={}", spec.name, value))
        .collect::<Vec<_>>()
        .join("&amp;")
}

/// Minimal escaping for text and attribute content
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_form_has_eight_sliders_with_bounds() {
        let record = PatientRecord::default();
        let html = render_page(&PageModel {
            record: &record,
            result: None,
            error: None,
        });

        assert_eq!(html.matches(r#"type="range""#).count(), 8);
        assert!(html.contains(r#"name="Insulin" min="0" max="900" step="1" value="85""#));
        assert!(html.contains(r#"name="BMI" min="0" max="70" step="0.01" value="26""#));
        assert!(html.contains(r#"name="Age" min="1" max="120" step="1" value="33""#));
        assert!(!html.contains("Prediction Result"));
    }

    #[test]
    fn test_result_panel_for_diabetes() {
        let record = PatientRecord::default();
        let result = PredictionResult::from_probabilities([0.2, 0.8]).unwrap();
        let html = render_page(&PageModel {
            record: &record,
            result: Some(&result),
            error: None,
        });

        assert!(html.contains(r#"class="warning""#));
        assert!(html.contains("The patient is likely to have diabetes."));
        assert!(html.contains("80.00%"));
        assert!(html.contains("Health Tips for Managing Diabetes"));
        assert_eq!(html.matches("<li>").count(), 5);
        assert!(html.contains("<svg"));
        assert!(html.contains("/report.csv?Pregnancies=2&amp;Glucose=120"));
    }

    #[test]
    fn test_error_message_is_escaped() {
        let record = PatientRecord::default();
        let html = render_page(&PageModel {
            record: &record,
            result: None,
            error: Some("unknown field '<script>'"),
        });
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script>"));
    }
}
