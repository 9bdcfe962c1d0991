//! HTML pages rendered with MiniJinja

use chrono::NaiveDate;
use lens_stock::chart::ChartSpec;
use lens_stock::format::{Metric, group_thousands};
use lens_stock::series::MIN_LOOKUP_DATE;
use lens_stock::{DashboardReport, Severity, StockError};
use minijinja::{Environment, context};
use serde::Serialize;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

const LAYOUT: &str = r#"<!DOCTYPE html>
<html lang="ko">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{% block title %}KRX stock dashboard{% endblock %}</title>
<script src="{{ plotly }}"></script>
<style>
body { font-family: sans-serif; margin: 0; display: flex; }
aside { width: 260px; padding: 1.5rem; background: #f5f6f8; min-height: 100vh; box-sizing: border-box; }
aside label { display: block; margin-top: 1rem; font-size: 0.9rem; }
aside input, aside button { width: 100%; margin-top: 0.25rem; padding: 0.4rem; box-sizing: border-box; }
main { flex: 1; padding: 1.5rem; overflow-x: auto; }
.metrics { display: flex; gap: 2rem; margin: 1rem 0; }
.metric .label { color: #666; font-size: 0.85rem; }
.metric .value { font-size: 1.5rem; }
.metric .delta { font-size: 0.9rem; }
.notice { padding: 0.75rem 1rem; border-radius: 4px; margin-bottom: 1rem; }
.notice.info { background: #e7f1fb; }
.notice.warning { background: #fff4d6; }
.notice.error { background: #fde4e4; }
.caption { color: #888; font-size: 0.85rem; }
table { border-collapse: collapse; font-size: 0.85rem; }
th, td { padding: 0.25rem 0.6rem; border-bottom: 1px solid #eee; text-align: right; }
th:first-child, td:first-child { text-align: left; }
</style>
</head>
<body>
{% block body %}{% endblock %}
</body>
</html>
"#;

const DASHBOARD: &str = r#"{% extends "layout.html" %}
{% block body %}
<aside>
  <h3>Search</h3>
  <form method="get" action="/">
    <label>Start date
      <input type="date" name="start" value="{{ form.start }}" min="{{ min_date }}" max="{{ today }}">
    </label>
    <label>End date
      <input type="date" name="end" value="{{ form.end }}" min="{{ min_date }}" max="{{ today }}">
    </label>
    <label>Company name or ticker
      <input type="text" name="query" value="{{ form.query }}" placeholder="삼성전자 or 005930">
    </label>
    <button type="submit">Look up</button>
  </form>
</aside>
<main>
  <h1>KRX stock dashboard</h1>
  {% if notice %}
  <div class="notice {{ notice.severity }}">
    {{ notice.message }}
    {% if notice.hint %}<br><small>{{ notice.hint }}</small>{% endif %}
  </div>
  {% endif %}
  {% if report %}
  <p class="caption">{{ report.caption }}</p>
  <h2>{{ report.title }}</h2>
  <div class="metrics">
    {% for metric in report.metrics %}
    <div class="metric">
      <div class="label">{{ metric.label }}</div>
      <div class="value">{{ metric.value }}</div>
      {% if metric.delta %}<div class="delta">{{ metric.delta }}</div>{% endif %}
    </div>
    {% endfor %}
  </div>
  <div id="chart"></div>
  <script>
    const spec = {{ report.chart_json|safe }};
    Plotly.newPlot("chart", spec.data, spec.layout, spec.config);
  </script>
  <h3>Data</h3>
  <p><a href="{{ report.download_href }}">Download xlsx</a></p>
  <table>
    <thead><tr>{% for column in columns %}<th>{{ column }}</th>{% endfor %}</tr></thead>
    <tbody>
    {% for row in report.rows %}
      <tr>{% for cell in row %}<td>{{ cell }}</td>{% endfor %}</tr>
    {% endfor %}
    </tbody>
  </table>
  {% elif not notice %}
  <p>Pick a date range, enter a company name or ticker, and press Look up.</p>
  {% endif %}
</main>
{% endblock %}
"#;

const CHART: &str = r#"{% extends "layout.html" %}
{% block title %}{{ title }}{% endblock %}
{% block body %}
<main>
  <h2>{{ title }}</h2>
  <p class="caption">{{ caption }}</p>
  <div id="chart"></div>
  <script>
    const spec = {{ chart_json|safe }};
    Plotly.newPlot("chart", spec.data, spec.layout, spec.config);
  </script>
</main>
{% endblock %}
"#;

/// Values echoed back into the search form
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormState {
    pub query: String,
    pub start: String,
    pub end: String,
}

/// A failed lookup as shown to the user
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub severity: Severity,
    pub message: String,
    pub hint: Option<&'static str>,
}

impl From<&StockError> for Notice {
    fn from(err: &StockError) -> Self {
        Self {
            severity: err.kind().severity(),
            message: err.to_string(),
            hint: err.hint(),
        }
    }
}

#[derive(Serialize)]
struct ReportView<'a> {
    title: &'a str,
    caption: String,
    metrics: &'a [Metric],
    chart_json: String,
    download_href: String,
    rows: Vec<[String; 9]>,
}

/// Compiled page templates
pub struct Pages {
    env: Environment<'static>,
}

impl Pages {
    pub fn new() -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("layout.html", LAYOUT)?;
        env.add_template("dashboard.html", DASHBOARD)?;
        env.add_template("chart.html", CHART)?;
        Ok(Self { env })
    }

    /// The search form, plus either a report or a notice
    pub fn dashboard(
        &self,
        form: &FormState,
        today: NaiveDate,
        report: Option<&DashboardReport>,
        notice: Option<&Notice>,
    ) -> Result<String, minijinja::Error> {
        let report = report.map(report_view).transpose()?;
        self.env.get_template("dashboard.html")?.render(context! {
            plotly => PLOTLY_CDN,
            form => form,
            min_date => MIN_LOOKUP_DATE.to_string(),
            today => today.to_string(),
            columns => lens_stock::export::COLUMNS,
            report => report,
            notice => notice,
        })
    }

    /// Standalone page holding only the chart
    pub fn chart(&self, report: &DashboardReport) -> Result<String, minijinja::Error> {
        self.env.get_template("chart.html")?.render(context! {
            plotly => PLOTLY_CDN,
            title => &report.panel.title,
            caption => caption(report),
            chart_json => chart_json(&report.chart)?,
        })
    }
}

pub fn caption(report: &DashboardReport) -> String {
    format!(
        "Fetched at {}",
        report.fetched_at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// `/api/export` link reproducing the lookup behind `report`
pub fn download_href(report: &DashboardReport) -> String {
    format!(
        "/api/export?query={}&start={}&end={}",
        urlencoding::encode(&report.company),
        report.range.start(),
        report.range.end()
    )
}

/// Figure JSON safe to inline inside a `<script>` element
fn chart_json(chart: &ChartSpec) -> Result<String, minijinja::Error> {
    serde_json::to_string(chart)
        .map(|json| json.replace("</", "<\\/"))
        .map_err(|e| {
            minijinja::Error::new(minijinja::ErrorKind::BadSerialization, e.to_string())
        })
}

fn report_view(report: &DashboardReport) -> Result<ReportView<'_>, minijinja::Error> {
    let amount = |v: f64| group_thousands(v.round() as i64);
    let average = |v: Option<f64>| v.map_or_else(String::new, |v| format!("{v:.2}"));

    Ok(ReportView {
        title: &report.panel.title,
        caption: caption(report),
        metrics: &report.panel.metrics,
        chart_json: chart_json(&report.chart)?,
        download_href: download_href(report),
        rows: report
            .table
            .rows()
            .iter()
            .map(|row| {
                [
                    row.date.to_string(),
                    amount(row.open),
                    amount(row.high),
                    amount(row.low),
                    amount(row.close),
                    group_thousands(row.volume as i64),
                    average(row.ma20),
                    average(row.ma60),
                    average(row.ma120),
                ]
            })
            .collect(),
    })
}
