//! One-shot terminal lookup

use crate::templates::Pages;
use chrono::{Local, NaiveDate};
use clap::Args;
use lens_stock::export;
use lens_stock::format::render_table;
use lens_stock::series::DEFAULT_START_DATE;
use lens_stock::{Dashboard, DashboardReport, LookupRequest, Severity, StockError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Args, Debug)]
pub struct LookupArgs {
    /// Company name (exact) or 6-digit ticker
    #[arg(short, long)]
    pub query: String,

    /// First day of the range, YYYY-MM-DD
    #[arg(long, default_value_t = DEFAULT_START_DATE)]
    pub start: NaiveDate,

    /// Last day of the range, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    pub end: Option<NaiveDate>,

    /// Directory for the xlsx export and chart page
    #[arg(short, long, default_value = ".")]
    pub out: PathBuf,

    /// Table rows to print, newest first
    #[arg(long, default_value_t = 20)]
    pub rows: usize,

    /// Skip writing files
    #[arg(long)]
    pub no_files: bool,
}

impl LookupArgs {
    pub fn request(&self, today: NaiveDate) -> LookupRequest {
        LookupRequest::new(&self.query, self.start, self.end.unwrap_or(today))
    }
}

pub async fn run(args: LookupArgs, dashboard: Dashboard) -> anyhow::Result<ExitCode> {
    let request = args.request(Local::now().date_naive());

    let report = match dashboard.run(&request).await {
        Ok(report) => report,
        Err(err) => {
            eprintln!("{}", describe(&err));
            return Ok(exit_code(err.kind().severity()));
        }
    };

    println!("{}", crate::templates::caption(&report));
    println!();
    println!("{}", report.panel.render());
    println!("{}", render_table(&report.table, args.rows));
    if report.table.len() > args.rows {
        println!("... {} more rows", report.table.len() - args.rows);
    }

    if !args.no_files {
        let written = write_files(&report, &args.out).await?;
        for path in written {
            println!("Wrote {}", path.display());
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn write_files(report: &DashboardReport, out: &Path) -> anyhow::Result<Vec<PathBuf>> {
    tokio::fs::create_dir_all(out).await?;

    let xlsx = out.join(export::file_name(&report.company));
    tokio::fs::write(&xlsx, report.table.to_xlsx()?).await?;

    let chart = out.join(format!("{}_chart.html", report.ticker));
    tokio::fs::write(&chart, Pages::new()?.chart(report)?).await?;

    Ok(vec![xlsx, chart])
}

/// Severity-tagged message with its hint on a second line
pub fn describe(err: &StockError) -> String {
    let tag = match err.kind().severity() {
        Severity::Info => "info",
        Severity::Warning => "warning",
        Severity::Error => "error",
    };
    match err.hint() {
        Some(hint) => format!("[{tag}] {err}\n  {hint}"),
        None => format!("[{tag}] {err}"),
    }
}

/// Informational outcomes still exit cleanly
pub fn exit_code(severity: Severity) -> ExitCode {
    match severity {
        Severity::Info => ExitCode::SUCCESS,
        Severity::Warning => ExitCode::from(2),
        Severity::Error => ExitCode::FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let err = StockError::NotFound {
            input: "없는회사".into(),
        };
        assert_eq!(
            describe(&err),
            "[warning] '없는회사' was not found\n  Try entering the 6-digit ticker code directly."
        );

        let err = StockError::InsufficientData { rows: 1 };
        assert!(describe(&err).starts_with("[info] "));
    }

    #[test]
    fn test_request_defaults_end_to_today() {
        let args = LookupArgs {
            query: "005930".into(),
            start: DEFAULT_START_DATE,
            end: None,
            out: PathBuf::from("."),
            rows: 20,
            no_files: false,
        };
        let today = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
        let request = args.request(today);
        assert_eq!(request.end, Some(today));
        assert_eq!(request.start, Some(DEFAULT_START_DATE));
    }
}
