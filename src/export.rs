//! Monthly PDF report built from statistics the calendar already loaded.
//!
//! [`MonthReport`] holds everything that ends up on paper and is plain data,
//! so layout decisions are testable without decoding a PDF. [`render_pdf`]
//! turns it into A4 pages with a repeated table header and a footer carrying
//! the generation timestamp on every page.

use std::fs;
use std::ops::Range;
use std::path::Path;

use chrono::NaiveDateTime;
use log::info;
use printpdf::{BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfLayerReference, Rgb};

use crate::error::ExportError;
use crate::models::{DayCount, MonthKey};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const LEFT: f32 = 14.0;
const DATE_COLUMN: f32 = 39.0;
const COUNT_COLUMN: f32 = 79.0;
const ROW_HEIGHT: f32 = 7.0;
const TITLE_Y: f32 = 277.0;
const SUMMARY_Y: f32 = 269.0;
const FIRST_TABLE_TOP: f32 = 257.0;
const TABLE_TOP: f32 = 277.0;
const TABLE_BOTTOM: f32 = 22.0;
const FOOTER_Y: f32 = 10.0;

/// Body rows fitting below the header on the first page and on later pages.
const FIRST_PAGE_ROWS: usize = ((FIRST_TABLE_TOP - ROW_HEIGHT - TABLE_BOTTOM) / ROW_HEIGHT) as usize;
const PAGE_ROWS: usize = ((TABLE_TOP - ROW_HEIGHT - TABLE_BOTTOM) / ROW_HEIGHT) as usize;

/// One table row of the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub weekday: String,
    pub date: String,
    pub count: u32,
    /// Rows with at least one absence are printed in bold red.
    pub highlighted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthReport {
    pub month: MonthKey,
    pub title: String,
    pub days_with_absences: usize,
    pub total_absence_days: u32,
    pub rows: Vec<ReportRow>,
}

impl MonthReport {
    pub fn from_statistics(month: MonthKey, stats: &[DayCount]) -> Self {
        let rows = stats
            .iter()
            .map(|day| ReportRow {
                weekday: day.date.format("%a").to_string(),
                date: day.date.format("%d.%m.%Y").to_string(),
                count: day.count,
                highlighted: day.count > 0,
            })
            .collect();

        Self {
            month,
            title: format!("Absences {month}"),
            days_with_absences: stats.iter().filter(|day| day.count > 0).count(),
            total_absence_days: stats.iter().map(|day| day.count).sum(),
            rows,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Days with absences: {} | Total: {} absence-days",
            self.days_with_absences, self.total_absence_days
        )
    }

    /// Row ranges per page.
    pub fn pages(&self) -> Vec<Range<usize>> {
        paginate(self.rows.len(), FIRST_PAGE_ROWS, PAGE_ROWS)
    }
}

/// `absences_2024-03.pdf`.
pub fn default_file_name(month: MonthKey) -> String {
    format!("absences_{}.pdf", month.iso_label())
}

/// Render the report into PDF bytes.
pub fn render_pdf(report: &MonthReport, generated_at: NaiveDateTime) -> Result<Vec<u8>, ExportError> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        report.title.as_str(),
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );
    let regular = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|err| ExportError::Pdf(err.to_string()))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|err| ExportError::Pdf(err.to_string()))?;
    let footer = format!("Generated on {}", generated_at.format("%d.%m.%Y %H:%M"));

    for (index, range) in report.pages().into_iter().enumerate() {
        let layer = if index == 0 {
            doc.get_page(first_page).get_layer(first_layer)
        } else {
            let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            doc.get_page(page).get_layer(layer)
        };

        let mut y = if index == 0 {
            set_color(&layer, (0, 0, 0));
            layer.use_text(report.title.as_str(), 18.0, Mm(LEFT), Mm(TITLE_Y), &bold);
            set_color(&layer, (100, 100, 100));
            layer.use_text(report.summary(), 10.0, Mm(LEFT), Mm(SUMMARY_Y), &regular);
            FIRST_TABLE_TOP
        } else {
            TABLE_TOP
        };

        set_color(&layer, (59, 130, 246));
        draw_row(&layer, &bold, y, "Day", "Date", "Absent");
        y -= ROW_HEIGHT;

        for row in &report.rows[range] {
            if row.highlighted {
                set_color(&layer, (185, 28, 28));
                draw_row(&layer, &bold, y, &row.weekday, &row.date, &row.count.to_string());
            } else {
                set_color(&layer, (0, 0, 0));
                draw_row(&layer, &regular, y, &row.weekday, &row.date, &row.count.to_string());
            }
            y -= ROW_HEIGHT;
        }

        set_color(&layer, (150, 150, 150));
        layer.use_text(footer.as_str(), 8.0, Mm(LEFT), Mm(FOOTER_Y), &regular);
    }

    doc.save_to_bytes()
        .map_err(|err| ExportError::Pdf(err.to_string()))
}

/// Render and save in one go.
pub fn export_month(
    path: &Path,
    report: &MonthReport,
    generated_at: NaiveDateTime,
) -> Result<(), ExportError> {
    let bytes = render_pdf(report, generated_at)?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| ExportError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    fs::write(path, bytes).map_err(|source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        "event=export module=export status=ok month={} path={}",
        report.month.iso_label(),
        path.display()
    );
    Ok(())
}

fn draw_row(layer: &PdfLayerReference, font: &IndirectFontRef, y: f32, day: &str, date: &str, count: &str) {
    layer.use_text(day, 9.0, Mm(LEFT), Mm(y), font);
    layer.use_text(date, 9.0, Mm(DATE_COLUMN), Mm(y), font);
    layer.use_text(count, 9.0, Mm(COUNT_COLUMN), Mm(y), font);
}

fn set_color(layer: &PdfLayerReference, (r, g, b): (u8, u8, u8)) {
    layer.set_fill_color(Color::Rgb(Rgb::new(
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0,
        None,
    )));
}

/// Split `rows` into page ranges. Always yields at least one page so an empty
/// month still prints its header.
fn paginate(rows: usize, first_capacity: usize, capacity: usize) -> Vec<Range<usize>> {
    let first_end = rows.min(first_capacity.max(1));
    let mut pages = vec![0..first_end];
    let mut start = first_end;
    while start < rows {
        let end = rows.min(start + capacity.max(1));
        pages.push(start..end);
        start = end;
    }
    pages
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn stats_for(month: MonthKey, counts: &[(u32, u32)]) -> Vec<DayCount> {
        month
            .days()
            .into_iter()
            .map(|date| {
                let count = counts
                    .iter()
                    .find(|(day, _)| NaiveDate::from_ymd_opt(month.year, month.month, *day) == Some(date))
                    .map(|(_, count)| *count)
                    .unwrap_or(0);
                DayCount { date, count }
            })
            .collect()
    }

    #[test]
    fn report_summarizes_the_month() {
        let month = MonthKey::new(2024, 3).unwrap();
        let report = MonthReport::from_statistics(month, &stats_for(month, &[(4, 2), (5, 1)]));

        assert_eq!(report.title, "Absences March 2024");
        assert_eq!(report.days_with_absences, 2);
        assert_eq!(report.total_absence_days, 3);
        assert_eq!(report.summary(), "Days with absences: 2 | Total: 3 absence-days");
        assert_eq!(report.rows.len(), 31);

        let monday = &report.rows[3];
        assert_eq!(monday.weekday, "Mon");
        assert_eq!(monday.date, "04.03.2024");
        assert!(monday.highlighted);
        assert!(!report.rows[0].highlighted);
    }

    #[test]
    fn a_full_month_fits_on_one_page() {
        let month = MonthKey::new(2024, 1).unwrap();
        let report = MonthReport::from_statistics(month, &stats_for(month, &[]));
        assert_eq!(report.pages(), vec![0..31]);
    }

    #[test]
    fn paginate_spills_over_and_keeps_empty_header_page() {
        assert_eq!(paginate(0, 5, 10), vec![0..0]);
        assert_eq!(paginate(12, 5, 4), vec![0..5, 5..9, 9..12]);
    }

    #[test]
    fn file_name_uses_year_and_month() {
        assert_eq!(default_file_name(MonthKey::new(2024, 3).unwrap()), "absences_2024-03.pdf");
    }

    #[test]
    fn rendered_pdf_has_pdf_header() {
        let month = MonthKey::new(2024, 2).unwrap();
        let report = MonthReport::from_statistics(month, &stats_for(month, &[(29, 1)]));
        let generated_at = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap();

        let bytes = render_pdf(&report, generated_at).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
