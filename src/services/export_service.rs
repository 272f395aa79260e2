use crate::dto::dashboard_dto::{ProjectHours, ProjectTotal, TimesheetEntry, TimesheetView};
use crate::error::{Error, Result};
use crate::utils::time::minutes_to_hours;
use csv::{Terminator, WriterBuilder};
use rust_xlsxwriter::*;

/// Lets spreadsheet apps detect UTF-8.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

const SUMMARY_HEADERS: [&str; 2] = ["Project", "Total Hours"];
const DETAIL_HEADERS: [&str; 7] = ["Date", "Project", "Start", "End", "Break (min)", "Hours", "Notes"];
const PROJECT_HOURS_HEADERS: [&str; 4] = ["Project", "Hours", "Billable Hours", "% Billable"];

pub const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub struct ExportService;

impl ExportService {
    fn detail_row(entry: &TimesheetEntry) -> [String; 7] {
        [
            entry.work_date.format("%d-%m-%Y").to_string(),
            entry.project_label().to_string(),
            entry.started_at.format("%H:%M").to_string(),
            entry
                .stopped_at
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_default(),
            entry.break_minutes.to_string(),
            format!("{:.2}", minutes_to_hours(entry.duration_minutes as i64)),
            entry.notes.clone(),
        ]
    }

    fn write_csv<const N: usize>(headers: [&str; N], rows: Vec<[String; N]>) -> Result<Vec<u8>> {
        let mut writer = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_writer(UTF8_BOM.to_vec());
        writer.write_record(headers)?;
        for row in rows {
            writer.write_record(&row)?;
        }
        writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }

    pub fn timesheet_summary_csv(totals: &[ProjectTotal]) -> Result<Vec<u8>> {
        let rows = totals
            .iter()
            .map(|t| [t.name.clone(), format!("{:.2}", t.hours)])
            .collect();
        Self::write_csv(SUMMARY_HEADERS, rows)
    }

    pub fn timesheet_details_csv(entries: &[TimesheetEntry]) -> Result<Vec<u8>> {
        let rows = entries.iter().map(Self::detail_row).collect();
        Self::write_csv(DETAIL_HEADERS, rows)
    }

    pub fn project_hours_csv(hours: &[ProjectHours]) -> Result<Vec<u8>> {
        let rows = hours
            .iter()
            .map(|h| {
                [
                    h.project.clone(),
                    format!("{:.2}", h.hours),
                    format!("{:.2}", h.billable_hours),
                    format!("{:.2}", h.percent_billable),
                ]
            })
            .collect();
        Self::write_csv(PROJECT_HOURS_HEADERS, rows)
    }

    /// Workbook with a "Summary" and a "Details" sheet for the timesheet window.
    pub fn timesheet_xlsx(view: &TimesheetView) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();

        let header_bg = Color::RGB(0x0F172A);
        let band_1 = Color::RGB(0xF8FAFC);
        let band_2 = Color::White;
        let border_color = Color::RGB(0xE2E8F0);

        let title_format = Format::new()
            .set_font_size(14)
            .set_bold()
            .set_align(FormatAlign::VerticalCenter);
        let header_format = Format::new()
            .set_bold()
            .set_font_size(10)
            .set_font_color(Color::White)
            .set_background_color(header_bg)
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter)
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);
        let cell_format = |idx: usize| {
            Format::new()
                .set_font_size(10)
                .set_background_color(if idx % 2 == 0 { band_1 } else { band_2 })
                .set_border(FormatBorder::Thin)
                .set_border_color(border_color)
        };
        let total_format = Format::new()
            .set_bold()
            .set_background_color(Color::RGB(0xE0E7FF))
            .set_border(FormatBorder::Thin)
            .set_border_color(border_color);

        let title = format!(
            "Timesheet {} to {}",
            view.start_date.format("%d-%m-%Y"),
            view.end_date.format("%d-%m-%Y")
        );

        // Summary
        let summary = workbook.add_worksheet();
        summary.set_name("Summary")?;
        summary.set_column_width(0, 32.0)?;
        summary.set_column_width(1, 14.0)?;
        summary.write_string_with_format(0, 0, &title, &title_format)?;
        for (col, name) in SUMMARY_HEADERS.iter().enumerate() {
            summary.write_string_with_format(2, col as u16, *name, &header_format)?;
        }
        for (idx, total) in view.by_project.iter().enumerate() {
            let row = 3 + idx as u32;
            let fmt = cell_format(idx);
            summary.write_string_with_format(row, 0, &total.name, &fmt)?;
            summary.write_number_with_format(row, 1, total.hours, &fmt.clone().set_num_format("0.00"))?;
        }
        let total_row = 3 + view.by_project.len() as u32;
        summary.write_string_with_format(total_row, 0, "Total", &total_format)?;
        summary.write_number_with_format(
            total_row,
            1,
            view.total_hours,
            &total_format.clone().set_num_format("0.00"),
        )?;

        // Details
        let details = workbook.add_worksheet();
        details.set_name("Details")?;
        let widths = [12.0, 28.0, 8.0, 8.0, 12.0, 8.0, 48.0];
        for (col, width) in widths.iter().enumerate() {
            details.set_column_width(col as u16, *width)?;
        }
        for (col, name) in DETAIL_HEADERS.iter().enumerate() {
            details.write_string_with_format(0, col as u16, *name, &header_format)?;
        }
        for (idx, entry) in view.entries.iter().enumerate() {
            let row = 1 + idx as u32;
            let fmt = cell_format(idx);
            let values = Self::detail_row(entry);
            for (col, value) in values.iter().enumerate() {
                match col {
                    4 => details.write_number_with_format(row, 4, entry.break_minutes as f64, &fmt)?,
                    5 => details.write_number_with_format(
                        row,
                        5,
                        minutes_to_hours(entry.duration_minutes as i64),
                        &fmt.clone().set_num_format("0.00"),
                    )?,
                    _ => details.write_string_with_format(row, col as u16, value, &fmt)?,
                };
            }
        }
        details.set_freeze_panes(1, 0)?;
        if !view.entries.is_empty() {
            details.autofilter(0, 0, view.entries.len() as u32, (DETAIL_HEADERS.len() - 1) as u16)?;
        }

        let buffer = workbook.save_to_buffer()?;
        Ok(buffer)
    }
}
