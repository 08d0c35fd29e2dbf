use crate::errors::{AppError, AppResult};
use crate::export::excel_date::parse_to_excel_date;
use crate::export::model::{get_headers, session_to_row};
use crate::export::{SessionExport, notify_export_success};
use crate::ui::messages::info;
use rust_xlsxwriter::{Color, Format, FormatAlign, FormatBorder, FormatPattern, Workbook, Worksheet};
use std::path::Path;
use unicode_width::UnicodeWidthStr;

const HEADER_BG: u32 = 0x2F75B5;
const BAND: [u32; 2] = [0xEAF3FB, 0xFFFFFF];

/// Session log as a single "Sessions" sheet: one typed row per session,
/// banded, with a totals row at the bottom.
pub(crate) fn export_xlsx(sessions: &[SessionExport], path: &Path) -> AppResult<()> {
    info(format!("Exporting to XLSX: {}", path.display()));

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Sessions").map_err(to_export_error)?;

    let headers = get_headers();
    let header_format = Format::new()
        .set_bold()
        .set_font_color(Color::RGB(0xFFFFFF))
        .set_background_color(Color::RGB(HEADER_BG))
        .set_pattern(FormatPattern::Solid)
        .set_border(FormatBorder::Thin);

    for (col, header) in headers.iter().enumerate() {
        sheet
            .write_with_format(0, col as u16, *header, &header_format)
            .map_err(to_export_error)?;
    }
    sheet.set_freeze_panes(1, 0).map_err(to_export_error)?;

    let mut widths: Vec<usize> = headers.iter().map(|h| UnicodeWidthStr::width(*h)).collect();

    for (i, session) in sessions.iter().enumerate() {
        let row = (i + 1) as u32;
        write_session(sheet, row, session, Color::RGB(BAND[i % 2]))?;

        for (col, text) in session_to_row(session).iter().enumerate() {
            widths[col] = widths[col].max(UnicodeWidthStr::width(text.as_str()));
        }
    }

    write_totals(sheet, sessions.len() as u32 + 1, sessions)?;

    for (col, w) in widths.iter().enumerate() {
        sheet
            .set_column_width(col as u16, *w as f64 + 2.0)
            .map_err(to_export_error)?;
    }

    workbook.save(path_str(path)?).map_err(to_export_error)?;

    notify_export_success("XLSX", path);
    Ok(())
}

fn cell(bg: Color) -> Format {
    Format::new()
        .set_background_color(bg)
        .set_pattern(FormatPattern::Solid)
        .set_border(FormatBorder::Thin)
}

fn status_color(status: &str) -> Color {
    match status {
        "Completed" => Color::RGB(0x2E7D32),
        "Early Stop" => Color::RGB(0xC62828),
        _ => Color::RGB(0xB26A00),
    }
}

fn write_session(sheet: &mut Worksheet, row: u32, s: &SessionExport, bg: Color) -> AppResult<()> {
    let number = cell(bg).set_align(FormatAlign::Right);

    sheet
        .write_with_format(row, 0, s.id as f64, &number)
        .map_err(to_export_error)?;
    sheet
        .write_with_format(row, 1, s.user_id.as_str(), &cell(bg))
        .map_err(to_export_error)?;

    match parse_to_excel_date(&s.timestamp) {
        Some((num_format, serial)) => sheet
            .write_with_format(row, 2, serial, &cell(bg).set_num_format(num_format))
            .map_err(to_export_error)?,
        None => sheet
            .write_with_format(row, 2, s.timestamp.as_str(), &cell(bg))
            .map_err(to_export_error)?,
    };

    for (col, minutes) in [(3, s.work_minutes), (4, s.break_minutes), (5, s.total_minutes)] {
        sheet
            .write_with_format(row, col, minutes as f64, &number)
            .map_err(to_export_error)?;
    }

    sheet
        .write_with_format(
            row,
            6,
            s.status.as_str(),
            &cell(bg).set_font_color(status_color(&s.status)),
        )
        .map_err(to_export_error)?;

    match s.efficiency {
        Some(e) => sheet
            .write_with_format(row, 7, e, &number.clone().set_num_format("0.0"))
            .map_err(to_export_error)?,
        None => sheet.write_blank(row, 7, &cell(bg)).map_err(to_export_error)?,
    };

    Ok(())
}

fn write_totals(sheet: &mut Worksheet, row: u32, sessions: &[SessionExport]) -> AppResult<()> {
    let label = Format::new().set_bold().set_border_top(FormatBorder::Thin);
    let number = label.clone().set_align(FormatAlign::Right);

    let work: i64 = sessions.iter().map(|s| s.work_minutes).sum();
    let brk: i64 = sessions.iter().map(|s| s.break_minutes).sum();

    sheet
        .write_with_format(row, 0, "Total", &label)
        .map_err(to_export_error)?;
    for (col, minutes) in [(3, work), (4, brk), (5, work + brk)] {
        sheet
            .write_with_format(row, col, minutes as f64, &number)
            .map_err(to_export_error)?;
    }
    Ok(())
}

fn to_export_error<E: std::fmt::Display>(e: E) -> AppError {
    AppError::Export(e.to_string())
}

fn path_str(path: &Path) -> AppResult<&str> {
    path.to_str()
        .ok_or_else(|| AppError::Export(format!("invalid path: {}", path.display())))
}
