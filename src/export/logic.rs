use crate::core::identity::UserId;
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::db::sessions::{SessionFilter, load_sessions};
use crate::errors::{AppError, AppResult};
use crate::export::ExportFormat;
use crate::export::fs_utils::ensure_writable;
use crate::export::json_csv::{export_csv, export_json};
use crate::export::model::SessionExport;
use crate::export::range::{parse_range, utc_bounds};
use crate::export::xlsx::export_xlsx;
use crate::ui::messages::warning;
use std::path::Path;

pub struct ExportLogic;

impl ExportLogic {
    /// Export a user's session log.
    ///
    /// - `file`: absolute path of the output file
    /// - `range`: `None`, `"all"` or a range understood by
    ///   [`parse_range`](crate::export::range::parse_range)
    ///
    /// Returns the number of exported rows.
    pub fn export(
        pool: &DbPool,
        user: &UserId,
        format: ExportFormat,
        file: &str,
        range: Option<&str>,
        force: bool,
    ) -> AppResult<usize> {
        let path = Path::new(file);

        if !path.is_absolute() {
            return Err(AppError::Export(format!(
                "output file path must be absolute: {file}"
            )));
        }

        let filter = match range {
            None => SessionFilter::default(),
            Some(r) if r.eq_ignore_ascii_case("all") => SessionFilter::default(),
            Some(r) => {
                let (first, last) = parse_range(r)?;
                let (since, until) = utc_bounds(first, last);
                SessionFilter {
                    since: Some(since),
                    until: Some(until),
                    limit: None,
                }
            }
        };

        let rows: Vec<SessionExport> = load_sessions(&pool.conn, user, &filter)?
            .iter()
            .map(SessionExport::from)
            .collect();

        if rows.is_empty() {
            warning("No sessions found for the selected range.");
            return Ok(0);
        }

        ensure_writable(path, force)?;

        match format {
            ExportFormat::Csv => export_csv(&rows, path)?,
            ExportFormat::Json => export_json(&rows, path)?,
            ExportFormat::Xlsx => export_xlsx(&rows, path)?,
        }

        ttlog_quiet(
            &pool.conn,
            "export",
            &path.to_string_lossy(),
            &format!("{} sessions exported as {}", rows.len(), format.as_str()),
        );

        Ok(rows.len())
    }
}
