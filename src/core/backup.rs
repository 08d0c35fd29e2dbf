use crate::config::Config;
use crate::db::log::ttlog_quiet;
use crate::db::pool::DbPool;
use crate::errors::{AppError, AppResult};
use crate::ui::messages::{info, success, warning};
use std::fs;
use std::io::{BufRead, Write, stdin, stdout};
use std::path::{Path, PathBuf};
use zip::ZipWriter;
use zip::write::FileOptions;

pub struct BackupLogic;

impl BackupLogic {
    /// Copy the database to `dest_file`, optionally replacing the copy with a
    /// `.zip`. Asks before overwriting unless `force` is set.
    pub fn backup(cfg: &Config, dest_file: &str, compress: bool, force: bool) -> AppResult<()> {
        let src = Path::new(&cfg.database);
        let dest = Path::new(dest_file);

        if !src.exists() {
            return Err(AppError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("Database not found: {}", src.display()),
            )));
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        if dest.exists() && !force && !confirm_overwrite(dest)? {
            info("Backup cancelled.");
            return Ok(());
        }

        fs::copy(src, dest)?;
        success(format!("Backup created: {}", dest.display()));

        let final_path = if compress {
            let zip_path = dest.with_extension("zip");
            let entry = dest
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "pomodash.sqlite".to_string());

            zip_file(dest, &zip_path, &entry)?;
            info(format!("Compressed: {}", zip_path.display()));

            if zip_path != dest
                && let Err(e) = fs::remove_file(dest)
            {
                warning(format!("Failed to remove uncompressed backup: {}", e));
            }
            zip_path
        } else {
            dest.to_path_buf()
        };

        if let Ok(pool) = DbPool::new(&cfg.database) {
            ttlog_quiet(
                &pool.conn,
                "backup",
                &final_path.to_string_lossy(),
                if compress {
                    "Backup created and compressed"
                } else {
                    "Backup created"
                },
            );
        }

        Ok(())
    }
}

fn confirm_overwrite(dest: &Path) -> AppResult<bool> {
    warning(format!(
        "The file '{}' already exists. Overwrite it? [y/N]",
        dest.display()
    ));
    print!("> ");
    stdout().flush().ok();

    let mut answer = String::new();
    stdin().lock().read_line(&mut answer)?;

    let answer = answer.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Write `src` into a new zip archive at `zip_path` under `entry_name`.
pub fn zip_file(src: &Path, zip_path: &Path, entry_name: &str) -> AppResult<PathBuf> {
    let file = fs::File::create(zip_path)?;
    let mut zip = ZipWriter::new(file);

    let options: FileOptions<'_, ()> =
        FileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    let mut f = fs::File::open(src)?;
    zip.start_file(entry_name, options)
        .map_err(std::io::Error::other)?;

    std::io::copy(&mut f, &mut zip)?;
    zip.finish().map_err(std::io::Error::other)?;

    Ok(zip_path.to_path_buf())
}
