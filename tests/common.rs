#![allow(dead_code)]
use assert_cmd::{Command, cargo_bin_cmd};
use chrono::{DateTime, TimeZone, Utc};
use pomodash::core::identity::UserId;
use pomodash::db::pool::DbPool;
use pomodash::db::sessions::{SessionFilter, load_sessions};
use pomodash::models::SessionRecord;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Binary under test, isolated from the real home directory and from any
/// `POMODASH_USER` set in the environment.
pub fn pomo() -> Command {
    let mut cmd = cargo_bin_cmd!("pomodash");
    cmd.env("HOME", test_home()).env_remove("POMODASH_USER");
    cmd
}

pub fn test_home() -> PathBuf {
    let mut path: PathBuf = env::temp_dir();
    path.push("pomodash_test_home");
    fs::create_dir_all(&path).ok();
    path
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_pomodash.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    fs::remove_file(&db_path).ok();
    db_path
}

/// Create a temporary output file path inside tempdir and ensure it's removed
pub fn temp_out(name: &str, ext: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_out.{}", name, ext));
    let p = path.to_string_lossy().to_string();
    fs::remove_file(&p).ok();
    p
}

pub fn init_db(db_path: &str) {
    pomo()
        .args(["--db", db_path, "--test", "init"])
        .assert()
        .success();
}

pub fn user(name: &str) -> UserId {
    UserId::new(name).expect("non-blank user")
}

/// Fixed instant used as "now" by clock-driven tests.
pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 10, 9, 0, 0).unwrap()
}

pub fn all_sessions(pool: &DbPool, user: &UserId) -> Vec<SessionRecord> {
    load_sessions(&pool.conn, user, &SessionFilter::default()).expect("load sessions")
}
