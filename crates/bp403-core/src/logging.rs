//! Timestamped logging: prints unless quiet, appends to a logfile,
//! dedupes the last line so hot retry loops don't spam the file.

use std::env;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use chrono::Local;

const LOG_FILE_ENV: &str = "BP403_LOG_FILE";

static LAST_LINE: Mutex<Option<String>> = Mutex::new(None);

fn is_quiet() -> bool {
    if env::var("BP403_QUIET")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false)
    {
        return true;
    }
    env::var("BP403_LOG")
        .map(|v| {
            let v = v.to_lowercase();
            v == "quiet" || v == "error"
        })
        .unwrap_or(false)
}

/// Write an informational line to stdout (unless quiet) and the logfile
/// (if `BP403_LOG_FILE` is set).
pub fn log(message: &str) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let line = format!("[{}] {}", timestamp, message);

    if !is_quiet() {
        println!("{}", line);
    }
    append_to_file(&line);
}

/// Write an error line to stderr and the logfile, regardless of quiet mode.
pub fn log_error(message: &str) {
    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
    let line = format!("[{}] ERROR: {}", timestamp, message);
    eprintln!("{}", line);
    append_to_file(&line);
}

fn append_to_file(line: &str) {
    let Ok(path) = env::var(LOG_FILE_ENV) else {
        return;
    };

    let mut last = LAST_LINE.lock().unwrap();
    if last.as_deref() == Some(line) {
        return;
    }
    if let Ok(mut file) = OpenOptions::new().create(true).append(true).open(&path) {
        let _ = writeln!(file, "{}", line);
    }
    *last = Some(line.to_string());
}
