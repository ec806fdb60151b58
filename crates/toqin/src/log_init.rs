use log::{LevelFilter, Metadata, Record};
use std::fs::OpenOptions;
use std::io::Write;

use crate::error::Result;

struct FileLogger {
    file_path: String,
    level: LevelFilter,
}

impl log::Log for FileLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            if let Ok(mut file) = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.file_path)
            {
                let _ = writeln!(
                    file,
                    "[{}] {}: {}",
                    record.level(),
                    record.target(),
                    record.args()
                );
            }
        }
    }

    fn flush(&self) {}
}

/// Appends every record up to `level` to the file at `path`.
///
/// Fails when a logger is already installed.
pub fn init_logger(path: &str, level: LevelFilter) -> Result<()> {
    let logger = FileLogger {
        file_path: path.to_string(),
        level,
    };
    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToqinError;

    #[test]
    fn test_init_logger_writes_records_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("toqin.log");
        let path = path.to_string_lossy();

        init_logger(&path, LevelFilter::Info).unwrap();
        log::info!("document graph ready");
        log::debug!("not recorded");

        let written = std::fs::read_to_string(path.as_ref()).unwrap();
        assert_eq!(written, "[INFO] toqin::log_init::tests: document graph ready\n");

        assert!(matches!(
            init_logger(&path, LevelFilter::Debug),
            Err(ToqinError::Logger(_))
        ));
    }
}
