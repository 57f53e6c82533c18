#![allow(dead_code)]

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn fixture(rel: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(rel)
}

pub fn configs() -> PathBuf {
    fixture("configs")
}

/// A unique path in the temp directory whose file name is `name`, under a fresh directory.
pub fn tmp_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "burnin-data-processing-{}-{nanos}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir.join(name)
}

/// Write `text` as UTF-16LE with a byte-order mark.
pub fn write_utf16le(path: &PathBuf, text: &str) {
    let mut bytes = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        bytes.extend_from_slice(&unit.to_le_bytes());
    }
    std::fs::write(path, bytes).unwrap();
}

pub const BENCH_LOG: &str =
    "# Bench Station 3\r\nElapsed\tCurrent\tChannel\r\n0.0\t1.5\tA\r\n0.5\t1.6\tA\r\n1.0\t1.7\tB\r\n";
