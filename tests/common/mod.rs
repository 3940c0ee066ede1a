#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use encoding_rs::EUC_KR;
use tempfile::{TempDir, tempdir};

pub const BANNER: &str = "2024년 교육 이수 현황,,,,,,,,,,,,,,";
pub const HEADER: &str = "연번,소속,직급,이름,구분1(외부/내부),구분2(법정의무/직무역량),과정구분3,과정명,교육기관,\"교육\n일시\",\"교육\n시간\",수료여부,비고1,비고2,";

/// One export data line; the trailing comma produces the blank artifact column.
pub fn export_row(seq: &str, name: &str, course: &str, session: &str, hours: &str) -> String {
    format!("{seq},인사팀,대리,{name},내부,법정의무,필수,{course},사내,{session},{hours},Y,,,")
}

/// Banner, header and data lines joined as the export tool writes them.
pub fn export_text(rows: &[String]) -> String {
    let mut text = format!("{BANNER}\r\n{HEADER}\r\n");
    for row in rows {
        text.push_str(row);
        text.push_str("\r\n");
    }
    text
}

pub fn encode_cp949(text: &str) -> Vec<u8> {
    let (bytes, _, had_errors) = EUC_KR.encode(text);
    assert!(!had_errors, "fixture text must be representable in cp949");
    bytes.into_owned()
}

pub fn decode_cp949(bytes: &[u8]) -> String {
    let (text, _, had_errors) = EUC_KR.decode(bytes);
    assert!(!had_errors, "output must be valid cp949");
    text.into_owned()
}

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write_bytes(&self, name: &str, contents: &[u8]) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents).expect("write temp file contents");
        path
    }

    /// Writes an export encoded as cp949 and returns its path.
    pub fn write_export(&self, name: &str, rows: &[String]) -> PathBuf {
        self.write_bytes(name, &encode_cp949(&export_text(rows)))
    }
}
