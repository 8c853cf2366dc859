use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;

// Read a JSON document from a file, or from stdin when the path is "-".
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("read stdin")?;
        buf
    } else {
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?
    };
    serde_json::from_str(&raw).with_context(|| format!("parse JSON from {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reads_json_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"[1, 2, 3]"#).unwrap();
        let v: Vec<u32> = read_json(f.path()).unwrap();
        assert_eq!(v, vec![1, 2, 3]);
    }

    #[test]
    fn reports_bad_json_with_path() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "not json").unwrap();
        let err = read_json::<Vec<u32>>(f.path()).unwrap_err();
        assert!(format!("{err}").contains("parse JSON"));
    }
}
