use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use crate::errors::BotResult;
use crate::storage::traits::CursorStore;

/// Round-robin position kept as a plain text file holding one feed name
#[derive(Debug, Clone)]
pub struct TextCursorStore {
    path: PathBuf,
}

impl TextCursorStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

impl CursorStore for TextCursorStore {
    fn read(&self) -> BotResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => {
                let name = raw.trim();
                Ok((!name.is_empty()).then(|| name.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, feed_name: &str) -> BotResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, feed_name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_reads_none() {
        let dir = TempDir::new().unwrap();
        let store = TextCursorStore::new(dir.path().join("counter.txt"));
        assert_eq!(store.read().unwrap(), None);
    }

    #[test]
    fn test_write_then_read() {
        let dir = TempDir::new().unwrap();
        let store = TextCursorStore::new(dir.path().join("metadata/counter.txt"));

        store.write("Jane Doe").unwrap();
        assert_eq!(store.read().unwrap().as_deref(), Some("Jane Doe"));
    }

    #[test]
    fn test_blank_file_reads_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("counter.txt");
        fs::write(&path, "\n").unwrap();

        assert_eq!(TextCursorStore::new(path).read().unwrap(), None);
    }
}
