//! Board database for runtime loading and lookup
//!
//! Boards are loaded from a directory of `.ron` / `.toml` files, one board
//! per file.

use std::fs;
use std::path::Path;

use super::BoardConfig;
use crate::error::{Error, Result};

/// Collection of known boards
#[derive(Debug, Default)]
pub struct BoardDatabase {
    boards: Vec<BoardConfig>,
}

impl BoardDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of boards loaded
    pub fn len(&self) -> usize {
        self.boards.len()
    }

    /// Whether no boards are loaded
    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    /// Add a board, replacing any board with the same name
    pub fn insert(&mut self, board: BoardConfig) {
        if let Some(existing) = self.boards.iter_mut().find(|b| b.name == board.name) {
            log::warn!("Board {} defined twice, keeping the last definition", board.name);
            *existing = board;
        } else {
            self.boards.push(board);
        }
    }

    /// Load a single board file
    pub fn load_file(&mut self, path: &Path) -> Result<()> {
        let board = BoardConfig::from_file(path)?;
        log::debug!("Loaded board {} from {}", board.name, path.display());
        self.insert(board);
        Ok(())
    }

    /// Load every board file in a directory
    ///
    /// Returns the number of boards loaded. Files with other extensions are
    /// skipped.
    pub fn load_dir(&mut self, dir: &Path) -> Result<usize> {
        let mut entries: Vec<_> = fs::read_dir(dir)?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.is_file()
                    && matches!(
                        p.extension().and_then(|e| e.to_str()),
                        Some("ron") | Some("toml")
                    )
            })
            .collect();
        entries.sort();

        let mut count = 0;
        for path in entries {
            self.load_file(&path).map_err(|e| match e {
                Error::Config(msg) => Error::Config(format!("{}: {}", path.display(), msg)),
                other => other,
            })?;
            count += 1;
        }
        Ok(count)
    }

    /// Look up a board by name
    pub fn get(&self, name: &str) -> Option<&BoardConfig> {
        self.boards.iter().find(|b| b.name == name)
    }

    /// Iterate over all boards
    pub fn iter(&self) -> impl Iterator<Item = &BoardConfig> {
        self.boards.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("nexus.ron"),
            r#"(name: "nexus", partitions: { "system_partition": "/system" })"#,
        )
        .unwrap();
        fs::write(dir.path().join("panda.toml"), "name = \"panda\"\n").unwrap();
        fs::write(dir.path().join("README"), "not a board").unwrap();

        let mut db = BoardDatabase::new();
        assert_eq!(db.load_dir(dir.path()).unwrap(), 2);
        assert_eq!(db.len(), 2);
        assert!(db.get("nexus").is_some());
        assert!(db.get("panda").is_some());
        assert!(db.get("beagle").is_none());
    }

    #[test]
    fn test_invalid_file_names_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("broken.ron"), "(name: ").unwrap();

        let mut db = BoardDatabase::new();
        match db.load_dir(dir.path()) {
            Err(Error::Config(msg)) => assert!(msg.contains("broken.ron")),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_insert_replaces() {
        let mut db = BoardDatabase::new();
        db.insert(BoardConfig::new("nexus"));
        let mut second = BoardConfig::new("nexus");
        second.shell_command = "adb -s 1234".into();
        db.insert(second);
        assert_eq!(db.len(), 1);
        assert_eq!(db.get("nexus").unwrap().shell_command, "adb -s 1234");
    }
}
