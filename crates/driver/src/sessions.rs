use anyhow::Context;
use apc_library::controls::{COLS, ROWS};
use std::fs;
use std::path::{Path, PathBuf};

/// Where saved sessions live. The files are opaque to us; only their
/// numbered names matter.
pub(crate) trait SessionStore {
    fn list(&self) -> anyhow::Result<Vec<String>>;

    /// Path handed to the engine for the session on `pad`.
    fn path_for(&self, pad: u8) -> String;
}

pub(crate) struct SessionDir {
    dir: PathBuf,
    extension: String,
}

impl SessionDir {
    pub fn new(dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            dir: dir.into(),
            extension: extension.to_string(),
        }
    }
}

impl SessionStore for SessionDir {
    fn list(&self) -> anyhow::Result<Vec<String>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Can't read session directory {}", self.dir.display()))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if !path.is_file() || path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                names.push(name.to_string());
            }
        }
        Ok(names)
    }

    fn path_for(&self, pad: u8) -> String {
        self.dir
            .join(format!("{pad:02}.{}", self.extension))
            .to_string_lossy()
            .into_owned()
    }
}

/// Pad a session file is shown on, from its `NN.ext` name.
pub(crate) fn session_pad(name: &str) -> Option<u8> {
    let stem = Path::new(name).file_stem()?.to_str()?;
    if stem.len() != 2 || !stem.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let pad: u8 = stem.parse().ok()?;
    ((pad as usize) < ROWS * COLS).then_some(pad)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Fixed listing for handler tests.
    #[derive(Default)]
    pub(crate) struct FakeSessions(pub Vec<String>);

    impl SessionStore for FakeSessions {
        fn list(&self) -> anyhow::Result<Vec<String>> {
            Ok(self.0.clone())
        }

        fn path_for(&self, pad: u8) -> String {
            format!("/sessions/{pad:02}.slsess")
        }
    }

    #[test]
    fn parses_pad_from_file_name() {
        assert_eq!(session_pad("07.slsess"), Some(7));
        assert_eq!(session_pad("39.slsess"), Some(39));
        assert_eq!(session_pad("40.slsess"), None);
        assert_eq!(session_pad("live.slsess"), None);
        assert_eq!(session_pad("00.slsess"), Some(0));
        assert_eq!(session_pad("5.slsess"), None);
        assert_eq!(session_pad("+5.slsess"), None);
        assert_eq!(session_pad("007.slsess"), None);
    }

    #[test]
    fn lists_only_session_files() {
        let dir = std::env::temp_dir().join(format!("apc-sl-sessions-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("03.slsess"), b"").unwrap();
        fs::write(dir.join("notes.txt"), b"").unwrap();

        let store = SessionDir::new(&dir, "slsess");
        assert_eq!(store.list().unwrap(), vec!["03.slsess".to_string()]);
        assert_eq!(store.path_for(5), dir.join("05.slsess").to_string_lossy());

        fs::remove_dir_all(&dir).unwrap();
    }
}
