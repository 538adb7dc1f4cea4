//! Audio clips played by name, e.g. `!risa` for `mp3/risa.mp3`.

use std::path::{Path, PathBuf};
use tracing::debug;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "ogg", "opus", "m4a", "wav"];

#[derive(Debug, Clone)]
pub struct Soundboard {
    dir: PathBuf,
}

impl Soundboard {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The clip whose file stem equals `command`, ignoring case. When several
    /// files share a stem the earlier extension in the list wins.
    pub async fn find(&self, command: &str) -> Option<PathBuf> {
        if command.is_empty() || command.contains(['/', '\\', '.']) {
            return None;
        }
        let wanted = command.to_lowercase();

        let mut best: Option<(usize, PathBuf)> = None;
        for path in self.clips().await {
            let Some((stem, rank)) = clip_name(&path) else {
                continue;
            };
            if stem != wanted {
                continue;
            }
            let better = match &best {
                Some((best_rank, best_path)) => (rank, &path) < (*best_rank, best_path),
                None => true,
            };
            if better {
                best = Some((rank, path));
            }
        }

        let (_, path) = best?;
        debug!(path = %path.display(), "Sound found");
        Some(path)
    }

    /// Every clip name available, sorted.
    pub async fn commands(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .clips()
            .await
            .iter()
            .filter_map(|path| clip_name(path).map(|(stem, _)| stem))
            .collect();
        names.sort();
        names.dedup();
        names
    }

    async fn clips(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        let Ok(mut entries) = tokio::fs::read_dir(&self.dir).await else {
            return paths;
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let is_file = tokio::fs::metadata(&path)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false);
            if is_file {
                paths.push(path);
            }
        }
        paths
    }
}

/// Lowercased stem and extension rank of an audio file.
fn clip_name(path: &Path) -> Option<(String, usize)> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let rank = AUDIO_EXTENSIONS.iter().position(|known| *known == ext)?;
    let stem = path.file_stem()?.to_str()?.to_lowercase();
    Some((stem, rank))
}
