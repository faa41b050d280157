use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::backup::{FilePicker, PickResult};

/// File given on the command line
pub struct PathPicker(pub PathBuf);

#[async_trait]
impl FilePicker for PathPicker {
    async fn pick_json(&self) -> PickResult {
        json_only(&self.0)
    }
}

/// Prompts for a path on stdin; an empty answer cancels
pub struct PromptPicker;

#[async_trait]
impl FilePicker for PromptPicker {
    async fn pick_json(&self) -> PickResult {
        let mut stdout = tokio::io::stdout();
        if stdout.write_all(b"Backup file (.json, empty to cancel): ").await.is_err()
            || stdout.flush().await.is_err()
        {
            return PickResult::Cancelled;
        }

        let mut line = String::new();
        match BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
            Ok(0) | Err(_) => PickResult::Cancelled,
            Ok(_) => match line.trim() {
                "" => PickResult::Cancelled,
                answer => json_only(Path::new(answer)),
            },
        }
    }
}

fn json_only(path: &Path) -> PickResult {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        PickResult::Chosen(path.to_path_buf())
    } else {
        tracing::debug!(path = %path.display(), "not a .json file");
        PickResult::Empty
    }
}
