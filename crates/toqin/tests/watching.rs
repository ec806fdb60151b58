use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use toqin::{CompilerOptions, FileWatcher, Store, StoreEvent, SystemSource};

struct QuietWatcher;

impl FileWatcher for QuietWatcher {
    fn watch(&mut self, _path: &Path) -> toqin::Result<()> {
        Ok(())
    }

    fn unwatch(&mut self, _path: &Path) -> toqin::Result<()> {
        Ok(())
    }
}

fn tokens(color: &str) -> String {
    format!(r#"{{"name": "tokens", "tokens": [{{"name": "color", "value": "{color}"}}]}}"#)
}

// ==================== RELATIVE BASE DIR TESTS ====================

#[tokio::test]
async fn test_absolute_change_reindexes_relative_load() {
    let dir = tempfile::tempdir().unwrap();
    let root_dir = dir.path().canonicalize().unwrap();
    let file = root_dir.join("tokens.json");
    std::fs::write(&file, tokens("red")).unwrap();
    std::env::set_current_dir(&root_dir).unwrap();

    let mut store = Store::new(SystemSource::new(), CompilerOptions::default());
    let root = store.load("./tokens.json", Path::new(".")).await.unwrap();

    let url = file.to_string_lossy().into_owned();
    assert_eq!(store.graph().find(&url), Some(root));
    let watched: Vec<PathBuf> = store.watched().map(Path::to_path_buf).collect();
    assert_eq!(watched, vec![file.clone()]);

    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let _ = store.subscribe(move |event| sink.lock().unwrap().push(event.clone()));

    std::fs::write(&file, tokens("blue")).unwrap();
    let (sender, changes) = mpsc::unbounded_channel();
    sender.send(file.clone()).unwrap();
    drop(sender);
    store.watch_with(Box::new(QuietWatcher), changes).await;

    assert!(events.lock().unwrap().contains(&StoreEvent::Reindexed { url }));
    let merged = store.graph().merged_token_map(root);
    assert_eq!(merged["color"].value, "blue");
}
