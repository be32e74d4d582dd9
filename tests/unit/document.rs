use super::*;
use crate::models::Color;
use crate::services::file::LocalFileProvider;
use std::sync::atomic::AtomicUsize;
use tempfile::tempdir;

/// Serves fixed bytes; optionally cancels a token while the request is in
/// flight, the way a host would cancel mid-save.
struct FixedData {
    data: Vec<u8>,
    calls: Arc<AtomicUsize>,
    cancel_during_fetch: Option<CancellationToken>,
}

impl DocumentDelegate for FixedData {
    fn get_file_data(&self) -> BoxFuture<'_, Result<Vec<u8>>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(token) = &self.cancel_during_fetch {
                token.cancel();
            }
            Ok(self.data.clone())
        })
    }
}

struct NoView;

impl DocumentDelegate for NoView {
    fn get_file_data(&self) -> BoxFuture<'_, Result<Vec<u8>>> {
        Box::pin(async { Err(EditorError::NoViewAvailable("test".to_string())) })
    }
}

fn files() -> Arc<dyn FileProvider> {
    Arc::new(LocalFileProvider::new())
}

fn fixed(data: &[u8]) -> (Box<dyn DocumentDelegate>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let delegate = FixedData {
        data: data.to_vec(),
        calls: Arc::clone(&calls),
        cancel_during_fetch: None,
    };
    (Box::new(delegate), calls)
}

fn red_stroke() -> Edit {
    Edit::new(Color::Red, vec![[0.0, 0.0], [1.0, 1.0]])
}

fn blue_stroke() -> Edit {
    Edit::new(Color::Blue, vec![[5.0, 5.0], [6.0, 7.0]])
}

async fn open(path: &Path, delegate: Box<dyn DocumentDelegate>) -> Arc<Document> {
    Document::create(ResourceUri::from_path(path), None, delegate, files())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_create_reads_resource() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cat.paw");
    std::fs::write(&path, [1u8, 2, 3]).unwrap();

    let (delegate, _) = fixed(&[]);
    let doc = open(&path, delegate).await;
    assert_eq!(&*doc.initial_content(), &[1, 2, 3]);
    assert!(doc.edits().is_empty());
    assert!(!doc.is_disposed());
}

#[tokio::test]
async fn test_create_prefers_readable_backup() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cat.paw");
    let backup = dir.path().join("backup");
    std::fs::write(&path, [1u8]).unwrap();
    std::fs::write(&backup, [9u8, 9]).unwrap();

    let (delegate, _) = fixed(&[]);
    let doc = Document::create(
        ResourceUri::from_path(&path),
        Some(backup),
        delegate,
        files(),
    )
    .await
    .unwrap();
    assert_eq!(&*doc.initial_content(), &[9, 9]);
}

#[tokio::test]
async fn test_create_falls_back_when_backup_missing() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cat.paw");
    std::fs::write(&path, [1u8]).unwrap();

    let (delegate, _) = fixed(&[]);
    let doc = Document::create(
        ResourceUri::from_path(&path),
        Some(dir.path().join("missing-backup")),
        delegate,
        files(),
    )
    .await
    .unwrap();
    assert_eq!(&*doc.initial_content(), &[1]);
}

#[tokio::test]
async fn test_create_fails_when_nothing_readable() {
    let dir = tempdir().unwrap();
    let (delegate, _) = fixed(&[]);
    let result = Document::create(
        ResourceUri::from_path(&dir.path().join("missing.paw")),
        Some(dir.path().join("missing-backup")),
        delegate,
        files(),
    )
    .await;
    assert!(matches!(result, Err(ref e) if e.is_io()));
}

#[tokio::test]
async fn test_untitled_starts_empty() {
    let (delegate, _) = fixed(&[]);
    let doc = Document::create(ResourceUri::untitled("Untitled-1"), None, delegate, files())
        .await
        .unwrap();
    assert!(doc.initial_content().is_empty());
}

#[tokio::test]
async fn test_stroke_undo_redo_scenario() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cat.paw");
    std::fs::write(&path, b"").unwrap();
    let (delegate, _) = fixed(&[]);
    let doc = open(&path, delegate).await;

    let changes: Arc<Mutex<Vec<DocumentEditEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let contents: Arc<Mutex<Vec<Vec<Edit>>>> = Arc::new(Mutex::new(Vec::new()));
    let c = Arc::clone(&changes);
    let _on_change = doc.on_did_change(move |e| c.lock().unwrap().push(e.clone()));
    let c = Arc::clone(&contents);
    let _on_content =
        doc.on_did_change_content(move |e| c.lock().unwrap().push(e.edits.clone()));

    doc.make_edit(red_stroke());
    let event = changes.lock().unwrap()[0].clone();
    assert_eq!(event.label(), "Stroke");
    assert_eq!(doc.edits(), vec![red_stroke()]);
    assert!(contents.lock().unwrap().is_empty());

    event.undo();
    assert!(doc.edits().is_empty());
    event.redo();
    assert_eq!(doc.edits(), vec![red_stroke()]);

    assert_eq!(
        *contents.lock().unwrap(),
        vec![Vec::new(), vec![red_stroke()]]
    );
}

#[tokio::test]
async fn test_history_behaves_like_a_stack() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cat.paw");
    std::fs::write(&path, b"").unwrap();
    let (delegate, _) = fixed(&[]);
    let doc = open(&path, delegate).await;

    let changes: Arc<Mutex<Vec<DocumentEditEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let c = Arc::clone(&changes);
    let _sub = doc.on_did_change(move |e| c.lock().unwrap().push(e.clone()));

    doc.make_edit(red_stroke());
    doc.make_edit(blue_stroke());
    let b = changes.lock().unwrap()[1].clone();

    b.undo();
    assert_eq!(doc.edits(), vec![red_stroke()]);
    b.redo();
    assert_eq!(doc.edits(), vec![red_stroke(), blue_stroke()]);
}

#[tokio::test]
async fn test_undo_on_empty_history_is_ignored() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cat.paw");
    std::fs::write(&path, b"").unwrap();
    let (delegate, _) = fixed(&[]);
    let doc = open(&path, delegate).await;

    let changes: Arc<Mutex<Vec<DocumentEditEvent>>> = Arc::new(Mutex::new(Vec::new()));
    let fired = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&changes);
    let _a = doc.on_did_change(move |e| c.lock().unwrap().push(e.clone()));
    let f = Arc::clone(&fired);
    let _b = doc.on_did_change_content(move |_| {
        f.fetch_add(1, Ordering::SeqCst);
    });

    doc.make_edit(red_stroke());
    let event = changes.lock().unwrap()[0].clone();
    event.undo();
    event.undo();

    assert!(doc.edits().is_empty());
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_save_writes_delegate_bytes() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cat.paw");
    std::fs::write(&path, [0u8]).unwrap();
    let (delegate, calls) = fixed(&[7, 7, 7]);
    let doc = open(&path, delegate).await;

    doc.save(&CancellationToken::new()).await.unwrap();
    assert_eq!(std::fs::read(&path).unwrap(), vec![7, 7, 7]);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_save_as_skips_write_when_already_cancelled() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cat.paw");
    let target = dir.path().join("copy.paw");
    std::fs::write(&path, [0u8]).unwrap();
    let (delegate, calls) = fixed(&[1]);
    let doc = open(&path, delegate).await;

    let cancel = CancellationToken::new();
    cancel.cancel();
    doc.save_as(&ResourceUri::from_path(&target), &cancel)
        .await
        .unwrap();

    assert!(!target.exists());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_save_as_skips_write_when_cancelled_mid_request() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cat.paw");
    let target = dir.path().join("copy.paw");
    std::fs::write(&path, [0u8]).unwrap();

    let cancel = CancellationToken::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let delegate = FixedData {
        data: vec![1, 2],
        calls: Arc::clone(&calls),
        cancel_during_fetch: Some(cancel.clone()),
    };
    let doc = open(&path, Box::new(delegate)).await;

    doc.save_as(&ResourceUri::from_path(&target), &cancel)
        .await
        .unwrap();
    assert!(!target.exists());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_save_without_view_fails() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cat.paw");
    std::fs::write(&path, [0u8]).unwrap();
    let doc = open(&path, Box::new(NoView)).await;

    let err = doc.save(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, EditorError::NoViewAvailable(_)));
    assert_eq!(std::fs::read(&path).unwrap(), vec![0]);
}

#[tokio::test]
async fn test_save_untitled_needs_a_target() {
    let (delegate, _) = fixed(&[1]);
    let doc = Document::create(ResourceUri::untitled("Untitled-1"), None, delegate, files())
        .await
        .unwrap();
    let err = doc.save(&CancellationToken::new()).await.unwrap_err();
    assert!(err.is_io());
}

#[tokio::test]
async fn test_revert_reloads_and_keeps_history() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cat.paw");
    std::fs::write(&path, [1u8]).unwrap();
    let (delegate, _) = fixed(&[]);
    let doc = open(&path, delegate).await;

    let reverted: Arc<Mutex<Vec<Vec<u8>>>> = Arc::new(Mutex::new(Vec::new()));
    let r = Arc::clone(&reverted);
    let _sub = doc.on_did_revert(move |e| r.lock().unwrap().push(e.content.to_vec()));

    doc.make_edit(red_stroke());
    std::fs::write(&path, [4u8, 5]).unwrap();
    doc.revert(&CancellationToken::new()).await.unwrap();

    assert_eq!(&*doc.initial_content(), &[4, 5]);
    assert_eq!(*reverted.lock().unwrap(), vec![vec![4, 5]]);
    assert_eq!(doc.edits(), vec![red_stroke()]);
}

#[tokio::test]
async fn test_revert_surfaces_read_errors() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cat.paw");
    std::fs::write(&path, [1u8]).unwrap();
    let (delegate, _) = fixed(&[]);
    let doc = open(&path, delegate).await;

    std::fs::remove_file(&path).unwrap();
    let err = doc.revert(&CancellationToken::new()).await.unwrap_err();
    assert!(err.is_io());
    assert_eq!(&*doc.initial_content(), &[1]);
}

#[tokio::test]
async fn test_backup_then_dispose_removes_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cat.paw");
    let destination = dir.path().join("backups").join("cat.bak");
    std::fs::write(&path, [1u8]).unwrap();
    let (delegate, _) = fixed(&[3, 1, 4]);
    let doc = open(&path, delegate).await;

    let backup = doc
        .backup(&destination, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(backup.location(), destination.as_path());
    assert_eq!(backup.sequence(), 1);
    assert_eq!(std::fs::read(&destination).unwrap(), vec![3, 1, 4]);

    backup.dispose();
    assert!(!destination.exists());
    backup.dispose();

    let second = doc
        .backup(&destination, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(second.sequence(), 2);
    assert_eq!(doc.backup_sequence(), 2);
}

#[tokio::test]
async fn test_dispose_is_terminal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("cat.paw");
    std::fs::write(&path, [1u8]).unwrap();
    let (delegate, _) = fixed(&[1]);
    let doc = open(&path, delegate).await;

    let disposed = Arc::new(AtomicUsize::new(0));
    let changed = Arc::new(AtomicUsize::new(0));
    let d = Arc::clone(&disposed);
    let _a = doc.on_did_dispose(move |_| {
        d.fetch_add(1, Ordering::SeqCst);
    });
    let c = Arc::clone(&changed);
    let _b = doc.on_did_change(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });

    doc.dispose();
    doc.dispose();
    assert!(doc.is_disposed());
    assert_eq!(disposed.load(Ordering::SeqCst), 1);

    doc.make_edit(red_stroke());
    assert_eq!(changed.load(Ordering::SeqCst), 0);
    assert!(doc.edits().is_empty());

    let err = doc.save(&CancellationToken::new()).await.unwrap_err();
    assert!(matches!(err, EditorError::Disposed(_)));

    let late = doc.on_did_change(|_| {});
    assert!(!late.is_active());
}
