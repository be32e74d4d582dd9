use super::*;
use crate::models::{Color, Edit};
use crate::provider::OpenContext;
use crate::services::config::EditorConfig;
use crate::services::file::LocalFileProvider;
use crate::webview::protocol::{GET_FILE_DATA, UPDATE};
use crate::webview::SurfaceEndpoint;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tempfile::tempdir;

const RED: &str = r#"{"type":"stroke","color":"red","stroke":[[1.0,1.0]]}"#;
const BLUE: &str = r#"{"type":"stroke","color":"blue","stroke":[[2.0,2.0]]}"#;

async fn session_for(dir: &Path, bytes: &[u8]) -> (Arc<HostSession>, SurfaceEndpoint) {
    let path = dir.join("cat.paw");
    std::fs::write(&path, bytes).unwrap();
    let config = EditorConfig::default().with_storage_root(dir.join("storage"));
    let provider =
        Arc::new(EditorProvider::from_config(&config, Arc::new(LocalFileProvider::new())).unwrap());
    let document = provider
        .open_custom_document(ResourceUri::from_path(&path), OpenContext::default())
        .await
        .unwrap();
    let (webview, endpoint) = Webview::channel("stdio");
    (HostSession::new(provider, document, webview), endpoint)
}

fn blue() -> Edit {
    Edit::new(Color::Blue, vec![[2.0, 2.0]])
}

fn red() -> Edit {
    Edit::new(Color::Red, vec![[1.0, 1.0]])
}

#[tokio::test]
async fn test_undo_applies_in_line_order() {
    let dir = tempdir().unwrap();
    let (session, mut endpoint) = session_for(dir.path(), b"").await;

    // three lines read back to back without yielding in between
    for line in [RED, r#"{"command":"undo"}"#, BLUE] {
        assert_eq!(session.handle_line(line).await, LineOutcome::Continue);
    }

    assert_eq!(session.document().edits(), vec![blue()]);
    let update = endpoint.try_recv().unwrap();
    assert!(update.is(UPDATE));
    assert_eq!(update.update_edits(), Some(Vec::new()));
    assert!(endpoint.try_recv().is_none());
    assert_eq!(session.undo_depth(), 1);
    assert_eq!(session.redo_depth(), 0);
}

#[tokio::test]
async fn test_redo_restores_undone_stroke() {
    let dir = tempdir().unwrap();
    let (session, mut endpoint) = session_for(dir.path(), b"").await;

    session.handle_line(RED).await;
    session.handle_line(r#"{"command":"undo"}"#).await;
    session.handle_line(r#"{"command":"redo"}"#).await;

    assert_eq!(session.document().edits(), vec![red()]);
    assert_eq!(endpoint.try_recv().unwrap().update_edits(), Some(Vec::new()));
    assert_eq!(endpoint.try_recv().unwrap().update_edits(), Some(vec![red()]));
    assert_eq!(session.undo_depth(), 1);
    assert_eq!(session.redo_depth(), 0);
}

#[tokio::test]
async fn test_undo_with_empty_stack_is_noop() {
    let dir = tempdir().unwrap();
    let (session, mut endpoint) = session_for(dir.path(), b"").await;

    session.handle_line(r#"{"command":"undo"}"#).await;
    assert!(endpoint.try_recv().is_none());
    assert!(session.document().edits().is_empty());
}

#[tokio::test]
async fn test_revert_runs_before_next_line() {
    let dir = tempdir().unwrap();
    let (session, mut endpoint) = session_for(dir.path(), &[1]).await;

    std::fs::write(dir.path().join("cat.paw"), [4u8, 5]).unwrap();
    session.handle_line(r#"{"command":"revert"}"#).await;

    assert_eq!(&*session.document().initial_content(), &[4, 5]);
    assert_eq!(endpoint.try_recv().unwrap().init_value(), Some(vec![4, 5]));
}

#[tokio::test]
async fn test_save_waits_for_later_response_line() {
    let dir = tempdir().unwrap();
    let (session, mut endpoint) = session_for(dir.path(), &[0]).await;

    session.handle_line(r#"{"command":"save"}"#).await;

    let request = endpoint.recv().await.unwrap();
    assert!(request.is(GET_FILE_DATA));
    let id = request.correlation_id.unwrap();
    let reply = json!({ "type": "response", "correlationId": id, "body": { "data": [7, 7] } });
    session.handle_line(&reply.to_string()).await;

    let path = dir.path().join("cat.paw");
    for _ in 0..100 {
        if std::fs::read(&path).unwrap() == vec![7, 7] {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(std::fs::read(&path).unwrap(), vec![7, 7]);
}

#[tokio::test]
async fn test_close_and_malformed_lines() {
    let dir = tempdir().unwrap();
    let (session, mut endpoint) = session_for(dir.path(), b"").await;

    assert_eq!(session.handle_line("not json").await, LineOutcome::Continue);
    assert_eq!(session.handle_line("   ").await, LineOutcome::Continue);
    assert!(endpoint.try_recv().is_none());
    assert_eq!(
        session.handle_line(r#"{"command":"close"}"#).await,
        LineOutcome::Close
    );
}

#[tokio::test]
async fn test_shutdown_disposes_document_and_surface() {
    let dir = tempdir().unwrap();
    let (session, endpoint) = session_for(dir.path(), b"").await;

    session.shutdown();
    assert!(session.document().is_disposed());
    assert!(endpoint.webview().is_disposed());
    session.handle_line(RED).await;
    assert!(session.document().edits().is_empty());
}
