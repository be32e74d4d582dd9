//! zdraw: stdio host for one document.
//!
//! stdin carries JSON lines for [`HostSession`]; stdout carries outbound
//! surface messages. Logs go to `<storage_root>/logs`.

mod logging;

use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

use zdraw::host::{HostSession, LineOutcome};
use zdraw::models::ResourceUri;
use zdraw::services::config::{get_app_data_dir, load_config, EditorConfig};
use zdraw::services::file::{FileProvider, LocalFileProvider};
use zdraw::webview::{SurfaceEndpoint, Webview};
use zdraw::{EditorError, EditorProvider, OpenContext};

struct Args {
    resource: String,
    backup_id: Option<String>,
    storage_root: Option<PathBuf>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let mut resource = None;
    let mut backup_id = None;
    let mut storage_root = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--backup" => backup_id = Some(args.next().ok_or("--backup needs a value")?),
            "--storage" => {
                storage_root = Some(PathBuf::from(args.next().ok_or("--storage needs a value")?))
            }
            _ if resource.is_none() => resource = Some(arg),
            _ => return Err(format!("unexpected argument: {}", arg)),
        }
    }

    Ok(Args {
        resource: resource.ok_or("usage: zdraw <path|uri> [--backup <id>] [--storage <dir>]")?,
        backup_id,
        storage_root,
    })
}

fn main() -> std::process::ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{}", msg);
            return std::process::ExitCode::from(2);
        }
    };

    let config = match args.storage_root.clone().or_else(get_app_data_dir) {
        Some(root) => load_config(&root),
        None => EditorConfig::default(),
    };
    let _logging = logging::init(&config);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to start runtime: {}", e);
            return std::process::ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(args, config)) {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "zdraw exited with error");
            eprintln!("zdraw: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(args: Args, config: EditorConfig) -> Result<(), EditorError> {
    let files: Arc<dyn FileProvider> = Arc::new(LocalFileProvider::new());
    let provider = Arc::new(EditorProvider::from_config(&config, files)?);

    let uri = ResourceUri::parse(&args.resource);
    let document = provider
        .open_custom_document(
            uri,
            OpenContext {
                backup_id: args.backup_id,
            },
        )
        .await?;

    let (webview, surface) = Webview::channel("stdio");
    let session = HostSession::new(provider, document, webview);
    let done = CancellationToken::new();
    let writer = tokio::spawn(write_outbound(surface, done.clone()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!(error = %e, "stdin read failed");
                break;
            }
        };
        if session.handle_line(&line).await == LineOutcome::Close {
            break;
        }
    }

    session.shutdown();
    done.cancel();
    let _ = writer.await;
    Ok(())
}

/// Writes outbound messages as JSON lines; drains what is queued once `done` fires.
async fn write_outbound(mut surface: SurfaceEndpoint, done: CancellationToken) {
    let mut out = tokio::io::stdout();
    loop {
        let msg = tokio::select! {
            biased;
            msg = surface.recv() => msg,
            _ = done.cancelled() => surface.try_recv(),
        };
        let Some(msg) = msg else {
            break;
        };
        let mut line = match serde_json::to_vec(&msg) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "encode outbound message failed");
                continue;
            }
        };
        line.push(b'\n');
        if out.write_all(&line).await.is_err() || out.flush().await.is_err() {
            break;
        }
    }
}
