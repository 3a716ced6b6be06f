//! Ask command - run one routed turn and stream the answer to the terminal.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use kreo_router::{TurnEvent, TurnFinish, TurnRequest, STOPPED_MARKER};
use kreo_server::KreoConfig;
use kreo_types::{Attachment, MessageStatus, ModelSettings};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::open_state;

const IMAGE_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

pub(crate) struct AskArgs {
    pub text: String,
    pub chat: Option<String>,
    pub model: Option<String>,
    pub file: Option<PathBuf>,
    pub user: Option<String>,
}

pub(crate) async fn run(config: KreoConfig, args: AskArgs) -> miette::Result<()> {
    let mut settings = ModelSettings::default()
        .with_model(args.model.unwrap_or_else(|| config.default_model.clone()));
    if let Some(user) = args.user {
        settings.user_name = user;
    }
    let attachment = args.file.as_deref().map(read_attachment).transpose()?;

    let state = open_state(config)?;
    let request = TurnRequest {
        chat_id: args.chat,
        text: args.text,
        attachment,
        settings,
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let cancel = CancellationToken::new();
    let printer = tokio::spawn(print_events(rx));
    let stop = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let result = state.orchestrator.run_turn(request, &tx, cancel).await;
    drop(tx);
    printer.await.ok();
    stop.abort();

    let outcome = result.map_err(|e| miette::miette!("{}", e))?;
    // Let the title and correction tasks finish before the process exits.
    for task in outcome.background {
        task.await.ok();
    }

    eprintln!();
    eprintln!("chat: {} ({})", outcome.chat_id, outcome.route.label());
    if outcome.finish == TurnFinish::Failed {
        return Err(miette::miette!("The model did not answer"));
    }
    Ok(())
}

async fn print_events(mut rx: mpsc::UnboundedReceiver<TurnEvent>) {
    let mut streamed = false;
    let mut stdout = std::io::stdout();
    while let Some(event) = rx.recv().await {
        match event {
            TurnEvent::Status { status } => match status {
                MessageStatus::Routing => eprintln!("[routing]"),
                MessageStatus::Searching => eprintln!("[searching the web]"),
                MessageStatus::Thinking | MessageStatus::None => {}
            },
            TurnEvent::Token { text } => {
                streamed = true;
                print!("{}", text);
                stdout.flush().ok();
            }
            TurnEvent::Done { message } => {
                if !streamed {
                    print!("{}", message.content);
                } else if message.content.ends_with(STOPPED_MARKER) {
                    print!("{}", STOPPED_MARKER);
                }
                println!();
            }
            TurnEvent::Error { message } => eprintln!("error: {}", message),
            TurnEvent::Chat { .. } => {}
        }
    }
}

/// Images are sent base64 encoded; anything else is inlined as text.
fn read_attachment(path: &Path) -> miette::Result<Attachment> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "attachment".to_string());
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        let bytes = std::fs::read(path)
            .map_err(|e| miette::miette!("Failed to read {}: {}", path.display(), e))?;
        return Ok(Attachment::Image {
            data: STANDARD.encode(bytes),
        });
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| miette::miette!("Failed to read {} as text: {}", path.display(), e))?;
    Ok(Attachment::Text { name, content })
}
