use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use hyra_chat::{
    ChatStore, ChatSubmitter, DirectChatService, HttpRouterClient, Message, MessageRole,
    RequestLifecycleController, RequestObserver, RouterConfig,
};

/// Terminal-side display collaborator: applies transcript updates to the
/// store and prints assistant replies and routing progress as they arrive.
struct TerminalView {
    store: Mutex<ChatStore>,
}

impl TerminalView {
    fn new() -> Self {
        Self { store: Mutex::new(ChatStore::new()) }
    }

    fn active_messages(&self) -> Vec<Message> {
        self.store.lock().unwrap().active().messages.clone()
    }

    fn active_title(&self) -> String {
        self.store.lock().unwrap().active().title.clone()
    }

    fn new_chat(&self) {
        self.store.lock().unwrap().new_chat();
    }

    fn list(&self) -> Vec<String> {
        self.store
            .lock()
            .unwrap()
            .conversations()
            .iter()
            .map(|c| c.title.clone())
            .collect()
    }

    fn switch(&self, index: usize) -> bool {
        let mut store = self.store.lock().unwrap();
        let id = match store.conversations().get(index) {
            Some(conv) => conv.id.clone(),
            None => return false,
        };
        store.select(&id)
    }
}

impl RequestObserver for TerminalView {
    fn transcript_replaced(&self, messages: &[Message]) {
        {
            let mut store = self.store.lock().unwrap();
            let conv = store.active_mut();
            conv.messages = messages.to_vec();
            conv.refresh_title();
        }
        if let Some(last) = messages.last() {
            if last.role == MessageRole::Assistant {
                println!("\nassistant> {}\n", last.content);
            }
        }
    }

    fn logs_appended(&self, lines: &[String]) {
        for line in lines {
            println!("  [routing] {line}");
        }
    }

    fn busy_changed(&self, _busy: bool) {
        // The prompt loop waits for idle between turns; nothing to disable.
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present (development convenience)
    dotenvy::dotenv().ok();

    // Initialise tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hyra_chat=info".into()),
        )
        .init();

    // ── Configuration & wiring ────────────────────────────────────────────────
    let config = RouterConfig::from_env();
    let client = Arc::new(HttpRouterClient::new(&config));
    let view = Arc::new(TerminalView::new());

    let mode = std::env::var("HYRA_MODE").unwrap_or_else(|_| "routed".to_string());
    let submitter: Box<dyn ChatSubmitter> = match mode.as_str() {
        "direct" => Box::new(DirectChatService::new(
            client,
            Arc::clone(&view) as Arc<dyn RequestObserver>,
        )),
        _ => Box::new(RequestLifecycleController::new(
            client,
            Arc::clone(&view) as Arc<dyn RequestObserver>,
            config.poll_interval,
        )),
    };
    info!("Connected to {} in {mode} mode", config.base_url);

    println!("HyRA chat — /new, /list, /switch <n>, /quit");

    // ── Prompt loop ───────────────────────────────────────────────────────────
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    loop {
        stdout.write_all(b"you> ").await?;
        stdout.flush().await?;

        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };
        let input = line.trim();

        match input {
            "" => continue,
            "/quit" => break,
            "/new" => {
                view.new_chat();
                println!("Started a new chat");
                continue;
            }
            "/list" => {
                for (i, title) in view.list().iter().enumerate() {
                    println!("  {i}: {title}");
                }
                continue;
            }
            _ if input.starts_with("/switch") => {
                let picked = input
                    .trim_start_matches("/switch")
                    .trim()
                    .parse::<usize>()
                    .ok()
                    .map(|i| view.switch(i))
                    .unwrap_or(false);
                if picked {
                    println!("Switched to: {}", view.active_title());
                } else {
                    println!("No such chat");
                }
                continue;
            }
            _ => {}
        }

        let transcript = view.active_messages();
        if let Err(e) = submitter.submit(&transcript, input) {
            println!("{e}");
            continue;
        }
        submitter.wait_for_idle().await;
    }

    Ok(())
}
