use chrono::Local;
use clap::Parser;
use log::{error, info, warn};
use prattle_client::{Client, ClientConfig};
use prattle_client::store::FileStore;
use tokio::sync::mpsc;

#[derive(Parser, Debug)]
#[command(name = "prattle", about = "Terminal client for the prattle chat service")]
struct Args {
    /// Endpoint serving both the request/response and push lanes.
    #[arg(long, default_value = "http://localhost:8080/graphql")]
    endpoint: String,

    /// Nickname to sign in with when no persisted session exists.
    #[arg(long, short)]
    nickname: Option<String>,

    /// Directory holding the persisted identity.
    #[arg(long, default_value = "prattle-data")]
    data_dir: String,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{:<5}] [{}] - {}",
                Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to build tokio runtime");

    rt.block_on(run(args))
}

async fn run(args: Args) -> anyhow::Result<()> {
    let store = FileStore::new(&args.data_dir).await?;
    let client = Client::builder()
        .with_config(ClientConfig {
            endpoint: args.endpoint.clone(),
            ..Default::default()
        })
        .with_identity_store(store)
        .build();

    let user = match client.restore_session().await? {
        Some(user) => user,
        None => {
            let nickname = args
                .nickname
                .clone()
                .ok_or_else(|| anyhow::anyhow!("no saved session; pass --nickname to sign in"))?;
            client.login(&nickname).await?
        }
    };
    info!(target: "Client", "Connected to {} as '{}'", args.endpoint, user.nickname);

    let backlog = client.fetch_messages().await?;
    // Arrival order is the cache's storage order; for display we sort by
    // creation time, like any UI would.
    let mut backlog = backlog;
    backlog.sort_by_key(|m| m.created_at);
    for message in &backlog {
        print_message(&message.created_at, &message.user.nickname, &message.content);
    }

    let push = client.start_push_sync().await?;

    let bus = client.events();
    let mut message_added = bus.message_added.subscribe();
    let mut session_notice = bus.session_notice.subscribe();
    let mut signed_out = bus.signed_out.subscribe();
    let mut push_state = bus.push_state.subscribe();

    let mut lines = stdin_lines();
    println!("Type a message and press enter to send; /quit to exit.");

    loop {
        tokio::select! {
            line = lines.recv() => {
                let Some(line) = line else { break };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "/quit" {
                    break;
                }
                if let Err(e) = client.send_message(line).await {
                    error!(target: "Client", "Send failed: {e}");
                }
            }
            Ok(message) = message_added.recv() => {
                if message.user.id != user.id {
                    print_message(&message.created_at, &message.user.nickname, &message.content);
                }
            }
            Ok(notice) = session_notice.recv() => {
                warn!(target: "Client", "{}", notice.message);
            }
            Ok(state) = push_state.recv() => {
                warn!(target: "Client", "Push lane state changed: {state:?}");
            }
            Ok(event) = signed_out.recv() => {
                info!(target: "Client", "Signed out ({:?}), exiting.", event.reason);
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    push.shutdown().await;
    Ok(())
}

fn print_message(created_at: &chrono::DateTime<chrono::Utc>, nickname: &str, content: &str) {
    println!(
        "[{}] {}: {}",
        created_at.with_timezone(&Local).format("%H:%M"),
        nickname,
        content
    );
}

/// Reads stdin on a blocking thread and forwards lines into the async loop.
fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        use std::io::BufRead;
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        return;
                    }
                }
                Err(_) => return,
            }
        }
    });
    rx
}
