//! Line-oriented terminal front end for the Parley client.
//!
//! Typing a line submits it as the draft text. `/attach <path>` stages an
//! image into the draft; the next submitted line carries every staged
//! attachment with it, mirroring the original form's text-plus-files submit.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{fmt, EnvFilter};

use parley_client::session::{FileInput, Session};
use parley_client::transport::HttpTransport;
use parley_shared::types::Role;

#[derive(Debug, Parser)]
#[command(name = "parley", about = "Chat with an inference gateway from the terminal")]
struct Cli {
    /// Base URL of the Parley gateway.
    #[arg(long, env = "PARLEY_SERVER", default_value = "http://127.0.0.1:5000")]
    server: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("parley_client=info,warn"));
    fmt().with_env_filter(filter).with_target(false).init();

    let cli = Cli::parse();
    let transport = HttpTransport::new(&cli.server);
    let mut session = Session::new();

    println!("parley — connected to {}", transport.endpoint());
    println!("type a message and press enter; /attach <path> to add an image; /quit to exit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim_end().to_string();

        if line == "/quit" {
            break;
        }

        if let Some(path) = line.strip_prefix("/attach ") {
            attach(&mut session, path.trim()).await;
            continue;
        }

        if line.is_empty() && session.draft().is_empty() {
            continue;
        }

        session.update_text(line);
        let before = session.transcript().len();
        if !session.submit(&transport).await {
            println!("(a submission is already in flight)");
            continue;
        }
        for message in &session.transcript()[before..] {
            print_message(message);
        }
    }

    Ok(())
}

async fn attach(session: &mut Session, path: &str) {
    let path = PathBuf::from(path);
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("image")
        .to_string();

    match tokio::fs::read(&path).await {
        Ok(bytes) => {
            let size = bytes.len();
            session.select_attachments([FileInput { file_name, bytes }]);
            println!(
                "attached {} ({size} bytes, {} staged)",
                path.display(),
                session.draft().attachments.len()
            );
        }
        Err(e) => println!("could not read {}: {e}", path.display()),
    }
}

fn print_message(message: &parley_shared::types::Message) {
    let who = match message.role {
        Role::User => "you",
        Role::Assistant => "assistant",
    };
    if message.attachment_previews.is_empty() {
        println!("[{who}] {}", message.content);
    } else {
        println!(
            "[{who}] {} ({} image(s) attached)",
            message.content,
            message.attachment_previews.len()
        );
    }
}
