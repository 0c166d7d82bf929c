use std::path::Path;

use anyhow::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::chat::attachment::ImageAttachment;
use crate::chat::models::Role;
use crate::client::{ChatClient, Transcript};
use crate::core::AppConfig;

const HELP: &str = "Commands: /new, /list, /open <id>, /delete <id>, /image <path>, /quit";

fn print_transcript(transcript: &Transcript) {
    for entry in transcript.entries() {
        let who = match entry.role {
            Role::User => "you",
            Role::Assistant => "assistant",
        };
        if entry.image_count > 0 {
            println!("[{}] ({} image(s)) {}", who, entry.image_count, entry.text);
        } else {
            println!("[{}] {}", who, entry.text);
        }
    }
}

async fn handle_command(
    client: &ChatClient,
    transcript: &mut Transcript,
    images: &mut Vec<ImageAttachment>,
    line: &str,
) -> Result<()> {
    let (cmd, arg) = line.split_once(' ').unwrap_or((line, ""));
    let arg = arg.trim();

    match cmd {
        "/new" => {
            *transcript = Transcript::new();
            images.clear();
            println!("Started a new conversation");
        }
        "/list" => {
            for c in client.conversations().await? {
                println!(
                    "{}  {}  ({} messages, updated {})",
                    c.id,
                    c.title,
                    c.message_count,
                    c.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        "/open" => {
            let conversation = client.conversation(arg).await?;
            *transcript = Transcript::from(&conversation);
            println!("== {}", conversation.title);
            print_transcript(transcript);
        }
        "/delete" => {
            client.delete(arg).await?;
            if transcript.conversation_id() == Some(arg) {
                *transcript = Transcript::new();
            }
            println!("Deleted {}", arg);
        }
        "/image" => {
            let attachment = ImageAttachment::from_path(Path::new(arg)).await?;
            println!("Attached {} ({})", arg, attachment.media_type);
            images.push(attachment);
        }
        _ => println!("{}", HELP),
    }
    Ok(())
}

pub async fn run(url: &str, password: Option<String>) -> Result<()> {
    let client = ChatClient::new(url)?;
    let password = password.unwrap_or_else(|| AppConfig::default().app_password);
    client.login(&password).await?;

    let mut rl = DefaultEditor::new()?;
    let mut transcript = Transcript::new();
    let mut images: Vec<ImageAttachment> = Vec::new();
    println!("{}", HELP);

    loop {
        let readline = rl.readline(">>> ");
        match readline {
            Ok(line) => {
                let line = line.trim_end();
                if line.trim().is_empty() {
                    continue;
                }
                if line == "/quit" {
                    break;
                }
                if line.starts_with('/') {
                    if let Err(e) = handle_command(&client, &mut transcript, &mut images, line).await {
                        println!("Error: {}", e);
                    }
                    continue;
                }

                if let Err(e) = rl.add_history_entry(line) {
                    tracing::warn!("Failed to add history entry: {}", e);
                }
                let pending = transcript.push_pending(line, images.len());
                let conversation_id = transcript.conversation_id().map(String::from);
                match client
                    .send(line, conversation_id.as_deref(), &images)
                    .await
                {
                    Ok(resp) => {
                        transcript.confirm(pending, &resp.response, &resp.conversation_id);
                        images.clear();
                        println!("{}", resp.response);
                    }
                    Err(e) => {
                        // Keep the attachments so the message can be retried
                        transcript.rollback(pending);
                        println!("Error: {}", e);
                    }
                }
            }
            Err(ReadlineError::Interrupted) => break,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}
