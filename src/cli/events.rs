use anyhow::Result;
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

use crate::{screen::Screen, store::EventId};

use super::AppContext;

pub async fn process_start_command(context: &AppContext, label: &str) -> Result<()> {
    let screen = Screen::new(context.store.clone(), chrono::Local, context.clock.time());
    let event = screen.start_event(label).await?;
    println!("기록을 시작했습니다\t{}\t{}", event.id, event.label);
    Ok(())
}

pub async fn process_quick_command(context: &AppContext) -> Result<()> {
    let screen = Screen::new(context.store.clone(), chrono::Local, context.clock.time());
    let event = screen.quick_start().await;
    println!("기록이 추가되었습니다\t{}", event.id);
    Ok(())
}

pub async fn process_rename_command(context: &AppContext, id: String, label: &str) -> Result<()> {
    let screen = Screen::new(context.store.clone(), chrono::Local, context.clock.time());
    screen.rename(&EventId::from(id), label).await
}

pub async fn process_clear_command(context: &AppContext, yes: bool) -> Result<()> {
    let screen = Screen::new(context.store.clone(), chrono::Local, context.clock.time());
    let request = screen.request_clear();
    if yes || confirm_on_stdin(&request.prompt()).await? {
        request.confirm().await;
        println!("기록을 초기화했습니다");
    } else {
        info!("Clearing cancelled");
        request.cancel();
    }
    Ok(())
}

/// Asks a yes/no question on the terminal. Anything but an explicit yes is a no.
async fn confirm_on_stdin(prompt: &str) -> Result<bool> {
    let mut stdout = io::stdout();
    stdout.write_all(format!("{prompt} [y/N] ").as_bytes()).await?;
    stdout.flush().await?;

    let mut answer = String::new();
    BufReader::new(io::stdin()).read_line(&mut answer).await?;
    Ok(is_yes(&answer))
}

fn is_yes(answer: &str) -> bool {
    matches!(
        answer.trim().to_lowercase().as_str(),
        "y" | "yes" | "네" | "예"
    )
}
