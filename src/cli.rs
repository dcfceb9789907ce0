//! Terminal REPL over the shared chat session.

use tokio::io::{AsyncBufReadExt, BufReader};

use crate::chat::{ChatEvent, ConversationTurn, Role, Screen};
use crate::server::AppState;

/// What a line of REPL input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Quit,
    Skip,
    Events(Vec<ChatEvent>),
}

/// Interpret one input line given the session's current screen.
///
/// Plain text on the welcome screen starts the chat first.
pub fn parse_line(line: &str, screen: Screen) -> ReplCommand {
    let line = line.trim();
    match line {
        "" => ReplCommand::Skip,
        "/quit" | "/exit" => ReplCommand::Quit,
        "/start" => ReplCommand::Events(vec![ChatEvent::Start]),
        "/home" => ReplCommand::Events(vec![ChatEvent::Home]),
        text if screen == Screen::Welcome => {
            ReplCommand::Events(vec![ChatEvent::Start, ChatEvent::Submit(text.to_string())])
        }
        text => ReplCommand::Events(vec![ChatEvent::Submit(text.to_string())]),
    }
}

/// Render a bot turn for the terminal.
pub fn render_turn(turn: &ConversationTurn) -> Option<String> {
    if turn.role != Role::Bot {
        return None;
    }
    Some(match turn.annotation {
        Some(ref note) => format!("{}\n  {}", turn.content, note),
        None => turn.content.clone(),
    })
}

/// Read stdin until EOF or `/quit`, feeding the chat session.
pub async fn run_repl(state: AppState) -> std::io::Result<()> {
    eprintln!("Welcome to Spam Detector ChatBot");
    eprintln!("Type any message, and I'll tell you if it's spam or ham.");
    eprintln!("Commands: /start, /home, /quit\n");
    eprint!("> ");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Error reading stdin: {}", e);
                return Err(e);
            }
        };

        let screen = state.session.lock().await.screen();
        let events = match parse_line(&line, screen) {
            ReplCommand::Quit => break,
            ReplCommand::Skip => {
                eprint!("> ");
                continue;
            }
            ReplCommand::Events(events) => events,
        };

        match state.dispatch(events).await {
            Ok((turns, snapshot)) => {
                for text in turns.iter().filter_map(render_turn) {
                    println!("\n{}\n", text);
                }
                if turns.is_empty() {
                    eprintln!("ℹ️  Screen: {}", snapshot.screen);
                }
            }
            Err(e) => eprintln!("❌ {}", e),
        }
        eprint!("> ");
    }

    Ok(())
}
