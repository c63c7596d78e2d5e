use storyloom::error::AIError;
use storyloom::session::{SessionEvent, SessionPhase, StorySession, TurnRequest};
use storyloom::{
    GameState, Message, MessageType, NarratorClient, SaveManager, Settings, descriptions, fate,
    logging,
};

use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::sleep;

type TurnResult = (u64, Result<String, AIError>);

// The completion call is never awaited inline: it runs detached and reports
// back over a channel, tagged with the turn sequence number, so that a
// response arriving after the player has left the story is simply discarded.
fn dispatch_turn(
    client: Arc<NarratorClient>,
    request: TurnRequest,
    sender: mpsc::UnboundedSender<TurnResult>,
) {
    println!("* The narrator is thinking...");
    tokio::spawn(async move {
        let result = client
            .request_turn(descriptions::NARRATOR_SYSTEM_PROMPT, &request.messages)
            .await;
        let _ = sender.send((request.seq, result));
    });
}

fn render_message(message: &Message) {
    match message.message_type {
        MessageType::User => println!("> {}", message.content),
        MessageType::Game => println!("\n{}\n", message.content),
        MessageType::System => println!("* {}", message.content),
    }
}

fn render_event(event: SessionEvent) {
    match event {
        SessionEvent::MessageAdded(message) => render_message(&message),
        SessionEvent::ProgressChanged(progress) => println!("* Story progress: {progress}%"),
        SessionEvent::InventoryChanged { item, added } => {
            if added {
                println!("* Gained: {item}");
            } else {
                println!("* Lost: {item}");
            }
        }
        SessionEvent::AchievementUnlocked(title) => println!("* Achievement unlocked: {title}"),
        SessionEvent::FlashbackShown(text) => println!("\n--- flashback ---\n{text}\n-----------------"),
        SessionEvent::Interrupted(interruption) => println!(
            "* {} interrupts: {}",
            interruption.character_name, interruption.content
        ),
        SessionEvent::EffectTriggered(effect) => println!("* [{effect}]"),
        SessionEvent::FateRollPending(challenge) => println!("\n!!! FATE ROLL: {challenge}"),
        SessionEvent::FateOutcomeRevealed(outcome) => println!("!!! The dice say: {outcome}\n"),
        SessionEvent::ErrorOccurred(_) => {} // already shown as a system message
    }
}

fn drain_events(events: &mut mpsc::UnboundedReceiver<SessionEvent>) {
    while let Ok(event) = events.try_recv() {
        render_event(event);
    }
}

fn render_choices(session: &StorySession) {
    for (index, choice) in session.current_choices().iter().enumerate() {
        let icon = choice.icon.as_deref().unwrap_or("-");
        println!("  {}. {} {} ({})", index + 1, icon, choice.text, choice.category);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = logging::init();

    let mut args = std::env::args().skip(1);
    let user_id = args.next().unwrap_or_else(|| "reader".to_string());
    let book_id = args.next().unwrap_or_else(|| "demo-book".to_string());

    let settings = Settings::load().unwrap_or_default();
    let client = Arc::new(NarratorClient::new(&settings));
    let save_manager = SaveManager::new();
    let save_name = SaveManager::save_name_for(&user_id, &book_id);

    let (event_sender, mut events) = mpsc::unbounded_channel();
    let (turn_sender, mut turns) = mpsc::unbounded_channel::<TurnResult>();

    let state = match save_manager.load(&save_name)? {
        Some(saved) => {
            println!("* Resuming '{book_id}'...\n");
            for message in &saved.message_history {
                render_message(message);
            }
            saved
        }
        None => GameState::new(&save_name),
    };

    let mut session =
        StorySession::new(state, event_sender).with_persistence(save_manager.debouncer());

    if session.phase() == SessionPhase::Idle {
        let request = session.begin_turn(storyloom::PlayerInput::FreeText(
            descriptions::OPENING_INSTRUCTION.to_string(),
        ))?;
        drain_events(&mut events);
        dispatch_turn(client.clone(), request, turn_sender.clone());
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let line = line.trim().to_string();
                if line.is_empty() {
                    continue;
                }
                if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("exit") {
                    break;
                }
                let submitted = match line.parse::<usize>() {
                    Ok(number) if number >= 1 => session.select_choice(number - 1),
                    _ => session.submit_free_text(&line),
                };
                match submitted {
                    Ok(request) => {
                        drain_events(&mut events);
                        dispatch_turn(client.clone(), request, turn_sender.clone());
                    }
                    Err(e) => println!("* {e}"),
                }
            }
            Some((seq, result)) = turns.recv() => {
                session.complete_turn(seq, result);
                drain_events(&mut events);

                if session.phase() == SessionPhase::FateRollPending {
                    sleep(fate::SUSPENSE_DURATION).await;
                    let (_, request) = session.resolve_fate()?;
                    drain_events(&mut events);
                    sleep(fate::REVEAL_DURATION).await;
                    dispatch_turn(client.clone(), request, turn_sender.clone());
                } else {
                    render_choices(&session);
                }
            }
        }
    }

    // Back to the library: persist only if at least one choice was resolved.
    if session.teardown().is_some() {
        println!("* Story saved.");
    }
    Ok(())
}
