pub mod ai;
pub mod ai_response;
pub mod descriptions;
pub mod discovery;
pub mod error;
pub mod fate;
pub mod game_state;
pub mod logging;
pub mod message;
pub mod save;
pub mod session;
pub mod settings;
pub mod tags;

// Re-export commonly used items for easier access
pub use ai::NarratorClient;
pub use ai_response::{
    ChatResponse, Choice, ChoiceCategory, Interruption, StoryResponse, VisualEffect,
    parse_chat_response, parse_story_response,
};
pub use discovery::{Discovery, DiscoveryLedger};
pub use error::{AIError, AppError, Result};
pub use fate::{FateOutcome, roll_fate};
pub use game_state::GameState;
pub use message::{Message, MessageType};
pub use save::SaveManager;
pub use session::{PlayerInput, SessionEvent, SessionPhase, StorySession, TurnRequest};
pub use settings::Settings;
