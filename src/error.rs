use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

// Enum for handling various application-level errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("AI error: {0}")]
    AI(#[from] AIError), // Errors related to the narrator LLM.

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error), // Errors related to data serialization.

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error), // Input/output errors.

    #[error("No active story session")]
    NoActiveStory, // Error when no story session is active.

    #[error("A turn is already in flight")]
    TurnInFlight, // A second player action was submitted before the response arrived.

    #[error("No fate roll is pending")]
    NoFatePending, // Fate resolution was requested outside the FateRollPending phase.

    #[error("A fate roll must be resolved first")]
    FatePending, // A normal action was submitted while a fate roll was on screen.

    #[error("No such choice")]
    NoSuchChoice, // A choice index outside the currently presented options.
}

// Errors related to the narrator LLM are separated into their own enum for clarity.
#[derive(Debug, Error)]
pub enum AIError {
    #[error("OpenAI API error: {0}")]
    OpenAI(#[from] async_openai::error::OpenAIError), // Errors from the proxy endpoint.

    #[error("Timeout occurred")]
    Timeout, // Error when the completion call exceeds its time limit.

    #[error("Empty completion")]
    EmptyCompletion, // The narrator returned no usable text.

    #[error("No message found")]
    NoMessageFound, // Error when expected message content is not found.
}
