use poise::serenity_prelude as serenity;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FlowError {
    #[error("Discord API error: {0}")]
    Platform(Box<serenity::Error>),

    /// Illegal call for the interaction's acknowledgment state.
    #[error("Interaction protocol error: {0}")]
    Protocol(String),

    /// The user stopped answering; the prompt has already been cleaned up.
    #[error("Flow abandoned after waiting for input")]
    Abandoned,

    #[error("Cannot tell which user may answer message {0}")]
    UnknownAuthor(serenity::MessageId),

    #[error("Interaction has no message to wait on")]
    NotAComponent,

    #[error("Store error: {0}")]
    Store(#[from] anyhow::Error),
}

impl From<serenity::Error> for FlowError {
    fn from(value: serenity::Error) -> Self {
        FlowError::Platform(Box::new(value))
    }
}

impl FlowError {
    pub fn is_abandoned(&self) -> bool {
        matches!(self, FlowError::Abandoned)
    }
}

pub type FlowResult<T> = Result<T, FlowError>;
