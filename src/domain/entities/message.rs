/// A chat message delivered through the platform webhook
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    /// Command text, already cleaned of bot mentions
    pub text: String,
    pub sender_name: String,
    pub sender_id: String,
    pub room_id: String,
}

impl InboundMessage {
    pub fn new(text: impl Into<String>, room_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            sender_name: String::new(),
            sender_id: String::new(),
            room_id: room_id.into(),
        }
    }

    pub fn with_sender(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.sender_id = id.into();
        self.sender_name = name.into();
        self
    }
}
