/// Rooms interested in change events of one controller class
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub class: String,
    /// Opaque id issued by the controller
    pub subscription_id: String,
    pub rooms: Vec<String>,
}

impl Subscription {
    pub fn new(
        class: impl Into<String>,
        subscription_id: impl Into<String>,
        room_id: impl Into<String>,
    ) -> Self {
        Self {
            class: class.into(),
            subscription_id: subscription_id.into(),
            rooms: vec![room_id.into()],
        }
    }

    pub fn has_room(&self, room_id: &str) -> bool {
        self.rooms.iter().any(|r| r == room_id)
    }
}

/// One object change pushed by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// Distinguished name of the affected object
    pub dn: String,
    pub status: String,
    pub subscription_id: String,
}
