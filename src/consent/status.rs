/// Overall consent state. Stored as an integer; `Unset` is the absence of a
/// stored value, never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsentStatus {
    Unset,
    Declined,
    AgreedPendingAck,
    Agreed,
}

impl ConsentStatus {
    pub fn as_code(self) -> Option<u8> {
        match self {
            Self::Unset => None,
            Self::Declined => Some(0),
            Self::AgreedPendingAck => Some(1),
            Self::Agreed => Some(2),
        }
    }

    pub fn as_stored(self) -> Option<&'static str> {
        match self {
            Self::Unset => None,
            Self::Declined => Some("0"),
            Self::AgreedPendingAck => Some("1"),
            Self::Agreed => Some("2"),
        }
    }

    /// Absent, unknown, or unparseable stored values all read as `Unset`.
    pub fn from_stored(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("0") => Self::Declined,
            Some("1") => Self::AgreedPendingAck,
            Some("2") => Self::Agreed,
            _ => Self::Unset,
        }
    }

    pub fn is_agreed(self) -> bool {
        matches!(self, Self::AgreedPendingAck | Self::Agreed)
    }
}
