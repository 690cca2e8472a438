use serde::{Deserialize, Serialize};

/// How a user is doing, reported once per day.
///
/// This is the single source of emoji, label and trend score for a status.
/// Stats responses and notification templates both read from here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckinStatus {
    Good,
    #[serde(rename = "OK")]
    Ok,
    Tired,
    NeedHelp,
}

/// Rendering data for a stored status value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusPresentation {
    pub emoji: &'static str,
    pub label: String,
    /// 4 (best) down to 1 (needs help); 0 for values we don't recognise.
    pub score: u8,
}

/// Shown for stored values that don't parse as a known status.
pub const FALLBACK_EMOJI: &str = "✅";

impl CheckinStatus {
    pub const ALL: [CheckinStatus; 4] = [Self::Good, Self::Ok, Self::Tired, Self::NeedHelp];

    /// Canonical name, as persisted and sent over the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Ok => "OK",
            Self::Tired => "Tired",
            Self::NeedHelp => "NeedHelp",
        }
    }

    /// Accepts canonical names case-insensitively, plus the legacy labels
    /// the first web client used.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let by_name = Self::ALL
            .into_iter()
            .find(|s| s.as_str().eq_ignore_ascii_case(raw));
        if by_name.is_some() {
            return by_name;
        }
        match raw {
            "很好" => Some(Self::Good),
            "还行" => Some(Self::Ok),
            "有点累" => Some(Self::Tired),
            "需要联系" => Some(Self::NeedHelp),
            _ if raw.eq_ignore_ascii_case("need help") || raw.eq_ignore_ascii_case("need_help") => {
                Some(Self::NeedHelp)
            }
            _ => None,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Self::Good => "😊",
            Self::Ok => "😌",
            Self::Tired => "😔",
            Self::NeedHelp => "🆘",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Ok => "OK",
            Self::Tired => "A bit tired",
            Self::NeedHelp => "Needs help",
        }
    }

    pub fn score(self) -> u8 {
        match self {
            Self::Good => 4,
            Self::Ok => 3,
            Self::Tired => 2,
            Self::NeedHelp => 1,
        }
    }

    pub fn presentation(self) -> StatusPresentation {
        StatusPresentation {
            emoji: self.emoji(),
            label: self.label().to_string(),
            score: self.score(),
        }
    }
}

impl std::fmt::Display for CheckinStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Presentation for a raw stored value. Unknown values keep their text and
/// get the generic checkmark.
pub fn presentation(raw: &str) -> StatusPresentation {
    match CheckinStatus::parse(raw) {
        Some(status) => status.presentation(),
        None => StatusPresentation {
            emoji: FALLBACK_EMOJI,
            label: raw.to_string(),
            score: 0,
        },
    }
}
