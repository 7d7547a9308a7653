//! Embedded prompts
//!
//! Persona and instruction prompts are compiled into the binary from
//! .pmt files.

/// Intent analysis prompt (strict JSON contract)
pub const INTENT: &str = include_str!("../prompts/intent.pmt");

/// Learning goal extraction prompt
pub const GOALS: &str = include_str!("../prompts/goals.pmt");

/// Search result narration persona
pub const SEARCH: &str = include_str!("../prompts/search.pmt");

/// Learning path narration persona
pub const PATH: &str = include_str!("../prompts/path.pmt");

/// Learning assistance persona
pub const LEARN: &str = include_str!("../prompts/learn.pmt");

/// Contribution invitation persona
pub const CONTRIBUTE: &str = include_str!("../prompts/contribute.pmt");

/// General chat persona
pub const CHAT: &str = include_str!("../prompts/chat.pmt");

/// Fixed apology used when a narration call fails
pub const APOLOGY: &str = "抱歉，AI导师暂时无法响应，请稍后重试。";

/// Get an embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    match name {
        "intent" => Some(INTENT),
        "goals" => Some(GOALS),
        "search" => Some(SEARCH),
        "path" => Some(PATH),
        "learn" => Some(LEARN),
        "contribute" => Some(CONTRIBUTE),
        "chat" => Some(CHAT),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_prompt_contract() {
        assert!(INTENT.contains("SEARCH"));
        assert!(INTENT.contains("PATH"));
        assert!(INTENT.contains("LEARN"));
        assert!(INTENT.contains("CONTRIBUTE"));
        assert!(INTENT.contains("CHAT"));
        assert!(INTENT.contains("JSON"));
    }

    #[test]
    fn test_goals_prompt_fields() {
        assert!(GOALS.contains("topic"));
        assert!(GOALS.contains("level"));
        assert!(GOALS.contains("goal"));
    }

    #[test]
    fn test_get_embedded() {
        assert!(get_embedded("search").is_some());
        assert!(get_embedded("unknown-prompt").is_none());
    }
}
