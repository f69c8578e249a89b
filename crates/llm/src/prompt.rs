//! Prompt construction
//!
//! Builds the persona-framed prompts for the text and vision paths. The
//! text path serializes a bounded window of recent history; the vision
//! path embeds the user's question next to the camera frame.

use video_agent_core::Turn;

/// Persona preamble for text conversation
pub const TEXT_PERSONA: &str = "You are a helpful AI video call assistant. You can see the user \
     through their camera and help them with tasks, answer questions, and provide guidance. Be \
     friendly, concise (2-3 sentences max), and helpful.";

/// Build the text-path prompt: persona + recent history + current message.
///
/// `history` is expected to already be the trailing window; this function
/// does not truncate further.
pub fn text_prompt(history: &[Turn], message: &str) -> String {
    let mut prompt = String::from(TEXT_PERSONA);
    prompt.push_str("\n\n");

    if !history.is_empty() {
        prompt.push_str("Recent conversation:\n");
        for turn in history {
            prompt.push_str(turn.role.display_name());
            prompt.push_str(": ");
            prompt.push_str(&turn.content);
            prompt.push('\n');
        }
        prompt.push('\n');
    }

    prompt.push_str("User: ");
    prompt.push_str(message);
    prompt.push_str("\nAssistant:");
    prompt
}

/// Build the vision-path prompt embedding the user's question
pub fn vision_prompt(message: &str) -> String {
    format!(
        "You are an AI video call assistant. The user is showing you something through their \
         camera and asking: \"{message}\"\n\nAnalyze the image and provide a helpful, concise \
         response (2-3 sentences). Describe what you see and answer their question."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_prompt_without_history() {
        let prompt = text_prompt(&[], "hello");
        assert!(prompt.starts_with(TEXT_PERSONA));
        assert!(!prompt.contains("Recent conversation"));
        assert!(prompt.ends_with("User: hello\nAssistant:"));
    }

    #[test]
    fn test_text_prompt_with_history() {
        let history = vec![Turn::user("hi"), Turn::assistant("hello, how can I help?")];
        let prompt = text_prompt(&history, "what time is it?");

        assert!(prompt.contains("Recent conversation:\nUser: hi\nAssistant: hello, how can I help?\n"));
        assert!(prompt.ends_with("User: what time is it?\nAssistant:"));
    }

    #[test]
    fn test_vision_prompt_embeds_message() {
        let prompt = vision_prompt("what do you see?");
        assert!(prompt.contains("\"what do you see?\""));
        assert!(prompt.contains("Analyze the image"));
    }
}
