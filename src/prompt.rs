//! Builds the completion request for a coaching turn

use crate::conversation::{Role, SpeakRequest};
use crate::llm::{ChatMessage, CompletionRequest, MessageRole};
use crate::persona::Persona;

/// Appended after the user's utterance
const CLOSING_INSTRUCTION: &str =
    "Provide a friendly response with feedback based on our conversation history.";

/// Compose the final user message: persona block, quoted utterance, closing instruction
#[must_use]
pub fn coaching_message(persona: &Persona, text: &str) -> String {
    format!(
        "{}\n\nUser said: \"{text}\"\n\n{CLOSING_INSTRUCTION}",
        persona.system_prompt
    )
}

/// Build the completion request for one turn
///
/// Prior turns are carried over in their original order, followed by the
/// coaching message for the current utterance.
#[must_use]
pub fn build_completion_request(persona: &Persona, request: &SpeakRequest) -> CompletionRequest {
    let mut messages: Vec<ChatMessage> = request
        .prior_turns()
        .iter()
        .map(|turn| ChatMessage {
            role: match turn.role {
                Role::User => MessageRole::User,
                Role::Assistant => MessageRole::Model,
            },
            text: turn.text.clone(),
        })
        .collect();

    messages.push(ChatMessage {
        role: MessageRole::User,
        text: coaching_message(persona, &request.text),
    });

    CompletionRequest {
        messages,
        max_output_tokens: persona.max_output_tokens,
        temperature: persona.temperature,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::Turn;

    fn persona() -> Persona {
        Persona {
            id: "test".to_string(),
            name: "Test".to_string(),
            system_prompt: "You are a coach.".to_string(),
            max_output_tokens: 200,
            temperature: None,
        }
    }

    #[test]
    fn empty_history_yields_single_message() {
        let request = SpeakRequest {
            text: "I go to market yesterday".to_string(),
            history: vec![],
        };

        let completion = build_completion_request(&persona(), &request);

        assert_eq!(completion.messages.len(), 1);
        assert_eq!(completion.messages[0].role, MessageRole::User);
        assert_eq!(
            completion.messages[0].text,
            "You are a coach.\n\nUser said: \"I go to market yesterday\"\n\n\
             Provide a friendly response with feedback based on our conversation history."
        );
        assert_eq!(completion.max_output_tokens, 200);
    }

    #[test]
    fn prior_turns_keep_order_and_map_roles() {
        let request = SpeakRequest {
            text: "third".to_string(),
            history: vec![
                Turn::user("first"),
                Turn::assistant("reply one"),
                Turn::user("second"),
                Turn::assistant("reply two"),
                Turn::user("third"),
            ],
        };

        let completion = build_completion_request(&persona(), &request);
        let summary: Vec<(MessageRole, &str)> = completion
            .messages
            .iter()
            .take(4)
            .map(|m| (m.role, m.text.as_str()))
            .collect();

        assert_eq!(
            summary,
            vec![
                (MessageRole::User, "first"),
                (MessageRole::Model, "reply one"),
                (MessageRole::User, "second"),
                (MessageRole::Model, "reply two"),
            ]
        );
        assert_eq!(completion.messages.len(), 5);
        assert!(completion.messages[4].text.contains("User said: \"third\""));
    }

    #[test]
    fn single_entry_history_contributes_no_context() {
        let request = SpeakRequest {
            text: "hello".to_string(),
            history: vec![Turn::user("hello")],
        };

        let completion = build_completion_request(&persona(), &request);
        assert_eq!(completion.messages.len(), 1);
    }

    #[test]
    fn temperature_is_forwarded() {
        let mut persona = persona();
        persona.temperature = Some(0.7);
        let request = SpeakRequest {
            text: "hi".to_string(),
            history: vec![],
        };

        assert_eq!(build_completion_request(&persona, &request).temperature, Some(0.7));
    }
}
