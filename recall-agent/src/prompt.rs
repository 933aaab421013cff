//! Prompt construction for every interaction mode.
//!
//! Each mode sends the same shape: one system message describing the world,
//! the character, the scene and the retrieved memories, a mode-specific
//! system instruction, then the conversation history.

use recall_core::Memory;
use recall_llm::Message;
use recall_llm::prompt::render_template;

use crate::knowledge::{Conversation, Knowledge};

/// World, character, scene and memories.
pub const CONTEXT_SYSTEM: &str = r"{game_description}

You are {name}. {description}

Scene: {scene_description}
Instructions: {instructions}

Things you remember:
{memories}";

/// Open dialogue where an action may be taken instead of speaking.
pub const INTERACT_INSTRUCTION: &str = "Stay in character as {name}. Reply to the conversation \
with what {name} says next, or call one of your functions if {name} would act instead of speaking.";

/// Plain dialogue.
pub const CHAT_INSTRUCTION: &str =
    "Stay in character as {name}. Reply with only what {name} says next.";

/// Pick an action.
pub const ACTION_INSTRUCTION: &str = "Decide what {name} does next given the conversation so far. \
Call the function for the action {name} takes.";

/// Introspective rating question.
pub const QUERY_INSTRUCTION: &str = "Answer the next question as {name} would feel about it, \
by calling the rate function with a rating from 1 (not at all) to 5 (extremely).";

/// Plausibility question asked in guardrail mode.
pub const GUARDRAIL_QUESTION: &str =
    r#"On a scale of 1 to 5, how likely is it that {name} would say "{message}"?"#;

const NO_MEMORIES: &str = "(nothing relevant)";

fn render_memories(memories: &[Memory]) -> String {
    if memories.is_empty() {
        return NO_MEMORIES.to_string();
    }
    memories
        .iter()
        .map(|m| format!("- {}", m.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The leading system message shared by every mode.
#[must_use]
pub fn context_message(
    knowledge: &Knowledge,
    conversation: &Conversation,
    memories: &[Memory],
) -> Message {
    let agent = &knowledge.agent_def;
    let memories = render_memories(memories);
    Message::system(render_template(
        CONTEXT_SYSTEM,
        &[
            ("game_description", knowledge.game_description.as_str()),
            ("name", agent.name.as_str()),
            ("description", agent.description.as_str()),
            ("scene_description", conversation.scene_description.as_str()),
            ("instructions", conversation.instructions.as_str()),
            ("memories", memories.as_str()),
        ],
    ))
}

fn build(
    instruction: &str,
    knowledge: &Knowledge,
    conversation: &Conversation,
    memories: &[Memory],
    history: &[Message],
) -> Vec<Message> {
    let name = knowledge.agent_def.name.as_str();
    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(context_message(knowledge, conversation, memories));
    messages.push(Message::system(render_template(instruction, &[("name", name)])));
    messages.extend_from_slice(history);
    messages
}

/// Messages for interact mode.
#[must_use]
pub fn interact_messages(
    knowledge: &Knowledge,
    conversation: &Conversation,
    memories: &[Memory],
    history: &[Message],
) -> Vec<Message> {
    build(INTERACT_INSTRUCTION, knowledge, conversation, memories, history)
}

/// Messages for chat mode.
#[must_use]
pub fn chat_messages(
    knowledge: &Knowledge,
    conversation: &Conversation,
    memories: &[Memory],
    history: &[Message],
) -> Vec<Message> {
    build(CHAT_INSTRUCTION, knowledge, conversation, memories, history)
}

/// Messages for act mode.
#[must_use]
pub fn action_messages(
    knowledge: &Knowledge,
    conversation: &Conversation,
    memories: &[Memory],
    history: &[Message],
) -> Vec<Message> {
    build(ACTION_INSTRUCTION, knowledge, conversation, memories, history)
}

/// One message sequence per question: the question's own memories in the
/// context, history, then the question as a user turn.
///
/// `memories` is paired with `questions` by index; a missing entry means no
/// memories.
#[must_use]
pub fn query_messages(
    knowledge: &Knowledge,
    conversation: &Conversation,
    memories: &[Vec<Memory>],
    history: &[Message],
    questions: &[String],
) -> Vec<Vec<Message>> {
    questions
        .iter()
        .enumerate()
        .map(|(i, question)| {
            let memories = memories.get(i).map_or(&[][..], Vec::as_slice);
            let mut messages =
                build(QUERY_INSTRUCTION, knowledge, conversation, memories, history);
            messages.push(Message::user(question.as_str()));
            messages
        })
        .collect()
}

/// The plausibility question for a candidate utterance.
#[must_use]
pub fn guardrail_query(knowledge: &Knowledge, message: &str) -> String {
    render_template(
        GUARDRAIL_QUESTION,
        &[("name", knowledge.agent_def.name.as_str()), ("message", message)],
    )
}

/// Strip a leading `NAME:` speaker tag and surrounding quotes.
#[must_use]
pub fn clean_response(name: &str, content: &str) -> String {
    let mut text = content.trim();
    if let Some(rest) = text.strip_prefix(name) {
        if let Some(rest) = rest.trim_start().strip_prefix(':') {
            text = rest.trim_start();
        }
    }
    for (open, close) in [('"', '"'), ('\u{201c}', '\u{201d}')] {
        let inner = text
            .strip_prefix(open)
            .and_then(|rest| rest.strip_suffix(close));
        if let Some(inner) = inner {
            text = inner.trim();
        }
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::AgentDef;
    use recall_llm::Role;
    use uuid::Uuid;

    fn knowledge() -> Knowledge {
        Knowledge {
            game_description: "A river town in the marshes.".into(),
            shared_lore: Vec::new(),
            agent_def: AgentDef {
                uuid: Uuid::new_v4(),
                name: "Goran".into(),
                description: "A gruff blacksmith.".into(),
                actions: Vec::new(),
                personal_lore: Vec::new(),
            },
        }
    }

    fn conversation() -> Conversation {
        Conversation {
            scene_description: "At the forge.".into(),
            instructions: "Be curt.".into(),
            memories_to_include: 3,
        }
    }

    #[test]
    fn context_lists_memories() {
        let message = context_message(
            &knowledge(),
            &conversation(),
            &[Memory::new("The mill burned down")],
        );
        assert_eq!(message.role, Role::System);
        assert!(message.content.contains("You are Goran. A gruff blacksmith."));
        assert!(message.content.contains("Scene: At the forge."));
        assert!(message.content.contains("- The mill burned down"));
    }

    #[test]
    fn authored_text_with_braces_is_kept_verbatim() {
        let mut knowledge = knowledge();
        knowledge.game_description = "Where {name} once ruled.".into();
        let mut conversation = conversation();
        conversation.instructions = "Never reveal {memories}.".into();

        let message = context_message(&knowledge, &conversation, &[Memory::new("The mill burned down")]);
        assert!(message.content.contains("Where {name} once ruled."));
        assert!(message.content.contains("Never reveal {memories}."));
        assert_eq!(message.content.matches("- The mill burned down").count(), 1);
    }

    #[test]
    fn context_without_memories_says_so() {
        let message = context_message(&knowledge(), &conversation(), &[]);
        assert!(message.content.contains(NO_MEMORIES));
    }

    #[test]
    fn history_follows_the_system_preamble() {
        let history = vec![Message::user("Hello"), Message::assistant("What.")];
        let messages = chat_messages(&knowledge(), &conversation(), &[], &history);

        assert_eq!(messages.len(), 4);
        assert_eq!(messages[1].role, Role::System);
        assert!(messages[1].content.contains("what Goran says next"));
        assert_eq!(&messages[2..], history.as_slice());
    }

    #[test]
    fn query_messages_pair_memories_with_questions() {
        let memories = vec![vec![Memory::new("I hate the mayor")]];
        let questions = vec!["How angry are you?".to_string(), "How tired?".to_string()];

        let groups = query_messages(&knowledge(), &conversation(), &memories, &[], &questions);

        assert_eq!(groups.len(), 2);
        assert!(groups[0][0].content.contains("- I hate the mayor"));
        assert!(groups[1][0].content.contains(NO_MEMORIES));
        assert_eq!(groups[1].last(), Some(&Message::user("How tired?")));
    }

    #[test]
    fn guardrail_question_names_speaker_and_message() {
        let question = guardrail_query(&knowledge(), "I love computers");
        assert_eq!(
            question,
            r#"On a scale of 1 to 5, how likely is it that Goran would say "I love computers"?"#
        );
    }

    #[test]
    fn clean_response_strips_tag_and_quotes() {
        assert_eq!(clean_response("Goran", "Goran: \"Get out.\""), "Get out.");
        assert_eq!(clean_response("Goran", "  \u{201c}Fine.\u{201d} "), "Fine.");
        assert_eq!(clean_response("Goran", "Goran works here."), "Goran works here.");
        assert_eq!(clean_response("Goran", "\""), "\"");
    }
}
