//! Per-character orchestration of every interaction mode.
//!
//! Every mode has the same shape:
//!
//! 1. optionally append the incoming user message to history,
//! 2. retrieve memories for the message and the scene,
//! 3. build the prompt and hand it to the LLM client,
//!
//! and differs only in which client operation it uses and what it does with
//! the answer.

use std::sync::Arc;

use futures::future::{join_all, try_join_all};
use tracing::{debug, info};
use uuid::Uuid;

use recall_core::embedding::embed_text;
use recall_core::{Memory, MemoryEngine, RecallError, Result};
use recall_llm::{ActionCompletion, Completion, LlmHandle, Message};

use crate::keywords::tag_keywords;
use crate::knowledge::{Conversation, Knowledge};
use crate::lore::{LoreMatch, split_sentences};
use crate::prompt;
use crate::tools::{rate_tool, rating_to_int, tools_from_actions};

/// The result of one interaction together with the prompt that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Interaction<T> {
    /// What the character said or did.
    pub result: T,
    /// The messages sent to the model.
    pub messages: Vec<Message>,
}

/// A conversational character: knowledge, memories and running conversation.
pub struct GenAgent {
    knowledge: Knowledge,
    memory: MemoryEngine,
    llm: Arc<LlmHandle>,
    conversation: Conversation,
    history: Vec<Message>,
}

impl GenAgent {
    /// Create a character and seed its memories: shared lore it knows, then
    /// its personal lore. Seeding runs concurrently.
    ///
    /// # Errors
    /// Fails if any initial memory cannot be rated, embedded or stored.
    pub async fn create(
        knowledge: Knowledge,
        memory: MemoryEngine,
        llm: Arc<LlmHandle>,
    ) -> Result<Self> {
        let agent = Self {
            knowledge,
            memory,
            llm,
            conversation: Conversation::default(),
            history: Vec::new(),
        };

        let initial = agent.knowledge.initial_memories();
        let seeded = initial.len();
        try_join_all(initial.into_iter().map(|m| agent.memory.add_memory(m))).await?;
        info!(agent = %agent.name(), memories = seeded, "Agent created");
        Ok(agent)
    }

    /// Stable character id.
    #[must_use]
    pub fn uuid(&self) -> Uuid {
        self.knowledge.agent_def.uuid
    }

    /// Character name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.knowledge.agent_def.name
    }

    /// Conversation so far.
    #[must_use]
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    /// Current scene.
    #[must_use]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// The character's memory engine.
    #[must_use]
    pub fn memory(&self) -> &MemoryEngine {
        &self.memory
    }

    /// Replace the scene and the history wholesale.
    pub fn start_conversation(&mut self, conversation: Conversation, history: Vec<Message>) {
        self.conversation = conversation;
        self.history = history;
    }

    /// Clear the history, keeping the scene.
    pub fn reset_conversation(&mut self) {
        self.history.clear();
    }

    /// Replace the character's knowledge. Memories already seeded are kept.
    pub fn update_knowledge(&mut self, knowledge: Knowledge) {
        self.knowledge = knowledge;
    }

    /// Rate, embed and store a new memory.
    ///
    /// # Errors
    /// See [`MemoryEngine::add_memory`].
    pub async fn add_memory(&self, memory: Memory) -> Result<Memory> {
        self.memory.add_memory(memory).await
    }

    /// Open dialogue: the character either speaks or takes one of its actions.
    ///
    /// A spoken reply is added to history (speaker tag and quotes stripped)
    /// and returned with memory keywords highlighted. An action leaves
    /// history untouched.
    ///
    /// # Errors
    /// Memory retrieval or completion failure.
    pub async fn interact(&mut self, message: Option<&str>) -> Result<Interaction<Completion>> {
        self.push_user(message);
        let memories = self.query_memories(message).await?;
        let messages = prompt::interact_messages(
            &self.knowledge,
            &self.conversation,
            &memories,
            &self.history,
        );
        log_prompt(&messages);

        let tools = tools_from_actions(&self.knowledge.agent_def.actions);
        let completion = self.llm.get()?.tool_completion(&messages, &tools).await?;

        let result = match completion {
            Completion::Message(mut reply) => {
                self.push_assistant(&reply.content);
                reply.content = tag_keywords(&reply.content, &memories);
                Completion::Message(reply)
            }
            action @ Completion::Action(_) => action,
        };
        Ok(Interaction { result, messages })
    }

    /// Plain dialogue without tools.
    ///
    /// # Errors
    /// Memory retrieval or completion failure.
    pub async fn chat(&mut self, message: &str) -> Result<Interaction<Message>> {
        self.push_user(Some(message));
        let memories = self.query_memories(Some(message)).await?;
        let messages =
            prompt::chat_messages(&self.knowledge, &self.conversation, &memories, &self.history);
        log_prompt(&messages);

        let mut reply = self.llm.get()?.plain_completion(&messages).await?;
        self.push_assistant(&reply.content);
        reply.content = tag_keywords(&reply.content, &memories);
        Ok(Interaction {
            result: reply,
            messages,
        })
    }

    /// Pick an action. `None` if the model answered in prose.
    ///
    /// # Errors
    /// Memory retrieval or completion failure.
    pub async fn act(
        &mut self,
        message: Option<&str>,
    ) -> Result<Interaction<Option<ActionCompletion>>> {
        self.push_user(message);
        let memories = self.query_memories(message).await?;
        let messages = prompt::action_messages(
            &self.knowledge,
            &self.conversation,
            &memories,
            &self.history,
        );
        log_prompt(&messages);

        let tools = tools_from_actions(&self.knowledge.agent_def.actions);
        let completion = self.llm.get()?.tool_completion(&messages, &tools).await?;
        Ok(Interaction {
            result: completion.into_action(),
            messages,
        })
    }

    /// Rate each question 1–5 as the character would, `-1` where no rating
    /// came back. Questions are asked concurrently; ratings come back in
    /// question order.
    ///
    /// # Errors
    /// Memory retrieval failure.
    pub async fn query(&self, questions: &[String]) -> Result<Vec<i32>> {
        let memories = try_join_all(
            questions
                .iter()
                .map(|q| self.query_memories(Some(q.as_str()))),
        )
        .await?;
        let groups = prompt::query_messages(
            &self.knowledge,
            &self.conversation,
            &memories,
            &self.history,
            questions,
        );

        let llm = self.llm.get()?;
        let tools = [rate_tool()];
        let ratings = join_all(
            groups
                .iter()
                .map(|messages| llm.forced_action_completion(messages, &tools)),
        )
        .await;
        Ok(ratings.iter().map(|r| rating_to_int(r.as_ref())).collect())
    }

    /// How plausible it is (1–5) that the character would say `message`;
    /// `-1` if no rating came back. No memories are retrieved.
    ///
    /// # Errors
    /// Client construction failure.
    pub async fn guardrail(&self, message: &str) -> Result<i32> {
        let question = prompt::guardrail_query(&self.knowledge, message);
        let groups = prompt::query_messages(
            &self.knowledge,
            &self.conversation,
            &[],
            &self.history,
            std::slice::from_ref(&question),
        );

        let llm = self.llm.get()?;
        let mut rating = None;
        if let Some(messages) = groups.first() {
            rating = llm.forced_action_completion(messages, &[rate_tool()]).await;
        }
        Ok(rating_to_int(rating.as_ref()))
    }

    /// Which memories each sentence fragment of `content` draws on.
    ///
    /// # Errors
    /// Embedding or retrieval failure.
    pub async fn trace_lore(&self, content: &str) -> Result<Vec<LoreMatch>> {
        let fragments = split_sentences(content);
        if fragments.is_empty() {
            return Ok(Vec::new());
        }
        let llm = self.llm.get()?;
        let top_k = self.conversation.memories_to_include;

        let per_fragment = try_join_all(fragments.into_iter().map(|fragment| {
            let llm = Arc::clone(&llm);
            async move {
                debug!(fragment, "Tracing lore");
                let embedding = embed_text(&llm, fragment).await?;
                let query = Memory::new(fragment).with_embedding(embedding.clone());
                let memories = self
                    .memory
                    .retrieve_relevant_memories(vec![query], Some(top_k))
                    .await?;
                Ok::<_, RecallError>(
                    memories
                        .iter()
                        .filter_map(|m| LoreMatch::measure(fragment, &embedding, m))
                        .collect::<Vec<_>>(),
                )
            }
        }))
        .await?;

        let matches: Vec<LoreMatch> = per_fragment.into_iter().flatten().collect();
        for found in &matches {
            debug!(
                lore_id = found.client_id.as_deref().unwrap_or(""),
                memory = %found.description,
                similarity = found.similarity,
                distance = found.distance,
                "Lore match"
            );
        }
        Ok(matches)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn push_user(&mut self, message: Option<&str>) {
        if let Some(message) = message.filter(|m| !m.is_empty()) {
            self.history.push(Message::user(message));
        }
    }

    fn push_assistant(&mut self, content: &str) {
        let cleaned = prompt::clean_response(self.name(), content);
        self.history.push(Message::assistant(cleaned));
    }

    /// The message is one query; when present, scene + instructions is a
    /// second. No message, no memories.
    async fn query_memories(&self, message: Option<&str>) -> Result<Vec<Memory>> {
        let Some(message) = message.filter(|m| !m.is_empty()) else {
            return Ok(Vec::new());
        };
        let mut queries = vec![Memory::new(message)];
        let context = self.conversation.context_description();
        if !context.is_empty() {
            queries.push(Memory::new(context));
        }
        self.memory
            .retrieve_relevant_memories(queries, Some(self.conversation.memories_to_include))
            .await
    }
}

fn log_prompt(messages: &[Message]) {
    for message in messages {
        debug!(role = message.role.as_str(), content = %message.content, "Outbound prompt");
    }
}
