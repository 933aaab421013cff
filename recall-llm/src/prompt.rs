//! Fixed prompt text used by the retry protocols and importance rating.

/// Poignancy rubric used to rate a memory on ingestion. The model's digit
/// (0–9) is shifted by one before it is stored.
pub const IMPORTANCE_RUBRIC: &str = r"On the scale of 0 to 9, where 0 is purely mundane
(e.g., brushing teeth, making bed) and 9 is
extremely poignant (e.g., a break up, college
acceptance), rate the likely poignancy of the
following piece of memory. Respond with a single integer without
explanation.

Memory: {memory_content}

Rating: ";

/// Injected after the model answers in prose when a tool call was required.
pub const NOT_A_FUNCTION_CALL: &str = "That was not a function call. Please call a function.";

/// Injected after the model answers with something other than a digit.
pub const NOT_A_DIGIT: &str = "That was not a digit. Try again.";

/// Simple template interpolation for prompts.
///
/// Replaces `{key}` with the corresponding value in a single pass over
/// `template`: inserted values are never expanded again. Unknown keys and
/// unmatched braces are copied through.
#[must_use]
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        result.push_str(&rest[..open]);
        let tail = &rest[open..];
        let value = tail.find('}').and_then(|close| {
            let key = &tail[1..close];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                result.push_str(value);
                rest = &tail[close + 1..];
            }
            None => {
                result.push('{');
                rest = &tail[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

/// Render the importance rubric for one memory description.
#[must_use]
pub fn importance_prompt(memory_content: &str) -> String {
    render_template(IMPORTANCE_RUBRIC, &[("memory_content", memory_content)])
}
