//! Grounding prompt assembly.

/// Fixed sentence the model is told to emit when the context cannot answer
/// the question.
pub const INSUFFICIENT_INFORMATION: &str = "I don't have enough information to answer this.";

/// Builds the strict grounding prompt around the assembled context and the
/// original question.
///
/// The rules pin the model to the supplied context: no outside knowledge,
/// a fixed fallback sentence when the context is insufficient, and source
/// citation when metadata allows it.
pub(crate) fn grounding_prompt(context: &str, question: &str) -> String {
    format!(
        "You are an expert AI assistant for document analysis.\n\
         \n\
         STRICT RULES:\n\
         1. Answer the question ONLY based on the context provided below.\n\
         2. If the answer is not present in the context, say \"{INSUFFICIENT_INFORMATION}\"\n\
         3. Do not use outside knowledge.\n\
         4. Cite the source document if metadata is available.\n\
         \n\
         Context:\n\
         {context}\n\
         \n\
         Question: {question}\n\
         \n\
         Answer:"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_context_and_question() {
        let prompt = grounding_prompt("the moon is made of rock", "what is the moon made of?");
        assert!(prompt.contains("the moon is made of rock"));
        assert!(prompt.contains("Question: what is the moon made of?"));
        assert!(prompt.contains(INSUFFICIENT_INFORMATION));
        assert!(prompt.contains("ONLY based on the context"));
        assert!(prompt.ends_with("Answer:"));
    }
}
