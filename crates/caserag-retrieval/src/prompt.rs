/// Asks for `count` alternative phrasings, one per line.
pub fn paraphrase_prompt(question: &str, count: usize) -> String {
    format!(
        "Write {count} alternative phrasings of the question below. \
Put each on its own line, without numbering or any other text.\n\n{question}\n\nAlternatives:"
    )
}

pub fn answer_prompt(question: &str, context: &str) -> String {
    format!(
        "You are an expert assistant for clinical diagnosis and procedure coding.\n\n\
Each case in the database has: description, codes, procedure, coding rationale and caveats.\n\n\
CONTEXT:\n{context}\n\n\
QUESTION: {question}\n\n\
RULES:\n\
1. Work out what is being asked.\n\
2. Use only specific information from the context.\n\
3. Answer directly and stay focused.\n\
4. Cite the relevant codes.\n\
5. Refer to the coding rationale for technical detail.\n\
6. Mention caveats when there are any.\n\
7. If the context does not contain the answer, reply: \"Not found in the database.\"\n\
8. Use bullets or numbering when it helps.\n\n\
Answer (concise and accurate):"
    )
}
