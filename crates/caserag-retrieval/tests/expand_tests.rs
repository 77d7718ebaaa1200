use std::sync::Mutex;

use caserag_core::error::{Error, Result};
use caserag_core::traits::Answerer;
use caserag_retrieval::expand::{parse_paraphrases, QueryExpander};

/// Replies with a fixed text (or error) and records prompts.
struct ScriptedAnswerer { reply: Result<String>, prompts: Mutex<Vec<String>> }

impl ScriptedAnswerer {
    fn ok(reply: &str) -> Self { Self { reply: Ok(reply.to_string()), prompts: Mutex::new(Vec::new()) } }
    fn failing() -> Self { Self { reply: Err(Error::Generation("connection refused".to_string())), prompts: Mutex::new(Vec::new()) } }
    fn calls(&self) -> usize { self.prompts.lock().unwrap().len() }
}

impl Answerer for ScriptedAnswerer {
    fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply { Ok(s) => Ok(s.clone()), Err(e) => Err(Error::Generation(e.to_string())) }
    }
}

#[test]
fn original_comes_first_then_at_most_m_paraphrases() {
    let answerer = ScriptedAnswerer::ok("  How is pneumonia coded?\n\n Which code fits pneumonia? \nA third one\n");
    let queries = QueryExpander::new(&answerer, 2).expand("pneumonia code");
    assert_eq!(queries, vec!["pneumonia code", "How is pneumonia coded?", "Which code fits pneumonia?"]);
    let prompts = answerer.prompts.lock().unwrap();
    assert!(prompts[0].contains("pneumonia code"));
    assert!(prompts[0].contains('2'));
}

#[test]
fn failing_answerer_degrades_to_the_original_question() {
    let answerer = ScriptedAnswerer::failing();
    assert_eq!(QueryExpander::new(&answerer, 3).expand("what is I10?"), vec!["what is I10?"]);
    assert_eq!(answerer.calls(), 1);
}

#[test]
fn blank_reply_yields_only_the_original() {
    let answerer = ScriptedAnswerer::ok("\n   \n");
    assert_eq!(QueryExpander::new(&answerer, 2).expand("q"), vec!["q"]);
}

#[test]
fn zero_paraphrases_skips_the_answerer() {
    let answerer = ScriptedAnswerer::ok("unused");
    assert_eq!(QueryExpander::new(&answerer, 0).expand("q"), vec!["q"]);
    assert_eq!(answerer.calls(), 0);
}

#[test]
fn parsing_handles_crlf_and_limits() {
    assert_eq!(parse_paraphrases("a\r\nb\r\nc", 2), vec!["a", "b"]);
    assert!(parse_paraphrases("a\nb", 0).is_empty());
}
