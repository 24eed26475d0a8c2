//! End-to-end session behavior against scripted collaborators.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use quill_agent::classifier::{ClassifierError, ZeroShotClassifier};
use quill_agent::composer::{GENERAL_ANSWER_NOTE, WEB_ANSWER_NOTE};
use quill_agent::provider::{Provider, ProviderError};
use quill_agent::session::{
    ChatSession, NO_HISTORY, OUT_OF_DOMAIN_MESSAGE, SERVICE_UNAVAILABLE_MESSAGE, SessionConfig,
};
use quill_agent::tools::WebSearchTool;
use quill_agent::web::search::{
    SearchError, SearchProvider, WebSearchQuery, WebSearchResponse, WebSearchResult,
    WebSearchService,
};
use quill_index::test_helpers::{HashEmbedder, MemoryCollection};
use quill_index::{Chunk, ContentStore};

/// Provider that replays scripted completions and records every prompt.
struct ScriptedProvider {
    responses: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
    unavailable: bool,
}

impl ScriptedProvider {
    fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().map(|s| s.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
            unavailable: false,
        })
    }

    fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(VecDeque::new()),
            prompts: Mutex::new(Vec::new()),
            unavailable: true,
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(&self, prompt: &str) -> Result<String, ProviderError> {
        if self.unavailable {
            return Err(ProviderError::Unavailable("connection refused".to_string()));
        }
        self.prompts.lock().unwrap().push(prompt.to_string());
        Ok(self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| "Answer: (script exhausted)".to_string()))
    }
}

/// Classifier returning one fixed score.
struct FixedClassifier(f32);

#[async_trait::async_trait]
impl ZeroShotClassifier for FixedClassifier {
    async fn classify(&self, _text: &str, _label: &str) -> Result<f32, ClassifierError> {
        Ok(self.0)
    }
}

/// Search provider returning one fixed result.
struct FixedSearchProvider;

#[async_trait::async_trait]
impl SearchProvider for FixedSearchProvider {
    async fn search(&self, query: &WebSearchQuery) -> Result<WebSearchResponse, SearchError> {
        Ok(WebSearchResponse {
            provider: "fixed".to_string(),
            results: vec![WebSearchResult {
                title: format!("Result for {}", query.query),
                url: "https://example.com".to_string(),
                snippet: Some("a web snippet".to_string()),
            }],
        })
    }
}

struct Fixture {
    session: ChatSession,
    provider: Arc<ScriptedProvider>,
    store: Arc<ContentStore>,
    _dir: tempfile::TempDir,
}

fn fixture(responses: &[&str], score: f32, with_web: bool) -> Fixture {
    fixture_with(ScriptedProvider::new(responses), score, with_web, 20)
}

fn fixture_with(
    provider: Arc<ScriptedProvider>,
    score: f32,
    with_web: bool,
    max_iterations: usize,
) -> Fixture {
    let dir = tempfile::TempDir::new().unwrap();
    let store = Arc::new(ContentStore::new(
        Arc::new(MemoryCollection::new()),
        Arc::new(HashEmbedder::new()),
        dir.path().join("data"),
        dir.path().join("unused"),
    ));

    let web = with_web.then(|| {
        let service = WebSearchService::new(
            Box::new(FixedSearchProvider),
            Duration::from_secs(60),
        );
        Arc::new(WebSearchTool::new(service, 5))
    });

    let config = SessionConfig {
        domain: None,
        domain_threshold: 0.1,
        top_k: 5,
        tool_top_k: 3,
        history_window: 10,
        memory_token_limit: 1500,
        max_iterations,
    };

    let session = ChatSession::new(
        config,
        provider.clone(),
        Arc::new(FixedClassifier(score)),
        store.clone(),
        web,
    );

    Fixture {
        session,
        provider,
        store,
        _dir: dir,
    }
}

async fn index_chunk(store: &ContentStore, text: &str) {
    store
        .add(vec![Chunk {
            text: text.to_string(),
            source: "doc.txt".to_string(),
            page: Some(0),
            sequence_index: 0,
        }])
        .await
        .unwrap();
}

#[tokio::test]
async fn out_of_domain_query_short_circuits() {
    let mut f = fixture(&[], 0.02, false);
    f.session.set_domain(Some("finance".to_string()));

    let answer = f.session.ask("What's the weather today?").await;

    assert_eq!(answer, OUT_OF_DOMAIN_MESSAGE);
    // Neither the model nor any tool was invoked.
    assert_eq!(f.provider.call_count(), 0);
}

#[tokio::test]
async fn in_domain_query_reaches_the_loop() {
    let mut f = fixture(
        &["Thought: I can answer now.\nAnswer: Bonds are debt instruments."],
        0.9,
        false,
    );
    f.session.set_domain(Some("finance".to_string()));

    let answer = f.session.ask("What is a bond?").await;
    assert_eq!(answer, "Bonds are debt instruments.");
}

#[tokio::test]
async fn no_domain_means_no_gating() {
    let mut f = fixture(&["Answer: fine"], 0.0, false);
    let answer = f.session.ask("anything at all").await;
    assert_eq!(answer, "fine");
}

#[tokio::test]
async fn query_numbers_are_normalized_before_the_loop() {
    let mut f = fixture(&["Answer: ok"], 0.9, false);
    f.session.ask("what is 5.000 plus 3,14?").await;

    let prompts = f.provider.prompts();
    assert!(prompts[0].contains("Question: what is 5000 plus 3.14?"));
}

#[tokio::test]
async fn local_search_observation_feeds_next_step() {
    let mut f = fixture(
        &[
            "Thought: need context\nAction: local_search\nAction Input: {\"query\": \"preamble\"}",
            "Thought: done\nAnswer: It establishes justice.",
        ],
        0.9,
        false,
    );
    index_chunk(&f.store, "The Preamble establishes justice and tranquility.").await;

    let answer = f.session.ask("What does the preamble do?").await;
    assert_eq!(answer, "It establishes justice.");

    let prompts = f.provider.prompts();
    assert!(prompts[1].contains("Observation:"));
    assert!(prompts[1].contains("The Preamble establishes justice"));
}

#[tokio::test]
async fn web_search_is_denied_until_local_search_ran() {
    let mut f = fixture(
        &[
            "Thought: web first\nAction: web_search\nAction Input: {\"query\": \"news\"}",
            "Thought: ok\nAnswer: done",
        ],
        0.9,
        true,
    );

    f.session.ask("latest news?").await;

    let prompts = f.provider.prompts();
    assert!(prompts[1].contains("web_search is not allowed yet"));
}

#[tokio::test]
async fn web_search_runs_after_local_search() {
    let mut f = fixture(
        &[
            "Thought: local\nAction: local_search\nAction Input: {\"query\": \"news\"}",
            "Thought: web\nAction: web_search\nAction Input: {\"query\": \"news\"}",
            "Thought: ok\nAnswer: combined",
        ],
        0.9,
        true,
    );

    let answer = f.session.ask("latest news?").await;
    assert_eq!(answer, "combined");

    let prompts = f.provider.prompts();
    assert!(prompts[2].contains("Result for news"));
}

#[tokio::test]
async fn calculator_result_is_observed_exactly() {
    let mut f = fixture(
        &[
            "Thought: math\nAction: calculator\nAction Input: {\"expression\": \"2**3 + 1\"}",
            "Thought: ok\nAnswer: 9",
        ],
        0.9,
        false,
    );

    let answer = f.session.ask("what is 2**3 + 1?").await;
    assert_eq!(answer, "9");
    assert!(f.provider.prompts()[1].contains("Observation: 9"));
}

#[tokio::test]
async fn malformed_tool_input_becomes_an_observation() {
    let mut f = fixture(
        &[
            "Thought: math\nAction: calculator\nAction Input: not json",
            "Thought: retry\nAnswer: gave up",
        ],
        0.9,
        false,
    );

    let answer = f.session.ask("calculate something").await;
    assert_eq!(answer, "gave up");
    assert!(f.provider.prompts()[1].contains("not valid JSON"));
}

#[tokio::test]
async fn web_tier_runs_when_local_answer_is_insufficient() {
    let mut f = fixture(
        &[
            "Thought: no idea\nAnswer: I don't know",
            "The web says it is 42.",
        ],
        0.9,
        true,
    );

    let answer = f.session.ask("what is the answer?").await;
    assert_eq!(answer, format!("{WEB_ANSWER_NOTE}The web says it is 42."));
}

#[tokio::test]
async fn general_tier_runs_when_web_tier_is_also_insufficient() {
    let mut f = fixture(
        &[
            "Answer: I don't know",
            "I don't know",
            "It is 42.",
        ],
        0.9,
        true,
    );

    let answer = f.session.ask("what is the answer?").await;
    assert_eq!(answer, format!("{GENERAL_ANSWER_NOTE}It is 42."));
}

#[tokio::test]
async fn general_tier_runs_directly_without_web_search() {
    let mut f = fixture(&["Answer: I don't know", "It is 42."], 0.9, false);

    let answer = f.session.ask("what is the answer?").await;
    assert_eq!(answer, format!("{GENERAL_ANSWER_NOTE}It is 42."));
}

#[tokio::test]
async fn unreachable_model_degrades_to_fixed_message() {
    let provider = ScriptedProvider::unavailable();
    let mut f = fixture_with(provider, 0.9, false, 20);

    let answer = f.session.ask("anything").await;
    assert_eq!(answer, SERVICE_UNAVAILABLE_MESSAGE);
}

#[tokio::test]
async fn irrelevant_history_is_withheld_from_the_loop() {
    let mut f = fixture(
        &[
            // First turn: plain answer (memory is empty, no relevance check).
            "Answer: Bonds are debt instruments.",
            // Second turn: relevance check says no, then the loop answers.
            "no",
            "Answer: The weather is sunny.",
        ],
        0.9,
        false,
    );

    f.session.ask("What is a bond?").await;
    f.session.ask("What's the weather?").await;

    let prompts = f.provider.prompts();
    // Prompt 1 is the relevance question, prompt 2 the loop prompt.
    assert!(prompts[1].contains("'yes' or 'no'"));
    assert!(prompts[2].contains(NO_HISTORY));
    assert!(!prompts[2].contains("User: What is a bond?"));
}

#[tokio::test]
async fn relevant_history_is_passed_to_the_loop() {
    let mut f = fixture(
        &[
            "Answer: Bonds are debt instruments.",
            "yes",
            "Answer: Stocks are equity.",
        ],
        0.9,
        false,
    );

    f.session.ask("What is a bond?").await;
    f.session.ask("And a stock?").await;

    let prompts = f.provider.prompts();
    assert!(prompts[2].contains("User: What is a bond?"));
    assert!(prompts[2].contains("Assistant: Bonds are debt instruments."));
}

#[tokio::test]
async fn iteration_cap_forces_a_final_answer() {
    let provider = ScriptedProvider::new(&[
        "Thought: searching\nAction: local_search\nAction Input: {\"query\": \"a\"}",
        "Answer: best effort",
    ]);
    let mut f = fixture_with(provider, 0.9, false, 1);

    let answer = f.session.ask("hard question").await;
    assert_eq!(answer, "best effort");

    let prompts = f.provider.prompts();
    assert!(prompts[1].contains("No more tool calls are allowed"));
}

#[tokio::test]
async fn unknown_tool_name_becomes_an_observation() {
    let mut f = fixture(
        &[
            "Thought: hm\nAction: database_query\nAction Input: {}",
            "Answer: ok",
        ],
        0.9,
        false,
    );

    f.session.ask("question").await;
    assert!(f.provider.prompts()[1].contains("unknown tool 'database_query'"));
}
