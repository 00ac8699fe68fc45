use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use legal_lens::analysis::{
    AnalysisError, AnalysisPipeline, AnalysisPrompt, AnalysisResult, CompletionClient,
    EndpointError, KeyTerm, ModelEndpoint, RiskLevel, RiskyClause, TRUNCATION_MARKER,
};
use legal_lens::language::Language;

/// Replies per endpoint name and records every call in order.
#[derive(Debug, Default)]
struct ScriptedClient {
    replies: HashMap<String, Result<String, EndpointError>>,
    calls: Mutex<Vec<(String, AnalysisPrompt)>>,
}

impl ScriptedClient {
    fn reply(mut self, endpoint: &str, reply: Result<&str, EndpointError>) -> Self {
        self.replies
            .insert(endpoint.to_string(), reply.map(str::to_string));
        self
    }

    fn called(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn prompts(&self) -> Vec<AnalysisPrompt> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, prompt)| prompt.clone())
            .collect()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        endpoint: &ModelEndpoint,
        prompt: &AnalysisPrompt,
    ) -> Result<String, EndpointError> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.name.clone(), prompt.clone()));
        self.replies
            .get(&endpoint.name)
            .cloned()
            .unwrap_or_else(|| Err(EndpointError::Transport("connection refused".to_string())))
    }
}

fn endpoints() -> Vec<ModelEndpoint> {
    ["flash-8b", "flash", "pro"]
        .into_iter()
        .map(|name| ModelEndpoint::new(name, format!("http://127.0.0.1:1/{name}:generateContent")))
        .collect()
}

fn pipeline(client: &Arc<ScriptedClient>) -> AnalysisPipeline {
    AnalysisPipeline::new(endpoints(), Arc::clone(client) as Arc<dyn CompletionClient>)
}

const LEASE: &str = "RENTAL AGREEMENT. This agreement is made on 1 June 2024 between \
                     Ravi Kumar (Owner) and Lakshmi Devi (Tenant). Monthly rent is Rs. 12,000, \
                     payable before the 5th. The deposit of Rs. 50,000 is non-refundable.";

const FULL_REPLY: &str = r#"{
  "documentType": "Rental Agreement between Ravi Kumar and Lakshmi Devi",
  "simpleSummary": "Lakshmi Devi rents from Ravi Kumar for Rs. 12,000 a month.",
  "keyTerms": [
    {"term": "Monthly rent", "explanation": "Rs. 12,000 due before the 5th"},
    {"term": "Deposit", "explanation": "Rs. 50,000 held by the owner"}
  ],
  "riskyClausesList": [
    {"clause": "The deposit is non-refundable", "risk": "You may never get Rs. 50,000 back"}
  ],
  "riskLevel": "HIGH",
  "recommendations": ["Ask for a refundable deposit", "Get a written receipt"]
}"#;

#[tokio::test]
async fn short_text_makes_no_calls() {
    let client = Arc::new(ScriptedClient::default().reply("flash-8b", Ok(FULL_REPLY)));

    let err = pipeline(&client)
        .analyze("0123456789", Language::English)
        .await
        .unwrap_err();

    assert_eq!(err, AnalysisError::TextTooShort { chars: 10, min: 50 });
    assert!(client.called().is_empty());
}

#[tokio::test]
async fn first_success_stops_the_walk() {
    let client = Arc::new(ScriptedClient::default().reply("flash-8b", Ok(FULL_REPLY)));

    let outcome = pipeline(&client).run(LEASE, Language::English).await.unwrap();

    assert_eq!(client.called(), ["flash-8b"]);
    assert_eq!(outcome.endpoint, "flash-8b");
    assert_eq!(outcome.result.risk_level, RiskLevel::High);
}

#[tokio::test]
async fn fully_populated_reply_round_trips() {
    let client = Arc::new(ScriptedClient::default().reply("flash-8b", Ok(FULL_REPLY)));

    let result = pipeline(&client).analyze(LEASE, Language::English).await.unwrap();

    assert_eq!(
        result,
        AnalysisResult {
            document_type: "Rental Agreement between Ravi Kumar and Lakshmi Devi".to_string(),
            simple_summary: "Lakshmi Devi rents from Ravi Kumar for Rs. 12,000 a month."
                .to_string(),
            key_terms: vec![
                KeyTerm {
                    term: "Monthly rent".to_string(),
                    explanation: "Rs. 12,000 due before the 5th".to_string(),
                },
                KeyTerm {
                    term: "Deposit".to_string(),
                    explanation: "Rs. 50,000 held by the owner".to_string(),
                },
            ],
            risky_clauses_list: vec![RiskyClause {
                clause: "The deposit is non-refundable".to_string(),
                risk: "You may never get Rs. 50,000 back".to_string(),
            }],
            risk_level: RiskLevel::High,
            recommendations: vec![
                "Ask for a refundable deposit".to_string(),
                "Get a written receipt".to_string(),
            ],
        }
    );
}

#[tokio::test]
async fn endpoints_are_tried_in_configured_order() {
    let client = Arc::new(
        ScriptedClient::default()
            .reply(
                "flash-8b",
                Err(EndpointError::Http {
                    status: 404,
                    message: "model not found".to_string(),
                }),
            )
            .reply("flash", Ok("I cannot help with that."))
            .reply("pro", Ok(FULL_REPLY)),
    );

    let outcome = pipeline(&client).run(LEASE, Language::English).await.unwrap();

    assert_eq!(client.called(), ["flash-8b", "flash", "pro"]);
    assert_eq!(outcome.endpoint, "pro");
    assert_eq!(outcome.attempts, 3);
}

#[tokio::test]
async fn prose_reply_falls_through_to_next_endpoint() {
    let client = Arc::new(
        ScriptedClient::default()
            .reply("flash-8b", Ok("Sure! Here is a summary of the lease in plain words."))
            .reply("flash", Ok(FULL_REPLY)),
    );

    let outcome = pipeline(&client).run(LEASE, Language::English).await.unwrap();

    assert_eq!(client.called(), ["flash-8b", "flash"]);
    assert_eq!(outcome.endpoint, "flash");
}

#[tokio::test]
async fn generic_document_type_is_skipped() {
    let client = Arc::new(
        ScriptedClient::default()
            .reply("flash-8b", Ok(r#"{"documentType": "Doc", "riskLevel": "LOW"}"#))
            .reply("flash", Ok(r#"{"simpleSummary": "No type at all"}"#))
            .reply("pro", Ok(FULL_REPLY)),
    );

    let outcome = pipeline(&client).run(LEASE, Language::English).await.unwrap();
    assert_eq!(outcome.endpoint, "pro");
}

#[tokio::test]
async fn all_rate_limited_reports_429() {
    let limited = || {
        Err(EndpointError::Http {
            status: 429,
            message: "Resource has been exhausted (e.g. check quota).".to_string(),
        })
    };
    let client = Arc::new(
        ScriptedClient::default()
            .reply("flash-8b", limited())
            .reply("flash", limited())
            .reply("pro", limited()),
    );

    let err = pipeline(&client)
        .analyze(LEASE, Language::English)
        .await
        .unwrap_err();

    assert_eq!(client.called().len(), 3);
    let AnalysisError::Exhausted {
        attempts,
        last_error,
    } = &err
    else {
        panic!("expected exhaustion, got {err:?}");
    };
    assert_eq!(*attempts, 3);
    assert!(last_error.contains("429"));
    assert!(err.to_string().starts_with("All models failed after 3 attempts"));
}

#[tokio::test]
async fn terminal_error_carries_the_last_endpoint_error() {
    let client = Arc::new(
        ScriptedClient::default()
            .reply(
                "flash-8b",
                Err(EndpointError::Http {
                    status: 500,
                    message: "internal".to_string(),
                }),
            )
            .reply("flash", Err(EndpointError::Blocked("SAFETY".to_string())))
            .reply("pro", Ok("no json here")),
    );

    let err = pipeline(&client)
        .analyze(LEASE, Language::English)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        AnalysisError::Exhausted {
            attempts: 3,
            last_error: EndpointError::NoJson.to_string(),
        }
    );
}

#[tokio::test]
async fn missing_fields_are_repaired() {
    let client = Arc::new(ScriptedClient::default().reply(
        "flash-8b",
        Ok(r#"```json
{"documentType": "Employment Offer Letter", "simpleSummary": "A job offer."}
```"#),
    ));

    let result = pipeline(&client).analyze(LEASE, Language::English).await.unwrap();

    assert_eq!(result.document_type, "Employment Offer Letter");
    assert_eq!(result.risk_level, RiskLevel::Medium);
    assert_eq!(result.key_terms[0].term, "Review Required");
    assert_eq!(result.risky_clauses_list[0].clause, "Full review needed");
    assert_eq!(result.recommendations, ["Consult a lawyer", "Read carefully"]);
}

#[tokio::test]
async fn long_text_is_truncated_identically_for_every_endpoint() {
    let client = Arc::new(ScriptedClient::default().reply("pro", Ok(FULL_REPLY)));
    let body: String = "क्लॉज़ ".repeat(3_000);
    assert!(body.chars().count() > 10_000);

    let outcome = pipeline(&client).run(&body, Language::Hindi).await.unwrap();
    assert!(outcome.truncated);

    let prompts = client.prompts();
    assert_eq!(prompts.len(), 3);
    assert!(prompts.windows(2).all(|w| w[0] == w[1]));

    let expected: String = body.chars().take(10_000).collect::<String>() + TRUNCATION_MARKER;
    assert_eq!(prompts[0].document(), expected);
    assert!(prompts[0].task().contains("Document Language: Hindi"));
}

#[tokio::test]
async fn custom_ceiling_applies() {
    let client = Arc::new(ScriptedClient::default().reply("flash-8b", Ok(FULL_REPLY)));
    let pipeline = pipeline(&client).with_max_chars(100);

    let outcome = pipeline.run(LEASE, Language::English).await.unwrap();

    assert!(outcome.truncated);
    assert!(client.prompts()[0].document().ends_with(TRUNCATION_MARKER));
}
