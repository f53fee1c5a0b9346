//! Chat responder: composes the canned table, the rule engine, and the
//! optional LLM delegate into one reply surface.
//!
//! The LLM path is a single attempt; any failure falls back to the rule
//! engine. PII filtering and rate limiting are applied by the orchestrator
//! before either path runs.

use serde::Serialize;
use tracing::warn;

use neuroscan_core::TopPrediction;

use crate::canned::CannedQa;
use crate::llm::{LlmClient, LlmError};
use crate::rules;

/// Fixed reply when a session exceeds its per-minute chat rate limit.
pub const RATE_LIMITED_REPLY: &str = "Rate limit exceeded. Please try again later.";

const CHAT_MAX_TOKENS: u32 = 500;
const CHAT_TEMPERATURE: f32 = 0.3;
const EXPLANATION_MAX_TOKENS: u32 = 200;
const EXPLANATION_TEMPERATURE: f32 = 0.2;

const CHAT_SYSTEM_PROMPT: &str = "You are a knowledgeable medical assistant helping users \
    understand their brain MRI analysis. You have access to a model prediction about a brain \
    tumor. Provide accurate, helpful information about the predicted tumor type, associated \
    symptoms, general treatment approaches, the confidence level, medical terms, and next steps. \
    IMPORTANT SAFETY RULES: \
    1. Do NOT provide medical diagnoses or definitive clinical advice. \
    2. Always recommend consulting with a qualified neurologist or radiologist for final \
    decisions. \
    3. If asked for medical advice beyond the prediction, redirect to healthcare professionals. \
    4. Do NOT present this as a replacement for professional medical evaluation. \
    5. Be compassionate and non-alarming in your tone. \
    6. Respond in the same language as the user's question. \
    7. Always emphasize that this is model output, not professional diagnosis.";

const EXPLANATION_SYSTEM_PROMPT: &str = "You are a careful assistant that summarizes and \
    explains model outputs. NEVER give medical diagnoses. Always include a disclaimer and \
    recommend consulting a licensed medical professional.";

/// Follow-up questions answered at predict time.
const SUGGESTED_QUESTIONS: &[&str] = &[
    "What does this result mean?",
    "How confident is the model in this result?",
    "What are safe next steps?",
    "What symptoms or signs are associated with this tumor type?",
];

/// One suggested question with its answer.
#[derive(Debug, Clone, Serialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
}

pub struct ChatResponder {
    canned: CannedQa,
    llm: Option<LlmClient>,
}

impl ChatResponder {
    pub fn new(canned: CannedQa, llm: Option<LlmClient>) -> Self {
        Self { canned, llm }
    }

    pub fn llm_enabled(&self) -> bool {
        self.llm.is_some()
    }

    /// Canned answer for the message, when one matches.
    pub fn canned_reply(&self, message: &str) -> Option<&str> {
        self.canned.lookup(message)
    }

    /// Answer via the LLM when configured, falling back to the rule engine
    /// on any failure. Single attempt, no retry loop.
    pub async fn reply(
        &self,
        message: &str,
        last_prediction: Option<&str>,
        last_confidence: Option<f64>,
    ) -> String {
        if let Some(llm) = &self.llm {
            match self
                .llm_reply(llm, message, last_prediction, last_confidence)
                .await
            {
                Ok(reply) => return reply,
                Err(err) => warn!(%err, "LLM call failed, falling back to rule-based reply"),
            }
        }
        rules::rule_based_reply(message, last_prediction, last_confidence)
    }

    async fn llm_reply(
        &self,
        llm: &LlmClient,
        message: &str,
        last_prediction: Option<&str>,
        last_confidence: Option<f64>,
    ) -> Result<String, LlmError> {
        let context = prediction_context(last_prediction, last_confidence);
        let user = format!("{context}\n\nUser's question: {message}");
        let reply = llm
            .complete(CHAT_SYSTEM_PROMPT, &user, CHAT_MAX_TOKENS, CHAT_TEMPERATURE)
            .await?;
        Ok(ensure_disclaimer(reply))
    }

    /// Plain-language, non-diagnostic explanation of a prediction.
    pub async fn explanation(
        &self,
        label: &str,
        confidence: f64,
        top_k: &[TopPrediction],
    ) -> String {
        if let Some(llm) = &self.llm {
            let user = explanation_prompt(label, confidence, top_k);
            match llm
                .complete(
                    EXPLANATION_SYSTEM_PROMPT,
                    &user,
                    EXPLANATION_MAX_TOKENS,
                    EXPLANATION_TEMPERATURE,
                )
                .await
            {
                Ok(text) => return text,
                Err(err) => warn!(%err, "LLM explanation failed, using rule-based text"),
            }
        }
        rules::rule_explanation(label, confidence)
    }

    /// Suggested follow-up Q&A pairs for a fresh prediction.
    pub async fn suggested_qa(&self, label: &str, confidence: f64) -> Vec<QaPair> {
        let mut out = Vec::with_capacity(SUGGESTED_QUESTIONS.len());
        for question in SUGGESTED_QUESTIONS {
            let answer = if self.llm_enabled() {
                let contextual =
                    format!("{question} Context: prediction {label} (confidence {confidence:.2}).");
                self.reply(&contextual, Some(label), Some(confidence)).await
            } else {
                rules::rule_based_reply(question, Some(label), Some(confidence))
            };
            out.push(QaPair {
                question: question.to_string(),
                answer,
            });
        }
        out
    }
}

/// Context block describing the stored prediction for the LLM.
fn prediction_context(last_prediction: Option<&str>, last_confidence: Option<f64>) -> String {
    match (last_prediction, last_confidence) {
        (Some(pred), Some(conf)) => {
            let conf_percent = conf * 100.0;
            let interpretation = if conf_percent >= 80.0 {
                "High confidence prediction"
            } else if conf_percent >= 50.0 {
                "Moderate confidence prediction"
            } else {
                "Lower confidence - professional evaluation recommended"
            };
            format!(
                "CURRENT PREDICTION CONTEXT:\n\
                 - Model Prediction: {pred}\n\
                 - Confidence Score: {conf_percent:.1}%\n\
                 - Confidence Interpretation: {interpretation}\n\n\
                 The user is asking questions about their brain MRI analysis. Provide helpful, \
                 accurate information related to their prediction. Always remind them that this \
                 is a model assessment and professional medical evaluation is essential."
            )
        }
        _ => "The user hasn't uploaded a brain MRI image yet or the image was invalid. Direct \
              them to upload a valid scan first."
            .to_string(),
    }
}

/// Prompt for the short predict-time explanation.
fn explanation_prompt(label: &str, confidence: f64, top_k: &[TopPrediction]) -> String {
    let mut context = String::from("Top predictions:");
    for entry in top_k {
        context.push_str(&format!("\n- {}: {:.3}", entry.label, entry.probability));
    }
    format!(
        "You are an assistant that explains the output of an image classification model for \
         educational purposes. You MUST NOT provide medical diagnoses or definitive clinical \
         advice. Include a clear disclaimer recommending consultation with a clinician. Keep the \
         language non-technical and concise (2-3 sentences).\n\n\
         Model label: {label}, confidence: {confidence:.3}.\n\
         {context}\n\n\
         Write a short, non-diagnostic explanation of what this model output may indicate and \
         safe next steps (e.g., consult a radiologist, consider follow-up imaging)."
    )
}

/// Append the safety disclaimer when the reply lacks one.
fn ensure_disclaimer(reply: String) -> String {
    let lower = reply.to_lowercase();
    if lower.contains("consult") || lower.contains("professional") {
        reply
    } else {
        format!(
            "{reply}\n\nPlease consult a qualified medical professional for definitive diagnosis \
             and treatment recommendations."
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn responder() -> ChatResponder {
        ChatResponder::new(CannedQa::builtin(), None)
    }

    #[tokio::test]
    async fn reply_without_llm_uses_rules() {
        let r = responder();
        let reply = r.reply("hello", None, None).await;
        assert!(reply.starts_with("No prediction available yet"));
    }

    #[test]
    fn canned_short_circuit_matches_regardless_of_prediction() {
        let r = responder();
        assert!(r.canned_reply("What is this?").is_some());
        assert!(r.canned_reply("something unrelated entirely").is_none());
    }

    #[tokio::test]
    async fn suggested_qa_answers_every_question() {
        let r = responder();
        let qa = r.suggested_qa("glioma_tumor", 0.9).await;
        assert_eq!(qa.len(), 4);
        assert!(qa.iter().all(|pair| !pair.answer.is_empty()));
        assert_eq!(qa[0].question, "What does this result mean?");
    }

    #[test]
    fn disclaimer_appended_only_when_missing() {
        let appended = ensure_disclaimer("The tumor looks small.".to_string());
        assert!(appended.contains("consult a qualified medical professional"));

        let original = "Please consult your radiologist.".to_string();
        assert_eq!(ensure_disclaimer(original.clone()), original);
    }

    #[test]
    fn prediction_context_tiers_confidence() {
        let high = prediction_context(Some("glioma_tumor"), Some(0.9));
        assert!(high.contains("High confidence"));
        let low = prediction_context(Some("glioma_tumor"), Some(0.2));
        assert!(low.contains("Lower confidence"));
        let none = prediction_context(None, None);
        assert!(none.contains("upload a valid scan"));
    }

    #[test]
    fn explanation_prompt_lists_top_k() {
        let top_k = vec![
            TopPrediction {
                label: "glioma".into(),
                probability: 0.7,
            },
            TopPrediction {
                label: "no_tumor".into(),
                probability: 0.3,
            },
        ];
        let prompt = explanation_prompt("glioma", 0.7, &top_k);
        assert!(prompt.contains("- glioma: 0.700"));
        assert!(prompt.contains("- no_tumor: 0.300"));
    }

    #[tokio::test]
    async fn explanation_without_llm_is_rule_based() {
        let r = responder();
        let text = r.explanation("glioma_tumor", 0.8, &[]).await;
        assert!(text.contains("glioma_tumor"));
        assert!(text.contains("consult"));
    }
}
