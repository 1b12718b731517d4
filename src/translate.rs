//! Natural-language query → [`StructuredFilter`] translation.
//!
//! The translator is the single validation gate between the untrusted model
//! output and typed code:
//!
//! ```text
//! user query ─▶ build_prompt ─▶ LanguageModel ─▶ sanitize ─▶ StructuredFilter::from_json
//! ```
//!
//! Any failure along the way surfaces as one [`TranslationFailed`] carrying
//! the root cause.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::TranslationFailed;
use crate::filter::StructuredFilter;
use crate::llm::LanguageModel;
use crate::sanitize::sanitize;

/// Sampling temperature for translation requests.
///
/// Zero biases the model toward repeatable, schema-shaped output. It does
/// not guarantee either; the output is still sanitized and validated.
pub const TRANSLATION_TEMPERATURE: f32 = 0.0;

const PROMPT_TEMPLATE: &str = r#"You are an API that converts natural language into product filters.
Return ONLY valid JSON.

Schema:
{
  "name": {"contains": [string]},
  "description": {"contains": [string]},
  "quantity": {"lt": number, "gt": number},
  "price": {"lt": number, "gt": number}
}

Rules:
- If user mentions product name similarity, use name.contains with array of relevant terms
- If user mentions description/meaning/related/like/similar, use description.contains with array of relevant terms
- If user mentions quantity, use quantity.lt and/or quantity.gt
- If user mentions price, use price.lt and/or price.gt
- If unsure about name or description add them in both fields
- If something is not mentioned, omit it
- Do not add any extra keys
- Do not add explanations

User: "#;

/// Build the instruction prompt for `user_query`.
///
/// Pure and deterministic: the same query always yields the same prompt.
pub fn build_prompt(user_query: &str) -> String {
    let mut prompt = String::with_capacity(PROMPT_TEMPLATE.len() + user_query.len());
    prompt.push_str(PROMPT_TEMPLATE);
    prompt.push_str(user_query);
    prompt
}

/// Every intermediate stage of one translation, for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct Translation {
    /// Completion text exactly as the model returned it.
    pub raw: String,
    /// Merged JSON object recovered by the sanitizer.
    pub sanitized: Map<String, Value>,
    /// The validated filter.
    pub filter: StructuredFilter,
}

/// Turns free-text queries into validated filters using a language model.
#[derive(Clone)]
pub struct FilterTranslator {
    model: Arc<dyn LanguageModel>,
}

impl FilterTranslator {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    pub fn model(&self) -> &Arc<dyn LanguageModel> {
        &self.model
    }

    /// Translate `user_query` into a [`StructuredFilter`].
    pub async fn translate(&self, user_query: &str) -> Result<StructuredFilter, TranslationFailed> {
        Ok(self.translate_verbose(user_query).await?.filter)
    }

    /// Like [`translate`](Self::translate), but keeps the raw completion and
    /// sanitized JSON alongside the filter.
    pub async fn translate_verbose(
        &self,
        user_query: &str,
    ) -> Result<Translation, TranslationFailed> {
        let prompt = build_prompt(user_query);

        let raw = self
            .model
            .complete(&prompt, TRANSLATION_TEMPERATURE)
            .await?;
        debug!(model = %self.model.model_name(), raw = %raw, "model completion");

        let sanitized = sanitize(&raw)?;
        let filter = StructuredFilter::from_json(sanitized.clone())?;

        Ok(Translation {
            raw,
            sanitized,
            filter,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::error::ModelInvocationError;
    use crate::llm::LanguageModel;

    /// A model that returns a fixed completion and records the prompts it saw.
    pub struct ScriptedModel {
        reply: Result<String, fn() -> ModelInvocationError>,
        pub prompts: Mutex<Vec<(String, f32)>>,
    }

    impl ScriptedModel {
        pub fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(err: fn() -> ModelInvocationError) -> Self {
            Self {
                reply: Err(err),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for ScriptedModel {
        fn model_name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            prompt: &str,
            temperature: f32,
        ) -> Result<String, ModelInvocationError> {
            self.prompts
                .lock()
                .unwrap()
                .push((prompt.to_string(), temperature));
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(make) => Err(make()),
            }
        }
    }
}
