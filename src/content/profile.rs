use crate::content::{json, lenient, truncate_chars};
use crate::generation::TextGenerator;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{instrument, warn};

const MAX_SITE_TEXT: usize = 8000;

const SYSTEM: &str = "You are a structured JSON data extractor.";

/// Structured summary of the target business, used as context by every
/// downstream stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CompanyProfile {
    #[serde(default, deserialize_with = "lenient::string")]
    pub company_name: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub industry: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub main_products_services: Vec<String>,
    #[serde(default, deserialize_with = "lenient::string")]
    pub target_audience: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub tone: String,
    #[serde(default, deserialize_with = "lenient::string_list")]
    pub keywords: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CompanyProfile {
    /// Interpret a parsed model response. `None` when there is nothing usable.
    pub fn from_value(value: Value) -> Option<Self> {
        let profile = match value {
            Value::Null => return None,
            Value::Object(map) => {
                let object = Value::Object(map);
                match serde_json::from_value::<Self>(object.clone()) {
                    Ok(profile) => profile,
                    Err(e) => {
                        warn!("company profile did not match the expected shape: {}", e);
                        Self::unparsed(object.to_string())
                    }
                }
            }
            Value::String(s) => Self::unparsed(s),
            other => Self::unparsed(other.to_string()),
        };
        (!profile.is_empty()).then_some(profile)
    }

    fn unparsed(raw: String) -> Self {
        let mut extra = Map::new();
        extra.insert(json::UNPARSED_KEY.to_string(), Value::String(raw));
        Self {
            extra,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.company_name.is_empty()
            && self.industry.is_empty()
            && self.main_products_services.is_empty()
            && self.target_audience.is_empty()
            && self.tone.is_empty()
            && self.keywords.is_empty()
            && self.extra.values().all(|v| match v {
                Value::Null => true,
                Value::String(s) => s.trim().is_empty(),
                _ => false,
            })
    }

    /// True when the model response could not be parsed and only the raw
    /// text was kept.
    pub fn is_unparsed(&self) -> bool {
        self.extra.contains_key(json::UNPARSED_KEY) && self.company_name.is_empty()
    }

    /// Pretty JSON for embedding in prompts.
    pub fn to_prompt_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}

/// Summarize combined site text into a company profile.
///
/// `None` when the backend fails or returns nothing usable.
#[instrument(skip(generator, site_text))]
pub async fn summarize_company(
    generator: &dyn TextGenerator,
    site_text: &str,
    base_url: &str,
) -> Option<CompanyProfile> {
    let prompt = format!(
        "You are a business analyst.
Summarize the company from the following website text. If the company name isn't explicit, infer it from the title/meta.
Website: {base_url}
Return ONLY valid JSON with keys:
- company_name
- industry
- main_products_services (array)
- target_audience
- tone
- keywords (array)

Website text (truncated to {MAX_SITE_TEXT} chars):
{}
",
        truncate_chars(site_text, MAX_SITE_TEXT)
    );

    let raw = match generator.complete(SYSTEM, &prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("company summary generation failed for {}: {}", base_url, e);
            return None;
        }
    };

    let profile = CompanyProfile::from_value(json::parse_structured(&raw));
    if profile.as_ref().is_some_and(CompanyProfile::is_unparsed) {
        warn!("company summary for {} was not valid JSON; keeping raw output", base_url);
    }
    profile
}
