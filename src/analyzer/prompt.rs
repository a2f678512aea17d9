//! Classification prompt.

use super::playbook::playbook_summary;
use crate::config::AnalysisConfig;

const RESPONSE_SCHEMA: &str = r#"{
    "summary": "2-3 sentence executive summary of the change/news",
    "signal_type": "one of: product_launch, pricing_change, feature_update, partnership, acquisition, leadership_change, marketing_campaign, certification, expansion, regulatory, other",
    "risk_level": "one of: critical, high, medium, low, info",
    "risk_score": "0-100 integer, where 100 is highest risk to us",
    "confidence_score": "0-100 integer, your confidence in this analysis",
    "relevance": "Explain specifically how this impacts our business",
    "key_details": ["list", "of", "important", "specific", "details"],
    "assumptions": ["list", "of", "assumptions", "you", "made"],
    "recommended_playbook": "name of the most appropriate playbook from the list above",
    "immediate_actions": [
        {"action": "specific action to take", "owner": "team/role", "priority": "high/medium/low", "rationale": "why this matters"}
    ],
    "questions_to_answer": ["list", "of", "questions", "that", "need", "investigation"],
    "monitoring_recommendations": "What should we continue to watch for?"
}"#;

/// Build the prompt asking the model to classify `content`.
pub fn analysis_prompt(
    config: &AnalysisConfig,
    content: &str,
    competitor_name: &str,
    source_type: &str,
    additional_context: Option<&str>,
) -> String {
    let company = &config.company_name;
    let additional = additional_context
        .map(|c| format!("## ADDITIONAL CONTEXT\n{c}\n\n"))
        .unwrap_or_default();

    format!(
        "You are a competitive intelligence analyst for {company}.\n\
         Analyze the following {source_type} from competitor \"{competitor_name}\" and provide \
         actionable intelligence.\n\n\
         ## COMPANY CONTEXT\n{context}\n\n\
         ## CONTENT TO ANALYZE\n{content}\n\n\
         {additional}\
         ## AVAILABLE RESPONSE PLAYBOOKS\n{playbooks}\n\n\
         ## YOUR TASK\n\
         Analyze this content and provide a structured assessment. Be specific and actionable.\n\n\
         ## PRIORITY GUIDANCE\n\
         - Partnership signals should generally be rated HIGH risk (risk_score 65-85) as they can \
         significantly alter competitive dynamics\n\
         - Partnerships with major tech companies (Microsoft, Google, Amazon, Siemens, Schneider \
         Electric, etc.) should be rated HIGH (risk_score 75-90)\n\
         - Partnerships with industry leaders or Fortune 500 companies warrant HIGH priority\n\
         - Only rate partnerships as CRITICAL (risk_score 85+) if they directly threaten \
         {company}'s core markets or involve exclusive deals\n\
         - Smaller partnerships with regional distributors or niche players can remain MEDIUM \
         (risk_score 45-65)\n\n\
         Respond with a JSON object containing:\n{RESPONSE_SCHEMA}\n\n\
         Be concise but thorough. Focus on actionable intelligence.",
        context = config.company_context,
        playbooks = playbook_summary(),
    )
}
