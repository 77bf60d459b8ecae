/// Analyst prompt asking how the enabling component can progress the
/// dependent one.
pub fn recommendation_prompt(enabling: &str, dependent: &str) -> String {
    format!(
        "You are a policy analyst generating rich, strategic recommendations for the USDA \
Wildlife Services Nonlethal Initiative (WS NLI).
Given the following context:

Enabling Component Description:
\"{enabling}\"

Dependent Component Description:
\"{dependent}\"

Generate a unique, insightful recommendation explaining how the Enabling Component can \
progress the Dependent Component.
Focus on strategic clarity, stakeholder value, and alignment with broader WS NLI goals.
Avoid generic or vague language.
"
    )
}
