//! Simulated patient persona.
//!
//! A session starts by asking the model for a short life-event backstory, then
//! folds that backstory and the trainee-selected profile into the system prompt
//! that drives every patient reply.

use psyclinic_core::simulation::PatientProfile;

use crate::constants::MAX_TOKENS_BACKSTORY;
use crate::types::CompletionRequest;

/// Name the simulated patient introduces themselves with.
pub const PATIENT_NAME: &str = "Sai";

const BACKSTORY_SYSTEM_PROMPT: &str = "You are a clinical psychologist creating realistic patient backgrounds for therapy training simulations.

Your task:
- Generate 4-6 concise sentences about a significant life event
- Focus on realistic psychosocial stressors (job loss, relationship breakdown, isolation, loss, trauma)
- Be specific and humanizing
- Do NOT mention diagnosis or symptoms, only life events that preceded them";

pub fn backstory_request(profile: &PatientProfile) -> CompletionRequest {
    let message = format!(
        "{}yo {} {} with {}. What happened?",
        profile.age, profile.gender, profile.working_domain, profile.diseases
    );
    CompletionRequest::single(BACKSTORY_SYSTEM_PROMPT, message, MAX_TOKENS_BACKSTORY)
}

/// Used when the backstory call fails.
pub fn fallback_backstory(profile: &PatientProfile) -> String {
    format!("Trauma from {}.", profile.primary_condition())
}

pub fn build_persona_prompt(profile: &PatientProfile, backstory: &str) -> String {
    format!(
        r#"You are {name}, a {age}-year-old {gender} {ethnicity} {domain} in therapy.

BACKGROUND: Living with {diseases}. {backstory}

ABSOLUTE RULE: OUTPUT ONLY SPOKEN WORDS

If your response contains ANY of these, you have FAILED:
- asterisks: *sighs*
- action verbs: pauses, looks, shifts, fidgets
- physical descriptions: nervously, looking down
- stage directions of any kind

Your response must be PURE DIALOGUE that could be spoken aloud naturally.

TEST: Could someone read your exact response out loud in a conversation?
- If YES: correct
- If NO (because it has actions/descriptions): wrong, try again

RESPONSE STYLE:
- 1-3 sentences, under 50 words
- Use verbal hesitations: "I mean...", "Maybe...", "I guess..."
- Show emotion through WORDS not actions
- Stay in character as vulnerable patient
- Never give advice or analyze like a therapist
- If you don't know how to respond, say: "I'm not sure how to answer that..."

CORRECT RESPONSES (spoken words only):
"I don't know. Everything just feels wrong lately."
"I... I'm not sure I can explain it. It's just hard."
"Maybe? I want to believe that, but..."

INCORRECT (has actions - DO NOT DO THIS):
"*sighs* I don't know."
"I... pauses ...I'm not sure."
"nervously Maybe?"

Begin speaking as the patient. DIALOGUE ONLY."#,
        name = PATIENT_NAME,
        age = profile.age,
        gender = profile.gender,
        ethnicity = profile.ethnicity,
        domain = profile.working_domain,
        diseases = profile.diseases,
        backstory = backstory.trim(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> PatientProfile {
        PatientProfile {
            age: 34,
            ethnicity: "Tamil".into(),
            diseases: "generalized anxiety, insomnia".into(),
            working_domain: "nurse".into(),
            gender: "female".into(),
            session_duration: 30,
        }
    }

    #[test]
    fn backstory_request_describes_profile() {
        let request = backstory_request(&profile());
        assert_eq!(request.max_tokens, 1000);
        assert_eq!(request.messages.len(), 1);
        assert_eq!(
            request.messages[0].content,
            "34yo female nurse with generalized anxiety, insomnia. What happened?"
        );
        assert!(request.system.contains("Do NOT mention diagnosis"));
    }

    #[test]
    fn fallback_uses_primary_condition() {
        assert_eq!(fallback_backstory(&profile()), "Trauma from generalized anxiety.");
    }

    #[test]
    fn persona_embeds_profile_and_backstory() {
        let prompt = build_persona_prompt(&profile(), "  Lost her mother last spring.\n");
        assert!(prompt.starts_with("You are Sai, a 34-year-old female Tamil nurse in therapy."));
        assert!(prompt.contains(
            "BACKGROUND: Living with generalized anxiety, insomnia. Lost her mother last spring."
        ));
        assert!(prompt.ends_with("DIALOGUE ONLY."));
    }
}
