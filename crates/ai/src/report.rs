//! Clinical supervision competency report.
//!
//! The rubric is kept as data so the prompt, the level bands and any future
//! structured scoring read from the same source.

use std::fmt::{self, Write as _};

use crate::constants::{MAX_TOKENS_REPORT, REPORT_SYSTEM_PROMPT, REPORT_TRANSCRIPT_MAX_CHARS};
use crate::types::CompletionRequest;

/// One rubric row: what it measures, what to look for, and the 1-5 anchors.
#[derive(Debug, Clone, Copy)]
pub struct Competency {
    pub name: &'static str,
    pub measures: &'static str,
    pub indicators: &'static str,
    pub anchors: [&'static str; 5],
}

pub const RATING_SCALE: [(&str, &str); 5] = [
    (
        "Needs major improvement / missing skill",
        "Frequently omits skill, errors, client safety/rapport compromised",
    ),
    (
        "Emerging skill, inconsistent, needs support",
        "Attempts skill but inconsistent, needs prompting, misses key pieces",
    ),
    (
        "Meets expected level for role",
        "Performs skill reliably, occasional gaps that do not affect therapy",
    ),
    (
        "Strong skill, mostly independent",
        "Consistently effective, anticipates needs, minimal supervisor input",
    ),
    (
        "Advanced mastery, highly consistent, models skill",
        "Models skill, flexible + fluent application, enhances therapy process",
    ),
];

pub const COMPETENCIES: [Competency; 15] = [
    Competency {
        name: "Rapport & Alliance",
        measures: "Trust, safety, therapeutic relationship",
        indicators: "Greets warmly; uses client's name; maintains gentle tone; shows respect; checks comfort; collaborative stance; maintains non-judgment; attuned responses",
        anchors: [
            "Flat/tense tone, avoids eye contact, appears distracted, client guarded",
            "Basic warmth but inconsistent attunement, forced or rehearsed rapport",
            "Warm, respectful, open body language, client comfortable",
            "Highly attuned, repairs ruptures, creates strong comfort quickly",
            "Deep trust evident, client highly engaged, strong safe therapeutic bond",
        ],
    },
    Competency {
        name: "Empathic Communication",
        measures: "Emotional attunement & reflection",
        indicators: "Reflects feelings accurately; uses validating language; pauses to understand; notices non-verbals; responds to emotion not only content",
        anchors: [
            "Interrupts client, dismisses emotion, focuses only on content",
            "Attempts reflection but inaccurate/robotic, misses emotional cues",
            "Reflects emotion + content accurately, validates client",
            "Picks nuanced emotional layers, uses silence effectively",
            "Deeply attuned, facilitates emotional insight naturally",
        ],
    },
    Competency {
        name: "Boundaries & Ethics",
        measures: "Professional conduct",
        indicators: "Keeps time; avoids dual relationships; appropriate self-disclosure; maintains confidentiality; avoids over-involvement",
        anchors: [
            "Blurred boundaries, inappropriate disclosure, time violations",
            "Understands boundaries but inconsistent adherence",
            "Maintains limits, confidentiality, professional tone",
            "Proactively manages boundaries, transparent ethical stance",
            "Models ethical professionalism, addresses boundary concerns immediately",
        ],
    },
    Competency {
        name: "Session Structure & Flow",
        measures: "Organizing and holding space",
        indicators: "Sets agenda; reviews goals; manages transitions; tracks time; summarizes; avoids tangents; provides closure",
        anchors: [
            "No structure, loses focus, poor time management",
            "Attempted structure, frequent redirection needed",
            "Agenda set, pacing adequate, session ends with brief plan",
            "Clear flow, smooth transitions, grounded closure",
            "Highly strategic flow, anticipates pacing, session feels purposeful + contained",
        ],
    },
    Competency {
        name: "Assessment & Questioning",
        measures: "Information gathering",
        indicators: "Balanced open/closed questions; clarifies unclear points; explores symptoms thoroughly; uses probing when appropriate; avoids leading questions",
        anchors: [
            "Superficial questions, misses core information, leading questions",
            "Gathers info but disorganized or over-reliant on closed questions",
            "Functional, clinically relevant questioning, adequate depth",
            "Systematic, thorough, responsive probing",
            "Advanced interview skill; integrates observation + nuance seamlessly",
        ],
    },
    Competency {
        name: "Case Conceptualization",
        measures: "Clinical meaning-making",
        indicators: "Identifies themes/patterns; links thoughts-emotions-behavior; integrates background; hypotheses grounded in theory; adjusts conceptualization as info emerges",
        anchors: [
            "No clear framework, inaccurate interpretations",
            "Basic understanding, struggles to link symptoms & theory",
            "Logical, theory-guided, links T-E-B patterns",
            "Dynamic formulation, integrates new information fluidly",
            "Highly coherent formulation guiding elegant intervention choices",
        ],
    },
    Competency {
        name: "Goal-Setting & Treatment Planning",
        measures: "Direction & alignment",
        indicators: "Co-creates goals; goals measurable; aligns interventions to goals; checks client consent on direction; revisits progress",
        anchors: [
            "No goals, vague direction",
            "Sets goals but not measurable, therapist-led",
            "Collaborative measurable goals, aligned with client needs",
            "Tracks progress, adapts goals, strong client agency",
            "Client deeply engaged, goals integrated naturally, ongoing evaluation",
        ],
    },
    Competency {
        name: "Intervention Skills",
        measures: "Proper technique use",
        indicators: "Chooses evidence-based tools; explains rationale; checks understanding; applies skill correctly; tailors to client; observes readiness",
        anchors: [
            "Incorrect/unsafe interventions, no rationale",
            "Attempts techniques but mechanical or mismatched",
            "Correct technique, clear rationale, appropriate timing",
            "Fluent technique use, adjusts to client readiness",
            "Seamless, creative application, high client response",
        ],
    },
    Competency {
        name: "Managing Resistance & Affect",
        measures: "Handling distress, avoidance, conflict",
        indicators: "Names emotions gently; normalizes protective defenses; uses de-escalation; slows pace when overwhelmed; maintains calm presence",
        anchors: [
            "Avoids emotional distress, escalates conflict",
            "Notices discomfort but unsure how to respond",
            "Names emotions, slows pace, normalizes reaction",
            "Skillfully holds intense affect, gentle de-escalation",
            "Resolves ruptures smoothly, builds insight through emotion",
        ],
    },
    Competency {
        name: "Cultural Sensitivity",
        measures: "Inclusivity & cultural awareness",
        indicators: "Uses inclusive language; avoids assumptions; invites client's cultural meaning; adapts interventions when culture relevant",
        anchors: [
            "Stereotypes or assumptions, cultural blind spots",
            "Awareness present but unsure how to apply",
            "Respectful, asks cultural meaning, avoids assumptions",
            "Culturally attuned adaptation of interventions",
            "Deep cultural humility, integrates context effortlessly",
        ],
    },
    Competency {
        name: "Ethical Practice",
        measures: "Safety, informed consent, documentation",
        indicators: "Introduces confidentiality & limits; safety questions when needed; reports risks; maintains clinical records accurately",
        anchors: [
            "Ethical breaches, confidentiality lapses",
            "Basic ethics but misses risk screening or forgets boundaries",
            "Follows ethical guidelines, informed consent routine",
            "Identifies ethical dilemmas early, consults when needed",
            "Ethical leader; prevents risk, educates clients, excellent judgement",
        ],
    },
    Competency {
        name: "Clinical Judgment",
        measures: "Decision-making capacity",
        indicators: "Prioritizes presenting issues; identifies risk; knows scope; seeks supervision appropriately; avoids premature conclusions",
        anchors: [
            "Poor prioritization, unsafe decisions",
            "Understands basics but inconsistent judgement",
            "Prioritizes appropriately, recognizes risk cues",
            "Strong reasoning, anticipates challenges",
            "Excellent judgement, clinical intuition backed by theory",
        ],
    },
    Competency {
        name: "Documentation Quality",
        measures: "Professional note-taking",
        indicators: "Notes accurate, objective, timely; includes presenting concerns, interventions, observations, plan; follows format (SOAP/DAP)",
        anchors: [
            "Missing or unsafe notes, subjective, disorganized",
            "Notes incomplete or vague",
            "Clear, timely, objective notes following structure",
            "Detailed, concise, intervention-focused",
            "Model-level documentation: measurable outcomes, risk notation, clear plan",
        ],
    },
    Competency {
        name: "Reflective Practice",
        measures: "Insight & growth",
        indicators: "Recognizes limitations; self-evaluates; invites feedback; adjusts behavior; remarks on personal reactions",
        anchors: [
            "Defensive, unaware of limitations",
            "Acknowledges issues but limited insight or change",
            "Open to feedback, names growth areas",
            "Integrates feedback consistently",
            "Deep reflective capacity, uses insight proactively",
        ],
    },
    Competency {
        name: "Professionalism",
        measures: "Conduct & responsibility",
        indicators: "Punctual; prepared; respectful; follows through on tasks; maintains appropriate demeanor; appropriate attire",
        anchors: [
            "Unprepared, late, disorganized",
            "Inconsistently professional",
            "Reliable, timely, prepared",
            "Highly dependable, self-directed",
            "Professional role-model, consistently exceeds expectations",
        ],
    },
];

/// Overall level derived from the average competency score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompetencyLevel {
    NeedsRemediation,
    Emerging,
    Competent,
    Strong,
    Advanced,
}

impl CompetencyLevel {
    pub const ALL: [CompetencyLevel; 5] = [
        CompetencyLevel::NeedsRemediation,
        CompetencyLevel::Emerging,
        CompetencyLevel::Competent,
        CompetencyLevel::Strong,
        CompetencyLevel::Advanced,
    ];

    pub fn from_average(average: f64) -> Self {
        if average >= 5.0 {
            CompetencyLevel::Advanced
        } else if average >= 4.0 {
            CompetencyLevel::Strong
        } else if average >= 3.0 {
            CompetencyLevel::Competent
        } else if average >= 2.0 {
            CompetencyLevel::Emerging
        } else {
            CompetencyLevel::NeedsRemediation
        }
    }

    /// Inclusive score band as printed in the rubric.
    pub fn band(&self) -> &'static str {
        match self {
            CompetencyLevel::NeedsRemediation => "1.0 to 1.9",
            CompetencyLevel::Emerging => "2.0 to 2.9",
            CompetencyLevel::Competent => "3.0 to 3.9",
            CompetencyLevel::Strong => "4.0 to 4.9",
            CompetencyLevel::Advanced => "5.0",
        }
    }
}

impl fmt::Display for CompetencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CompetencyLevel::NeedsRemediation => "Needs Remediation",
            CompetencyLevel::Emerging => "Emerging",
            CompetencyLevel::Competent => "Competent",
            CompetencyLevel::Strong => "Strong",
            CompetencyLevel::Advanced => "Advanced",
        })
    }
}

/// Mean of the ratings rounded to one decimal place. `None` for no ratings.
pub fn average_score(ratings: &[u8]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: u32 = ratings.iter().map(|&r| u32::from(r)).sum();
    let mean = f64::from(sum) / ratings.len() as f64;
    Some((mean * 10.0).round() / 10.0)
}

/// Cut the transcript to the prompt allowance, on a character boundary.
pub fn truncate_transcript(transcript: &str) -> String {
    if transcript.chars().count() <= REPORT_TRANSCRIPT_MAX_CHARS {
        return transcript.to_string();
    }
    let cut: String = transcript.chars().take(REPORT_TRANSCRIPT_MAX_CHARS).collect();
    format!("{cut}...")
}

const REPORT_SECTIONS: &str = r#"REPORT SECTIONS TO COMPLETE

# Section 1: Overall Competency Summary
List all 15 competencies with their numerical ratings. Calculate and display the average competency score. State the overall level.

# Section 2: Strengths Demonstrated
At least 4 specific strengths, focused on scores of 4-5, in behavioral language with concrete examples.
Format: [Competency area]: [Specific observable behavior with concrete example]

# Section 3: Areas for Development
At least 3-4 specific areas, focused on scores of 1-2 (and 3s that need improvement), using growth-oriented language and saying how to improve.
Format: [Competency area]: [Specific skill gap with developmental recommendation]

# Section 4: Evidence / Supervisor Observations
Concrete examples drawn from the session (direct quotes or paraphrased behaviors with context, strengths AND gaps) for:
- Therapeutic Attunement
- Therapeutic Skills
- Professional Conduct
- Clinical Formulation
- Risk & Ethics

# Section 5: Training Goals for Next Placement / Month
2-3 SMART goals targeting the lowest-scoring competencies, each with: Goal, Target Behaviour / Skill, Timeline, Measure of Progress.

# Section 6: Action Plan
- Practice / assignment areas: 2-3 activities (homework, role-plays, practice scenarios)
- Required supervision focus: 2-3 priority topics
- Resources recommended: 2-4 readings, videos, training modules or shadowing opportunities matched to the development areas"#;

const FORMATTING_GUIDE: &str = r#"FORMATTING GUIDELINES (TAILWIND, DARK THEME)

Output HTML fragments styled only with Tailwind classes, no inline styles and no white backgrounds.
- Section headers (Section 1-6): <h1 class="text-2xl md:text-3xl font-bold text-transparent bg-clip-text bg-gradient-to-r from-cyan-400 to-purple-500 mb-6 pb-3 border-b-2 shadow-lg shadow-cyan-500/20">
- Sub-headers: <h3 class="text-xl font-semibold text-cyan-300 mt-8 mb-4 flex items-center gap-2"><i class="fas fa-circle text-cyan-400 text-xs"></i> ...</h3>
- Competency table: <div class="overflow-x-auto rounded-xl border border-cyan-400/20 bg-gradient-to-b from-white/5 to-white/2 backdrop-blur-sm"><table class="w-full text-sm md:text-base"> with header cells "text-left p-4 font-semibold text-cyan-300", rows "hover:bg-white/5 transition-colors", name cells "p-4 text-gray-200" and rating cells "p-4 text-center font-bold text-cyan-400"
- Average score and overall level box: <div class="mt-8 p-6 rounded-2xl bg-gradient-to-br from-cyan-900/20 to-purple-900/20 border border-cyan-400/30 backdrop-blur-md shadow-xl shadow-cyan-500/20">
- Lists: <ul class="space-y-3 mt-4"> with items <li class="flex items-start gap-3 p-4 rounded-lg bg-white/5 border border-cyan-400/20"> and labels <strong class="text-cyan-300">
- Dividers: <hr class="my-10 border-t border-cyan-400/30">
- All body text text-gray-200, labels text-cyan-300, ratings text-cyan-400 font-bold"#;

const FINAL_CHECKLIST: &str = r#"FINAL CHECKLIST
- All 15 competencies have numerical ratings (1-5)
- Average score is calculated correctly and the overall level matches it
- At least 4 strengths and at least 3 development areas, each with examples
- Evidence section covers all 5 skill areas
- 2-3 SMART training goals with all components
- Action plan has all 3 subsections
- Every rating is supported by observable behavioral evidence
- Language is professional, objective and developmental"#;

/// Build the full evaluator prompt for a session transcript.
pub fn build_report_prompt(transcript: &str, language: Option<&str>) -> String {
    let mut prompt = String::with_capacity(16 * 1024);
    prompt.push_str(
        "Prompt: Clinical Supervision Competency Report Generator\n\n\
         You are an experienced clinical supervisor tasked with evaluating a supervisee's clinical \
         competency and generating a comprehensive Clinical Supervision Competency Summary Report.\n\n\
         Your Task\n\n\
         1. Rate each of the 15 clinical competencies using the 1-5 scale\n\
         2. Complete all sections of the Clinical Supervision Competency Summary Report\n\
         3. Provide specific behavioral evidence to support all ratings\n\
         4. Identify strengths and areas for development\n\
         5. Create actionable training goals and an implementation plan\n\n---\n\nRATING SCALE\n\n",
    );

    for (score, (label, meaning)) in RATING_SCALE.iter().enumerate() {
        let _ = writeln!(prompt, "Score {} - {}\nMeaning: {}\n", score + 1, label, meaning);
    }

    prompt.push_str("---\n\nTHE 15 COMPETENCIES TO EVALUATE\n\n");
    for (index, competency) in COMPETENCIES.iter().enumerate() {
        let _ = writeln!(prompt, "# {}. {}\n", index + 1, competency.name);
        let _ = writeln!(prompt, "What It Measures: {}\n", competency.measures);
        let _ = writeln!(
            prompt,
            "Observable Indicators / Evaluation Parameters: {}\n",
            competency.indicators
        );
        prompt.push_str("Rating Anchors:\n");
        for (score, anchor) in competency.anchors.iter().enumerate() {
            let _ = writeln!(prompt, "- Score {}: {}", score + 1, anchor);
        }
        prompt.push_str("\n---\n\n");
    }

    prompt.push_str(
        "EVALUATION METHODOLOGY\n\n\
         For each competency, identify relevant behavioral evidence, match it to the rating anchors, \
         weigh consistency (one good moment does not equal consistent competency) and assign the \
         rating that best fits the overall pattern.\n\n\
         Sum all 15 ratings, divide by 15, and round to one decimal place.\n\n\
         Determine the overall level from the average score:\n",
    );
    for level in CompetencyLevel::ALL {
        let _ = writeln!(prompt, "- {}: {}", level.band(), level);
    }

    prompt.push_str("\n---\n\n");
    prompt.push_str(REPORT_SECTIONS);
    prompt.push_str("\n\n---\n\n");
    prompt.push_str(FORMATTING_GUIDE);
    prompt.push_str("\n\n---\n\n");
    prompt.push_str(FINAL_CHECKLIST);

    if let Some(language) = language.map(str::trim).filter(|l| !l.is_empty()) {
        let _ = write!(prompt, "\n\nWrite the entire report in {language}.");
    }

    let _ = write!(
        prompt,
        "\n\nTRANSCRIPT:\n{}\n\nGenerate a complete Clinical Supervision Competency Summary Report \
         following all sections and guidelines above. USE TAILWIND CLASSES AND DARK THEME STYLES \
         ABOVE, DO NOT USE HTML STYLES.\n",
        truncate_transcript(transcript)
    );
    prompt
}

pub fn report_request(transcript: &str, language: Option<&str>) -> CompletionRequest {
    CompletionRequest::single(
        REPORT_SYSTEM_PROMPT,
        build_report_prompt(transcript, language),
        MAX_TOKENS_REPORT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_bands() {
        assert_eq!(CompetencyLevel::from_average(1.0), CompetencyLevel::NeedsRemediation);
        assert_eq!(CompetencyLevel::from_average(1.9), CompetencyLevel::NeedsRemediation);
        assert_eq!(CompetencyLevel::from_average(2.0), CompetencyLevel::Emerging);
        assert_eq!(CompetencyLevel::from_average(3.5), CompetencyLevel::Competent);
        assert_eq!(CompetencyLevel::from_average(4.9), CompetencyLevel::Strong);
        assert_eq!(CompetencyLevel::from_average(5.0), CompetencyLevel::Advanced);
        assert_eq!(CompetencyLevel::Emerging.to_string(), "Emerging");
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        assert_eq!(average_score(&[]), None);
        assert_eq!(average_score(&[2, 2, 3]), Some(2.3));
        let ratings = [4, 3, 3, 2, 3, 2, 2, 3, 2, 3, 2, 2, 1, 3, 3];
        assert_eq!(average_score(&ratings), Some(2.5));
    }

    #[test]
    fn transcript_is_cut_on_char_boundary() {
        let short = "Therapist: hi";
        assert_eq!(truncate_transcript(short), short);

        let long = "é".repeat(3500);
        let cut = truncate_transcript(&long);
        assert!(cut.ends_with("..."));
        assert_eq!(cut.chars().count(), 3003);
    }

    #[test]
    fn prompt_lists_every_competency_and_the_transcript() {
        let prompt = build_report_prompt("Therapist: How are you?\nPatient: I guess okay.", None);
        for (index, competency) in COMPETENCIES.iter().enumerate() {
            assert!(prompt.contains(&format!("# {}. {}", index + 1, competency.name)));
        }
        assert!(prompt.contains("- 2.0 to 2.9: Emerging"));
        assert!(prompt.contains("TRANSCRIPT:\nTherapist: How are you?\nPatient: I guess okay."));
        assert!(!prompt.contains("Write the entire report in"));
    }

    #[test]
    fn optional_language_instruction() {
        let prompt = build_report_prompt("t", Some(" Hindi "));
        assert!(prompt.contains("Write the entire report in Hindi."));
        assert!(!build_report_prompt("t", Some("  ")).contains("Write the entire report in"));
    }

    #[test]
    fn report_request_uses_evaluator_settings() {
        let request = report_request("t", None);
        assert_eq!(request.system, "Concise therapy evaluator.");
        assert_eq!(request.max_tokens, 10_000);
    }
}
