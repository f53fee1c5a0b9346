//! Rule-based chat responder.
//!
//! Deterministic first-match-wins evaluation over the canonicalized message,
//! keyed on the stored prediction and confidence. Used directly when no LLM
//! is configured and as the fallback when the LLM call fails.

use neuroscan_core::knowledge::TumorClass;

/// Fixed reply when the stored prediction is the invalid-image sentinel.
const INVALID_IMAGE_REPLY: &str = "The uploaded image appears to be invalid or not a brain MRI \
                                   scan. Please upload a valid grayscale brain MRI image for \
                                   analysis.";

const QUESTION_WORDS: &[&str] = &["what", "how", "why", "can", "will", "should", "is"];

/// Answer a message given the last stored prediction and confidence.
pub fn rule_based_reply(
    message: &str,
    last_prediction: Option<&str>,
    last_confidence: Option<f64>,
) -> String {
    let msg = message.to_lowercase();

    // Invalid image takes priority over everything else.
    if last_prediction.is_some_and(|p| p.to_lowercase().contains("invalid")) {
        return INVALID_IMAGE_REPLY.to_string();
    }

    let Some(pred) = last_prediction else {
        // No prediction yet: orient the user toward uploading first.
        if contains_any(&msg, &["what", "how", "why", "can", "will", "is", "does"]) {
            return format!(
                "To answer your question about brain MRI analysis, I first need you to upload a \
                 brain MRI image. Once you upload an image, I can analyze it and answer questions \
                 like: \"{message}\". Please upload a valid brain MRI image first."
            );
        }
        return "No prediction available yet. Please upload a brain MRI image first, then I can \
                answer your questions about it."
            .to_string();
    };

    let conf_percent = last_confidence.unwrap_or(0.0) * 100.0;
    let class = TumorClass::from_label(pred);

    if contains_any(&msg, &["hi ", "hello", "hey", "greetings", "how are"]) {
        return format!(
            "Hello! I analyzed your brain MRI and detected: **{pred}** with **{conf_percent:.1}% \
             confidence**. Feel free to ask me any questions about this result, such as what this \
             means, treatment options, symptoms, or anything else you'd like to know!"
        );
    }

    if contains_any(&msg, &["thank", "thanks", "appreciate"]) {
        return "You're welcome! I'm here to help you understand your brain MRI results. Is there \
                anything else you'd like to know?"
            .to_string();
    }

    if contains_any(
        &msg,
        &[
            "what did you find",
            "what did you detect",
            "what's the result",
            "what tumor",
            "what is the",
            "tell me the result",
        ],
    ) {
        return format!(
            "I detected **{pred}** in your brain MRI scan with **{conf_percent:.1}% confidence**. \
             This means the model assessed the image and identified this tumor type as the most \
             likely diagnosis based on the scan patterns."
        );
    }

    if contains_any(
        &msg,
        &[
            "what does it mean",
            "what does this mean",
            "what is this",
            "explain the result",
        ],
    ) {
        return meaning_reply(pred, class);
    }

    if contains_any(
        &msg,
        &[
            "how confident",
            "how sure",
            "how accurate",
            "confidence level",
            "how reliable",
            "is it accurate",
        ],
    ) {
        let reliability = if conf_percent >= 85.0 {
            "very high"
        } else if conf_percent >= 70.0 {
            "high"
        } else if conf_percent >= 50.0 {
            "moderate"
        } else {
            "low"
        };
        return format!(
            "The model has **{conf_percent:.1}% confidence** in this prediction, which represents \
             {reliability} confidence. This means there's a {conf_percent:.1}% probability the \
             model is correct. However, this is still a machine learning prediction and should be \
             confirmed by a professional radiologist or neurologist for final diagnosis."
        );
    }

    if contains_any(
        &msg,
        &[
            "symptoms",
            "signs",
            "what are symptoms",
            "what causes symptoms",
            "will i have",
            "can cause",
            "common symptoms",
        ],
    ) {
        return symptoms_reply(pred, class);
    }

    if contains_any(
        &msg,
        &[
            "treatment",
            "cure",
            "how to treat",
            "what is the treatment",
            "surgery",
            "therapy",
            "medication",
            "how to fix",
            "how can it be treated",
        ],
    ) {
        return treatment_reply(pred, class);
    }

    if contains_any(
        &msg,
        &[
            "prognosis",
            "survive",
            "survival rate",
            "outcome",
            "how serious",
            "will i be ok",
            "recovery",
            "long term",
            "life expectancy",
        ],
    ) {
        return format!(
            "Prognosis for **{pred}** depends on multiple factors including: tumor grade/stage, \
             size, location, how early it was detected, and individual patient factors. \
             **Survival rates and recovery prospects vary widely.** Early detection and proper \
             treatment generally improve outcomes. **Consult an oncologist for personalized \
             prognosis information based on your specific case.**"
        );
    }

    if contains_any(
        &msg,
        &[
            "cause",
            "why did",
            "how did i get",
            "risk factors",
            "what causes",
            "is it hereditary",
            "can it be prevented",
        ],
    ) {
        return format!(
            "The exact causes of **{pred}** are not fully understood. Possible risk factors may \
             include: genetics, radiation exposure, certain genetic syndromes, hormonal factors, \
             or other medical conditions. Most brain tumors are not preventable. **A neurologist \
             can discuss your specific risk factors and family history.**"
        );
    }

    if contains_any(
        &msg,
        &[
            "next",
            "what now",
            "what should i do",
            "what happens next",
            "follow up",
            "next steps",
            "what to do",
        ],
    ) {
        return "Recommended next steps after this prediction:\n\
                1) **Schedule appointment** with a neurologist or neurosurgeon\n\
                2) **Get professional evaluation** - share this MRI and analysis with your doctor\n\
                3) **Discuss treatment** - consult about treatment options if needed\n\
                4) **Get second opinion** - consider getting another medical professional's \
                perspective\n\
                5) **Follow-up imaging** - your doctor may recommend follow-up scans\n\
                **This AI prediction is not a medical diagnosis - professional evaluation is \
                essential.**"
            .to_string();
    }

    if contains_any(
        &msg,
        &[
            "heatmap",
            "explain how",
            "why this result",
            "how did it decide",
            "grad-cam",
            "attention",
            "focus",
            "highlight",
        ],
    ) {
        return format!(
            "The **heatmap (Grad-CAM visualization)** shows which brain regions most influenced \
             the model's prediction. **Bright/hot areas** = regions that strongly contributed to \
             detecting {pred}. **Darker areas** = less influential regions. This helps you see \
             where the model focused its analysis, though it's still an AI interpretation and \
             needs professional confirmation."
        );
    }

    if contains_any(
        &msg,
        &[
            "difference between",
            "vs",
            "versus",
            "compare",
            "what's the difference",
        ],
    ) {
        return format!(
            "To compare {pred} with other tumor types, I'd be happy to help! Could you specify \
             which tumor type you'd like to compare it with? I can explain differences between \
             glioma, meningioma, pituitary tumors, etc."
        );
    }

    if contains_any(&msg, QUESTION_WORDS) {
        return format!(
            "Your current prediction is **{pred}** (confidence: {conf_percent:.1}%). Regarding \
             your question about this, I can help explain:\n\
             - What {pred} means\n\
             - Symptoms and signs\n\
             - Treatment options\n\
             - Prognosis and recovery\n\
             - Next steps to take\n\
             **Please ask me specifically about any of these topics, and I'll provide detailed \
             information.**"
        );
    }

    format!(
        "You have **{pred}** detected in your scan with **{conf_percent:.1}% confidence**. Feel \
         free to ask me anything about this result - I can explain what it means, discuss \
         treatment options, symptoms, prognosis, or anything else you'd like to know. What would \
         you like to learn about?"
    )
}

/// Plain-language, non-diagnostic explanation of a prediction (fallback when
/// the LLM is unavailable).
pub fn rule_explanation(label: &str, confidence: f64) -> String {
    format!(
        "The model identified '{label}' as the most likely label (confidence {confidence:.2}). \
         This is an automated, non-diagnostic summary; consult a radiologist or treating \
         physician for interpretation and next steps."
    )
}

fn meaning_reply(pred: &str, class: TumorClass) -> String {
    match class {
        TumorClass::Glioma => format!(
            "**{pred}** is a type of brain tumor that originates from glial cells (supporting \
             cells in the brain). Gliomas can vary in grade and severity, ranging from low-grade \
             (slow-growing) to high-grade (aggressive). The exact treatment depends on the grade, \
             size, and location."
        ),
        TumorClass::Meningioma => format!(
            "**{pred}** is a tumor of the meninges - the protective membranes surrounding the \
             brain and spinal cord. Most meningiomas are benign (non-cancerous) and slow-growing. \
             However, treatment may still be needed depending on size and location."
        ),
        TumorClass::Pituitary => format!(
            "**{pred}** originates from the pituitary gland, a small but important gland at the \
             base of the brain. These tumors can affect hormone production and may cause various \
             symptoms. Treatment options include medication, surgery, or radiation depending on \
             the tumor size and type."
        ),
        TumorClass::NoTumor => format!(
            "The scan shows **{pred}** - meaning no detectable tumor was found. This is a \
             positive result indicating normal brain tissue without apparent pathology based on \
             the model's analysis."
        ),
        TumorClass::Other => format!(
            "The predicted diagnosis is **{pred}**. This is the model's assessment of what it \
             identified in the MRI scan. For detailed medical interpretation, please consult \
             with a neurologist or radiologist."
        ),
    }
}

fn symptoms_reply(pred: &str, class: TumorClass) -> String {
    match class {
        TumorClass::Glioma => format!(
            "**{pred}** commonly presents with: headaches, seizures, vision changes, difficulty \
             with balance, cognitive changes, or speech difficulties. Symptoms depend on tumor \
             location and size. However, not all patients experience symptoms. **Important**: \
             Always consult a neurologist about your specific symptoms."
        ),
        TumorClass::Meningioma => format!(
            "**{pred}** may cause: headaches, vision problems, hearing issues, balance \
             difficulties, or cognitive changes. Many meningiomas grow slowly and may not cause \
             symptoms initially. **Please consult a neurologist to discuss whether your symptoms \
             match this prediction.**"
        ),
        TumorClass::Pituitary => format!(
            "**{pred}** can cause: hormonal imbalances, headaches, vision loss (especially \
             peripheral vision), fatigue, or sexual dysfunction. Symptoms depend on which \
             hormones are affected. **Consult an endocrinologist or neurologist for symptom \
             evaluation and management.**"
        ),
        _ => format!(
            "Symptoms related to {pred} vary by individual. Please consult a healthcare \
             professional to discuss your specific symptoms and how they relate to this \
             diagnosis."
        ),
    }
}

fn treatment_reply(pred: &str, class: TumorClass) -> String {
    match class {
        TumorClass::Glioma => format!(
            "Treatment for **{pred}** typically involves: 1) **Surgery** - to remove or biopsy \
             the tumor, 2) **Radiation therapy** - to target cancer cells, 3) **Chemotherapy** - \
             systemic drug treatment, or combinations of these. The best approach depends on \
             grade, size, and location. **You must discuss with an oncologist and neurosurgeon \
             for a personalized treatment plan.**"
        ),
        TumorClass::Meningioma => format!(
            "Treatment for **{pred}** may include: 1) **Observation** - if it's small and not \
             causing symptoms, 2) **Surgery** - if it's growing or symptomatic, 3) **Radiation \
             therapy** - in certain cases. Many meningiomas can be managed conservatively. \
             **Consult a neurosurgeon to determine the best approach for your case.**"
        ),
        TumorClass::Pituitary => format!(
            "Treatment for **{pred}** options include: 1) **Medication** - to control hormone \
             levels, 2) **Surgery** - if the tumor is large or causing vision problems, 3) \
             **Radiation therapy** - in some cases. **An endocrinologist and neurosurgeon can \
             determine the best treatment strategy for you.**"
        ),
        _ => format!(
            "Treatment options for {pred} vary based on many factors. **Please consult with a \
             qualified neurologist or oncologist to discuss the best treatment approach for your \
             specific case.**"
        ),
    }
}

fn contains_any(msg: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| msg.contains(n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_sentinel_wins_over_everything() {
        let reply = rule_based_reply("hello there", Some("invalid image"), Some(0.0));
        assert!(reply.contains("invalid"));
        assert!(reply.contains("upload a valid grayscale"));
    }

    #[test]
    fn greeting_without_prediction_redirects_to_upload() {
        // "hello" carries no question word, so the fixed upload-first reply
        // applies regardless of the greeting rule further down.
        let reply = rule_based_reply("hello", None, None);
        assert!(reply.starts_with("No prediction available yet"));
    }

    #[test]
    fn question_without_prediction_echoes_the_question() {
        let reply = rule_based_reply("what is a glioma?", None, None);
        assert!(reply.contains("what is a glioma?"));
        assert!(reply.contains("upload"));
    }

    #[test]
    fn greeting_with_prediction_summarizes_it() {
        let reply = rule_based_reply("hello!", Some("glioma_tumor"), Some(0.914));
        assert!(reply.contains("glioma_tumor"));
        assert!(reply.contains("91.4%"));
    }

    #[test]
    fn meaning_question_gets_label_specific_branch() {
        let glioma = rule_based_reply("what does it mean?", Some("glioma_tumor"), Some(0.8));
        assert!(glioma.contains("glial cells"));

        let meningioma =
            rule_based_reply("what does this mean", Some("meningioma_tumor"), Some(0.8));
        assert!(meningioma.contains("meninges"));

        let normal = rule_based_reply("what does it mean", Some("no_tumor"), Some(0.95));
        assert!(normal.contains("no detectable tumor"));
    }

    #[test]
    fn confidence_question_tiers_reliability() {
        let high = rule_based_reply("how confident are you?", Some("glioma_tumor"), Some(0.9));
        assert!(high.contains("very high"));

        let low = rule_based_reply("how confident are you?", Some("glioma_tumor"), Some(0.3));
        assert!(low.contains("low"));
    }

    #[test]
    fn treatment_question_routes_by_label() {
        let reply = rule_based_reply("how can it be treated?", Some("pituitary_tumor"), Some(0.7));
        assert!(reply.contains("endocrinologist"));
    }

    #[test]
    fn what_is_the_phrasing_hits_the_detection_branch_first() {
        // Rule order is significant: "what is the treatment" matches the
        // what-did-you-detect phrase list before the treatment keywords.
        let reply = rule_based_reply("what is the treatment?", Some("glioma_tumor"), Some(0.8));
        assert!(reply.contains("I detected"));
    }

    #[test]
    fn unmatched_message_gets_default_summary() {
        let reply = rule_based_reply("ok", Some("meningioma_tumor"), Some(0.66));
        assert!(reply.contains("meningioma_tumor"));
        assert!(reply.contains("66.0%"));
    }

    #[test]
    fn rule_explanation_mentions_label_and_disclaimer() {
        let text = rule_explanation("glioma_tumor", 0.87);
        assert!(text.contains("glioma_tumor"));
        assert!(text.contains("0.87"));
        assert!(text.contains("consult"));
    }
}
