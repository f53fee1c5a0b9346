//! Structured explanation report.
//!
//! The core emits ordered sections as data; rendering (terminal, web, chat
//! bubbles) is the caller's concern. Section order is fixed: analysis,
//! disease, symptoms, treatment, recommendation.

use serde::{Deserialize, Serialize};

use crate::knowledge::{
    self, DiseaseInfo, SideEffectProfile, SymptomProfile, TumorAnalysis, TumorClass,
};

/// Fixed section kinds, in report order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Analysis,
    Disease,
    Symptoms,
    Treatment,
    Recommendation,
}

/// One report section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSection {
    #[serde(rename = "type")]
    pub section_type: SectionType,
    pub title: String,
    pub text: String,
}

/// Build the five-section explanation report for a predicted label.
///
/// Used both for the explain operation and, with the same ordering, for the
/// conversational messages attached to predict responses.
pub fn explanation_sections(label: &str, confidence: f64) -> Vec<ReportSection> {
    let conf_percent = confidence * 100.0;
    let info = knowledge::disease_info(label);
    let symptoms = knowledge::symptom_profile(label);
    let side_effects = knowledge::side_effect_profile(label);

    vec![
        analysis_section(conf_percent),
        disease_section(&info, conf_percent),
        symptoms_section(&symptoms),
        treatment_section(&side_effects),
        recommendation_section(),
    ]
}

/// Build the predict-time conversational messages. Same section order as
/// [`explanation_sections`], with the detection summary phrased around the
/// analysis payload.
pub fn prediction_messages(
    label: &str,
    confidence: f64,
    analysis: &TumorAnalysis,
) -> Vec<ReportSection> {
    let conf_percent = confidence * 100.0;
    let mut sections = explanation_sections(label, confidence);

    // The disease message leads with the analysis name when the knowledge
    // base resolved one.
    if TumorClass::from_label(label) == TumorClass::Other {
        sections[1].text = format!(
            "Detected condition: {}\n\nDescription: {}\n\nConfidence: {:.1}%",
            analysis.name, analysis.description, conf_percent
        );
    }
    sections
}

fn analysis_section(conf_percent: f64) -> ReportSection {
    ReportSection {
        section_type: SectionType::Analysis,
        title: "Tumor detection confidence".to_string(),
        text: format!(
            "Confidence score: {conf_percent:.1}%\n\n\
             The model has analyzed the brain MRI and is {conf_percent:.1}% confident in its \
             assessment.\n\
             - Higher percentage = higher certainty in the prediction\n\
             - This is NOT a medical diagnosis - professional evaluation is always needed."
        ),
    }
}

fn disease_section(info: &DiseaseInfo, conf_percent: f64) -> ReportSection {
    let mut text = format!(
        "Detected condition: {}\n\nDescription: {}",
        info.name, info.description
    );
    if let Some(classification) = info.classification {
        text.push_str(&format!("\n\nClassification: {classification}"));
    }
    if let Some(origin) = info.origin {
        text.push_str(&format!("\nOrigin: {origin}"));
    }
    if let Some(prevalence) = info.prevalence {
        text.push_str(&format!("\nPrevalence: {prevalence}"));
    }
    if let Some(status) = info.status {
        text.push_str(&format!(
            "\n\nStatus: {status}\nNote: this is a positive result indicating normal brain \
             structure"
        ));
    } else {
        text.push_str(&format!("\nConfidence: {conf_percent:.1}%"));
    }
    ReportSection {
        section_type: SectionType::Disease,
        title: "Disease information".to_string(),
        text,
    }
}

fn symptoms_section(profile: &SymptomProfile) -> ReportSection {
    let mut text = String::new();
    for (heading, items) in &profile.groups {
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        text.push_str(&format!("{}:\n", heading.to_uppercase()));
        text.push_str(&bullet_list(items));
    }
    if text.is_empty() {
        text.push_str(profile.note);
    } else {
        text.push_str(&format!(
            "\n\nImportant notes:\n\
             - Not all patients experience all symptoms\n\
             - Symptoms depend on tumor location, size, and type\n\
             - Presence of symptoms doesn't confirm diagnosis\n\
             - {}",
            profile.note
        ));
    }
    ReportSection {
        section_type: SectionType::Symptoms,
        title: "Common symptoms and warning signs".to_string(),
        text,
    }
}

fn treatment_section(profile: &SideEffectProfile) -> ReportSection {
    let mut text = String::new();
    for (heading, items) in &profile.groups {
        if !text.is_empty() {
            text.push_str("\n\n");
        }
        text.push_str(&format!("{}:\n", heading.to_uppercase()));
        text.push_str(&bullet_list(items));
    }
    if text.is_empty() {
        text.push_str(profile.note);
    } else {
        text.push_str(&format!("\n\nNote: {}", profile.note));
    }
    text.push_str(
        "\n\nTreatment selection depends on tumor size, location, grade, patient age, overall \
         health, and patient preferences. Your doctor will recommend the best approach for your \
         specific case.",
    );
    ReportSection {
        section_type: SectionType::Treatment,
        title: "Potential side effects and treatment".to_string(),
        text,
    }
}

fn recommendation_section() -> ReportSection {
    ReportSection {
        section_type: SectionType::Recommendation,
        title: "Doctor visit recommendations".to_string(),
        text: "Recommended action: schedule an appointment with a neurologist or neurosurgeon.\n\n\
               Priority tasks:\n\
               - Get professional medical evaluation from a qualified neurologist or radiologist\n\
               - Share this MRI scan and analysis with your healthcare provider\n\
               - Discuss treatment options if needed (surgery, radiation, medication, monitoring)\n\
               - Get a second opinion from another medical specialist\n\
               - Ask about a follow-up imaging schedule\n\n\
               Specialists to consult: neurologist, neurosurgeon, oncologist (if cancer-related), \
               radiologist (for imaging interpretation).\n\n\
               This is an AI-generated prediction and NOT a medical diagnosis. Professional \
               medical evaluation is essential."
            .to_string(),
    }
}

/// Default plain-text rendering of a report, used when sections are stored
/// in conversation history.
pub fn render_plain(sections: &[ReportSection]) -> String {
    sections
        .iter()
        .map(|s| format!("{}\n\n{}", s.title.to_uppercase(), s.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn bullet_list(items: &[&str]) -> String {
    items
        .iter()
        .map(|i| format!("- {i}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPECTED_ORDER: [SectionType; 5] = [
        SectionType::Analysis,
        SectionType::Disease,
        SectionType::Symptoms,
        SectionType::Treatment,
        SectionType::Recommendation,
    ];

    #[test]
    fn pituitary_report_has_five_sections_in_order() {
        let sections = explanation_sections("pituitary_tumor", 0.88);
        let types: Vec<SectionType> = sections.iter().map(|s| s.section_type).collect();
        assert_eq!(types, EXPECTED_ORDER);
    }

    #[test]
    fn section_type_serializes_to_expected_wire_names() {
        let sections = explanation_sections("glioma_tumor", 0.7);
        let json = serde_json::to_value(&sections).unwrap();
        let types: Vec<&str> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["type"].as_str().unwrap())
            .collect();
        assert_eq!(
            types,
            ["analysis", "disease", "symptoms", "treatment", "recommendation"]
        );
    }

    #[test]
    fn analysis_section_carries_confidence_percent() {
        let sections = explanation_sections("glioma_tumor", 0.914);
        assert!(sections[0].text.contains("91.4%"));
    }

    #[test]
    fn no_tumor_report_reads_as_normal_result() {
        let sections = explanation_sections("no_tumor", 0.97);
        assert!(sections[1].text.contains("No Tumor Detected"));
        assert!(sections[1].text.contains("Normal brain tissue"));
        assert!(sections[2].text.contains("No tumor-related symptoms"));
    }

    #[test]
    fn plain_rendering_includes_every_section() {
        let sections = explanation_sections("glioma_tumor", 0.8);
        let text = render_plain(&sections);
        for section in &sections {
            assert!(text.contains(&section.title.to_uppercase()));
        }
    }

    #[test]
    fn prediction_messages_share_the_section_order() {
        let analysis = crate::knowledge::tumor_analysis("meningioma_tumor", 0.66);
        let messages = prediction_messages("meningioma_tumor", 0.66, &analysis);
        let types: Vec<SectionType> = messages.iter().map(|s| s.section_type).collect();
        assert_eq!(types, EXPECTED_ORDER);
    }
}
