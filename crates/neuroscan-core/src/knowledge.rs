//! Static medical knowledge lookups for the supported tumor classes.
//!
//! Pure lookup tables, no state. All text is educational and non-diagnostic;
//! the report builder and chat rules interpolate it verbatim.

use serde::Serialize;

/// Tumor category derived from a predicted label.
///
/// Labels arrive in catalog spelling (`glioma_tumor`, `no_tumor`, sometimes
/// `notumor`), so matching is by substring on the lowercased label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TumorClass {
    Glioma,
    Meningioma,
    Pituitary,
    NoTumor,
    Other,
}

impl TumorClass {
    pub fn from_label(label: &str) -> Self {
        let l = label.to_lowercase();
        if l.contains("glioma") {
            Self::Glioma
        } else if l.contains("meningioma") {
            Self::Meningioma
        } else if l.contains("pituitary") {
            Self::Pituitary
        } else if l.contains("no_tumor") || l.contains("no tumor") || l.contains("notumor") {
            Self::NoTumor
        } else {
            Self::Other
        }
    }
}

/// Analysis payload attached to prediction responses.
#[derive(Debug, Clone, Serialize)]
pub struct TumorAnalysis {
    pub name: String,
    pub confidence: String,
    pub description: String,
    pub recommendations: Vec<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub symptoms: Vec<&'static str>,
}

/// Build the analysis payload for a predicted label.
pub fn tumor_analysis(label: &str, confidence: f64) -> TumorAnalysis {
    TumorAnalysis {
        name: label.to_string(),
        confidence: format!("{:.1}%", confidence * 100.0),
        description: format!(
            "Detected {label} with {:.1}% confidence.",
            confidence * 100.0
        ),
        recommendations: vec![
            "Consult a neurologist immediately.",
            "Schedule MRI for confirmation.",
        ],
        symptoms: tumor_symptoms(label),
    }
}

/// Common symptoms for the tumor type.
pub fn tumor_symptoms(label: &str) -> Vec<&'static str> {
    match TumorClass::from_label(label) {
        TumorClass::Glioma => vec![
            "Headaches",
            "Seizures",
            "Nausea",
            "Vision changes",
            "Weakness on one side of the body",
        ],
        TumorClass::Meningioma => vec![
            "Headaches",
            "Seizures",
            "Vision problems",
            "Hearing loss",
            "Weakness",
        ],
        TumorClass::Pituitary => vec![
            "Headaches",
            "Vision changes",
            "Hormonal imbalances",
            "Fatigue",
            "Weight changes",
        ],
        TumorClass::NoTumor => vec![],
        TumorClass::Other => vec!["General neurological symptoms; consult a doctor."],
    }
}

/// Side effects of medications commonly related to the tumor type.
pub fn medication_side_effects(label: &str) -> Vec<&'static str> {
    match TumorClass::from_label(label) {
        TumorClass::Glioma => vec!["Nausea", "Fatigue", "Hair loss"],
        TumorClass::Meningioma => vec!["Headache", "Seizures"],
        TumorClass::Pituitary => vec!["Hormonal imbalances", "Vision changes"],
        _ => vec![],
    }
}

/// Lifestyle recommendations for the tumor type.
pub fn lifestyle_recommendations(label: &str) -> Vec<&'static str> {
    match TumorClass::from_label(label) {
        TumorClass::Glioma => vec![
            "Maintain healthy diet",
            "Regular exercise",
            "Avoid smoking",
        ],
        TumorClass::Meningioma => vec!["Stress management", "Adequate sleep"],
        TumorClass::Pituitary => vec!["Monitor hormone levels", "Balanced nutrition"],
        _ => vec![],
    }
}

/// Descriptive disease facts used by the report builder.
#[derive(Debug, Clone)]
pub struct DiseaseInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub classification: Option<&'static str>,
    pub origin: Option<&'static str>,
    pub prevalence: Option<&'static str>,
    pub status: Option<&'static str>,
}

pub fn disease_info(label: &str) -> DiseaseInfo {
    match TumorClass::from_label(label) {
        TumorClass::Glioma => DiseaseInfo {
            name: "Glioma Tumor",
            description: "Glioma is a type of brain tumor that originates from glial cells \
                          (supportive cells of the brain and nervous system).",
            classification: Some(
                "Can be classified as low-grade (slow-growing) or high-grade (aggressive)",
            ),
            origin: Some("Arises from astrocytes, oligodendrocytes, or ependymal cells"),
            prevalence: Some("Most common type of primary brain tumor"),
            status: None,
        },
        TumorClass::Meningioma => DiseaseInfo {
            name: "Meningioma Tumor",
            description: "Meningioma is a tumor arising from the meninges - the protective \
                          membranes surrounding the brain and spinal cord.",
            classification: Some(
                "Typically benign (non-cancerous) but can be atypical or malignant",
            ),
            origin: Some("Arises from the dura mater and arachnoid mater layers"),
            prevalence: Some("Accounts for about 30% of primary brain tumors"),
            status: None,
        },
        TumorClass::Pituitary => DiseaseInfo {
            name: "Pituitary Tumor",
            description: "Pituitary tumor originates from the pituitary gland - a small gland \
                          at the base of the brain that regulates hormones.",
            classification: Some(
                "Can be hormone-secreting (functional) or non-secreting (non-functional)",
            ),
            origin: Some("Arises from pituitary gland cells"),
            prevalence: Some("Accounts for 10-15% of primary brain tumors"),
            status: None,
        },
        TumorClass::NoTumor => DiseaseInfo {
            name: "No Tumor Detected",
            description: "The brain MRI scan shows no detectable tumor.",
            classification: None,
            origin: None,
            prevalence: None,
            status: Some("Normal brain tissue detected"),
        },
        TumorClass::Other => DiseaseInfo {
            name: "Unknown",
            description: "Brain abnormality detected; no detailed information is available \
                          for this classification.",
            classification: None,
            origin: None,
            prevalence: None,
            status: None,
        },
    }
}

/// Named symptom groups for the report builder.
#[derive(Debug, Clone)]
pub struct SymptomProfile {
    pub groups: Vec<(&'static str, Vec<&'static str>)>,
    pub note: &'static str,
}

pub fn symptom_profile(label: &str) -> SymptomProfile {
    match TumorClass::from_label(label) {
        TumorClass::Glioma => SymptomProfile {
            groups: vec![
                (
                    "Common symptoms",
                    vec![
                        "Headaches (often progressive)",
                        "Seizures",
                        "Vision or hearing loss",
                        "Balance and coordination problems",
                        "Cognitive changes",
                    ],
                ),
                (
                    "Severe/urgent symptoms",
                    vec![
                        "Weakness or numbness in limbs",
                        "Difficulty speaking",
                        "Memory loss",
                        "Behavioral changes",
                    ],
                ),
            ],
            note: "Symptoms depend on tumor location, size, and grade. Not all patients \
                   experience symptoms.",
        },
        TumorClass::Meningioma => SymptomProfile {
            groups: vec![
                (
                    "Common symptoms",
                    vec![
                        "Headaches",
                        "Vision problems (especially peripheral)",
                        "Hearing loss",
                        "Nausea and vomiting",
                    ],
                ),
                (
                    "Severe/urgent symptoms",
                    vec![
                        "Weakness in arms or legs",
                        "Cognitive difficulties",
                        "Personality changes",
                        "Loss of balance",
                    ],
                ),
            ],
            note: "Many slow-growing meningiomas may not cause symptoms initially.",
        },
        TumorClass::Pituitary => SymptomProfile {
            groups: vec![
                (
                    "Hormonal symptoms",
                    vec![
                        "Excessive growth (acromegaly)",
                        "Excessive milk production",
                        "Irregular menstruation",
                        "Sexual dysfunction",
                        "Fatigue and weakness",
                    ],
                ),
                (
                    "Local symptoms",
                    vec![
                        "Headaches",
                        "Vision loss (especially peripheral)",
                        "Double vision",
                    ],
                ),
            ],
            note: "Symptoms vary based on hormone type and tumor size.",
        },
        TumorClass::NoTumor => SymptomProfile {
            groups: vec![],
            note: "No tumor-related symptoms expected. Normal brain tissue indicates no \
                   pathology detected.",
        },
        TumorClass::Other => SymptomProfile {
            groups: vec![],
            note: "Symptoms vary by individual; consult a healthcare professional.",
        },
    }
}

/// Named treatment side-effect groups for the report builder.
#[derive(Debug, Clone)]
pub struct SideEffectProfile {
    pub groups: Vec<(&'static str, Vec<&'static str>)>,
    pub note: &'static str,
}

pub fn side_effect_profile(label: &str) -> SideEffectProfile {
    match TumorClass::from_label(label) {
        TumorClass::Glioma => SideEffectProfile {
            groups: vec![
                (
                    "Surgical procedure side effects",
                    vec![
                        "Infection risk",
                        "Brain edema",
                        "Neurological deficits",
                        "Memory or speech issues",
                        "Bleeding",
                    ],
                ),
                (
                    "Radiation therapy side effects",
                    vec![
                        "Hair loss",
                        "Scalp irritation",
                        "Fatigue",
                        "Cognitive changes",
                        "Secondary cancer risk (long-term)",
                    ],
                ),
                (
                    "Chemotherapy side effects",
                    vec![
                        "Nausea and vomiting",
                        "Hair loss",
                        "Bone marrow suppression",
                        "Infection risk",
                        "Cognitive effects",
                    ],
                ),
            ],
            note: "Side effects vary based on treatment type and individual factors",
        },
        TumorClass::Meningioma => SideEffectProfile {
            groups: vec![
                (
                    "Surgical procedure side effects",
                    vec![
                        "Infection",
                        "Bleeding",
                        "Brain edema",
                        "Temporary neurological changes",
                    ],
                ),
                (
                    "Radiation therapy side effects",
                    vec![
                        "Hair loss",
                        "Fatigue",
                        "Skin irritation",
                        "Cognitive changes (rare)",
                    ],
                ),
                (
                    "Monitoring approach",
                    vec!["Minimal side effects with monitoring approach"],
                ),
            ],
            note: "Many meningiomas can be managed conservatively with observation",
        },
        TumorClass::Pituitary => SideEffectProfile {
            groups: vec![
                (
                    "Medication side effects",
                    vec!["Nausea", "Fatigue", "Dizziness", "Hormonal imbalances"],
                ),
                (
                    "Surgical procedure side effects",
                    vec![
                        "Bleeding",
                        "Infection",
                        "Cerebrospinal fluid leak",
                        "Hormonal imbalances",
                        "Vision changes",
                    ],
                ),
                (
                    "Radiation therapy side effects",
                    vec![
                        "Fatigue",
                        "Hair loss",
                        "Cognitive changes (rare)",
                        "Secondary hormone deficiencies",
                    ],
                ),
            ],
            note: "Specific side effects depend on treatment approach",
        },
        _ => SideEffectProfile {
            groups: vec![],
            note: "No treatment side effects expected for this condition.",
        },
    }
}
