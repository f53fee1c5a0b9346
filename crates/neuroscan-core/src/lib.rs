//! Core types shared across the inference service: sessions, predictions,
//! the label catalog, the medical knowledge base, and the report model.

pub mod knowledge;
pub mod labels;
pub mod prediction;
pub mod report;
pub mod session;

pub use labels::{EXPLAINABLE_LABELS, LabelCatalog};
pub use prediction::{Prediction, TopPrediction};
pub use report::{ReportSection, SectionType};
pub use session::{ChatTurn, INVALID_IMAGE_SENTINEL, Role, Session, is_invalid_label};
