// src/types/mod.rs
pub mod analysis;
pub mod response;

pub use analysis::{
    AnalysisDetails, AnalysisFeedback, AnalysisResult, HistoryEntry, InputType, ScoreBand,
};
