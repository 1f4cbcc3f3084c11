pub mod domain;
pub mod render;
pub mod submission;

mod wizard;

pub use wizard::{
    AdvanceOutcome, FinalizeError, FinalizeReport, InterviewStep, InterviewWizard, WizardError,
    WizardPhase,
};
