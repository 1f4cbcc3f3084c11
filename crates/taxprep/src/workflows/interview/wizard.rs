use chrono::NaiveDate;

use super::domain::{InterviewRecord, RecordPatch};
use super::render::{self, RenderError, SummaryDocument};
use super::submission::{
    interview_attachments, interview_export_body, SubmissionClient, SubmissionError,
    SubmissionReceipt, SubmissionTransport,
};

/// Ordered steps of the interview. The set is closed; there is no skipping
/// and no jumping backward past the first step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterviewStep {
    Personal,
    Filing,
    Income,
    Review,
}

impl InterviewStep {
    pub const fn ordered() -> [Self; 4] {
        [Self::Personal, Self::Filing, Self::Income, Self::Review]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Personal => "Personal Details",
            Self::Filing => "Filing Status",
            Self::Income => "Income",
            Self::Review => "Review & Download",
        }
    }

    /// 1-based position for progress display.
    pub const fn number(self) -> usize {
        match self {
            Self::Personal => 1,
            Self::Filing => 2,
            Self::Income => 3,
            Self::Review => 4,
        }
    }

    const fn next(self) -> Option<Self> {
        match self {
            Self::Personal => Some(Self::Filing),
            Self::Filing => Some(Self::Income),
            Self::Income => Some(Self::Review),
            Self::Review => None,
        }
    }

    const fn previous(self) -> Option<Self> {
        match self {
            Self::Personal => None,
            Self::Filing => Some(Self::Personal),
            Self::Income => Some(Self::Filing),
            Self::Review => Some(Self::Income),
        }
    }
}

/// Where the wizard is in its lifecycle. `Failed` leaves the wizard on the
/// review step with the record intact so finalize can be retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardPhase {
    Collecting,
    Finalizing,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Moved forward to the given step.
    Moved(InterviewStep),
    /// Already on the last step; the caller should run finalize.
    ReadyToFinalize,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("finalize already in flight")]
    FinalizeInFlight,
    #[error("interview already submitted")]
    AlreadySubmitted,
    #[error("finalize is only available from the review step")]
    NotAtReview,
}

/// Error raised while finalizing. Render failures are local faults and are
/// surfaced separately from delivery failures so the caller does not tell
/// the subject to "try again" when the problem is not transient.
#[derive(Debug, thiserror::Error)]
pub enum FinalizeError {
    #[error(transparent)]
    Wizard(#[from] WizardError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("unable to encode submission payload: {0}")]
    Encode(#[from] serde_json::Error),
    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// Outputs of a successful finalize: both rendered documents plus the
/// remote receipt, all derived from one record snapshot.
#[derive(Debug)]
pub struct FinalizeReport {
    pub summary: SummaryDocument,
    pub flat_export: String,
    pub receipt: SubmissionReceipt,
}

/// Drives the fixed step sequence over a single shared record and owns the
/// finalize transition.
#[derive(Debug, Default)]
pub struct InterviewWizard {
    record: InterviewRecord,
    step: InterviewStep,
    phase: WizardPhase,
}

impl Default for InterviewStep {
    fn default() -> Self {
        Self::Personal
    }
}

impl Default for WizardPhase {
    fn default() -> Self {
        Self::Collecting
    }
}

impl InterviewWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) -> &InterviewRecord {
        &self.record
    }

    pub fn step(&self) -> InterviewStep {
        self.step
    }

    pub fn phase(&self) -> WizardPhase {
        self.phase
    }

    fn guard_mutation(&self) -> Result<(), WizardError> {
        match self.phase {
            WizardPhase::Finalizing => Err(WizardError::FinalizeInFlight),
            WizardPhase::Done => Err(WizardError::AlreadySubmitted),
            WizardPhase::Collecting | WizardPhase::Failed => Ok(()),
        }
    }

    /// Merge one field update into the record.
    pub fn set_field(&mut self, patch: RecordPatch) -> Result<(), WizardError> {
        self.guard_mutation()?;
        self.record.apply(patch);
        Ok(())
    }

    /// Move to the next step, or report that the wizard is ready to
    /// finalize when already on the review step.
    pub fn advance(&mut self) -> Result<AdvanceOutcome, WizardError> {
        self.guard_mutation()?;
        match self.step.next() {
            Some(next) => {
                self.step = next;
                Ok(AdvanceOutcome::Moved(next))
            }
            None => Ok(AdvanceOutcome::ReadyToFinalize),
        }
    }

    /// Move to the previous step; a no-op on the first step.
    pub fn retreat(&mut self) -> Result<InterviewStep, WizardError> {
        self.guard_mutation()?;
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        Ok(self.step)
    }

    /// Snapshot the record and enter the finalizing phase. A second call
    /// while a finalize is in flight fails, which is the guard against
    /// duplicate submissions from rapid repeated clicks.
    pub fn begin_finalize(&mut self) -> Result<InterviewRecord, WizardError> {
        match self.phase {
            WizardPhase::Finalizing => return Err(WizardError::FinalizeInFlight),
            WizardPhase::Done => return Err(WizardError::AlreadySubmitted),
            WizardPhase::Collecting | WizardPhase::Failed => {}
        }
        if self.step != InterviewStep::Review {
            return Err(WizardError::NotAtReview);
        }

        self.phase = WizardPhase::Finalizing;
        Ok(self.record.clone())
    }

    /// Render both documents from a snapshot of the current record, package
    /// them as file attachments, and deliver the export payload. On failure
    /// the wizard stays on the review step with the record intact.
    pub async fn finalize<T>(
        &mut self,
        client: &SubmissionClient<T>,
        today: NaiveDate,
    ) -> Result<FinalizeReport, FinalizeError>
    where
        T: SubmissionTransport,
    {
        let snapshot = self.begin_finalize()?;
        match finalize_snapshot(&snapshot, client, today).await {
            Ok(report) => {
                self.phase = WizardPhase::Done;
                Ok(report)
            }
            Err(err) => {
                self.phase = WizardPhase::Failed;
                Err(err)
            }
        }
    }
}

async fn finalize_snapshot<T>(
    snapshot: &InterviewRecord,
    client: &SubmissionClient<T>,
    today: NaiveDate,
) -> Result<FinalizeReport, FinalizeError>
where
    T: SubmissionTransport,
{
    let summary = render::render_summary(snapshot, today)?;
    let flat_export = render::csv_string(snapshot)?;
    let attachments = interview_attachments(snapshot, &summary, &flat_export);
    let payload = interview_export_body(snapshot, &attachments)?;
    let receipt = client.submit(payload).await?;

    Ok(FinalizeReport {
        summary,
        flat_export,
        receipt,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::interview::domain::RecordPatch;

    #[test]
    fn retreat_on_first_step_is_a_noop() {
        let mut wizard = InterviewWizard::new();
        assert_eq!(wizard.retreat().expect("retreat"), InterviewStep::Personal);
        assert_eq!(wizard.step(), InterviewStep::Personal);
    }

    #[test]
    fn advance_walks_the_ordered_steps_then_signals_finalize() {
        let mut wizard = InterviewWizard::new();
        assert_eq!(
            wizard.advance().expect("advance"),
            AdvanceOutcome::Moved(InterviewStep::Filing)
        );
        assert_eq!(
            wizard.advance().expect("advance"),
            AdvanceOutcome::Moved(InterviewStep::Income)
        );
        assert_eq!(
            wizard.advance().expect("advance"),
            AdvanceOutcome::Moved(InterviewStep::Review)
        );
        assert_eq!(
            wizard.advance().expect("advance"),
            AdvanceOutcome::ReadyToFinalize
        );
        assert_eq!(wizard.step(), InterviewStep::Review);
    }

    #[test]
    fn begin_finalize_requires_review_step() {
        let mut wizard = InterviewWizard::new();
        assert_eq!(
            wizard.begin_finalize().expect_err("not at review"),
            WizardError::NotAtReview
        );
    }

    #[test]
    fn second_begin_finalize_is_rejected_while_in_flight() {
        let mut wizard = wizard_at_review();
        wizard.begin_finalize().expect("first finalize starts");
        assert_eq!(
            wizard.begin_finalize().expect_err("second call rejected"),
            WizardError::FinalizeInFlight
        );
    }

    #[test]
    fn navigation_and_edits_are_disabled_while_finalizing() {
        let mut wizard = wizard_at_review();
        wizard.begin_finalize().expect("finalize starts");

        assert_eq!(
            wizard.advance().expect_err("advance disabled"),
            WizardError::FinalizeInFlight
        );
        assert_eq!(
            wizard.retreat().expect_err("retreat disabled"),
            WizardError::FinalizeInFlight
        );
        assert_eq!(
            wizard
                .set_field(RecordPatch::FirstName("Jane".to_string()))
                .expect_err("edits disabled"),
            WizardError::FinalizeInFlight
        );
    }

    #[test]
    fn snapshot_is_isolated_from_later_edits() {
        let mut wizard = wizard_at_review();
        wizard
            .set_field(RecordPatch::FirstName("Jane".to_string()))
            .expect("edit before finalize");
        let snapshot = wizard.begin_finalize().expect("finalize starts");
        assert_eq!(snapshot.first_name, "Jane");

        // The snapshot was captured before any downstream operation runs;
        // the wizard's own record stays untouched by rendering/submission.
        assert_eq!(wizard.record().first_name, "Jane");
    }

    fn wizard_at_review() -> InterviewWizard {
        let mut wizard = InterviewWizard::new();
        while wizard.step() != InterviewStep::Review {
            wizard.advance().expect("walk to review");
        }
        wizard
    }
}
