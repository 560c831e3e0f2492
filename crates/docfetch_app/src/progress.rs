//! Terminal progress reporting: one line per item outcome, debug logs for
//! intermediate stages.

use docfetch_engine::{ProgressSink, ProgressUpdate, Stage};

#[derive(Debug, Default)]
pub struct TerminalProgress;

impl ProgressSink for TerminalProgress {
    fn emit(&self, update: ProgressUpdate) {
        if update.outcome.is_some() {
            println!("{}", outcome_line(&update));
        } else {
            log::debug!(
                "[{}/{}] {}: {} {}",
                update.index + 1,
                update.total,
                update.id,
                update.stage,
                update.message
            );
        }
    }
}

fn outcome_line(update: &ProgressUpdate) -> String {
    let mut line = format!(
        "[{}/{}] {}: {}",
        update.index + 1,
        update.total,
        update.id,
        update.stage
    );
    if update.stage == Stage::Failed && !update.message.is_empty() {
        line.push_str(&format!(" ({})", update.message));
    }
    line.push_str(&format!(
        " - {}/{} saved",
        update.successes, update.success_cap
    ));
    line
}

#[cfg(test)]
mod tests {
    use docfetch_engine::{Disposition, OutcomeRow, ProgressUpdate, Stage};

    use super::outcome_line;

    #[test]
    fn outcome_line_shows_position_stage_and_success_count() {
        let update = ProgressUpdate {
            index: 2,
            total: 8,
            successes: 3,
            success_cap: 5,
            id: "doc-3".to_string(),
            stage: Stage::Saved,
            message: "saved".to_string(),
            url: Some("https://a.example/3.pdf".to_string()),
            outcome: Some(OutcomeRow {
                id: "doc-3".to_string(),
                attempted_url: "https://a.example/3.pdf".to_string(),
                disposition: Disposition::Saved,
                error: String::new(),
            }),
        };
        assert_eq!(outcome_line(&update), "[3/8] doc-3: saved - 3/5 saved");
    }

    #[test]
    fn failed_outcome_line_includes_the_error() {
        let update = ProgressUpdate {
            index: 0,
            total: 1,
            successes: 0,
            success_cap: 5,
            id: "doc-1".to_string(),
            stage: Stage::Failed,
            message: "no URL available".to_string(),
            url: None,
            outcome: Some(OutcomeRow {
                id: "doc-1".to_string(),
                attempted_url: String::new(),
                disposition: Disposition::Failed,
                error: "no URL available".to_string(),
            }),
        };
        assert_eq!(
            outcome_line(&update),
            "[1/1] doc-1: failed (no URL available) - 0/5 saved"
        );
    }
}
