use melon_core::{LaunchError, LaunchObserver, LaunchReport, LaunchStage};

/// Prints launch progress as it happens. Failures are reported by the caller.
pub struct ConsoleObserver;

impl LaunchObserver for ConsoleObserver {
    fn on_stage(&self, stage: LaunchStage, message: &str) {
        if stage != LaunchStage::Done {
            println!("{message}...");
        }
    }
}

/// Heading plus body, the way the error is shown to the user.
pub fn failure_message(error: &LaunchError) -> String {
    format!("{}: {error}", error.title())
}

pub fn success_message(report: &LaunchReport) -> String {
    let mut message = format!(
        "Launching Minecraft ({}) {} as {} [pid {}]",
        report.selection.resolved.label(),
        report.selection.version_id,
        report.session.display_name,
        report.pid
    );
    if report.selection.fallback {
        message.push_str(&format!(
            "\nNo installed {} version was found; launched {} instead.",
            report.selection.requested.label(),
            report.selection.resolved.label()
        ));
    }
    message
}
