// src/cli/transcript.rs

//! The operator-facing run transcript: one status line per event, written to the
//! console+file sink so the log file reads exactly like the terminal did.

use crate::{
    core::report::{Mode, NodeReport, NodeStatus, RunReporter, Stage},
    system::{
        executor::{SharedSink, display_command, write_sink},
        identity::{CallerIdentity, IdentityError},
    },
};

/// Writes the run's status lines to the console and transcript sink.
pub struct TranscriptReporter {
    sink: SharedSink,
}

impl std::fmt::Debug for TranscriptReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranscriptReporter").finish_non_exhaustive()
    }
}

impl TranscriptReporter {
    /// Creates a reporter writing to `sink`.
    pub fn new(sink: SharedSink) -> Self {
        Self { sink }
    }

    /// Writes one line to the transcript.
    pub fn line(&self, text: &str) {
        if let Err(e) = write_sink(&self.sink, format!("{text}\n").as_bytes()) {
            log::warn!("could not write transcript line: {}", e);
        }
    }
}

/// Nested nodes are shown as `parent-indent + name`.
fn label(node: &str, depth: usize) -> String {
    format!("{}{}", "  ".repeat(depth), node)
}

impl RunReporter for TranscriptReporter {
    fn identity_confirmed(&mut self, profile: &str, identity: &CallerIdentity) {
        self.line(&format!(
            "🔐 STS OK   | profile={} | account={}",
            profile, identity.account
        ));
    }

    fn identity_rejected(&mut self, profile: &str, error: &IdentityError) {
        self.line(&format!("❌ STS NG   | profile={profile}"));
        if let Some(stderr) = error.stderr() {
            self.line(&format!("   stderr  | {stderr}"));
        }
    }

    fn command_started(&mut self, name: &str, mode: Mode) {
        match mode {
            Mode::Plan => self.line(&format!("\n🧪 CMD PLAN  | {name}")),
            Mode::Execute => self.line(&format!("\n🚀 CMD START | {name}")),
        }
    }

    fn node_started(&mut self, profile: &str, node: &str, depth: usize, _argv: &[String]) {
        self.line(&format!("▶️  RUN       | {} | profile={}", label(node, depth), profile));
    }

    fn node_finished(&mut self, report: &NodeReport) {
        let name = label(&report.node, report.depth);
        let profile = &report.profile;
        match report.status {
            NodeStatus::Planned => {
                self.line(&format!("🧪 RUN PLAN  | {name} | profile={profile}"));
                self.line(&display_command(&report.argv));
            }
            NodeStatus::Succeeded => {
                self.line(&format!("✅ RUN OK    | {name} | profile={profile}"));
                for (var, value) in &report.captured {
                    self.line(&format!("📥 CAPTURE   | {name} | profile={profile} | {var}={value}"));
                }
                if let Some(passed) = report.branch {
                    let branch = if passed { "then" } else { "else" };
                    self.line(&format!("🔀 BRANCH    | {name} | profile={profile} | {branch}"));
                }
            }
            NodeStatus::Failed(Stage::Render) => {
                self.line(&format!("❌ CMD NG    | {name} | profile={profile} (render)"));
            }
            NodeStatus::Failed(Stage::Run) => {
                self.line(&format!("❌ RUN NG    | {name} | profile={profile}"));
            }
            NodeStatus::Failed(stage) => {
                self.line(&format!("❌ RUN NG    | {name} | profile={profile} ({stage})"));
            }
        }
    }

    fn command_finished(&mut self, name: &str, mode: Mode) {
        match mode {
            Mode::Plan => self.line(&format!("🧪 CMD DONE  | {name}")),
            Mode::Execute => self.line(&format!("🚀 CMD OK    | {name}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn reporter() -> (TranscriptReporter, Arc<Mutex<Vec<u8>>>) {
        let buffer = Arc::new(Mutex::new(Vec::<u8>::new()));
        let sink: SharedSink = buffer.clone();
        (TranscriptReporter::new(sink), buffer)
    }

    fn text(buffer: &Arc<Mutex<Vec<u8>>>) -> String {
        String::from_utf8(buffer.lock().unwrap().clone()).unwrap()
    }

    fn report(status: NodeStatus) -> NodeReport {
        NodeReport {
            profile: "dev".to_string(),
            node: "list".to_string(),
            depth: 0,
            argv: vec!["aws".to_string(), "s3".to_string(), "ls".to_string()],
            status,
            captured: Vec::new(),
            branch: None,
        }
    }

    #[test]
    fn test_plan_lines() {
        let (mut r, buffer) = reporter();
        r.command_started("list", Mode::Plan);
        r.node_finished(&report(NodeStatus::Planned));
        r.command_finished("list", Mode::Plan);
        assert_eq!(
            text(&buffer),
            "\n🧪 CMD PLAN  | list\n🧪 RUN PLAN  | list | profile=dev\naws s3 ls\n🧪 CMD DONE  | list\n"
        );
    }

    #[test]
    fn test_success_lists_captures_and_branch() {
        let (mut r, buffer) = reporter();
        let mut ok = report(NodeStatus::Succeeded);
        ok.depth = 1;
        ok.captured = vec![("VPC_ID".to_string(), "vpc-1".to_string())];
        ok.branch = Some(false);
        r.node_started("dev", "list", 1, &ok.argv);
        r.node_finished(&ok);
        let out = text(&buffer);
        assert!(out.contains("▶️  RUN       |   list | profile=dev\n"));
        assert!(out.contains("✅ RUN OK    |   list | profile=dev\n"));
        assert!(out.contains("📥 CAPTURE   |   list | profile=dev | VPC_ID=vpc-1\n"));
        assert!(out.contains("🔀 BRANCH    |   list | profile=dev | else\n"));
    }

    #[test]
    fn test_failure_lines_name_the_stage() {
        let (mut r, buffer) = reporter();
        r.node_finished(&report(NodeStatus::Failed(Stage::Render)));
        r.node_finished(&report(NodeStatus::Failed(Stage::Run)));
        r.node_finished(&report(NodeStatus::Failed(Stage::Capture)));
        assert_eq!(
            text(&buffer),
            "❌ CMD NG    | list | profile=dev (render)\n❌ RUN NG    | list | profile=dev\n❌ RUN NG    | list | profile=dev (capture)\n"
        );
    }

    #[test]
    fn test_identity_lines() {
        let (mut r, buffer) = reporter();
        r.identity_confirmed(
            "dev",
            &CallerIdentity {
                account: "123".to_string(),
                arn: "arn".to_string(),
            },
        );
        r.identity_rejected(
            "prod",
            &IdentityError::CallFailed {
                profile: "prod".to_string(),
                stderr: "ExpiredToken".to_string(),
            },
        );
        assert_eq!(
            text(&buffer),
            "🔐 STS OK   | profile=dev | account=123\n❌ STS NG   | profile=prod\n   stderr  | ExpiredToken\n"
        );
    }
}
