//! Risk evaluator
//!
//! Pure classification of a subtask's danger level. No I/O, no side
//! effects; calling it twice on the same subtask yields the same answer.
//! Rules are checked in priority order and the first match wins.

use crate::config::RiskConfig;
use crate::plan::{RiskLevel, Subtask, SubtaskType};
use regex::Regex;
use std::sync::LazyLock;

/// Shell payloads that are destructive no matter the surrounding text
static DESTRUCTIVE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        // recursive delete of root or home
        r"rm\s+(-[a-zA-Z]*r[a-zA-Z]*f|-[a-zA-Z]*f[a-zA-Z]*r)\s+(/|~)(\s|$)",
        r"rm\s+-rf?\s+/\*",
        // disk formatting and raw device writes
        r"mkfs(\.\w+)?\s",
        r"dd\s+.*of=/dev/",
        r">\s*/dev/sd[a-z]",
        // forced shutdown / reboot
        r"(shutdown|reboot|halt|poweroff)(\s|$)",
        r"init\s+0",
        // force-push
        r"git\s+push\s+.*(--force|-f)(\s|$)",
        // mass permission changes
        r"chmod\s+(-[a-zA-Z]*R[a-zA-Z]*\s+)?777\s",
        r"chown\s+-R\s",
        // kill everything
        r"kill(all)?\s+-9",
        r"pkill\s+-9",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("destructive patterns are compile-time constants"))
    .collect()
});

/// Command keywords that imply privileged operation
const PRIVILEGED_KEYWORDS: &[&str] = &[
    "shutdown", "reboot", "halt", "poweroff", "kill", "pkill", "killall", "sudo", "su",
];

/// APIs in code payloads that can destroy data or spawn arbitrary
/// processes. Matched against lowercased payload text.
const DESTRUCTIVE_APIS: &[&str] = &[
    "shutil.rmtree",
    "os.system",
    "os.remove",
    "subprocess.",
    "rm -rf",
    "fs.rmsync",
    "fs.unlink",
    "child_process",
    "runtime.getruntime().exec",
];

/// Pure risk classifier
#[derive(Debug, Clone)]
pub struct RiskEvaluator {
    protected_paths: Vec<String>,
    auto_approve_low: bool,
}

impl RiskEvaluator {
    /// Create an evaluator from risk configuration
    #[must_use]
    pub fn new(config: &RiskConfig) -> Self {
        Self {
            protected_paths: config.protected_paths.clone(),
            auto_approve_low: config.auto_approve_low,
        }
    }

    /// Classify a subtask's risk. Deterministic; first matching rule wins.
    #[must_use]
    pub fn evaluate(&self, subtask: &Subtask) -> RiskLevel {
        let payload = self.payload_text(subtask);

        match subtask.kind {
            SubtaskType::SystemCommand => {
                if matches_destructive(&payload) || contains_privileged(&payload) {
                    RiskLevel::High
                } else {
                    RiskLevel::Medium
                }
            }
            SubtaskType::FileOperation => {
                let operation = param_str(subtask, "operation").unwrap_or_default();
                let path = param_str(subtask, "path").unwrap_or_default();
                if matches!(operation, "delete" | "modify") && self.is_protected(path) {
                    RiskLevel::High
                } else {
                    // delete elsewhere, or an unmatched operation: caution
                    RiskLevel::Medium
                }
            }
            // close/kill are the explicit medium cases; everything else on
            // a live desktop session is unmatched and also fails to medium
            SubtaskType::AppControl => RiskLevel::Medium,
            SubtaskType::CodeExecution => {
                if matches_destructive(&payload) {
                    RiskLevel::High
                } else if DESTRUCTIVE_APIS.iter().any(|api| payload.contains(api)) {
                    RiskLevel::Medium
                } else {
                    RiskLevel::Low
                }
            }
            SubtaskType::ScreenRead | SubtaskType::WebSearch => RiskLevel::Low,
            // skills run arbitrary tools underneath
            SubtaskType::SkillExecution => RiskLevel::Medium,
        }
    }

    /// Whether a subtask at the given risk level needs human approval.
    ///
    /// High and medium always do. Low does too unless the caller has
    /// explicitly opted into auto-approval; the conservative default is
    /// to ask.
    #[must_use]
    pub fn requires_approval(&self, risk: RiskLevel) -> bool {
        match risk {
            RiskLevel::High | RiskLevel::Medium => true,
            RiskLevel::Low => !self.auto_approve_low,
        }
    }

    /// The text the pattern rules run against: the command or code payload
    /// plus the description, lowercased.
    fn payload_text(&self, subtask: &Subtask) -> String {
        let mut text = String::new();
        for key in ["command", "code"] {
            if let Some(value) = param_str(subtask, key) {
                text.push_str(value);
                text.push(' ');
            }
        }
        text.push_str(&subtask.description);
        text.to_lowercase()
    }

    fn is_protected(&self, path: &str) -> bool {
        self.protected_paths.iter().any(|prefix| {
            path == prefix
                || path
                    .strip_prefix(prefix.as_str())
                    .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('\\'))
        })
    }
}

fn matches_destructive(payload: &str) -> bool {
    DESTRUCTIVE_PATTERNS.iter().any(|re| re.is_match(payload))
}

fn contains_privileged(payload: &str) -> bool {
    payload
        .split(|c: char| !c.is_alphanumeric() && c != '_')
        .any(|word| PRIVILEGED_KEYWORDS.contains(&word))
}

fn param_str<'a>(subtask: &'a Subtask, key: &str) -> Option<&'a str> {
    subtask.parameters.get(key).and_then(|v| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn evaluator() -> RiskEvaluator {
        RiskEvaluator::new(&RiskConfig::default())
    }

    fn auto_approve_evaluator() -> RiskEvaluator {
        RiskEvaluator::new(&RiskConfig {
            auto_approve_low: true,
            ..RiskConfig::default()
        })
    }

    #[test]
    fn test_destructive_command_high_regardless_of_description() {
        let subtask = Subtask::new(SubtaskType::SystemCommand, "tidy up temp files")
            .with_parameter("command", serde_json::json!("rm -rf / "));
        assert_eq!(evaluator().evaluate(&subtask), RiskLevel::High);
    }

    #[test]
    fn test_disk_format_high() {
        let subtask = Subtask::new(SubtaskType::SystemCommand, "prepare disk")
            .with_parameter("command", serde_json::json!("mkfs.ext4 /dev/sdb1"));
        assert_eq!(evaluator().evaluate(&subtask), RiskLevel::High);
    }

    #[test]
    fn test_force_push_high() {
        let subtask = Subtask::new(SubtaskType::SystemCommand, "update remote")
            .with_parameter("command", serde_json::json!("git push origin main --force"));
        assert_eq!(evaluator().evaluate(&subtask), RiskLevel::High);
    }

    #[test]
    fn test_privileged_keyword_high() {
        for cmd in ["sudo apt update", "shutdown -h now", "kill 1234"] {
            let subtask = Subtask::new(SubtaskType::SystemCommand, "admin task")
                .with_parameter("command", serde_json::json!(cmd));
            assert_eq!(evaluator().evaluate(&subtask), RiskLevel::High, "{}", cmd);
        }
    }

    #[test]
    fn test_plain_command_medium() {
        let subtask = Subtask::new(SubtaskType::SystemCommand, "list files")
            .with_parameter("command", serde_json::json!("ls -la"));
        assert_eq!(evaluator().evaluate(&subtask), RiskLevel::Medium);
    }

    #[test]
    fn test_protected_path_delete_high() {
        let subtask = Subtask::new(SubtaskType::FileOperation, "remove hosts")
            .with_parameter("operation", serde_json::json!("delete"))
            .with_parameter("path", serde_json::json!("/etc/hosts"));
        assert_eq!(evaluator().evaluate(&subtask), RiskLevel::High);
    }

    #[test]
    fn test_protected_path_modify_high() {
        let subtask = Subtask::new(SubtaskType::FileOperation, "edit config")
            .with_parameter("operation", serde_json::json!("modify"))
            .with_parameter("path", serde_json::json!("/etc/ssh/sshd_config"));
        assert_eq!(evaluator().evaluate(&subtask), RiskLevel::High);
    }

    #[test]
    fn test_ordinary_delete_medium() {
        let subtask = Subtask::new(SubtaskType::FileOperation, "remove scratch file")
            .with_parameter("operation", serde_json::json!("delete"))
            .with_parameter("path", serde_json::json!("/home/user/scratch.txt"));
        assert_eq!(evaluator().evaluate(&subtask), RiskLevel::Medium);
    }

    #[test]
    fn test_file_create_unmatched_medium() {
        // only delete/modify are explicitly classified; the rest fail
        // toward caution
        let subtask = Subtask::new(SubtaskType::FileOperation, "create notes")
            .with_parameter("operation", serde_json::json!("create"))
            .with_parameter("path", serde_json::json!("/home/user/notes.txt"));
        assert_eq!(evaluator().evaluate(&subtask), RiskLevel::Medium);
    }

    #[test]
    fn test_app_control_medium() {
        let close = Subtask::new(SubtaskType::AppControl, "close browser")
            .with_parameter("action", serde_json::json!("close"));
        let open = Subtask::new(SubtaskType::AppControl, "open editor")
            .with_parameter("action", serde_json::json!("open"));
        assert_eq!(evaluator().evaluate(&close), RiskLevel::Medium);
        assert_eq!(evaluator().evaluate(&open), RiskLevel::Medium);
    }

    #[test]
    fn test_code_execution_tiers() {
        let destructive = Subtask::new(SubtaskType::CodeExecution, "cleanup")
            .with_parameter("code", serde_json::json!("import os; os.system('rm -rf / ')"));
        let api = Subtask::new(SubtaskType::CodeExecution, "list dir")
            .with_parameter("code", serde_json::json!("import shutil; shutil.rmtree(d)"));
        let benign = Subtask::new(SubtaskType::CodeExecution, "math")
            .with_parameter("code", serde_json::json!("print(2 + 2)"));
        assert_eq!(evaluator().evaluate(&destructive), RiskLevel::High);
        assert_eq!(evaluator().evaluate(&api), RiskLevel::Medium);
        assert_eq!(evaluator().evaluate(&benign), RiskLevel::Low);
    }

    #[test]
    fn test_read_only_kinds_low() {
        let screen = Subtask::new(SubtaskType::ScreenRead, "what is on screen");
        let search = Subtask::new(SubtaskType::WebSearch, "weather today");
        assert_eq!(evaluator().evaluate(&screen), RiskLevel::Low);
        assert_eq!(evaluator().evaluate(&search), RiskLevel::Low);
    }

    #[test]
    fn test_skill_execution_defaults_medium() {
        let subtask = Subtask::new(SubtaskType::SkillExecution, "run morning-briefing");
        assert_eq!(evaluator().evaluate(&subtask), RiskLevel::Medium);
    }

    #[test]
    fn test_deterministic() {
        let subtask = Subtask::new(SubtaskType::SystemCommand, "check uptime")
            .with_parameter("command", serde_json::json!("uptime"));
        let first = evaluator().evaluate(&subtask);
        let second = evaluator().evaluate(&subtask);
        assert_eq!(first, second);
    }

    #[test]
    fn test_approval_policy_conservative_default() {
        let eval = evaluator();
        assert!(eval.requires_approval(RiskLevel::High));
        assert!(eval.requires_approval(RiskLevel::Medium));
        // low still requires approval unless auto-approve is opted into
        assert!(eval.requires_approval(RiskLevel::Low));

        let relaxed = auto_approve_evaluator();
        assert!(relaxed.requires_approval(RiskLevel::Medium));
        assert!(!relaxed.requires_approval(RiskLevel::Low));
    }
}
