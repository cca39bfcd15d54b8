//! Security checks shared by file, command, and code tools
//!
//! Path validation rejects traversal and protected system directories
//! before anything touches the filesystem; command analysis blocks
//! privileged and destructive invocations before anything is spawned.
//! These checks run inside the tools themselves — independent of the
//! engine's risk gating, so a tool invoked directly is still protected.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Directories tools may never delete from or write into
pub const PROTECTED_DIRECTORIES: &[&str] = &[
    "/etc",
    "/root",
    "/boot",
    "/dev",
    "/proc",
    "/sys",
    "/usr/bin",
    "/usr/sbin",
    "/bin",
    "/sbin",
    "/var/run",
    "/run",
    "C:\\Windows",
    "C:\\Program Files",
];

/// Commands blocked outright in system-command payloads
pub const BLOCKED_COMMANDS: &[&str] = &[
    // Destructive
    "rm", "rmdir", "dd", "mkfs", "fdisk", "parted", "shred",
    // System control
    "shutdown", "reboot", "poweroff", "halt", "init",
    // Permission manipulation
    "chmod", "chown", "chgrp", "passwd",
    // Privilege escalation
    "sudo", "su", "doas",
    // Process control
    "kill", "pkill", "killall",
    // Shell dangers
    "eval", "source", "exec",
];

/// Dangerous substrings in command payloads (injection, raw device access)
pub const DANGEROUS_PATTERNS: &[&str] = &[
    "LD_PRELOAD=",
    "DYLD_INSERT_LIBRARIES=",
    ">/dev/sda",
    "/dev/mem",
    "$(curl",
    "$(wget",
    "`curl",
    "`wget",
];

/// Check whether a path is inside a protected system directory
#[must_use]
pub fn is_protected_path(path: &str, protected: &[String]) -> bool {
    let check = |prefix: &str| {
        path == prefix
            || path
                .strip_prefix(prefix)
                .is_some_and(|rest| rest.starts_with('/') || rest.starts_with('\\'))
    };
    PROTECTED_DIRECTORIES.iter().any(|p| check(p))
        || protected.iter().any(|p| check(p.as_str()))
}

/// Validate and sanitize a file path
///
/// Rejects traversal (`..`), protected system directories, and resolves
/// symlinks for existing paths so a link cannot escape into a protected
/// location.
pub fn validate_path(path: &str, extra_protected: &[String]) -> Result<PathBuf> {
    let path_buf = PathBuf::from(path);
    let path_str = path_buf.to_string_lossy();

    if path_str.contains("..") {
        warn!(path = %path, "Path traversal attempt detected");
        return Err(Error::PermissionDenied(
            "Path traversal (..) is not allowed".to_string(),
        ));
    }

    if is_protected_path(&path_str, extra_protected) {
        warn!(path = %path, "Access to protected directory");
        return Err(Error::PermissionDenied(format!(
            "Access to '{}' is restricted",
            path
        )));
    }

    // Resolve symlinks for existing paths; for new files resolve the parent
    let canonical = if path_buf.exists() {
        path_buf
            .canonicalize()
            .map_err(|e| Error::PermissionDenied(format!("Cannot resolve path '{}': {}", path, e)))?
    } else if let Some(parent) = path_buf.parent() {
        if parent.as_os_str().is_empty() || !parent.exists() {
            path_buf.clone()
        } else {
            let canonical_parent = parent.canonicalize().map_err(|e| {
                Error::PermissionDenied(format!(
                    "Cannot resolve parent directory of '{}': {}",
                    path, e
                ))
            })?;
            match path_buf.file_name() {
                Some(filename) => canonical_parent.join(filename),
                None => canonical_parent,
            }
        }
    } else {
        path_buf.clone()
    };

    // Re-check after symlink resolution
    if is_protected_path(&canonical.to_string_lossy(), extra_protected) {
        warn!(path = %path, resolved = %canonical.display(), "Symlink into protected directory");
        return Err(Error::PermissionDenied(format!(
            "Path '{}' resolves into a restricted directory",
            path
        )));
    }

    Ok(canonical)
}

/// Analyze a command line, rejecting blocked commands and dangerous patterns
///
/// Checks every segment of pipelines and chains (`|`, `&&`, `;`), stripping
/// directory prefixes so `/usr/bin/rm` is treated as `rm`.
pub fn analyze_command(command: &str) -> Result<()> {
    for pattern in DANGEROUS_PATTERNS {
        if command.contains(pattern) {
            warn!(pattern = %pattern, "Dangerous pattern detected");
            return Err(Error::PermissionDenied(format!(
                "Command contains dangerous pattern: '{}'",
                pattern
            )));
        }
    }

    for segment in command.split('|') {
        for sub in segment.split(&['&', ';'][..]) {
            let sub = sub.trim();
            if sub.is_empty() {
                continue;
            }
            let first_token = sub.split_whitespace().next().unwrap_or("");
            let base_cmd = first_token.rsplit('/').next().unwrap_or(first_token);
            if BLOCKED_COMMANDS.contains(&base_cmd) {
                warn!(command = %base_cmd, "Blocked command in pipeline");
                return Err(Error::PermissionDenied(format!(
                    "Command '{}' is blocked for security reasons",
                    base_cmd
                )));
            }
        }
    }

    Ok(())
}

/// Check whether a file name matches a sensitive pattern (credentials, keys)
#[must_use]
pub fn is_sensitive_file(path: &Path) -> bool {
    const SENSITIVE: &[&str] = &[
        ".env",
        "credentials",
        "secrets",
        "id_rsa",
        "id_ed25519",
        ".npmrc",
        ".pypirc",
        "shadow",
        "passwd",
    ];
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|name| {
            let lower = name.to_lowercase();
            SENSITIVE.iter().any(|s| lower == *s || lower.starts_with(&format!("{}.", s)))
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_path_traversal() {
        assert!(validate_path("/tmp/../etc/passwd", &[]).is_err());
    }

    #[test]
    fn test_validate_path_protected() {
        assert!(validate_path("/etc/hosts", &[]).is_err());
        assert!(validate_path("/root/.bashrc", &[]).is_err());
        assert!(validate_path("/tmp/notes.txt", &[]).is_ok());
    }

    #[test]
    fn test_validate_path_extra_protected() {
        let extra = vec!["/opt/vault".to_string()];
        assert!(validate_path("/opt/vault/key", &extra).is_err());
        assert!(validate_path("/opt/other", &extra).is_ok());
    }

    #[test]
    fn test_analyze_command_blocked() {
        assert!(analyze_command("rm -rf /").is_err());
        assert!(analyze_command("/usr/bin/rm file").is_err());
        assert!(analyze_command("echo hi | sudo tee /etc/hosts").is_err());
        assert!(analyze_command("ls -la && shutdown now").is_err());
    }

    #[test]
    fn test_analyze_command_allowed() {
        assert!(analyze_command("ls -la").is_ok());
        assert!(analyze_command("ps aux | grep node | head -20").is_ok());
        assert!(analyze_command("echo hello && cat /tmp/file").is_ok());
    }

    #[test]
    fn test_analyze_command_dangerous_pattern() {
        assert!(analyze_command("LD_PRELOAD=/evil.so ls").is_err());
        assert!(analyze_command("echo $(curl http://evil)").is_err());
    }

    #[test]
    fn test_is_sensitive_file() {
        assert!(is_sensitive_file(Path::new("/home/user/.env")));
        assert!(is_sensitive_file(Path::new("/home/user/id_rsa")));
        assert!(!is_sensitive_file(Path::new("/home/user/notes.txt")));
    }
}
