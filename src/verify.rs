// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write;
use std::path::Path;

use crate::clip::ClipId;
use crate::vocabulary::Vocabulary;

/// Severity level for a verification issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

/// A single verification issue found during checking.
#[derive(Debug, Clone)]
pub struct Issue {
    pub severity: Severity,
    pub category: &'static str,
    /// The vocabulary category the issue was found in.
    pub group: String,
    pub message: String,
}

/// Result of verifying a vocabulary.
#[derive(Debug, Clone, Default)]
pub struct VerificationReport {
    pub issues: Vec<Issue>,
}

impl VerificationReport {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }
}

/// Checks that every clip the vocabulary refers to exists under the resource root. A
/// missing clip is only a warning since it will be spoken instead. A missing resource root
/// is an error.
pub fn check_clips(vocabulary: &Vocabulary, root: &Path) -> VerificationReport {
    let mut report = VerificationReport::default();
    if !root.is_dir() {
        report.issues.push(Issue {
            severity: Severity::Error,
            category: "resource-root",
            group: root.display().to_string(),
            message: format!("resource root {} is not a directory", root.display()),
        });
    }

    for name in vocabulary.categories() {
        let items = vocabulary.category(name).unwrap_or_default();
        report.issues.extend(
            items
                .iter()
                .filter(|item| !item.clip().resolve(root).is_file())
                .map(|item| Issue {
                    severity: Severity::Warning,
                    category: "missing-clip",
                    group: name.to_string(),
                    message: format!(
                        "clip \"{}\" for \"{}\" not found, it will be spoken instead",
                        item.clip(),
                        item.english()
                    ),
                }),
        );
    }
    report
}

/// The clips the vocabulary refers to that don't exist under the resource root.
pub fn missing_clips(vocabulary: &Vocabulary, root: &Path) -> Vec<ClipId> {
    vocabulary
        .clips()
        .into_iter()
        .filter(|clip| !clip.resolve(root).is_file())
        .collect()
}

/// Tells the user where the clip files go and which ones are expected.
pub fn download_instructions(root: &Path, missing: &[ClipId]) -> String {
    let mut instructions = String::new();
    let _ = writeln!(
        instructions,
        "Pronunciation clips are loaded from {}.",
        root.display()
    );
    if missing.is_empty() {
        let _ = writeln!(instructions, "All clips are in place.");
        return instructions;
    }

    let _ = writeln!(
        instructions,
        "Record or download the following {} clip(s) and save them there under exactly these names:",
        missing.len()
    );
    for clip in missing.iter().collect::<BTreeSet<_>>() {
        let _ = writeln!(instructions, "  - {}", clip);
    }
    let _ = writeln!(
        instructions,
        "Any audio format the player can decode works (mp3, wav, ogg, flac). Until a clip is \
         in place, its name is spoken with synthesized speech instead."
    );
    instructions
}

/// Prints a verification report grouped by vocabulary category.
pub fn print_report(report: &VerificationReport, vocabulary: &Vocabulary) {
    if report.is_clean() {
        println!(
            "\u{2705} All {} vocabulary item(s) have clips.",
            vocabulary.len()
        );
        return;
    }

    let mut by_group: BTreeMap<&str, Vec<&Issue>> = BTreeMap::new();
    for issue in &report.issues {
        by_group.entry(&issue.group).or_default().push(issue);
    }

    for (group, issues) in &by_group {
        let has_errors = issues.iter().any(|i| i.severity == Severity::Error);
        let icon = if has_errors {
            "\u{274c}"
        } else {
            "\u{26a0}\u{fe0f} "
        };
        println!("{} {}", icon, group);
        for issue in issues {
            let severity_icon = match issue.severity {
                Severity::Warning => "\u{26a0}\u{fe0f} ",
                Severity::Error => "\u{274c}",
            };
            println!(
                "   {} [{}] {}",
                severity_icon, issue.category, issue.message
            );
        }
    }

    println!(
        "\nSummary: {} issue(s) found across {} group(s).",
        report.issues.len(),
        by_group.len()
    );
}

#[cfg(test)]
mod tests {
    use std::{error::Error, fs};

    use super::*;
    use crate::vocabulary::VocabularyItem;

    fn vocabulary() -> Vocabulary {
        Vocabulary::new(vec![
            (
                "basics".to_string(),
                vec![
                    VocabularyItem::new("پانی", "Water", ClipId::from("pani.mp3")),
                    VocabularyItem::new("کتاب", "Book", ClipId::from("kitab.mp3")),
                ],
            ),
            (
                "people".to_string(),
                vec![VocabularyItem::new("دوست", "Friend", ClipId::from("dost.mp3"))],
            ),
        ])
    }

    #[test]
    fn test_check_clips() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        fs::write(dir.path().join("pani.mp3"), b"")?;
        fs::write(dir.path().join("dost.mp3"), b"")?;

        let report = check_clips(&vocabulary(), dir.path());
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].group, "basics");
        assert_eq!(report.issues[0].category, "missing-clip");
        assert_eq!(report.issues[0].severity, Severity::Warning);
        assert!(report.issues[0].message.contains("kitab.mp3"));
        assert!(!report.has_errors());

        assert_eq!(
            vec![ClipId::from("kitab.mp3")],
            missing_clips(&vocabulary(), dir.path())
        );
        Ok(())
    }

    #[test]
    fn test_check_clips_missing_root() -> Result<(), Box<dyn Error>> {
        let dir = tempfile::tempdir()?;
        let root = dir.path().join("nonexistent");

        let report = check_clips(&vocabulary(), &root);
        assert!(report.has_errors());
        assert_eq!(report.issues.len(), 4);
        Ok(())
    }

    #[test]
    fn test_download_instructions() {
        let root = Path::new("assets/audio");
        let instructions = download_instructions(
            root,
            &[ClipId::from("pani.mp3"), ClipId::from("kitab.mp3")],
        );
        assert!(instructions.contains("assets/audio"));
        assert!(instructions.contains("2 clip(s)"));
        assert!(instructions.contains("  - kitab.mp3\n  - pani.mp3\n"));

        let instructions = download_instructions(root, &[]);
        assert!(instructions.contains("All clips are in place."));
    }
}
