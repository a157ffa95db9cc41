/// Domain types: advice mode, recommendations, and typed detail records.
///
/// The backend keys its detail fields with display labels ("Employment Type",
/// "Full Fee"). We keep those labels on the wire via serde renames but store
/// fixed-field structs, and map option-click labels to fields through an
/// explicit per-mode lookup table instead of dynamic key access.
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

// ── Mode ──────────────────────────────────────────────────────────────────────

/// The advice domain. Exactly one is active; toggling never touches the
/// transcript but invalidates cross-mode recommendation/detail context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Career,
    Skill,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Career => Mode::Skill,
            Mode::Skill => Mode::Career,
        }
    }

    /// Wire name used by the backend.
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Career => "career",
            Mode::Skill => "skill",
        }
    }

    /// Display label for the status bar.
    pub fn label(self) -> &'static str {
        match self {
            Mode::Career => "Career",
            Mode::Skill => "Skill",
        }
    }

    /// The selectable field options offered after a detail fetch in this mode.
    pub fn field_options(self) -> &'static [&'static str] {
        match self {
            Mode::Career => CAREER_OPTIONS,
            Mode::Skill => SKILL_OPTIONS,
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "career" => Ok(Mode::Career),
            "skill" => Ok(Mode::Skill),
            other => Err(format!("unknown mode '{other}' (expected career or skill)")),
        }
    }
}

// ── Recommendation ────────────────────────────────────────────────────────────

/// Lightweight reference returned by a chat turn; its title is the key for a
/// subsequent detail fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
}

// ── Detail records ────────────────────────────────────────────────────────────

fn na() -> String {
    "N/A".to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerDetail {
    #[serde(rename = "Company", default = "na")]
    pub company: String,
    #[serde(rename = "Location", default = "na")]
    pub location: String,
    #[serde(rename = "Employment Type", default = "na")]
    pub employment_type: String,
    #[serde(rename = "Salary", default = "na")]
    pub salary: String,
    #[serde(rename = "Job Description", default = "na")]
    pub job_description: String,
    #[serde(rename = "Link", default = "na")]
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillDetail {
    #[serde(rename = "Institution", default = "na")]
    pub institution: String,
    #[serde(rename = "Upcoming Date", default = "na")]
    pub upcoming_date: String,
    #[serde(rename = "Duration", default = "na")]
    pub duration: String,
    #[serde(rename = "Training Mode", default = "na")]
    pub training_mode: String,
    #[serde(rename = "Full Fee", default = "na")]
    pub full_fee: String,
    #[serde(rename = "Funded Fee", default = "na")]
    pub funded_fee: String,
    #[serde(rename = "About This Course", default = "na")]
    pub about: String,
    #[serde(rename = "What You'll Learn", default = "na")]
    pub syllabus: String,
    #[serde(rename = "Minimum Entry Requirement", default = "na")]
    pub entry_requirement: String,
    #[serde(rename = "Link", default = "na")]
    pub link: String,
}

/// The full structured record fetched for a single recommendation.
/// At most one is active at a time (see `InteractionSession`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailRecord {
    Career(CareerDetail),
    Skill(SkillDetail),
}

impl DetailRecord {
    /// Decode the backend's `details` object for the mode that requested it.
    pub fn from_json(mode: Mode, value: serde_json::Value) -> Result<Self> {
        Ok(match mode {
            Mode::Career => DetailRecord::Career(serde_json::from_value(value)?),
            Mode::Skill => DetailRecord::Skill(serde_json::from_value(value)?),
        })
    }

    pub fn mode(&self) -> Mode {
        match self {
            DetailRecord::Career(_) => Mode::Career,
            DetailRecord::Skill(_) => Mode::Skill,
        }
    }

    /// External listing URL, opened by the "Go to Listing" option.
    pub fn link(&self) -> &str {
        match self {
            DetailRecord::Career(d) => &d.link,
            DetailRecord::Skill(d) => &d.link,
        }
    }

    /// Option-label → field lookup table. Returns None for labels that don't
    /// belong to this record's mode (e.g. a stale cross-mode option).
    pub fn field_value(&self, label: &str) -> Option<&str> {
        match self {
            DetailRecord::Career(d) => match label {
                "Company" => Some(&d.company),
                "Location" => Some(&d.location),
                "Employment Type" => Some(&d.employment_type),
                "Salary" => Some(&d.salary),
                "Job Description" => Some(&d.job_description),
                _ => None,
            },
            DetailRecord::Skill(d) => match label {
                "Upcoming Date" => Some(&d.upcoming_date),
                "Duration" => Some(&d.duration),
                "Training Mode" => Some(&d.training_mode),
                "Full Fee" => Some(&d.full_fee),
                "Funded Fee" => Some(&d.funded_fee),
                "About This Course" => Some(&d.about),
                "What You'll Learn" => Some(&d.syllabus),
                "Minimum Entry Requirement" => Some(&d.entry_requirement),
                _ => None,
            },
        }
    }
}

// ── Field option tables ───────────────────────────────────────────────────────

/// The navigate option — opens the record's Link externally, never summarized.
pub const GO_TO_LISTING: &str = "Go to Listing";

pub const CAREER_OPTIONS: &[&str] = &[
    "Company",
    "Location",
    "Employment Type",
    "Salary",
    "Job Description",
    GO_TO_LISTING,
];

pub const SKILL_OPTIONS: &[&str] = &[
    "Upcoming Date",
    "Duration",
    "Training Mode",
    "Full Fee",
    "Funded Fee",
    "About This Course",
    "What You'll Learn",
    "Minimum Entry Requirement",
    GO_TO_LISTING,
];

/// The backend pads absent fields with "N/A"; treat those as missing too.
pub fn is_blank(value: &str) -> bool {
    let t = value.trim();
    t.is_empty() || t.eq_ignore_ascii_case("n/a")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_toggle_round_trip() {
        assert_eq!(Mode::Career.toggled(), Mode::Skill);
        assert_eq!(Mode::Career.toggled().toggled(), Mode::Career);
    }

    #[test]
    fn test_every_option_resolves_except_navigate() {
        let career = DetailRecord::Career(CareerDetail {
            company: "Acme".into(),
            location: "Remote".into(),
            employment_type: "Full Time".into(),
            salary: "$100k".into(),
            job_description: "Build things".into(),
            link: "http://x".into(),
        });
        for label in CAREER_OPTIONS {
            if *label == GO_TO_LISTING {
                assert!(career.field_value(label).is_none());
            } else {
                assert!(career.field_value(label).is_some(), "missing {label}");
            }
        }

        let skill: SkillDetail = serde_json::from_value(serde_json::json!({})).unwrap();
        let skill = DetailRecord::Skill(skill);
        for label in SKILL_OPTIONS {
            if *label == GO_TO_LISTING {
                assert!(skill.field_value(label).is_none());
            } else {
                assert_eq!(skill.field_value(label), Some("N/A"), "missing {label}");
            }
        }
    }

    #[test]
    fn test_cross_mode_label_is_none() {
        let career: CareerDetail = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(DetailRecord::Career(career).field_value("Full Fee").is_none());
    }

    #[test]
    fn test_detail_from_json_fills_missing_keys() {
        let record = DetailRecord::from_json(
            Mode::Career,
            serde_json::json!({"Company": "Acme", "Link": "http://x"}),
        )
        .unwrap();
        assert_eq!(record.field_value("Company"), Some("Acme"));
        assert_eq!(record.field_value("Salary"), Some("N/A"));
        assert_eq!(record.link(), "http://x");
    }

    #[test]
    fn test_is_blank() {
        assert!(is_blank(""));
        assert!(is_blank("   "));
        assert!(is_blank("N/A"));
        assert!(is_blank("n/a"));
        assert!(!is_blank("$95k"));
    }
}
