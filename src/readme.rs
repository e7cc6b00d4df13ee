//! README metadata extraction.
//!
//! Pure pattern-matchers from raw README text to a [`ReadmeFragment`].
//! Each section extractor is independent and tolerant of absence: a
//! missing heading never fails the parse, it just leaves that field
//! unset (or at its sentinel default). Identical input always yields
//! identical output.

use regex::Regex;
use std::sync::OnceLock;

use crate::models::{ReadmeFragment, TechStack};

/// Display labels for the five tech-stack bullet lines, in README order.
pub const TECH_CATEGORIES: [&str; 5] =
    ["Frontend", "Backend", "Database", "Hardware", "Other Tools"];

fn title_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^# (.+)").unwrap())
}

fn description_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)## Description\n(.+?)(?:\n##|\z)").unwrap())
}

fn features_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)## Features\n(.+?)(?:\n##|\z)").unwrap())
}

fn demo_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)(?:Demo Link|Live Demo):?\s*(https?://\S+)").unwrap())
}

fn devpost_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Devpost:?\s*(https?://devpost\.com/\S+)").unwrap())
}

fn tech_res() -> &'static [Regex; 5] {
    static RES: OnceLock<[Regex; 5]> = OnceLock::new();
    RES.get_or_init(|| {
        TECH_CATEGORIES.map(|cat| {
            Regex::new(&format!(r"- \*\*{}:\*\* ?(.*)", regex::escape(cat))).unwrap()
        })
    })
}

/// Parse raw README text into a metadata fragment.
///
/// Empty or whitespace-only input short-circuits to the empty fragment;
/// no record is fabricated from nothing.
pub fn parse_readme(content: &str) -> ReadmeFragment {
    if content.trim().is_empty() {
        return ReadmeFragment::default();
    }

    ReadmeFragment {
        project_name: extract_title(content),
        description: extract_section(content, description_re()),
        tech_stack: extract_tech_stack(content),
        features: extract_features(content),
        demo_link: extract_link(content, demo_link_re()),
        devpost_link: extract_link(content, devpost_link_re()),
    }
}

/// First level-1 heading anywhere in the document, trimmed.
fn extract_title(content: &str) -> Option<String> {
    title_re()
        .captures(content)
        .map(|c| c[1].trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Section body up to the next `##` heading or end of document, trimmed.
fn extract_section(content: &str, re: &Regex) -> Option<String> {
    re.captures(content)
        .map(|c| c[1].trim().to_string())
        .filter(|s| !s.is_empty())
}

/// All five categories, unconditionally: absent or empty lines resolve
/// to the `Not specified` sentinel so the mapping is never partial.
fn extract_tech_stack(content: &str) -> TechStack {
    let mut stack = TechStack::default();
    let res = tech_res();
    let slots = [
        &mut stack.frontend,
        &mut stack.backend,
        &mut stack.database,
        &mut stack.hardware,
        &mut stack.other_tools,
    ];
    for (re, slot) in res.iter().zip(slots) {
        if let Some(caps) = re.captures(content) {
            let value = caps[1].trim();
            if !value.is_empty() {
                *slot = value.to_string();
            }
        }
    }
    stack
}

/// Bullet lines from the `## Features` section, list markup stripped,
/// blanks dropped, order preserved.
fn extract_features(content: &str) -> Vec<String> {
    let Some(caps) = features_re().captures(content) else {
        return Vec::new();
    };
    caps[1]
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix("- ").unwrap_or(line).trim()
        })
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// First URL following the label pattern, if any.
fn extract_link(content: &str, re: &Regex) -> Option<String> {
    re.captures(content).map(|c| c[1].trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NOT_SPECIFIED;

    const FULL: &str = "\
# Digital Medics
## Description
A system for healthcare alerts.
## Tech Stack
- **Frontend:** React
- **Backend:** Flask, Python
- **Database:**
- **Other Tools:** Twilio
## Features
- Real-time alerts
- SMS notifications

## Links
Demo Link: https://example.com/demo
Devpost: https://devpost.com/software/digital-medics
";

    #[test]
    fn parses_all_sections() {
        let frag = parse_readme(FULL);
        assert_eq!(frag.project_name.as_deref(), Some("Digital Medics"));
        assert_eq!(
            frag.description.as_deref(),
            Some("A system for healthcare alerts.")
        );
        assert_eq!(frag.tech_stack.frontend, "React");
        assert_eq!(frag.tech_stack.backend, "Flask, Python");
        // Present but empty value resolves to the sentinel
        assert_eq!(frag.tech_stack.database, NOT_SPECIFIED);
        assert_eq!(frag.tech_stack.hardware, NOT_SPECIFIED);
        assert_eq!(frag.tech_stack.other_tools, "Twilio");
        assert_eq!(frag.features, vec!["Real-time alerts", "SMS notifications"]);
        assert_eq!(frag.demo_link.as_deref(), Some("https://example.com/demo"));
        assert_eq!(
            frag.devpost_link.as_deref(),
            Some("https://devpost.com/software/digital-medics")
        );
    }

    #[test]
    fn digital_medics_readme_end_to_end() {
        let text = "# Digital Medics\n## Description\nA system for healthcare alerts.\n## Features\n- Real-time alerts\n- SMS notifications\n";
        let frag = parse_readme(text);
        assert_eq!(frag.project_name.as_deref(), Some("Digital Medics"));
        assert_eq!(
            frag.description.as_deref(),
            Some("A system for healthcare alerts.")
        );
        assert_eq!(frag.features, vec!["Real-time alerts", "SMS notifications"]);
        assert!(frag.tech_stack.is_default());
    }

    #[test]
    fn empty_input_is_empty_fragment() {
        assert!(parse_readme("").is_empty());
        assert!(parse_readme("   \n\t ").is_empty());
    }

    #[test]
    fn unrecognized_prose_is_empty_fragment() {
        let frag = parse_readme("just some text\nwith no headings at all\n");
        assert!(frag.is_empty());
        assert!(frag.tech_stack.is_default());
        assert!(frag.features.is_empty());
    }

    #[test]
    fn parsing_is_idempotent() {
        let a = parse_readme(FULL);
        let b = parse_readme(FULL);
        assert_eq!(a, b);
    }

    #[test]
    fn title_is_first_match_anywhere() {
        let frag = parse_readme("intro text\n# First Title\nbody\n# Second Title\n");
        assert_eq!(frag.project_name.as_deref(), Some("First Title"));
    }

    #[test]
    fn description_stops_at_next_heading() {
        let frag = parse_readme("## Description\nline one\nline two\n## Features\n- x\n");
        assert_eq!(frag.description.as_deref(), Some("line one\nline two"));
    }

    #[test]
    fn description_runs_to_end_of_document() {
        let frag = parse_readme("## Description\ntrailing text");
        assert_eq!(frag.description.as_deref(), Some("trailing text"));
    }

    #[test]
    fn features_drop_blank_lines_and_keep_order() {
        let frag = parse_readme("## Features\n- first\n\n- second\nthird without marker\n");
        assert_eq!(frag.features, vec!["first", "second", "third without marker"]);
    }

    #[test]
    fn demo_link_labels_are_case_insensitive() {
        let frag = parse_readme("# T\nlive demo: https://demo.example.org\n");
        assert_eq!(frag.demo_link.as_deref(), Some("https://demo.example.org"));
    }

    #[test]
    fn devpost_link_requires_devpost_domain() {
        let frag = parse_readme("# T\nDevpost: https://example.com/not-devpost\n");
        assert_eq!(frag.devpost_link, None);
    }
}
