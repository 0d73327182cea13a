//! Digest rendering shared by the delivery channels: section grouping with
//! an explicit priority order, plus markdown and HTML output formats.

use crate::types::DigestItem;
use chrono::Utc;
use std::collections::HashMap;

const FALLBACK_RANK: u32 = 99;

/// Explicit total order over digest sections: id -> (label, rank).
/// Unknown section ids render with a generic label after all known ones.
#[derive(Debug, Clone)]
pub struct SectionTable {
    entries: Vec<(String, String, u32)>,
}

impl Default for SectionTable {
    fn default() -> Self {
        Self {
            entries: vec![
                ("ai_dev".into(), "🤖 AI & Development".into(), 1),
                ("x_timeline".into(), "🐦 X Timeline".into(), 2),
                ("gamedev_ai".into(), "🎮 Game-Dev AI".into(), 3),
                ("politics".into(), "🏛 World & Politics".into(), 4),
                ("finance".into(), "💰 Finance".into(), 5),
            ],
        }
    }
}

impl SectionTable {
    pub fn new(entries: Vec<(String, String, u32)>) -> Self {
        Self { entries }
    }

    pub fn label(&self, section: &str) -> String {
        self.entries
            .iter()
            .find(|(id, _, _)| id == section)
            .map(|(_, label, _)| label.clone())
            .unwrap_or_else(|| format!("📌 {section}"))
    }

    pub fn rank(&self, section: &str) -> u32 {
        self.entries
            .iter()
            .find(|(id, _, _)| id == section)
            .map(|(_, _, rank)| *rank)
            .unwrap_or(FALLBACK_RANK)
    }

    pub fn known_ids(&self) -> Vec<&str> {
        self.entries.iter().map(|(id, _, _)| id.as_str()).collect()
    }
}

/// Group items by section, sections in table-rank order (unknown sections
/// last, alphabetical), items within a section by importance descending.
pub fn group_by_section<'a>(
    digest: &'a [DigestItem],
    sections: &SectionTable,
) -> Vec<(String, Vec<&'a DigestItem>)> {
    let mut groups: HashMap<&str, Vec<&DigestItem>> = HashMap::new();
    for item in digest {
        groups.entry(item.section.as_str()).or_default().push(item);
    }

    let mut ids: Vec<&str> = groups.keys().copied().collect();
    ids.sort_by_key(|id| (sections.rank(id), id.to_string()));

    ids.into_iter()
        .map(|id| {
            let mut items = groups.remove(id).unwrap_or_default();
            items.sort_by(|a, b| b.importance.cmp(&a.importance));
            (sections.label(id), items)
        })
        .collect()
}

pub fn digest_title() -> String {
    format!("📰 AI News Digest — {}", Utc::now().format("%Y-%m-%d"))
}

pub fn to_markdown(digest: &[DigestItem], sections: &SectionTable) -> String {
    let mut lines = vec![format!("# {}\n", digest_title())];

    for (label, items) in group_by_section(digest, sections) {
        lines.push(format!("## {label}\n"));
        for (i, item) in items.iter().enumerate() {
            lines.push(format!("### {}. {}", i + 1, item.title));
            lines.push(format!("⭐ {}/10\n", item.importance));
            lines.push(format!("{}\n", item.summary));
            lines.push(format!("🔗 [link]({})\n", item.url));
        }
        lines.push("---\n".to_string());
    }

    lines.join("\n")
}

pub fn to_html(digest: &[DigestItem], sections: &SectionTable) -> String {
    let mut parts = vec![
        "<html><body style='font-family:sans-serif;max-width:700px;margin:auto'>".to_string(),
        format!("<h1>{}</h1>", digest_title()),
    ];

    for (label, items) in group_by_section(digest, sections) {
        parts.push(format!("<h2>{label}</h2>"));
        for (i, item) in items.iter().enumerate() {
            parts.push(format!("<h3>{}. {}</h3>", i + 1, item.title));
            parts.push(format!("<p><strong>⭐ {}/10</strong></p>", item.importance));
            parts.push(format!("<p>{}</p>", item.summary));
            parts.push(format!("<p>🔗 <a href=\"{}\">link</a></p>", item.url));
        }
        parts.push("<hr/>".to_string());
    }

    parts.push("</body></html>".to_string());
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(section: &str, title: &str, importance: u8) -> DigestItem {
        DigestItem {
            section: section.to_string(),
            title: title.to_string(),
            summary: format!("{title} summary"),
            importance,
            url: format!("https://example.com/{title}"),
        }
    }

    #[test]
    fn sections_follow_table_rank_not_input_order() {
        let digest = vec![
            item("politics", "p1", 5),
            item("ai_dev", "a1", 3),
            item("finance", "f1", 9),
        ];
        let groups = group_by_section(&digest, &SectionTable::default());
        let labels: Vec<&str> = groups.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(
            labels,
            vec!["🤖 AI & Development", "🏛 World & Politics", "💰 Finance"]
        );
    }

    #[test]
    fn items_sorted_by_importance_descending_within_section() {
        let digest = vec![
            item("ai_dev", "low", 2),
            item("ai_dev", "high", 9),
            item("ai_dev", "mid", 5),
        ];
        let groups = group_by_section(&digest, &SectionTable::default());
        let titles: Vec<&str> = groups[0].1.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["high", "mid", "low"]);
    }

    #[test]
    fn unknown_sections_render_last_with_generic_label() {
        let digest = vec![item("space", "s1", 10), item("ai_dev", "a1", 1)];
        let groups = group_by_section(&digest, &SectionTable::default());
        assert_eq!(groups[0].0, "🤖 AI & Development");
        assert_eq!(groups[1].0, "📌 space");
    }

    #[test]
    fn markdown_contains_all_items() {
        let digest = vec![item("ai_dev", "headline", 7)];
        let md = to_markdown(&digest, &SectionTable::default());
        assert!(md.contains("headline"));
        assert!(md.contains("⭐ 7/10"));
        assert!(md.contains("https://example.com/headline"));
    }
}
