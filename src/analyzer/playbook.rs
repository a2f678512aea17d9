//! Built-in response playbooks.

use crate::alert::RecommendedAction;

/// Key of the playbook used when the model names an unknown one.
pub const DEFAULT_PLAYBOOK: &str = "default";

/// A named set of follow-up actions for a kind of signal.
#[derive(Debug, Clone, Copy)]
pub struct Playbook {
    pub key: &'static str,
    pub name: &'static str,
    actions: &'static [(&'static str, &'static str, &'static str)],
}

impl Playbook {
    /// The playbook's actions.
    pub fn actions(&self) -> Vec<RecommendedAction> {
        self.actions
            .iter()
            .map(|(action, owner, priority)| RecommendedAction::new(action, owner, priority))
            .collect()
    }
}

/// Every playbook offered to the model, in prompt order.
pub const PLAYBOOKS: &[Playbook] = &[
    Playbook {
        key: "product_launch",
        name: "Competitor Product Launch",
        actions: &[
            ("Analyze product specifications", "Product Management", "high"),
            ("Compare pricing vs our products", "Pricing Team", "high"),
            ("Assess impact on target markets", "Marketing", "medium"),
            ("Update competitive battle cards", "Sales Enablement", "medium"),
            ("Monitor customer reactions", "Customer Success", "low"),
        ],
    },
    Playbook {
        key: "pricing_change",
        name: "Competitor Pricing Change",
        actions: &[
            ("Validate pricing information", "Competitive Intelligence", "high"),
            ("Analyze impact on win rates", "Sales Operations", "high"),
            ("Review our pricing strategy", "Pricing Team", "medium"),
            ("Prepare sales team talking points", "Sales Enablement", "medium"),
        ],
    },
    Playbook {
        key: "partnership",
        name: "Competitor Partnership/Alliance",
        actions: &[
            ("Assess strategic implications", "Strategy", "high"),
            ("Evaluate channel impact", "Channel Sales", "medium"),
            ("Review our partnership opportunities", "Business Development", "medium"),
        ],
    },
    Playbook {
        key: "acquisition",
        name: "Competitor Acquisition/Merger",
        actions: &[
            ("Analyze strategic rationale", "Strategy", "high"),
            ("Assess market consolidation impact", "Strategy", "high"),
            ("Review customer retention opportunities", "Sales", "medium"),
            ("Monitor integration progress", "Competitive Intelligence", "low"),
        ],
    },
    Playbook {
        key: DEFAULT_PLAYBOOK,
        name: "General Competitive Update",
        actions: &[
            ("Document and categorize change", "Competitive Intelligence", "medium"),
            ("Assess relevance to our business", "Product Management", "medium"),
            ("Determine if follow-up needed", "Competitive Intelligence", "low"),
        ],
    },
];

/// Look up a playbook by key.
pub fn find_playbook(key: &str) -> Option<&'static Playbook> {
    PLAYBOOKS.iter().find(|p| p.key == key)
}

/// The playbook for `key`, falling back to the default playbook.
pub fn playbook_or_default(key: &str) -> &'static Playbook {
    find_playbook(key)
        .or_else(|| find_playbook(DEFAULT_PLAYBOOK))
        .unwrap_or(&PLAYBOOKS[PLAYBOOKS.len() - 1])
}

/// One `- key: Name` line per playbook.
pub fn playbook_summary() -> String {
    PLAYBOOKS
        .iter()
        .map(|p| format!("- {}: {}", p.key, p.name))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert_eq!(playbook_or_default("pricing_change").actions().len(), 4);
        assert_eq!(playbook_or_default("nonsense").key, DEFAULT_PLAYBOOK);
        assert!(find_playbook("nonsense").is_none());
    }

    #[test]
    fn test_summary_lines() {
        let summary = playbook_summary();
        assert_eq!(summary.lines().count(), PLAYBOOKS.len());
        assert!(summary.starts_with("- product_launch: Competitor Product Launch"));
    }
}
