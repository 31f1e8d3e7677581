use clap::ValueEnum;

use crate::proposals::Record;

/// Primary language of generated pages.
#[derive(Debug, ValueEnum, Clone, Copy, Default, PartialEq, Eq)]
pub enum Lang {
    #[default]
    Ja,
    En,
}

impl Lang {
    pub fn as_str(self) -> &'static str {
        match self {
            Lang::Ja => "ja",
            Lang::En => "en",
        }
    }

    pub fn other(self) -> Self {
        match self {
            Lang::Ja => Lang::En,
            Lang::En => Lang::Ja,
        }
    }

    /// `base_<lang>` field name, e.g. `title_ja`.
    pub fn field(self, base: &str) -> String {
        format!("{base}_{}", self.as_str())
    }

    pub fn label(self, label: Label) -> &'static str {
        match (self, label) {
            (Lang::Ja, Label::Problem) => "課題",
            (Lang::Ja, Label::Solution) => "解決策",
            (Lang::Ja, Label::Team) => "チーム",
            (Lang::En, Label::Problem) => "Problem",
            (Lang::En, Label::Solution) => "Solution",
            (Lang::En, Label::Team) => "Team",
        }
    }

    /// Proposal count line of the listing page.
    pub fn proposal_count(self, total: usize) -> String {
        match self {
            Lang::Ja => format!("{total}件の提案"),
            Lang::En if total == 1 => "1 proposal".to_string(),
            Lang::En => format!("{total} proposals"),
        }
    }
}

/// Section headings that belong to the page chrome rather than to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Problem,
    Solution,
    Team,
}

/// Non-empty `<base>_<lang>` value, falling back to the other language.
pub fn localized<'a>(record: &'a Record, base: &str, lang: Lang) -> Option<&'a str> {
    record
        .get_str(&lang.field(base))
        .or_else(|| record.get_str(&lang.other().field(base)))
}
