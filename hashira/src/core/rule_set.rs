use regex::{Regex, RegexBuilder};

use hashira_ipc::{MatchField, WindowRule};

#[derive(Debug)]
struct CompiledRule {
    rule: WindowRule,
    /// None for disabled rules and patterns that failed to compile.
    regex: Option<Regex>,
}

impl CompiledRule {
    fn compile(rule: WindowRule) -> Self {
        let regex = if rule.is_enabled() {
            match RegexBuilder::new(&rule.pattern)
                .case_insensitive(true)
                .build()
            {
                Ok(regex) => Some(regex),
                Err(e) => {
                    tracing::warn!("Invalid regex pattern \"{}\": {}", rule.pattern, e);
                    None
                }
            }
        } else {
            None
        };
        Self { rule, regex }
    }
}

/// Ordered window rules. Earlier rules take priority; the first one whose
/// pattern matches wins and later rules are not consulted.
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<WindowRule>) -> Self {
        Self {
            rules: rules.into_iter().map(CompiledRule::compile).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn rules(&self) -> impl Iterator<Item = &WindowRule> {
        self.rules.iter().map(|c| &c.rule)
    }

    pub fn to_vec(&self) -> Vec<WindowRule> {
        self.rules().cloned().collect()
    }

    /// Finds the first rule matching the window's title or class.
    ///
    /// Disabled rules, rules with invalid patterns and rules whose field has
    /// no text on this window are skipped. Matching is an unanchored search,
    /// so `Firefox` matches a class of `firefox-esr`.
    pub fn find_match(&self, title: Option<&str>, class: Option<&str>) -> Option<&WindowRule> {
        self.rules.iter().find_map(|compiled| {
            let regex = compiled.regex.as_ref()?;
            let text = match compiled.rule.field {
                MatchField::Title => title,
                MatchField::Class => class,
            }
            .filter(|t| !t.is_empty())?;

            regex.is_match(text).then_some(&compiled.rule)
        })
    }
}
