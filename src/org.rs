//! Email-domain to organization classification.

use crate::config::OrgConfig;
use crate::error::Result;
use regex::Regex;

/// Maps author emails to one of the selected organizations.
///
/// The whole-domain pattern is built once from every selected org's tokens
/// (its domain aliases, or the org id when it has none) in configuration
/// order. When tokens overlap, the regex's leftmost-first semantics decide:
/// the greedy prefix picks the last `token.` occurrence in the domain and,
/// at that position, the earlier-configured token wins.
#[derive(Debug, Clone)]
pub struct OrgResolver {
    pattern: Regex,
    orgs: Vec<(String, Vec<String>)>,
}

impl OrgResolver {
    pub fn new(config: &OrgConfig, selected: &[String]) -> Result<Self> {
        let mut orgs = Vec::with_capacity(selected.len());
        let mut alternatives = Vec::new();
        for id in selected {
            let aliases = config
                .get(id)
                .map(|entry| entry.domains.clone())
                .unwrap_or_default();
            alternatives.extend(tokens(id, &aliases).map(|t| regex::escape(t)));
            orgs.push((id.clone(), aliases));
        }
        let pattern = Regex::new(&format!("^.*({})[.]", alternatives.join("|")))?;
        Ok(Self { pattern, orgs })
    }

    /// `None` means the email belongs to no selected organization.
    pub fn resolve(&self, email: &str) -> Option<&str> {
        let domain = email.rsplit('@').next().unwrap_or(email);
        let token = self.pattern.captures(domain)?.get(1)?.as_str();
        if let Some((id, _)) = self.orgs.iter().find(|(id, _)| id == token) {
            return Some(id);
        }
        self.orgs
            .iter()
            .find(|(_, aliases)| aliases.iter().any(|a| a == token))
            .map(|(id, _)| id.as_str())
    }

    /// Pattern for an address of `org` inside free-form trailer text.
    pub fn trailer_pattern(&self, org: &str) -> String {
        let aliases = self
            .orgs
            .iter()
            .find(|(id, _)| id == org)
            .map(|(_, aliases)| aliases.as_slice())
            .unwrap_or(&[]);
        let alternatives: Vec<String> = tokens(org, aliases).map(regex::escape).collect();
        format!("@(.*[.]|)({})[.]", alternatives.join("|"))
    }
}

fn tokens<'a>(id: &'a str, aliases: &'a [String]) -> Box<dyn Iterator<Item = &'a str> + 'a> {
    if aliases.is_empty() {
        Box::new(std::iter::once(id))
    } else {
        Box::new(aliases.iter().map(String::as_str))
    }
}
