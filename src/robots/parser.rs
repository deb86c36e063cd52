//! Robots.txt parser implementation
//!
//! Parsing and matching go through the robotstxt crate (a port of Google's
//! robots.txt parser). A small parse handler records the `Disallow` values
//! that apply to our token and every `Sitemap:` directive, so they can be
//! reported alongside the audit.

use robotstxt::{parse_robotstxt, DefaultMatcher, RobotsParseHandler};

/// Parsed robots.txt data relevant to an audit crawl
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRobots {
    /// Raw robots.txt content (empty string means allow all)
    content: String,

    /// Product token matched against `User-agent:` lines
    token: String,

    /// Disallow values for our groups, in file order, without duplicates
    pub disallow_rules: Vec<String>,

    /// Absolute sitemap URLs announced by the file
    pub sitemaps: Vec<String>,
}

/// Collects rules while the robotstxt parser walks the file
struct RuleCollector {
    token: String,
    group_agents: Vec<String>,
    in_rules: bool,
    disallow_rules: Vec<String>,
    sitemaps: Vec<String>,
}

impl RuleCollector {
    fn new(token: &str) -> Self {
        Self {
            token: token.to_lowercase(),
            group_agents: Vec::new(),
            in_rules: false,
            disallow_rules: Vec::new(),
            sitemaps: Vec::new(),
        }
    }

    fn group_applies(&self) -> bool {
        self.group_agents
            .iter()
            .any(|agent| agent == "*" || *agent == self.token)
    }
}

impl RobotsParseHandler for RuleCollector {
    fn handle_robots_start(&mut self) {}

    fn handle_robots_end(&mut self) {}

    fn handle_user_agent(&mut self, _line_num: u32, user_agent: &str) {
        // A user-agent line after rules starts a new group
        if self.in_rules {
            self.group_agents.clear();
            self.in_rules = false;
        }
        self.group_agents.push(user_agent.trim().to_lowercase());
    }

    fn handle_allow(&mut self, _line_num: u32, _value: &str) {
        self.in_rules = true;
    }

    fn handle_disallow(&mut self, _line_num: u32, value: &str) {
        self.in_rules = true;
        let value = value.trim();
        if self.group_applies()
            && !value.is_empty()
            && !self.disallow_rules.iter().any(|r| r == value)
        {
            self.disallow_rules.push(value.to_string());
        }
    }

    fn handle_sitemap(&mut self, _line_num: u32, value: &str) {
        let value = value.trim();
        if !value.is_empty() && !self.sitemaps.iter().any(|s| s == value) {
            self.sitemaps.push(value.to_string());
        }
    }

    fn handle_unknown_action(&mut self, _line_num: u32, _action: &str, _value: &str) {
        self.in_rules = true;
    }
}

impl ParsedRobots {
    /// Parses raw robots.txt content for the given crawler token
    ///
    /// Rules are collected from groups addressed to `*` or to `user_agent`
    /// (case-insensitive). Empty `Disallow:` lines mean "allow everything"
    /// and contribute no rule. Malformed lines are ignored.
    pub fn parse(content: &str, user_agent: &str) -> Self {
        let mut collector = RuleCollector::new(user_agent);
        parse_robotstxt(content, &mut collector);

        Self {
            content: content.to_string(),
            token: user_agent.to_string(),
            disallow_rules: collector.disallow_rules,
            sitemaps: collector.sitemaps,
        }
    }

    /// Checks if a URL is allowed for our crawler
    ///
    /// # Arguments
    ///
    /// * `url` - Absolute URL or path to check
    ///
    /// # Returns
    ///
    /// * `true` - If the URL may be fetched
    /// * `false` - If robots.txt disallows it
    pub fn is_allowed(&self, url: &str) -> bool {
        if self.content.is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, &self.token, url)
    }
}
