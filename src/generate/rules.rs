//! Rule combinators.

/// Associativity attached to a precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Assoc {
    #[default]
    None,
    Left,
    Right,
}

/// A grammar rule expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Matches nothing.
    Blank,
    /// Literal text; becomes an anonymous token.
    String(String),
    /// Regular expression; inline patterns become hidden tokens.
    Pattern(String),
    /// Reference to another rule or external token by name.
    Symbol(String),
    Seq(Vec<Rule>),
    Choice(Vec<Rule>),
    /// Zero or more.
    Repeat(Box<Rule>),
    /// One or more.
    Repeat1(Box<Rule>),
    /// Static precedence used to resolve shift/reduce conflicts.
    Prec {
        value: i32,
        assoc: Assoc,
        rule: Box<Rule>,
    },
    /// Runtime precedence used to pick among complete GLR parses.
    PrecDynamic { value: i32, rule: Box<Rule> },
}

pub fn blank() -> Rule {
    Rule::Blank
}

pub fn lit(text: &str) -> Rule {
    Rule::String(text.to_string())
}

pub fn pat(source: &str) -> Rule {
    Rule::Pattern(source.to_string())
}

pub fn sym(name: &str) -> Rule {
    Rule::Symbol(name.to_string())
}

pub fn seq(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::Seq(rules.into_iter().collect())
}

pub fn choice(rules: impl IntoIterator<Item = Rule>) -> Rule {
    Rule::Choice(rules.into_iter().collect())
}

pub fn optional(rule: Rule) -> Rule {
    Rule::Choice(vec![rule, Rule::Blank])
}

pub fn repeat(rule: Rule) -> Rule {
    Rule::Repeat(Box::new(rule))
}

pub fn repeat1(rule: Rule) -> Rule {
    Rule::Repeat1(Box::new(rule))
}

pub fn prec(value: i32, rule: Rule) -> Rule {
    Rule::Prec {
        value,
        assoc: Assoc::None,
        rule: Box::new(rule),
    }
}

pub fn prec_left(value: i32, rule: Rule) -> Rule {
    Rule::Prec {
        value,
        assoc: Assoc::Left,
        rule: Box::new(rule),
    }
}

pub fn prec_right(value: i32, rule: Rule) -> Rule {
    Rule::Prec {
        value,
        assoc: Assoc::Right,
        rule: Box::new(rule),
    }
}

pub fn prec_dynamic(value: i32, rule: Rule) -> Rule {
    Rule::PrecDynamic {
        value,
        rule: Box::new(rule),
    }
}

/// `item (sep item)*`
pub fn sep1(item: Rule, separator: Rule) -> Rule {
    seq([item.clone(), repeat(seq([separator, item]))])
}

impl Rule {
    /// The token text or pattern when this rule is a bare token.
    pub(crate) fn as_token(&self) -> Option<&Rule> {
        match self {
            Self::String(_) | Self::Pattern(_) => Some(self),
            _ => None,
        }
    }
}
