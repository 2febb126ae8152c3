use regex::Regex;
use serde::{Deserialize, Serialize};

/// Closed set of request intents. Derived per request, never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Query,
    AddPerson,
    AddRelationship,
    Update,
    Error,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::AddPerson => "add_person",
            Self::AddRelationship => "add_relationship",
            Self::Update => "update",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule-based intent classification. No model call, no I/O.
///
/// Rules are evaluated top to bottom and the first match wins, so creation
/// rules must precede the modification rule: "set Alice as a friend of Bob"
/// contains both a creation verb and `set`, and must classify as relationship
/// creation rather than update. The rule order is part of the contract.
pub struct IntentClassifier {
    rules: Vec<(Regex, Intent)>,
}

impl IntentClassifier {
    pub fn new() -> Self {
        let rules = vec![
            (
                pattern(r"(?i)\b(add|create|insert|register|new)\b.*\b(person|people|individual|user|member)\b"),
                Intent::AddPerson,
            ),
            (
                pattern(r"(?i)\b(add|create|make|set)\b.*\b(friend|spouse|parent|child|sibling|colleague|neighbor|relationship|connection)"),
                Intent::AddRelationship,
            ),
            (
                pattern(r"(?i)\b(update|change|modify|edit|set|rename)\b.*\b(name|age|phone|email|address|job|title)\b"),
                Intent::Update,
            ),
        ];
        Self { rules }
    }

    pub fn classify(&self, request: &str) -> Intent {
        if request.trim().is_empty() {
            return Intent::Error;
        }
        for (rule, intent) in &self.rules {
            if rule.is_match(request) {
                return *intent;
            }
        }
        Intent::Query
    }
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn pattern(source: &str) -> Regex {
    // The rule table is fixed at compile time; a malformed pattern is a
    // programming error, caught by the constructor test below.
    Regex::new(source).unwrap_or_else(|error| panic!("invalid intent rule `{source}`: {error}"))
}

#[cfg(test)]
mod tests {
    use super::{Intent, IntentClassifier};

    #[test]
    fn constructor_compiles_all_rules() {
        let classifier = IntentClassifier::new();
        assert_eq!(classifier.rules.len(), 3);
    }

    #[test]
    fn plain_questions_default_to_query() {
        let classifier = IntentClassifier::new();
        assert_eq!(classifier.classify("Who are David's friends?"), Intent::Query);
        assert_eq!(classifier.classify("List everyone living in Boston"), Intent::Query);
        assert_eq!(classifier.classify("How old is Alice?"), Intent::Query);
    }

    #[test]
    fn person_creation_is_detected() {
        let classifier = IntentClassifier::new();
        assert_eq!(
            classifier.classify("Add a new person named Carol, age 34"),
            Intent::AddPerson
        );
        assert_eq!(classifier.classify("register a member called Bob"), Intent::AddPerson);
    }

    #[test]
    fn relationship_creation_is_detected() {
        let classifier = IntentClassifier::new();
        assert_eq!(
            classifier.classify("Make Alice a friend of Bob"),
            Intent::AddRelationship
        );
        assert_eq!(
            classifier.classify("add a friend who is the parent of Dana"),
            Intent::AddRelationship
        );
    }

    #[test]
    fn creation_keywords_win_over_query_wording() {
        // Ordering invariant: a creation keyword before any relationship
        // keyword must yield a creation intent, never the default query.
        let classifier = IntentClassifier::new();
        let request = "Create a person entry for the user who knows everyone";
        assert_eq!(classifier.classify(request), Intent::AddPerson);
    }

    #[test]
    fn creation_rules_precede_the_update_rule() {
        let classifier = IntentClassifier::new();
        // `set` appears in both the relationship and update rules; the
        // relationship rule is checked first.
        assert_eq!(
            classifier.classify("Set Alice as the spouse of Bob"),
            Intent::AddRelationship
        );
        assert_eq!(classifier.classify("Set Alice's phone to 555-0199"), Intent::Update);
    }

    #[test]
    fn update_requests_are_detected() {
        let classifier = IntentClassifier::new();
        assert_eq!(classifier.classify("Change Bob's email to bob@example.org"), Intent::Update);
        assert_eq!(classifier.classify("modify Carol's job title"), Intent::Update);
    }

    #[test]
    fn blank_requests_classify_as_error() {
        let classifier = IntentClassifier::new();
        assert_eq!(classifier.classify(""), Intent::Error);
        assert_eq!(classifier.classify("   \t\n"), Intent::Error);
    }
}
