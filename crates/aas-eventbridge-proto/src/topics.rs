//! MQTT topic scheme for model mutation events.
//!
//! Topic structure:
//!
//! ```text
//! aas-repository/{repo}/shells/created
//! aas-repository/{repo}/shells/{sid}/submodels/created
//! aas-repository/{repo}/shells/{sid}/submodels/deleted
//! aas-repository/{repo}/shells/{sid}/submodels/{smid}/submodelElements/{path}/created
//! .../submodelElements/{path}/updated
//! .../submodelElements/{path}/deleted
//! .../submodelElements/{path}/value
//! ```
//!
//! `{sid}` and `{smid}` are base64url encoded, `{path}` is the normalized
//! idShortPath. Topics are a pure function of the identifiers and the kind,
//! so subscribers can register patterns before any event occurs.

use crate::encoding::{decode_id_base64url, encode_id_base64url};
use aas_eventbridge_core::{normalize_path, EntityIds, EventKind};
use serde::{Deserialize, Serialize};

/// Root segment of every topic.
pub const TOPIC_ROOT: &str = "aas-repository";

/// Repository used when an event carries no repository id.
pub const DEFAULT_REPOSITORY: &str = "aas-repo";

/// Kind of a published topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TopicKind {
    /// A shell was announced
    ShellCreated,
    /// A submodel was added to a shell
    SubmodelCreated,
    /// A submodel was removed from a shell
    SubmodelDeleted,
    /// An element was created
    ElementCreated,
    /// An element was replaced
    ElementUpdated,
    /// An element was deleted
    ElementDeleted,
    /// The value of an element changed
    ElementValue,
}

impl TopicKind {
    fn element_suffix(self) -> Option<&'static str> {
        match self {
            Self::ElementCreated => Some("created"),
            Self::ElementUpdated => Some("updated"),
            Self::ElementDeleted => Some("deleted"),
            Self::ElementValue => Some("value"),
            Self::ShellCreated | Self::SubmodelCreated | Self::SubmodelDeleted => None,
        }
    }

    fn from_element_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "created" => Some(Self::ElementCreated),
            "updated" => Some(Self::ElementUpdated),
            "deleted" => Some(Self::ElementDeleted),
            "value" => Some(Self::ElementValue),
            _ => None,
        }
    }
}

impl From<EventKind> for TopicKind {
    fn from(kind: EventKind) -> Self {
        match kind {
            EventKind::SubmodelAdded => Self::SubmodelCreated,
            EventKind::SubmodelRemoved => Self::SubmodelDeleted,
            EventKind::ElementAdded => Self::ElementCreated,
            EventKind::ElementRemoved => Self::ElementDeleted,
            EventKind::ElementUpdated => Self::ElementUpdated,
            EventKind::ElementValueChanged => Self::ElementValue,
        }
    }
}

/// Components recovered from a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTopic {
    /// Kind of event the topic carries
    pub kind: TopicKind,
    /// Repository segment
    pub repo_id: String,
    /// Decoded shell id (absent for shell announcements)
    pub shell_id: Option<String>,
    /// Decoded submodel id (element topics only)
    pub submodel_id: Option<String>,
    /// Element path (element topics only)
    pub path: Option<String>,
}

/// Topic scheme configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicScheme {
    /// Repository segment used when an event carries none
    pub default_repo: String,
}

impl Default for TopicScheme {
    fn default() -> Self {
        Self {
            default_repo: DEFAULT_REPOSITORY.to_string(),
        }
    }
}

impl TopicScheme {
    /// Create a scheme with the given default repository.
    #[must_use]
    pub fn new(default_repo: impl Into<String>) -> Self {
        Self {
            default_repo: default_repo.into(),
        }
    }

    fn repo<'a>(&'a self, repo_id: Option<&'a str>) -> &'a str {
        repo_id.unwrap_or(&self.default_repo)
    }

    fn shell_base(&self, shell_id: &str, repo_id: Option<&str>) -> String {
        format!(
            "{TOPIC_ROOT}/{}/shells/{}",
            self.repo(repo_id),
            encode_id_base64url(shell_id)
        )
    }

    /// Topic announcing a shell.
    #[must_use]
    pub fn shell_created(&self, repo_id: Option<&str>) -> String {
        format!("{TOPIC_ROOT}/{}/shells/created", self.repo(repo_id))
    }

    /// Topic for a submodel added to a shell.
    #[must_use]
    pub fn submodel_created(&self, shell_id: &str, repo_id: Option<&str>) -> String {
        format!("{}/submodels/created", self.shell_base(shell_id, repo_id))
    }

    /// Topic for a submodel removed from a shell.
    #[must_use]
    pub fn submodel_deleted(&self, shell_id: &str, repo_id: Option<&str>) -> String {
        format!("{}/submodels/deleted", self.shell_base(shell_id, repo_id))
    }

    fn element(&self, ids: &EntityIds, path: &str, suffix: &str) -> String {
        format!(
            "{}/submodels/{}/submodelElements/{}/{suffix}",
            self.shell_base(&ids.shell_id, ids.repo_id.as_deref()),
            encode_id_base64url(&ids.submodel_id),
            normalize_path(path),
        )
    }

    /// Topic for an element event of the given kind.
    ///
    /// Submodel kinds ignore `path`; the shell announcement ignores the ids
    /// apart from the repository.
    #[must_use]
    pub fn topic(&self, kind: TopicKind, ids: &EntityIds, path: &str) -> String {
        let repo_id = ids.repo_id.as_deref();
        match kind {
            TopicKind::ShellCreated => self.shell_created(repo_id),
            TopicKind::SubmodelCreated => self.submodel_created(&ids.shell_id, repo_id),
            TopicKind::SubmodelDeleted => self.submodel_deleted(&ids.shell_id, repo_id),
            TopicKind::ElementCreated
            | TopicKind::ElementUpdated
            | TopicKind::ElementDeleted
            | TopicKind::ElementValue => {
                let suffix = kind.element_suffix().unwrap_or_default();
                self.element(ids, path, suffix)
            }
        }
    }

    /// Topic for a mutation event.
    ///
    /// Total over all kinds: a missing path maps to the empty path.
    #[must_use]
    pub fn for_event(&self, kind: EventKind, ids: &EntityIds, path: Option<&str>) -> String {
        self.topic(kind.into(), ids, path.unwrap_or_default())
    }

    /// Wildcard subscription for every event below one shell.
    #[must_use]
    pub fn shell_wildcard(&self, shell_id: &str, repo_id: Option<&str>) -> String {
        format!("{}/#", self.shell_base(shell_id, repo_id))
    }

    /// Wildcard subscription for every event in a repository.
    #[must_use]
    pub fn repository_wildcard(&self, repo_id: Option<&str>) -> String {
        format!("{TOPIC_ROOT}/{}/#", self.repo(repo_id))
    }

    /// Parse a topic back into its kind and identifiers.
    ///
    /// Returns `None` for topics outside the scheme.
    #[must_use]
    pub fn parse(&self, topic: &str) -> Option<ParsedTopic> {
        let parts: Vec<&str> = topic.split('/').collect();
        if parts.len() < 4 || parts[0] != TOPIC_ROOT || parts[2] != "shells" {
            return None;
        }
        let repo_id = parts[1].to_string();

        if parts.len() == 4 {
            return (parts[3] == "created").then(|| ParsedTopic {
                kind: TopicKind::ShellCreated,
                repo_id,
                shell_id: None,
                submodel_id: None,
                path: None,
            });
        }

        if parts[4] != "submodels" {
            return None;
        }
        let shell_id = decode_id_base64url(parts[3]).ok()?;

        if parts.len() == 6 {
            let kind = match parts[5] {
                "created" => TopicKind::SubmodelCreated,
                "deleted" => TopicKind::SubmodelDeleted,
                _ => return None,
            };
            return Some(ParsedTopic {
                kind,
                repo_id,
                shell_id: Some(shell_id),
                submodel_id: None,
                path: None,
            });
        }

        // shells/{sid}/submodels/{smid}/submodelElements/{path...}/{suffix}
        if parts.len() < 9 || parts[6] != "submodelElements" {
            return None;
        }
        let submodel_id = decode_id_base64url(parts[5]).ok()?;
        let last = parts.len() - 1;
        let kind = TopicKind::from_element_suffix(parts[last])?;

        Some(ParsedTopic {
            kind,
            repo_id,
            shell_id: Some(shell_id),
            submodel_id: Some(submodel_id),
            path: Some(parts[7..last].join("/")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashSet;

    fn ids() -> EntityIds {
        EntityIds::new("S1", "SM1").in_repo("repo1")
    }

    #[test]
    fn topic_generation() {
        let scheme = TopicScheme::default();
        let sid = encode_id_base64url("S1");
        let smid = encode_id_base64url("SM1");

        assert_eq!(
            scheme.shell_created(Some("repo1")),
            "aas-repository/repo1/shells/created"
        );
        assert_eq!(
            scheme.submodel_created("S1", Some("repo1")),
            format!("aas-repository/repo1/shells/{sid}/submodels/created")
        );
        assert_eq!(
            scheme.for_event(EventKind::ElementUpdated, &ids(), Some("/temperature/")),
            format!(
                "aas-repository/repo1/shells/{sid}/submodels/{smid}/submodelElements/temperature/updated"
            )
        );
    }

    #[test]
    fn default_repository_applies_without_repo_id() {
        let scheme = TopicScheme::new("plant-a");
        let topic = scheme.for_event(EventKind::SubmodelRemoved, &EntityIds::new("S1", "SM1"), None);
        assert!(topic.starts_with("aas-repository/plant-a/shells/"));
        assert!(topic.ends_with("/submodels/deleted"));
    }

    #[test]
    fn identifiers_with_slashes_stay_in_one_segment() {
        let scheme = TopicScheme::default();
        let ids = EntityIds::new("https://example.org/aas/1", "https://example.org/sm/1");
        let topic = scheme.for_event(EventKind::ElementValueChanged, &ids, Some("a/b"));

        let parsed = scheme.parse(&topic).unwrap();
        assert_eq!(parsed.kind, TopicKind::ElementValue);
        assert_eq!(parsed.shell_id.as_deref(), Some("https://example.org/aas/1"));
        assert_eq!(parsed.submodel_id.as_deref(), Some("https://example.org/sm/1"));
        assert_eq!(parsed.path.as_deref(), Some("a/b"));
    }

    #[test]
    fn all_kinds_are_disjoint() {
        let scheme = TopicScheme::default();
        let topics: HashSet<String> = EventKind::ALL
            .iter()
            .map(|kind| scheme.for_event(*kind, &ids(), Some("x")))
            .chain(std::iter::once(scheme.shell_created(Some("repo1"))))
            .collect();
        assert_eq!(topics.len(), EventKind::ALL.len() + 1);
    }

    #[test]
    fn parse_rejects_foreign_topics() {
        let scheme = TopicScheme::default();
        assert!(scheme.parse("sm-repository/repo/submodels/abc").is_none());
        assert!(scheme.parse("aas-repository/repo/shells/updated").is_none());
        assert!(scheme.parse("aas-repository/repo/shells/UzE/submodels/patched").is_none());
    }

    #[test]
    fn wildcard_topics() {
        let scheme = TopicScheme::default();
        let sid = encode_id_base64url("S1");
        assert_eq!(
            scheme.shell_wildcard("S1", None),
            format!("aas-repository/aas-repo/shells/{sid}/#")
        );
        assert_eq!(scheme.repository_wildcard(Some("r")), "aas-repository/r/#");
    }

    proptest! {
        #[test]
        fn topics_are_deterministic_and_parse_back(
            shell in "[ -~]{1,32}",
            submodel in "[ -~]{1,32}",
            repo in "[a-z0-9-]{1,12}",
            path in "[A-Za-z0-9_.]{1,8}(/[A-Za-z0-9_.]{1,8}){0,3}",
        ) {
            let scheme = TopicScheme::default();
            let ids = EntityIds::new(shell.clone(), submodel.clone()).in_repo(repo.clone());

            let mut seen = HashSet::new();
            for kind in EventKind::ALL {
                let topic = scheme.for_event(kind, &ids, Some(&path));
                prop_assert_eq!(&topic, &scheme.for_event(kind, &ids, Some(&path)));

                let parsed = scheme.parse(&topic).unwrap();
                prop_assert_eq!(parsed.kind, TopicKind::from(kind));
                prop_assert_eq!(&parsed.repo_id, &repo);
                prop_assert_eq!(parsed.shell_id.as_deref(), Some(shell.as_str()));
                if kind.is_element_scoped() {
                    prop_assert_eq!(parsed.submodel_id.as_deref(), Some(submodel.as_str()));
                    prop_assert_eq!(parsed.path.as_deref(), Some(path.as_str()));
                }
                prop_assert!(seen.insert(topic));
            }
        }
    }
}
