use crate::core::errors::{KonfigError, Result};

/// The user a credential is issued for: a common name plus the groups
/// the API server should place that user in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    common_name: String,
    groups: Vec<String>,
}

impl Identity {
    /// Build a validated identity.
    ///
    /// The user name and every group must be non-empty, at least one group
    /// is required, groups may not repeat, and none of the parts may contain
    /// `/` or `%`, which are not allowed in a resource path segment.
    pub fn new(common_name: impl Into<String>, groups: Vec<String>) -> Result<Self> {
        let common_name = common_name.into();

        if common_name.trim().is_empty() {
            return Err(KonfigError::InvalidIdentity {
                detail: "user name must not be empty".into(),
            });
        }
        if groups.is_empty() {
            return Err(KonfigError::InvalidIdentity {
                detail: "at least one group is required".into(),
            });
        }

        for part in std::iter::once(&common_name).chain(groups.iter()) {
            if part.trim().is_empty() {
                return Err(KonfigError::InvalidIdentity {
                    detail: "group names must not be empty".into(),
                });
            }
            if part.contains('/') || part.contains('%') {
                return Err(KonfigError::InvalidIdentity {
                    detail: format!("'{part}' contains '/' or '%'"),
                });
            }
        }

        for (i, group) in groups.iter().enumerate() {
            if groups[..i].contains(group) {
                return Err(KonfigError::InvalidIdentity {
                    detail: format!("group '{group}' is listed more than once"),
                });
            }
        }

        Ok(Self {
            common_name,
            groups,
        })
    }

    pub fn common_name(&self) -> &str {
        &self.common_name
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Name of the remote signing request for this identity.
    ///
    /// `user:group1:group2...` in the order the groups were given. The name
    /// is order-sensitive: the same groups in a different order produce a
    /// different request name.
    pub fn request_name(&self) -> String {
        let mut name = self.common_name.clone();
        for group in &self.groups {
            name.push(':');
            name.push_str(group);
        }
        name
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.common_name, self.groups.join(", "))
    }
}
