//! Pluggable credential verification.

use super::User;

/// Verifies a credential pair against some backing record set.
///
/// The production binary wires in [`AllowList`]; a real deployment would
/// substitute a store-backed implementation behind the same seam.
pub trait CredentialVerifier: Send + Sync {
    /// Return the matching user for the pair, or `None` on any mismatch.
    fn verify(&self, email: &str, password: &str) -> Option<User>;
}

/// One allow-list record: a user plus its plaintext password.
#[derive(Debug, Clone)]
pub struct Credential {
    pub user: User,
    pub password: String,
}

/// Fixed in-memory credential table used for mock authentication.
#[derive(Debug, Clone)]
pub struct AllowList {
    records: Vec<Credential>,
}

impl AllowList {
    /// Build an allow-list from explicit records.
    #[must_use]
    pub fn new(records: Vec<Credential>) -> Self {
        Self { records }
    }

    /// The record set the original client shipped with.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new(vec![
            Credential {
                user: User {
                    id: "1".to_string(),
                    email: "anugrah@email.com".to_string(),
                    name: "Anugrah".to_string(),
                },
                password: "1234".to_string(),
            },
            Credential {
                user: User {
                    id: "2".to_string(),
                    email: "kunal@email.com".to_string(),
                    name: "Kunal".to_string(),
                },
                password: "1234".to_string(),
            },
        ])
    }

    /// All users in the list (without passwords).
    #[cfg(test)]
    fn users(&self) -> Vec<User> {
        self.records.iter().map(|r| r.user.clone()).collect()
    }
}

impl Default for AllowList {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CredentialVerifier for AllowList {
    fn verify(&self, email: &str, password: &str) -> Option<User> {
        self.records
            .iter()
            .find(|r| r.user.email == email && r.password == password)
            .map(|r| r.user.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_pairs_verify() {
        let list = AllowList::builtin();

        for user in list.users() {
            let verified = list.verify(&user.email, "1234").unwrap();
            assert_eq!(verified.id, user.id);
            assert_eq!(verified.name, user.name);
        }
    }

    #[test]
    fn test_mismatch_rejected() {
        let list = AllowList::builtin();

        assert!(list.verify("anugrah@email.com", "wrong").is_none());
        assert!(list.verify("nobody@email.com", "1234").is_none());
        assert!(list.verify("", "").is_none());
    }
}
