use crate::models::user::User;
use crate::utils::auth::hash_pin;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

const DEFAULT_USER_NAME: &str = "Parvathy";
const DEFAULT_USER_PIN: &str = "4321";

/// Read-only credential store. The table is built once, before the server
/// accepts connections, and never mutated afterwards; handlers receive it
/// through `web::Data` so a real persistence layer could back the same
/// call sites later.
#[derive(Clone)]
pub struct UserRepository {
    users: Arc<HashMap<String, User>>,
}

impl UserRepository {
    /// Build the store with the single default account. PIN hashing happens
    /// here, synchronously, so the account is usable for the very first
    /// request the server sees.
    pub fn seeded() -> Self {
        let mut users = HashMap::new();
        let user = User {
            id: DEFAULT_USER_NAME.to_lowercase(),
            display_name: DEFAULT_USER_NAME.to_string(),
            pin_hash: hash_pin(DEFAULT_USER_PIN).expect("failed to hash default PIN at startup"),
            created_at: chrono::Utc::now(),
        };
        info!(user_id = %user.id, "Default user initialized");
        users.insert(user.id.clone(), user);
        UserRepository {
            users: Arc::new(users),
        }
    }

    pub fn get(&self, id: &str) -> Option<&User> {
        self.users.get(id)
    }

    pub fn count(&self) -> usize {
        self.users.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::auth::verify_pin;

    #[test]
    fn test_seeded_contains_default_user() {
        let repo = UserRepository::seeded();

        let user = repo.get("parvathy").unwrap();
        assert_eq!(user.id, "parvathy");
        assert_eq!(user.display_name, "Parvathy");
        assert_eq!(repo.count(), 1);
    }

    #[test]
    fn test_seeded_pin_verifies() {
        let repo = UserRepository::seeded();

        let user = repo.get("parvathy").unwrap();
        assert!(verify_pin("4321", &user.pin_hash));
        assert!(!verify_pin("0000", &user.pin_hash));
    }

    #[test]
    fn test_lookup_is_exact_id() {
        let repo = UserRepository::seeded();

        // Callers are responsible for lowercasing/trimming the name first.
        assert!(repo.get("Parvathy").is_none());
        assert!(repo.get("unknown").is_none());
    }
}
