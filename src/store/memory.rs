use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::{fingerprint, SessionStore, UserRepository};
use crate::error::AppError;
use crate::models::{NewUser, Role, User};

/// Process-local store. Sessions live behind one mutex, which makes
/// `rotate` a true compare-and-swap.
#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    sessions: Mutex<HashMap<Uuid, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::BadRequest(
                "User with this email already exists".into(),
            ));
        }

        let user = User::from_new(new_user);
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn update_role(&self, id: Uuid, role: Role) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(&id).map(|user| {
            user.role = role;
            user.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, AppError> {
        let removed = self.users.write().await.remove(&id).is_some();
        if removed {
            self.sessions.lock().await.remove(&id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn store(&self, user_id: Uuid, refresh_token: &str) -> Result<(), AppError> {
        self.sessions
            .lock()
            .await
            .insert(user_id, fingerprint(refresh_token));
        Ok(())
    }

    async fn rotate(
        &self,
        user_id: Uuid,
        presented: &str,
        replacement: &str,
    ) -> Result<bool, AppError> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get_mut(&user_id) {
            Some(current) if *current == fingerprint(presented) => {
                *current = fingerprint(replacement);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke(&self, user_id: Uuid) -> Result<bool, AppError> {
        Ok(self.sessions.lock().await.remove(&user_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            name: "Test".into(),
            email: email.into(),
            password_hash: "hash".into(),
            role: Role::User,
        }
    }

    #[actix_rt::test]
    async fn test_duplicate_email_rejected() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@example.com")).await.unwrap();

        match store.create_user(new_user("a@example.com")).await {
            Err(AppError::BadRequest(msg)) => assert!(msg.contains("already exists")),
            other => panic!("expected BadRequest, got {:?}", other),
        }
    }

    #[actix_rt::test]
    async fn test_rotate_requires_current_token() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("b@example.com")).await.unwrap();

        assert!(!store.rotate(user.id, "t1", "t2").await.unwrap());

        store.store(user.id, "t1").await.unwrap();
        assert!(store.rotate(user.id, "t1", "t2").await.unwrap());
        assert!(!store.rotate(user.id, "t1", "t3").await.unwrap());
        assert!(store.rotate(user.id, "t2", "t4").await.unwrap());
    }

    #[actix_rt::test]
    async fn test_concurrent_rotation_has_one_winner() {
        let store = Arc::new(MemoryStore::new());
        let user = store.create_user(new_user("c@example.com")).await.unwrap();
        store.store(user.id, "shared").await.unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .rotate(user.id, "shared", &format!("next-{}", i))
                    .await
                    .unwrap()
            }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }

    #[actix_rt::test]
    async fn test_delete_user_drops_session() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("d@example.com")).await.unwrap();
        store.store(user.id, "token").await.unwrap();

        assert!(store.delete_user(user.id).await.unwrap());
        assert!(!store.revoke(user.id).await.unwrap());
        assert!(!store.delete_user(user.id).await.unwrap());
    }

    #[actix_rt::test]
    async fn test_update_role_and_listing_order() {
        let store = MemoryStore::new();
        let first = store.create_user(new_user("e@example.com")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = store.create_user(new_user("f@example.com")).await.unwrap();

        let listed = store.list_users().await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);

        let updated = store.update_role(first.id, Role::Admin).await.unwrap().unwrap();
        assert_eq!(updated.role, Role::Admin);
        assert!(store.update_role(Uuid::new_v4(), Role::Admin).await.unwrap().is_none());
    }
}
