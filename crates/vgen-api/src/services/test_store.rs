//! In-memory store implementations for service tests.
//!
//! Semantics mirror the Postgres stores: idempotent free-tier insert,
//! zero-row updates for unknown subscription ids are silent, deletes
//! report whether a row matched.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use vgen_db::{CheckoutUpsert, DbError, DbResult, ProjectStore, SubscriptionStore};
use vgen_models::{Project, Subscription};
use vgen_storage::{keys, ObjectStore, StorageError, StorageResult};

#[derive(Default)]
pub struct MemorySubscriptionStore {
    rows: Mutex<HashMap<Uuid, Subscription>>,
    fail_quota_writes: AtomicBool,
}

impl MemorySubscriptionStore {
    pub fn get(&self, user_id: Uuid) -> Option<Subscription> {
        self.rows.lock().unwrap().get(&user_id).cloned()
    }

    pub fn get_by_subscription(&self, stripe_subscription_id: &str) -> Option<Subscription> {
        self.rows
            .lock()
            .unwrap()
            .values()
            .find(|s| s.stripe_subscription_id.as_deref() == Some(stripe_subscription_id))
            .cloned()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn seed(&self, user_id: Uuid, quota_used: i32, quota_limit: i32, status: Option<&str>) {
        let mut sub = Subscription::free_tier(user_id);
        sub.quota_used = quota_used;
        sub.quota_limit = quota_limit;
        sub.status = status.map(|s| s.to_string());
        self.rows.lock().unwrap().insert(user_id, sub);
    }

    /// Make every subsequent quota write fail.
    pub fn fail_quota_writes(&self) {
        self.fail_quota_writes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SubscriptionStore for MemorySubscriptionStore {
    async fn find_by_user(&self, user_id: Uuid) -> DbResult<Option<Subscription>> {
        Ok(self.get(user_id))
    }

    async fn insert_free(&self, user_id: Uuid) -> DbResult<Subscription> {
        let mut rows = self.rows.lock().unwrap();
        let sub = rows
            .entry(user_id)
            .or_insert_with(|| Subscription::free_tier(user_id));
        Ok(sub.clone())
    }

    async fn set_quota_used(&self, user_id: Uuid, quota_used: i32) -> DbResult<bool> {
        if self.fail_quota_writes.load(Ordering::SeqCst) {
            return Err(DbError::config("quota write rejected"));
        }
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&user_id) {
            Some(sub) => {
                sub.quota_used = quota_used;
                sub.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn upsert_checkout(&self, upsert: CheckoutUpsert) -> DbResult<()> {
        let mut rows = self.rows.lock().unwrap();
        let sub = rows
            .entry(upsert.user_id)
            .or_insert_with(|| Subscription::free_tier(upsert.user_id));
        sub.stripe_customer_id = Some(upsert.stripe_customer_id);
        sub.stripe_subscription_id = Some(upsert.stripe_subscription_id);
        sub.stripe_price_id = upsert.stripe_price_id;
        sub.status = Some(upsert.status);
        sub.current_period_end = upsert.current_period_end;
        sub.quota_limit = upsert.quota_limit;
        sub.quota_used = 0;
        sub.updated_at = Utc::now();
        Ok(())
    }

    async fn update_plan_by_subscription(
        &self,
        stripe_subscription_id: &str,
        stripe_price_id: Option<&str>,
        status: &str,
        current_period_end: Option<chrono::DateTime<Utc>>,
        quota_limit: i32,
    ) -> DbResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(sub) = rows
            .values_mut()
            .find(|s| s.stripe_subscription_id.as_deref() == Some(stripe_subscription_id))
        {
            sub.stripe_price_id = stripe_price_id.map(|s| s.to_string());
            sub.status = Some(status.to_string());
            sub.current_period_end = current_period_end;
            sub.quota_limit = quota_limit;
            sub.quota_used = 0;
            sub.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_status_by_subscription(
        &self,
        stripe_subscription_id: &str,
        status: &str,
    ) -> DbResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(sub) = rows
            .values_mut()
            .find(|s| s.stripe_subscription_id.as_deref() == Some(stripe_subscription_id))
        {
            sub.status = Some(status.to_string());
            sub.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn reset_quota_by_subscription(&self, stripe_subscription_id: &str) -> DbResult<()> {
        let mut rows = self.rows.lock().unwrap();
        if let Some(sub) = rows
            .values_mut()
            .find(|s| s.stripe_subscription_id.as_deref() == Some(stripe_subscription_id))
        {
            sub.quota_used = 0;
            sub.updated_at = Utc::now();
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryProjectStore {
    rows: Mutex<Vec<Project>>,
    fail_inserts: AtomicBool,
}

impl MemoryProjectStore {
    pub fn all(&self) -> Vec<Project> {
        self.rows.lock().unwrap().clone()
    }

    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn seed(&self, project: Project) {
        self.rows.lock().unwrap().push(project);
    }

    /// Make every subsequent insert fail.
    pub fn fail_inserts(&self) {
        self.fail_inserts.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ProjectStore for MemoryProjectStore {
    async fn insert(&self, project: &Project) -> DbResult<()> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(DbError::config("insert rejected"));
        }
        self.rows.lock().unwrap().push(project.clone());
        Ok(())
    }

    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> DbResult<Option<Project>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id && p.user_id == user_id)
            .cloned())
    }

    async fn delete_for_user(&self, id: Uuid, user_id: Uuid) -> DbResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|p| !(p.id == id && p.user_id == user_id));
        Ok(rows.len() < before)
    }

    async fn list_for_user(&self, user_id: Uuid) -> DbResult<Vec<Project>> {
        let mut projects: Vec<Project> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }
}

pub struct MemoryObjectStore {
    bucket: String,
    public_base: Option<String>,
    objects: Mutex<HashMap<String, (Vec<u8>, String)>>,
    deleted: Mutex<Vec<String>>,
    fail_deletes: AtomicBool,
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self {
            bucket: "test-bucket".to_string(),
            public_base: Some("https://media.test".to_string()),
            objects: Mutex::new(HashMap::new()),
            deleted: Mutex::new(Vec::new()),
            fail_deletes: AtomicBool::new(false),
        }
    }
}

impl MemoryObjectStore {
    /// A store without a public base, so every URL comes out presigned.
    pub fn presigned_only() -> Self {
        Self {
            public_base: None,
            ..Self::default()
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn deleted_keys(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    /// Make every subsequent delete fail without removing the object.
    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload_bytes(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (data, content_type.to_string()));
        Ok(())
    }

    fn public_url(&self, key: &str) -> Option<String> {
        self.public_base
            .as_ref()
            .map(|base| format!("{}/{}", base, key))
    }

    async fn presign_get(&self, key: &str, _expires_in: Duration) -> StorageResult<String> {
        Ok(format!(
            "https://presign.test/{}/{}?X-Amz-Signature=stub",
            self.bucket, key
        ))
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::delete_failed(format!("{} unavailable", key)));
        }
        self.objects.lock().unwrap().remove(key);
        self.deleted.lock().unwrap().push(key.to_string());
        Ok(())
    }

    fn key_from_url(&self, url: &str) -> Option<String> {
        keys::key_from_url(url, self.public_base.as_deref(), &self.bucket)
    }
}
