use anyhow::Result;
use sled::Db;

use crate::{error::AppError, models::Task};

/// Every user's task collection in one sled tree. Values are named
/// MessagePack; keys are `uid|task_id`.
pub struct TaskStorage {
    _db: Db,
    tasks: sled::Tree,
}

impl TaskStorage {
    /// Open or create a new task storage in the given path
    pub fn open(path: &str) -> Result<Self> {
        let db = sled::open(path)?;
        let tasks = db.open_tree("tasks")?;

        Ok(Self { _db: db, tasks })
    }

    fn make_key(uid: &str, task_id: &str) -> String {
        format!("{}|{}", uid, task_id)
    }

    fn user_prefix(uid: &str) -> String {
        format!("{}|", uid)
    }

    pub fn add(&self, uid: &str, task: &Task) -> Result<()> {
        let key = Self::make_key(uid, &task.id);
        let bytes = rmp_serde::to_vec_named(task)?;
        self.tasks.insert(key.as_bytes(), bytes)?;
        Ok(())
    }

    pub fn get(&self, uid: &str, task_id: &str) -> Result<Option<Task>> {
        let key = Self::make_key(uid, task_id);
        if let Some(value) = self.tasks.get(key.as_bytes())? {
            Ok(Some(rmp_serde::from_slice(&value)?))
        } else {
            Ok(None)
        }
    }

    /// The user's whole collection, oldest first.
    pub fn list_for_user(&self, uid: &str) -> Result<Vec<Task>> {
        let prefix = Self::user_prefix(uid);
        let mut result = Vec::new();

        for item in self.tasks.scan_prefix(prefix.as_bytes()) {
            let (_key, value) = item?;
            let task: Task = rmp_serde::from_slice(&value)?;
            result.push(task);
        }

        Ok(result)
    }

    /// Flips only the completion flag; other fields are left as stored.
    pub fn set_completed(
        &self,
        uid: &str,
        task_id: &str,
        completed: bool,
    ) -> Result<Task, AppError> {
        let mut task = self
            .get(uid, task_id)?
            .ok_or_else(|| AppError::not_found(format!("task {}", task_id)))?;
        task.completed = completed;

        let key = Self::make_key(uid, task_id);
        let bytes = rmp_serde::to_vec_named(&task)?;
        self.tasks.insert(key.as_bytes(), bytes)?;
        Ok(task)
    }

    /// Returns whether the task existed.
    pub fn delete(&self, uid: &str, task_id: &str) -> Result<bool> {
        let key = Self::make_key(uid, task_id);
        Ok(self.tasks.remove(key.as_bytes())?.is_some())
    }

    /// Clears the user's collection and reports how many tasks were removed.
    pub fn delete_all_for_user(&self, uid: &str) -> Result<usize> {
        let prefix = Self::user_prefix(uid);
        let mut batch = sled::Batch::default();
        let mut removed = 0;

        for item in self.tasks.scan_prefix(prefix.as_bytes()) {
            let (key, _value) = item?;
            batch.remove(key);
            removed += 1;
        }

        self.tasks.apply_batch(batch)?;
        Ok(removed)
    }
}
