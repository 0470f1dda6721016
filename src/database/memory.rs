use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{
    Media, MediaChanges, MediaRepository, NewMedia, NewUser, Page, StoreError, User, UserChanges,
    UserFilter, UserRepository,
};

struct Table<T> {
    next_id: i64,
    rows: BTreeMap<i64, T>,
}

impl<T: Clone> Table<T> {
    fn new() -> Self {
        Self {
            next_id: 1,
            rows: BTreeMap::new(),
        }
    }

    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

fn paginate<T: Clone>(rows: Vec<&T>, page: Page) -> (Vec<T>, i64) {
    let total = rows.len() as i64;
    let items = rows
        .into_iter()
        .skip(page.offset() as usize)
        .take(page.limit() as usize)
        .cloned()
        .collect();
    (items, total)
}

/// In-memory user table, ordered by id
pub struct MemoryUserRepository {
    table: RwLock<Table<User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Table::new()),
        }
    }
}

impl Default for MemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn ensure_unique_user(
    table: &Table<User>,
    skip_id: Option<i64>,
    username: &str,
    email: &str,
) -> Result<(), StoreError> {
    for user in table.rows.values() {
        if Some(user.id) == skip_id {
            continue;
        }
        if user.username == username {
            return Err(StoreError::Conflict(format!("username '{}' is taken", username)));
        }
        if user.email == email {
            return Err(StoreError::Conflict(format!("email '{}' is taken", email)));
        }
    }
    Ok(())
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn list(&self, filter: &UserFilter, page: Page) -> Result<(Vec<User>, i64), StoreError> {
        let table = self.table.read().await;
        let rows = table
            .rows
            .values()
            .filter(|u| filter.role.map_or(true, |role| u.role == role))
            .collect();
        Ok(paginate(rows, page))
    }

    async fn find(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<User>, StoreError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .find(|u| u.username == login || u.email == login)
            .cloned())
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut table = self.table.write().await;
        ensure_unique_user(&table, None, &new.username, &new.email)?;

        let now = Utc::now();
        let user = User {
            id: table.allocate_id(),
            username: new.username,
            email: new.email,
            password: new.password,
            role: new.role,
            api_key: new.api_key,
            created_at: now,
            updated_at: now,
            medias: Vec::new(),
        };
        table.rows.insert(user.id, user.clone());
        Ok(user)
    }

    async fn update(&self, id: i64, changes: UserChanges) -> Result<User, StoreError> {
        let mut table = self.table.write().await;
        let mut user = table
            .rows
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("user {} not found", id)))?;

        changes.apply(&mut user);
        ensure_unique_user(&table, Some(id), &user.username, &user.email)?;
        user.updated_at = Utc::now();
        table.rows.insert(id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        match self.table.write().await.rows.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(format!("user {} not found", id))),
        }
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// In-memory media table, ordered by id
pub struct MemoryMediaRepository {
    table: RwLock<Table<Media>>,
}

impl MemoryMediaRepository {
    pub fn new() -> Self {
        Self {
            table: RwLock::new(Table::new()),
        }
    }
}

impl Default for MemoryMediaRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaRepository for MemoryMediaRepository {
    async fn list(&self, owner_id: Option<i64>, page: Page) -> Result<(Vec<Media>, i64), StoreError> {
        let table = self.table.read().await;
        let rows = table
            .rows
            .values()
            .filter(|m| owner_id.map_or(true, |owner| m.owner_id == owner))
            .collect();
        Ok(paginate(rows, page))
    }

    async fn by_owner(&self, owner_id: i64) -> Result<Vec<Media>, StoreError> {
        let table = self.table.read().await;
        Ok(table
            .rows
            .values()
            .filter(|m| m.owner_id == owner_id)
            .cloned()
            .collect())
    }

    async fn find(&self, id: i64) -> Result<Option<Media>, StoreError> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn create(&self, new: NewMedia) -> Result<Media, StoreError> {
        let mut table = self.table.write().await;
        let now = Utc::now();
        let media = Media {
            id: table.allocate_id(),
            owner_id: new.owner_id,
            filename: new.filename,
            mimetype: new.mimetype,
            size: new.size,
            url: new.url,
            storage_path: new.storage_path,
            created_at: now,
            updated_at: now,
        };
        table.rows.insert(media.id, media.clone());
        Ok(media)
    }

    async fn update(&self, id: i64, changes: MediaChanges) -> Result<Media, StoreError> {
        let mut table = self.table.write().await;
        let media = table
            .rows
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("media {} not found", id)))?;
        changes.apply(media);
        media.updated_at = Utc::now();
        Ok(media.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), StoreError> {
        match self.table.write().await.rows.remove(&id) {
            Some(_) => Ok(()),
            None => Err(StoreError::NotFound(format!("media {} not found", id))),
        }
    }

    async fn delete_by_owner(&self, owner_id: i64) -> Result<u64, StoreError> {
        let mut table = self.table.write().await;
        let before = table.rows.len();
        table.rows.retain(|_, m| m.owner_id != owner_id);
        Ok((before - table.rows.len()) as u64)
    }
}
