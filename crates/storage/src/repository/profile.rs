use uuid::Uuid;

use crate::error::{Result, StorageError};
use crate::models::{Profile, ProfileKind};
use crate::store::{DataStore, Filter, from_row, to_row};

/// Repository for the global Champion and Competitor profiles
pub struct ProfileRepository<'a> {
    store: &'a dyn DataStore,
}

impl<'a> ProfileRepository<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, kind: ProfileKind, profile: &Profile) -> Result<Profile> {
        let mut rows = self.store.insert(kind.table(), vec![to_row(profile)?]).await?;
        let row = rows
            .pop()
            .ok_or_else(|| StorageError::validation("insert returned no profile row"))?;
        from_row(row)
    }

    pub async fn find(&self, kind: ProfileKind, id: Uuid) -> Result<Option<Profile>> {
        let rows = self
            .store
            .select(kind.table(), &Filter::new().eq_id("id", id))
            .await?;
        rows.into_iter().next().map(from_row).transpose()
    }

    /// Finds a profile id in either profile table.
    pub async fn find_any(&self, id: Uuid) -> Result<Option<(ProfileKind, Profile)>> {
        for kind in [ProfileKind::Champion, ProfileKind::Competitor] {
            if let Some(profile) = self.find(kind, id).await? {
                return Ok(Some((kind, profile)));
            }
        }
        Ok(None)
    }
}
