//! SurrealDB implementation of [`OwnerRepository`].

use chrono::{DateTime, Utc};
use comanager_core::error::ComanagerResult;
use comanager_core::models::delegate::normalize_email;
use comanager_core::models::owner::{CreateOwner, Owner};
use comanager_core::repository::OwnerRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct OwnerRow {
    email: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct OwnerRowWithId {
    record_id: String,
    email: String,
    name: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OwnerRow {
    fn into_owner(self, id: Uuid) -> Owner {
        Owner {
            id,
            email: self.email,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl OwnerRowWithId {
    fn try_into_owner(self) -> Result<Owner, DbError> {
        Ok(Owner {
            id: parse_uuid("owner", &self.record_id)?,
            email: self.email,
            name: self.name,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// SurrealDB implementation of the Owner repository.
#[derive(Clone)]
pub struct SurrealOwnerRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealOwnerRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> OwnerRepository for SurrealOwnerRepository<C> {
    async fn create(&self, input: CreateOwner) -> ComanagerResult<Owner> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('owner', $id) SET \
                 email = $email, name = $name",
            )
            .bind(("id", id_str.clone()))
            .bind(("email", normalize_email(&input.email)))
            .bind(("name", input.name))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("owner email", e))?;

        let rows: Vec<OwnerRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "owner".into(),
            id: id_str,
        })?;

        Ok(row.into_owner(id))
    }

    async fn get_by_id(&self, id: Uuid) -> ComanagerResult<Owner> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('owner', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OwnerRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "owner".into(),
            id: id_str,
        })?;

        Ok(row.into_owner(id))
    }

    async fn get_by_email(&self, email: &str) -> ComanagerResult<Owner> {
        let email = normalize_email(email);

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM owner WHERE email = $email")
            .bind(("email", email.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<OwnerRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "owner".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_owner()?)
    }
}
