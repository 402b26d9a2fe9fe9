//! SurrealDB implementation of [`DelegateRepository`].
//!
//! Grants are stored as a single FLEXIBLE object in permission-map shape
//! (`{"contenus": ["read"]}`), the same shape that ends up in tokens.

use chrono::{DateTime, Utc};
use comanager_core::error::ComanagerResult;
use comanager_core::models::delegate::{
    CreateDelegate, DELEGATE_ROLE, Delegate, DelegateStatus, UpdateDelegate, normalize_email,
};
use comanager_core::models::permission::{PermissionGrant, PermissionMap};
use comanager_core::repository::DelegateRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use super::parse_uuid;
use crate::error::DbError;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct DelegateRow {
    owner_id: String,
    email: String,
    name: String,
    password_hash: String,
    is_password_set: bool,
    requires_password_change: bool,
    status: String,
    grants: serde_json::Value,
    role: String,
    last_login: Option<DateTime<Utc>>,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct DelegateRowWithId {
    record_id: String,
    owner_id: String,
    email: String,
    name: String,
    password_hash: String,
    is_password_set: bool,
    requires_password_change: bool,
    status: String,
    grants: serde_json::Value,
    role: String,
    last_login: Option<DateTime<Utc>>,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_status(s: &str) -> Result<DelegateStatus, DbError> {
    match s {
        "Active" => Ok(DelegateStatus::Active),
        "Suspended" => Ok(DelegateStatus::Suspended),
        other => Err(DbError::Decode(format!("unknown delegate status: {other}"))),
    }
}

fn status_to_string(s: DelegateStatus) -> &'static str {
    match s {
        DelegateStatus::Active => "Active",
        DelegateStatus::Suspended => "Suspended",
    }
}

fn grants_to_value(grants: &[PermissionGrant]) -> Result<serde_json::Value, DbError> {
    serde_json::to_value(PermissionMap::from_grants(grants))
        .map_err(|e| DbError::Decode(format!("grants: {e}")))
}

fn grants_from_value(value: serde_json::Value) -> Result<Vec<PermissionGrant>, DbError> {
    let map: PermissionMap =
        serde_json::from_value(value).map_err(|e| DbError::Decode(format!("grants: {e}")))?;
    Ok(map.to_grants())
}

impl DelegateRow {
    fn into_delegate(self, id: Uuid) -> Result<Delegate, DbError> {
        Ok(Delegate {
            id,
            owner_id: parse_uuid("owner", &self.owner_id)?,
            email: self.email,
            name: self.name,
            password_hash: self.password_hash,
            is_password_set: self.is_password_set,
            requires_password_change: self.requires_password_change,
            status: parse_status(&self.status)?,
            grants: grants_from_value(self.grants)?,
            role: self.role,
            last_login: self.last_login,
            created_by: parse_uuid("created_by", &self.created_by)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl DelegateRowWithId {
    fn try_into_delegate(self) -> Result<Delegate, DbError> {
        let id = parse_uuid("delegate", &self.record_id)?;
        DelegateRow {
            owner_id: self.owner_id,
            email: self.email,
            name: self.name,
            password_hash: self.password_hash,
            is_password_set: self.is_password_set,
            requires_password_change: self.requires_password_change,
            status: self.status,
            grants: self.grants,
            role: self.role,
            last_login: self.last_login,
            created_by: self.created_by,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_delegate(id)
    }
}

/// SurrealDB implementation of the Delegate repository.
#[derive(Clone)]
pub struct SurrealDelegateRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealDelegateRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> DelegateRepository for SurrealDelegateRepository<C> {
    async fn create(&self, input: CreateDelegate) -> ComanagerResult<Delegate> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let is_password_set = input.password_hash.is_some();

        let result = self
            .db
            .query(
                "CREATE type::record('delegate', $id) SET \
                 owner_id = $owner_id, \
                 email = $email, name = $name, \
                 password_hash = $password_hash, \
                 is_password_set = $is_password_set, \
                 requires_password_change = $requires_password_change, \
                 status = 'Active', \
                 grants = $grants, \
                 role = $role, \
                 last_login = NONE, \
                 created_by = $created_by",
            )
            .bind(("id", id_str.clone()))
            .bind(("owner_id", input.owner_id.to_string()))
            .bind(("email", normalize_email(&input.email)))
            .bind(("name", input.name))
            .bind(("password_hash", input.password_hash.unwrap_or_default()))
            .bind(("is_password_set", is_password_set))
            .bind(("requires_password_change", input.requires_password_change))
            .bind(("grants", grants_to_value(&input.grants)?))
            .bind(("role", DELEGATE_ROLE.to_string()))
            .bind(("created_by", input.created_by.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("delegate email", e))?;

        let rows: Vec<DelegateRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "delegate".into(),
            id: id_str,
        })?;

        Ok(row.into_delegate(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> ComanagerResult<Delegate> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('delegate', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DelegateRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "delegate".into(),
            id: id_str,
        })?;

        Ok(row.into_delegate(id)?)
    }

    async fn get_by_email(&self, email: &str) -> ComanagerResult<Delegate> {
        let email = normalize_email(email);

        let mut result = self
            .db
            .query("SELECT meta::id(id) AS record_id, * FROM delegate WHERE email = $email")
            .bind(("email", email.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DelegateRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "delegate".into(),
            id: format!("email={email}"),
        })?;

        Ok(row.try_into_delegate()?)
    }

    async fn update(&self, id: Uuid, input: UpdateDelegate) -> ComanagerResult<Delegate> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.status.is_some() {
            sets.push("status = $status");
        }
        if input.grants.is_some() {
            sets.push("grants = $grants");
        }
        if input.password_hash.is_some() {
            sets.push("password_hash = $password_hash");
        }
        if input.is_password_set.is_some() {
            sets.push("is_password_set = $is_password_set");
        }
        if input.requires_password_change.is_some() {
            sets.push("requires_password_change = $requires_password_change");
        }
        if input.last_login.is_some() {
            sets.push("last_login = $last_login");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('delegate', $id) SET {}",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(status) = input.status {
            builder = builder.bind(("status", status_to_string(status).to_string()));
        }
        if let Some(grants) = input.grants {
            builder = builder.bind(("grants", grants_to_value(&grants)?));
        }
        if let Some(password_hash) = input.password_hash {
            builder = builder.bind(("password_hash", password_hash));
        }
        if let Some(is_password_set) = input.is_password_set {
            builder = builder.bind(("is_password_set", is_password_set));
        }
        if let Some(requires_password_change) = input.requires_password_change {
            builder = builder.bind(("requires_password_change", requires_password_change));
        }
        if let Some(last_login) = input.last_login {
            builder = builder.bind(("last_login", last_login));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_write("delegate", e))?;

        let rows: Vec<DelegateRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "delegate".into(),
            id: id_str,
        })?;

        Ok(row.into_delegate(id)?)
    }

    async fn delete(&self, owner_id: Uuid, id: Uuid) -> ComanagerResult<()> {
        self.db
            .query(
                "DELETE type::record('delegate', $id) \
                 WHERE owner_id = $owner_id",
            )
            .bind(("id", id.to_string()))
            .bind(("owner_id", owner_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> ComanagerResult<Vec<Delegate>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM delegate \
                 WHERE owner_id = $owner_id \
                 ORDER BY created_at ASC",
            )
            .bind(("owner_id", owner_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<DelegateRowWithId> = result.take(0).map_err(DbError::from)?;

        let delegates = rows
            .into_iter()
            .map(|row| row.try_into_delegate())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(delegates)
    }
}
