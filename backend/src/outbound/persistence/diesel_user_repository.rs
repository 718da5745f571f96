//! PostgreSQL-backed [`UserRepository`].

use async_trait::async_trait;
use chrono::Utc;
use diesel::dsl::exists;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{UserRepository, UserRepositoryError};
use crate::domain::{NewUser, StoredCredentials, User, UserId};

use super::diesel_error_mapping::{StoreFault, diesel_fault, pool_fault};
use super::models::{CredentialsRow, NewUserRow, UserRow};
use super::pool::DbPool;
use super::schema::users;

/// Diesel implementation of the user repository port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

/// Unique constraint guarding the e-mail column.
const EMAIL_CONSTRAINT: &str = "users_uc_email";

fn map_fault(fault: StoreFault) -> UserRepositoryError {
    match fault {
        StoreFault::NotFound => UserRepositoryError::not_found(),
        StoreFault::UniqueViolation { constraint }
            if constraint.as_deref() == Some(EMAIL_CONSTRAINT) =>
        {
            UserRepositoryError::duplicate_email()
        }
        StoreFault::UniqueViolation { constraint } => UserRepositoryError::query(format!(
            "unexpected unique violation on {}",
            constraint.as_deref().unwrap_or("unknown constraint")
        )),
        StoreFault::ForeignKeyViolation => UserRepositoryError::query("unexpected foreign key"),
        StoreFault::Connection(message) => UserRepositoryError::connection(message),
        StoreFault::Query(message) => UserRepositoryError::query(message),
    }
}

fn user_id(raw: i64) -> Result<UserId, UserRepositoryError> {
    UserId::new(raw).map_err(|err| UserRepositoryError::query(err.to_string()))
}

fn row_to_credentials(row: CredentialsRow) -> Result<StoredCredentials, UserRepositoryError> {
    Ok(StoredCredentials {
        id: user_id(row.id)?,
        password_hash: row.hashed_password,
    })
}

fn row_to_user(row: UserRow) -> Result<User, UserRepositoryError> {
    Ok(User {
        id: user_id(row.id)?,
        name: row.name,
        email: row.email,
        created: row.created,
    })
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, user: NewUser) -> Result<UserId, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_fault(pool_fault(err)))?;
        let row = NewUserRow {
            name: &user.name,
            email: &user.email,
            hashed_password: &user.password_hash,
            created: Utc::now(),
        };
        let id: i64 = diesel::insert_into(users::table)
            .values(&row)
            .returning(users::id)
            .get_result(&mut conn)
            .await
            .map_err(|err| map_fault(diesel_fault(err, "insert user")))?;
        user_id(id)
    }

    async fn credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_fault(pool_fault(err)))?;
        users::table
            .filter(users::email.eq(email))
            .select(CredentialsRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_fault(diesel_fault(err, "find credentials by email")))?
            .map(row_to_credentials)
            .transpose()
    }

    async fn credentials_by_id(
        &self,
        id: UserId,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_fault(pool_fault(err)))?;
        users::table
            .find(id.get())
            .select(CredentialsRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_fault(diesel_fault(err, "find credentials by id")))?
            .map(row_to_credentials)
            .transpose()
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_fault(pool_fault(err)))?;
        users::table
            .find(id.get())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(|err| map_fault(diesel_fault(err, "find user")))?
            .map(row_to_user)
            .transpose()
    }

    async fn exists(&self, id: UserId) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_fault(pool_fault(err)))?;
        diesel::select(exists(users::table.find(id.get())))
            .get_result(&mut conn)
            .await
            .map_err(|err| map_fault(diesel_fault(err, "user exists")))
    }

    async fn authorize(&self, id: UserId) -> Result<bool, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_fault(pool_fault(err)))?;
        diesel::select(exists(
            users::table
                .find(id.get())
                .filter(users::owner.eq(true)),
        ))
        .get_result(&mut conn)
        .await
        .map_err(|err| map_fault(diesel_fault(err, "authorize user")))
    }

    async fn update_password_hash(
        &self,
        id: UserId,
        password_hash: String,
    ) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(|err| map_fault(pool_fault(err)))?;
        let updated = diesel::update(users::table.find(id.get()))
            .set(users::hashed_password.eq(password_hash))
            .execute(&mut conn)
            .await
            .map_err(|err| map_fault(diesel_fault(err, "update password")))?;
        if updated == 0 {
            return Err(UserRepositoryError::not_found());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn email_unique_violation_means_duplicate_email() {
        let fault = StoreFault::UniqueViolation {
            constraint: Some("users_uc_email".to_owned()),
        };
        assert_eq!(map_fault(fault), UserRepositoryError::DuplicateEmail);
    }

    #[rstest]
    #[case(Some("users_pkey"), "unexpected unique violation on users_pkey")]
    #[case(None, "unexpected unique violation on unknown constraint")]
    fn other_unique_violations_are_query_faults(
        #[case] constraint: Option<&str>,
        #[case] message: &str,
    ) {
        let fault = StoreFault::UniqueViolation {
            constraint: constraint.map(str::to_owned),
        };
        assert_eq!(map_fault(fault), UserRepositoryError::query(message));
    }

    #[rstest]
    fn connection_faults_keep_their_message() {
        assert_eq!(
            map_fault(StoreFault::Connection("refused".to_owned())),
            UserRepositoryError::connection("refused")
        );
    }

    #[rstest]
    fn zero_ids_from_the_database_are_rejected() {
        let row = CredentialsRow {
            id: 0,
            hashed_password: "x".to_owned(),
        };
        assert!(matches!(
            row_to_credentials(row),
            Err(UserRepositoryError::Query { .. })
        ));
    }
}
