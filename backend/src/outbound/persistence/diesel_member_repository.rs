//! PostgreSQL-backed `MemberRepository` implementation using Diesel.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{MemberPersistenceError, MemberRepository};
use crate::domain::{Member, MemberId, NewMember};

use super::diesel_helpers::{map_diesel_error, map_pool_error, member_from_row};
use super::models::{MemberRow, NewMemberRow};
use super::pool::DbPool;
use super::schema::members;

/// Diesel-backed implementation of the `MemberRepository` port.
#[derive(Clone)]
pub struct DieselMemberRepository {
    pool: DbPool,
}

impl DieselMemberRepository {
    /// Create a new repository with the given connection pool.
    #[must_use]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: super::pool::PoolError) -> MemberPersistenceError {
    map_pool_error(error, MemberPersistenceError::connection)
}

fn map_diesel(error: diesel::result::Error) -> MemberPersistenceError {
    map_diesel_error(
        error,
        MemberPersistenceError::query,
        MemberPersistenceError::connection,
    )
}

#[async_trait]
impl MemberRepository for DieselMemberRepository {
    async fn create(&self, member: &NewMember) -> Result<Member, MemberPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = NewMemberRow {
            name: &member.name,
            age: member.age,
            city: member.address.city(),
            street: member.address.street(),
            zipcode: member.address.zipcode(),
        };
        let inserted: MemberRow = diesel::insert_into(members::table)
            .values(&row)
            .returning(MemberRow::as_returning())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel)?;

        member_from_row(inserted).map_err(MemberPersistenceError::query)
    }

    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, MemberPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row: Option<MemberRow> = members::table
            .find(id.value())
            .select(MemberRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(|row| member_from_row(row).map_err(MemberPersistenceError::query))
            .transpose()
    }

    async fn list(&self) -> Result<Vec<Member>, MemberPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<MemberRow> = members::table
            .order(members::id.asc())
            .select(MemberRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows.into_iter()
            .map(|row| member_from_row(row).map_err(MemberPersistenceError::query))
            .collect()
    }

    async fn rename(
        &self,
        id: MemberId,
        name: &str,
    ) -> Result<Option<Member>, MemberPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row: Option<MemberRow> = diesel::update(members::table.find(id.value()))
            .set(members::name.eq(name))
            .returning(MemberRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(|row| member_from_row(row).map_err(MemberPersistenceError::query))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn pool_errors_map_to_connection_errors() {
        let err = map_pool(super::super::pool::PoolError::checkout("refused"));
        assert!(matches!(err, MemberPersistenceError::Connection { .. }));
        assert!(err.to_string().contains("refused"));
    }

    #[rstest]
    fn diesel_not_found_maps_to_a_query_error() {
        let err = map_diesel(diesel::result::Error::NotFound);
        assert!(matches!(err, MemberPersistenceError::Query { .. }));
    }
}
