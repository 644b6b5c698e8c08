use sea_query::{
    Alias as SeaAlias, ColumnDef, Expr as SeaExpr, Func as SeaFunc, Iden, Index, Order as SeaOrder, PostgresQueryBuilder, Query as SeaQuery, Table,
};
use sea_query_binder::SqlxBinder;
use sqlx::{Error as DbError, Row, postgres::PgRow};

use crate::{
    Result,
    store::{
        DbCollection, PageData, data,
        db::postgres::{DbInit, DbRow},
        map_db_err, query,
    },
};

use super::{DbConnection, into_query};

#[derive(Debug)]
pub struct RunStepCollection {
    conn: DbConnection,
}

#[derive(Iden)]
#[iden = "run_steps"]
enum CollectionIden {
    Table,

    Id,
    RunId,
    ActionId,
    Seq,
    Status,
    Error,
    SkipReason,
    StartedAt,
    CompletedAt,
}

impl DbCollection for RunStepCollection {
    type Item = data::RunStep;

    fn exists(
        &self,
        id: &str,
    ) -> Result<bool> {
        let (sql, values) = SeaQuery::select()
            .from(CollectionIden::Table)
            .expr(SeaFunc::count(SeaExpr::col(CollectionIden::Id)))
            .and_where(SeaExpr::col(CollectionIden::Id).eq(id))
            .build_sqlx(PostgresQueryBuilder);

        let count = self.conn.query_one(sql.as_str(), values).map(|row| row.get::<i64, usize>(0)).map_err(map_db_err)?;

        Ok(count > 0)
    }

    fn find(
        &self,
        id: &str,
    ) -> Result<Self::Item> {
        let (sql, values) = SeaQuery::select()
            .from(CollectionIden::Table)
            .columns([
                CollectionIden::Id,
                CollectionIden::RunId,
                CollectionIden::ActionId,
                CollectionIden::Seq,
                CollectionIden::Status,
                CollectionIden::Error,
                CollectionIden::SkipReason,
                CollectionIden::StartedAt,
                CollectionIden::CompletedAt,
            ])
            .and_where(SeaExpr::col(CollectionIden::Id).eq(id))
            .build_sqlx(PostgresQueryBuilder);

        self.conn.query_one(&sql, values).map(|row| Self::Item::from_row(&row).map_err(map_db_err)).map_err(map_db_err)?
    }

    fn query(
        &self,
        q: &query::Query,
    ) -> Result<PageData<Self::Item>> {
        let filter = into_query(q);

        let mut count_query = SeaQuery::select();
        count_query.from(CollectionIden::Table).expr(SeaFunc::count(SeaExpr::col(SeaAlias::new("id"))));

        let mut query = SeaQuery::select();
        query
            .columns([
                CollectionIden::Id,
                CollectionIden::RunId,
                CollectionIden::ActionId,
                CollectionIden::Seq,
                CollectionIden::Status,
                CollectionIden::Error,
                CollectionIden::SkipReason,
                CollectionIden::StartedAt,
                CollectionIden::CompletedAt,
            ])
            .from(CollectionIden::Table);

        if !filter.is_empty() {
            count_query.cond_where(filter.clone());
            query.cond_where(filter);
        }

        for (order, rev) in q.order_by().iter() {
            query.order_by(
                SeaAlias::new(order),
                if *rev {
                    SeaOrder::Desc
                } else {
                    SeaOrder::Asc
                },
            );
        }
        let (sql, values) = query.limit(q.get_limit() as u64).offset(q.get_offset() as u64).build_sqlx(PostgresQueryBuilder);

        let (count_sql, count_values) = count_query.build_sqlx(PostgresQueryBuilder);
        let count = self.conn.query_one(count_sql.as_str(), count_values).map_err(map_db_err)?.get::<i64, usize>(0) as usize;
        let page_count = count.div_ceil(q.get_limit());
        let page_num = q.get_offset() / q.get_limit() + 1;
        let data = PageData {
            count,
            page_size: q.get_limit(),
            page_num,
            page_count,
            rows: self.conn.query(&sql, values).map_err(map_db_err)?.iter().map(|row| Self::Item::from_row(row).map_err(map_db_err)).collect::<Result<Vec<_>>>()?,
        };
        Ok(data)
    }

    fn create(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        let data = data.clone();
        let (sql, sql_values) = SeaQuery::insert()
            .into_table(CollectionIden::Table)
            .columns([
                CollectionIden::Id,
                CollectionIden::RunId,
                CollectionIden::ActionId,
                CollectionIden::Seq,
                CollectionIden::Status,
                CollectionIden::Error,
                CollectionIden::SkipReason,
                CollectionIden::StartedAt,
                CollectionIden::CompletedAt,
            ])
            .values([
                data.id.into(),
                data.run_id.into(),
                data.action_id.into(),
                data.seq.into(),
                data.status.as_ref().into(),
                data.error.into(),
                data.skip_reason.into(),
                data.started_at.into(),
                data.completed_at.into(),
            ])
            .map_err(map_db_err)?
            .build_sqlx(PostgresQueryBuilder);

        let result = self.conn.execute(sql.as_str(), sql_values).map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    fn update(
        &self,
        data: &Self::Item,
    ) -> Result<bool> {
        let model = data.clone();
        let (sql, sql_values) = SeaQuery::update()
            .table(CollectionIden::Table)
            .values([
                (CollectionIden::RunId, model.run_id.into()),
                (CollectionIden::ActionId, model.action_id.into()),
                (CollectionIden::Seq, model.seq.into()),
                (CollectionIden::Status, model.status.as_ref().into()),
                (CollectionIden::Error, model.error.into()),
                (CollectionIden::SkipReason, model.skip_reason.into()),
                (CollectionIden::StartedAt, model.started_at.into()),
                (CollectionIden::CompletedAt, model.completed_at.into()),
            ])
            .and_where(SeaExpr::col(CollectionIden::Id).eq(data.id.as_str()))
            .build_sqlx(PostgresQueryBuilder);

        let result = self.conn.execute(sql.as_str(), sql_values).map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }

    fn delete(
        &self,
        id: &str,
    ) -> Result<bool> {
        let (sql, values) =
            SeaQuery::delete().from_table(CollectionIden::Table).and_where(SeaExpr::col(CollectionIden::Id).eq(id)).build_sqlx(PostgresQueryBuilder);

        let result = self.conn.execute(sql.as_str(), values).map_err(map_db_err)?;
        Ok(result.rows_affected() > 0)
    }
}

impl DbRow for data::RunStep {
    fn from_row(row: &PgRow) -> std::result::Result<Self, DbError>
    where
        Self: Sized,
    {
        let status: String = row.get("status");
        Ok(Self {
            id: row.get("id"),
            run_id: row.get("run_id"),
            action_id: row.get("action_id"),
            seq: row.get("seq"),
            status: status.parse().map_err(|e: strum::ParseError| DbError::Decode(e.to_string().into()))?,
            error: row.get("error"),
            skip_reason: row.get("skip_reason"),
            started_at: row.get("started_at"),
            completed_at: row.get("completed_at"),
        })
    }
}

impl DbInit for RunStepCollection {
    fn init(&self) {
        let sql = [
            Table::create()
                .table(CollectionIden::Table)
                .if_not_exists()
                .col(ColumnDef::new(CollectionIden::Id).string().not_null().primary_key())
                .col(ColumnDef::new(CollectionIden::RunId).string().not_null())
                .col(ColumnDef::new(CollectionIden::ActionId).string().not_null())
                .col(ColumnDef::new(CollectionIden::Seq).big_integer().default(0))
                .col(ColumnDef::new(CollectionIden::Status).string().not_null())
                .col(ColumnDef::new(CollectionIden::Error).string())
                .col(ColumnDef::new(CollectionIden::SkipReason).string())
                .col(ColumnDef::new(CollectionIden::StartedAt).big_integer().default(0))
                .col(ColumnDef::new(CollectionIden::CompletedAt).big_integer().default(0))
                .build(PostgresQueryBuilder),
            Index::create()
                .name("idx_run_steps_run_id")
                .if_not_exists()
                .table(CollectionIden::Table)
                .col(CollectionIden::RunId)
                .build(PostgresQueryBuilder),
        ];
        self.conn.batch_execute(&sql).unwrap();
    }
}

impl RunStepCollection {
    pub fn new(conn: &DbConnection) -> Self {
        Self {
            conn: conn.clone(),
        }
    }
}
