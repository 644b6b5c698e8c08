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
pub struct OrderCollection {
    conn: DbConnection,
}

#[derive(Iden)]
#[iden = "orders"]
enum CollectionIden {
    Table,

    Id,
    ContactId,
    Status,
    TotalAmount,
    FunnelId,
    Items,
    CompletedAt,
}

impl DbCollection for OrderCollection {
    type Item = data::Order;

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
                CollectionIden::ContactId,
                CollectionIden::Status,
                CollectionIden::TotalAmount,
                CollectionIden::FunnelId,
                CollectionIden::Items,
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
                CollectionIden::ContactId,
                CollectionIden::Status,
                CollectionIden::TotalAmount,
                CollectionIden::FunnelId,
                CollectionIden::Items,
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
        let items = serde_json::to_string(&data.items)?;
        let (sql, sql_values) = SeaQuery::insert()
            .into_table(CollectionIden::Table)
            .columns([
                CollectionIden::Id,
                CollectionIden::ContactId,
                CollectionIden::Status,
                CollectionIden::TotalAmount,
                CollectionIden::FunnelId,
                CollectionIden::Items,
                CollectionIden::CompletedAt,
            ])
            .values([
                data.id.into(),
                data.contact_id.into(),
                data.status.as_ref().into(),
                data.total_amount.into(),
                data.funnel_id.into(),
                items.into(),
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
        let items = serde_json::to_string(&model.items)?;
        let (sql, sql_values) = SeaQuery::update()
            .table(CollectionIden::Table)
            .values([
                (CollectionIden::ContactId, model.contact_id.into()),
                (CollectionIden::Status, model.status.as_ref().into()),
                (CollectionIden::TotalAmount, model.total_amount.into()),
                (CollectionIden::FunnelId, model.funnel_id.into()),
                (CollectionIden::Items, items.into()),
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

impl DbRow for data::Order {
    fn from_row(row: &PgRow) -> std::result::Result<Self, DbError>
    where
        Self: Sized,
    {
        let status: String = row.get("status");
        let items: String = row.get("items");
        Ok(Self {
            id: row.get("id"),
            contact_id: row.get("contact_id"),
            status: status.parse().map_err(|e: strum::ParseError| DbError::Decode(e.to_string().into()))?,
            total_amount: row.get("total_amount"),
            funnel_id: row.get("funnel_id"),
            items: serde_json::from_str(&items).map_err(|e| DbError::Decode(e.to_string().into()))?,
            completed_at: row.get("completed_at"),
        })
    }
}

impl DbInit for OrderCollection {
    fn init(&self) {
        let sql = [
            Table::create()
                .table(CollectionIden::Table)
                .if_not_exists()
                .col(ColumnDef::new(CollectionIden::Id).string().not_null().primary_key())
                .col(ColumnDef::new(CollectionIden::ContactId).string().not_null())
                .col(ColumnDef::new(CollectionIden::Status).string().not_null())
                .col(ColumnDef::new(CollectionIden::TotalAmount).big_integer().default(0))
                .col(ColumnDef::new(CollectionIden::FunnelId).string())
                .col(ColumnDef::new(CollectionIden::Items).text().not_null())
                .col(ColumnDef::new(CollectionIden::CompletedAt).big_integer().default(0))
                .build(PostgresQueryBuilder),
            Index::create()
                .name("idx_orders_contact_id")
                .if_not_exists()
                .table(CollectionIden::Table)
                .col(CollectionIden::ContactId)
                .build(PostgresQueryBuilder),
        ];
        self.conn.batch_execute(&sql).unwrap();
    }
}

impl OrderCollection {
    pub fn new(conn: &DbConnection) -> Self {
        Self {
            conn: conn.clone(),
        }
    }
}
