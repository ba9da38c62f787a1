//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{deliveries, items, members, order_items, orders};

/// Row struct for reading from the members table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MemberRow {
    pub id: i64,
    pub name: String,
    pub age: i32,
    pub city: String,
    pub street: String,
    pub zipcode: String,
}

/// Insertable struct for creating new member records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = members)]
pub(crate) struct NewMemberRow<'a> {
    pub name: &'a str,
    pub age: i32,
    pub city: &'a str,
    pub street: &'a str,
    pub zipcode: &'a str,
}

/// Row struct for reading from the items table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = items)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ItemRow {
    pub id: i64,
    pub name: String,
    pub price: i32,
    pub stock_quantity: i32,
    pub kind: String,
    pub author: Option<String>,
    pub isbn: Option<String>,
}

/// Insertable struct for creating new item records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = items)]
pub(crate) struct NewItemRow<'a> {
    pub name: &'a str,
    pub price: i32,
    pub stock_quantity: i32,
    pub kind: &'a str,
    pub author: Option<&'a str>,
    pub isbn: Option<&'a str>,
}

/// Changeset struct for replacing an item's editable fields.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = items)]
pub(crate) struct ItemChangeset<'a> {
    pub name: &'a str,
    pub price: i32,
    pub stock_quantity: i32,
    pub kind: &'a str,
    pub author: Option<&'a str>,
    pub isbn: Option<&'a str>,
}

/// Row struct for reading from the deliveries table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = deliveries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct DeliveryRow {
    pub id: i64,
    pub city: String,
    pub street: String,
    pub zipcode: String,
    pub status: String,
}

/// Insertable struct for creating new delivery records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = deliveries)]
pub(crate) struct NewDeliveryRow<'a> {
    pub city: &'a str,
    pub street: &'a str,
    pub zipcode: &'a str,
    pub status: &'a str,
}

/// Row struct for reading from the orders table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = orders)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct OrderRow {
    pub id: i64,
    pub member_id: i64,
    pub delivery_id: i64,
    pub status: String,
    pub ordered_at: DateTime<Utc>,
}

/// Insertable struct for creating new order records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = orders)]
pub(crate) struct NewOrderRow<'a> {
    pub member_id: i64,
    pub delivery_id: i64,
    pub status: &'a str,
    pub ordered_at: DateTime<Utc>,
}

/// Insertable struct for creating new order line records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = order_items)]
pub(crate) struct NewOrderItemRow {
    pub order_id: i64,
    pub item_id: i64,
    pub order_price: i32,
    pub quantity: i32,
}
