//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly; Diesel uses
//! them for compile-time query validation. Regenerate with
//! `diesel print-schema` when a migration changes the schema.

diesel::table! {
    /// Registered members.
    members (id) {
        /// Primary key (bigserial).
        id -> Int8,
        /// Member display name.
        name -> Varchar,
        /// Member age in years.
        age -> Int4,
        /// Address city component.
        city -> Varchar,
        /// Address street component.
        street -> Varchar,
        /// Address zipcode component.
        zipcode -> Varchar,
    }
}

diesel::table! {
    /// Catalogue items, single table for all subtypes.
    ///
    /// The `kind` column discriminates the subtype; subtype columns are
    /// nullable and only populated for the matching kind.
    items (id) {
        /// Primary key (bigserial).
        id -> Int8,
        /// Item display name.
        name -> Varchar,
        /// Unit price.
        price -> Int4,
        /// Units remaining in stock.
        stock_quantity -> Int4,
        /// Subtype discriminator, currently only `BOOK`.
        kind -> Varchar,
        /// Book author (BOOK rows only).
        author -> Nullable<Varchar>,
        /// Book ISBN (BOOK rows only).
        isbn -> Nullable<Varchar>,
    }
}

diesel::table! {
    /// Deliveries, one per order.
    deliveries (id) {
        /// Primary key (bigserial).
        id -> Int8,
        /// Destination city component.
        city -> Varchar,
        /// Destination street component.
        street -> Varchar,
        /// Destination zipcode component.
        zipcode -> Varchar,
        /// Shipment state: `READY` or `COMPLETED`.
        status -> Varchar,
    }
}

diesel::table! {
    /// Order roots.
    orders (id) {
        /// Primary key (bigserial).
        id -> Int8,
        /// Ordering member.
        member_id -> Int8,
        /// Associated delivery.
        delivery_id -> Int8,
        /// Lifecycle state: `ORDER` or `CANCEL`.
        status -> Varchar,
        /// Placement timestamp.
        ordered_at -> Timestamptz,
    }
}

diesel::table! {
    /// Order lines.
    order_items (id) {
        /// Primary key (bigserial).
        id -> Int8,
        /// Owning order.
        order_id -> Int8,
        /// Ordered item.
        item_id -> Int8,
        /// Unit price captured at placement time.
        order_price -> Int4,
        /// Units ordered.
        quantity -> Int4,
    }
}

diesel::joinable!(orders -> members (member_id));
diesel::joinable!(orders -> deliveries (delivery_id));
diesel::joinable!(order_items -> orders (order_id));
diesel::joinable!(order_items -> items (item_id));

diesel::allow_tables_to_appear_in_same_query!(members, items, deliveries, orders, order_items);
