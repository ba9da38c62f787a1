//! Deterministic in-memory implementation of every shop port.
//!
//! Used by handler tests and by the server when no database is configured.
//! The seeded data set matches the tutorial fixtures: two members, four
//! books, and one two-line order per member.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use pagination::PageRequest;

use crate::domain::{
    Address, Delivery, DeliveryId, DeliveryStatus, Item, ItemId, ItemKind, ItemUpdate, Member,
    MemberId, NewItem, NewMember, NewOrder, Order, OrderDetail, OrderHead, OrderId, OrderLine,
    OrderSearch, OrderStatus, OrderWithParties,
};

use super::{
    ItemPersistenceError, ItemRepository, MemberPersistenceError, MemberRepository,
    OrderFlatRow, OrderLineSummary, OrderPersistenceError, OrderProjectionError,
    OrderQueryRepository, OrderRepository, OrderSummary, SimpleOrderSummary, StockAdjustment,
};

/// Stored order row plus its lines; associations resolved on read.
#[derive(Debug, Clone)]
struct StoredOrder {
    id: OrderId,
    member_id: MemberId,
    delivery_id: DeliveryId,
    status: OrderStatus,
    ordered_at: DateTime<Utc>,
    lines: Vec<OrderLine>,
}

#[derive(Debug, Default)]
struct ShopState {
    members: BTreeMap<i64, Member>,
    items: BTreeMap<i64, Item>,
    deliveries: BTreeMap<i64, Delivery>,
    orders: BTreeMap<i64, StoredOrder>,
    next_id: i64,
}

impl ShopState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn order_matches(&self, order: &StoredOrder, search: &OrderSearch) -> bool {
        if let Some(status) = search.status
            && order.status != status
        {
            return false;
        }
        if let Some(name) = &search.member_name {
            let Some(member) = self.members.get(&order.member_id.value()) else {
                return false;
            };
            if !member.name().contains(name.as_str()) {
                return false;
            }
        }
        true
    }

    fn matching_orders(&self, search: &OrderSearch) -> Vec<&StoredOrder> {
        self.orders
            .values()
            .filter(|order| self.order_matches(order, search))
            .collect()
    }

    fn parties_for(&self, order: &StoredOrder) -> Option<OrderWithParties> {
        let member = self.members.get(&order.member_id.value())?.clone();
        let delivery = self.deliveries.get(&order.delivery_id.value())?.clone();
        Some(OrderWithParties {
            id: order.id,
            member,
            delivery,
            status: order.status,
            ordered_at: order.ordered_at,
        })
    }
}

/// In-memory shop backing all four repository ports.
#[derive(Debug, Default)]
pub struct FixtureShop {
    state: Mutex<ShopState>,
}

/// Lock the state or surface a poisoned-lock failure through `make_err`.
macro_rules! lock_state {
    ($self:ident, $make_err:expr) => {
        $self.state.lock().map_err(|_| $make_err("fixture state lock poisoned"))
    };
}

impl FixtureShop {
    /// An empty shop.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A shop seeded with the tutorial demo data.
    ///
    /// # Panics
    ///
    /// Panics when the hard-coded fixture data fails validation; the values
    /// are compile-time constants, so this only fires on a programming error.
    #[must_use]
    pub fn seeded() -> Self {
        let shop = Self::empty();
        shop.seed_demo_data().expect("fixture data is valid");
        shop
    }

    fn seed_demo_data(&self) -> Result<(), String> {
        let mut state = self.state.lock().map_err(|_| "state lock".to_owned())?;
        let seoul = Address::new("Seoul", "Teheran-ro 1", "06234").map_err(|e| e.to_string())?;
        let busan = Address::new("Busan", "Suyeong-ro 2", "48265").map_err(|e| e.to_string())?;

        let member_a = insert_member(&mut state, "userA", 32, seoul.clone())?;
        let member_b = insert_member(&mut state, "userB", 28, busan.clone())?;

        let jpa1 = insert_book(&mut state, "JPA1 BOOK", 10_000, 100, "Kim", "978-89-001")?;
        let jpa2 = insert_book(&mut state, "JPA2 BOOK", 20_000, 100, "Kim", "978-89-002")?;
        let spring1 = insert_book(&mut state, "SPRING1 BOOK", 20_000, 200, "Lee", "978-89-003")?;
        let spring2 = insert_book(&mut state, "SPRING2 BOOK", 40_000, 300, "Lee", "978-89-004")?;

        let first_placed = Utc
            .with_ymd_and_hms(2024, 3, 1, 10, 0, 0)
            .single()
            .ok_or("valid timestamp")?;
        let second_placed = Utc
            .with_ymd_and_hms(2024, 3, 2, 14, 30, 0)
            .single()
            .ok_or("valid timestamp")?;

        insert_order(
            &mut state,
            member_a,
            seoul,
            first_placed,
            &[(jpa1, 1), (jpa2, 2)],
        )?;
        insert_order(
            &mut state,
            member_b,
            busan,
            second_placed,
            &[(spring1, 3), (spring2, 4)],
        )?;
        Ok(())
    }
}

fn insert_member(
    state: &mut ShopState,
    name: &str,
    age: i32,
    address: Address,
) -> Result<MemberId, String> {
    let id = MemberId::new(state.allocate_id());
    let member = Member::new(id, name, age, address).map_err(|e| e.to_string())?;
    state.members.insert(id.value(), member);
    Ok(id)
}

fn insert_book(
    state: &mut ShopState,
    name: &str,
    price: i32,
    stock: i32,
    author: &str,
    isbn: &str,
) -> Result<ItemId, String> {
    let id = ItemId::new(state.allocate_id());
    let item = Item::new(
        id,
        name,
        price,
        stock,
        ItemKind::Book {
            author: author.to_owned(),
            isbn: isbn.to_owned(),
        },
    )
    .map_err(|e| e.to_string())?;
    state.items.insert(id.value(), item);
    Ok(id)
}

fn insert_order(
    state: &mut ShopState,
    member_id: MemberId,
    address: Address,
    ordered_at: DateTime<Utc>,
    lines: &[(ItemId, i32)],
) -> Result<OrderId, String> {
    let delivery_id = DeliveryId::new(state.allocate_id());
    state.deliveries.insert(
        delivery_id.value(),
        Delivery {
            id: delivery_id,
            address,
            status: DeliveryStatus::Ready,
        },
    );

    let mut order_lines = Vec::with_capacity(lines.len());
    for &(item_id, count) in lines {
        let item = state
            .items
            .get_mut(&item_id.value())
            .ok_or("fixture item missing")?;
        let mut updated = item.clone();
        updated.remove_stock(count).map_err(|e| e.to_string())?;
        order_lines.push(OrderLine {
            item_id,
            item_name: updated.name().to_owned(),
            order_price: updated.price(),
            count,
        });
        *item = updated;
    }

    let order_id = OrderId::new(state.allocate_id());
    state.orders.insert(
        order_id.value(),
        StoredOrder {
            id: order_id,
            member_id,
            delivery_id,
            status: OrderStatus::Order,
            ordered_at,
            lines: order_lines,
        },
    );
    Ok(order_id)
}

fn adjust_item_stock(state: &mut ShopState, adjustment: &StockAdjustment) -> Result<(), String> {
    let item = state
        .items
        .get(&adjustment.item_id.value())
        .ok_or("stock adjustment for unknown item")?;
    let quantity = item
        .stock_quantity()
        .checked_add(adjustment.delta)
        .filter(|quantity| *quantity >= 0)
        .ok_or("stock adjustment drives quantity negative")?;
    let updated = Item::new(item.id(), item.name(), item.price(), quantity, item.kind().clone())
        .map_err(|e| e.to_string())?;
    state.items.insert(item.id().value(), updated);
    Ok(())
}

#[async_trait]
impl MemberRepository for FixtureShop {
    async fn create(&self, member: &NewMember) -> Result<Member, MemberPersistenceError> {
        let mut state = lock_state!(self, MemberPersistenceError::connection)?;
        let id = MemberId::new(state.allocate_id());
        let member = Member::new(id, member.name.clone(), member.age, member.address.clone())
            .map_err(|e| MemberPersistenceError::query(e.to_string()))?;
        state.members.insert(id.value(), member.clone());
        Ok(member)
    }

    async fn find_by_id(&self, id: MemberId) -> Result<Option<Member>, MemberPersistenceError> {
        let state = lock_state!(self, MemberPersistenceError::connection)?;
        Ok(state.members.get(&id.value()).cloned())
    }

    async fn list(&self) -> Result<Vec<Member>, MemberPersistenceError> {
        let state = lock_state!(self, MemberPersistenceError::connection)?;
        Ok(state.members.values().cloned().collect())
    }

    async fn rename(
        &self,
        id: MemberId,
        name: &str,
    ) -> Result<Option<Member>, MemberPersistenceError> {
        let mut state = lock_state!(self, MemberPersistenceError::connection)?;
        let Some(existing) = state.members.get(&id.value()) else {
            return Ok(None);
        };
        let renamed = Member::new(id, name, existing.age(), existing.address().clone())
            .map_err(|e| MemberPersistenceError::query(e.to_string()))?;
        state.members.insert(id.value(), renamed.clone());
        Ok(Some(renamed))
    }
}

#[async_trait]
impl ItemRepository for FixtureShop {
    async fn create(&self, item: &NewItem) -> Result<Item, ItemPersistenceError> {
        let mut state = lock_state!(self, ItemPersistenceError::connection)?;
        let id = ItemId::new(state.allocate_id());
        let item = Item::new(
            id,
            item.name.clone(),
            item.price,
            item.stock_quantity,
            item.kind.clone(),
        )
        .map_err(|e| ItemPersistenceError::query(e.to_string()))?;
        state.items.insert(id.value(), item.clone());
        Ok(item)
    }

    async fn find_by_id(&self, id: ItemId) -> Result<Option<Item>, ItemPersistenceError> {
        let state = lock_state!(self, ItemPersistenceError::connection)?;
        Ok(state.items.get(&id.value()).cloned())
    }

    async fn list(&self) -> Result<Vec<Item>, ItemPersistenceError> {
        let state = lock_state!(self, ItemPersistenceError::connection)?;
        Ok(state.items.values().cloned().collect())
    }

    async fn update(
        &self,
        id: ItemId,
        update: &ItemUpdate,
    ) -> Result<Option<Item>, ItemPersistenceError> {
        let mut state = lock_state!(self, ItemPersistenceError::connection)?;
        let Some(existing) = state.items.get(&id.value()) else {
            return Ok(None);
        };
        let mut updated = existing.clone();
        updated
            .apply_update(update.clone())
            .map_err(|e| ItemPersistenceError::query(e.to_string()))?;
        state.items.insert(id.value(), updated.clone());
        Ok(Some(updated))
    }
}

#[async_trait]
impl OrderRepository for FixtureShop {
    async fn place(
        &self,
        order: &NewOrder,
        stock: &[StockAdjustment],
    ) -> Result<OrderId, OrderPersistenceError> {
        let mut state = lock_state!(self, OrderPersistenceError::connection)?;
        for adjustment in stock {
            adjust_item_stock(&mut state, adjustment).map_err(OrderPersistenceError::query)?;
        }
        let delivery_id = DeliveryId::new(state.allocate_id());
        state.deliveries.insert(
            delivery_id.value(),
            Delivery {
                id: delivery_id,
                address: order.delivery_address.clone(),
                status: DeliveryStatus::Ready,
            },
        );
        let order_id = OrderId::new(state.allocate_id());
        state.orders.insert(
            order_id.value(),
            StoredOrder {
                id: order_id,
                member_id: order.member_id,
                delivery_id,
                status: OrderStatus::Order,
                ordered_at: order.ordered_at,
                lines: order
                    .lines
                    .iter()
                    .map(|line| OrderLine {
                        item_id: line.item_id,
                        item_name: line.item_name.clone(),
                        order_price: line.order_price,
                        count: line.count,
                    })
                    .collect(),
            },
        );
        Ok(order_id)
    }

    async fn mark_cancelled(
        &self,
        id: OrderId,
        stock: &[StockAdjustment],
    ) -> Result<(), OrderPersistenceError> {
        let mut state = lock_state!(self, OrderPersistenceError::connection)?;
        for adjustment in stock {
            adjust_item_stock(&mut state, adjustment).map_err(OrderPersistenceError::query)?;
        }
        let order = state
            .orders
            .get_mut(&id.value())
            .ok_or_else(|| OrderPersistenceError::query(format!("order {id} not found")))?;
        order.status = OrderStatus::Cancel;
        Ok(())
    }

    async fn find_by_id(&self, id: OrderId) -> Result<Option<Order>, OrderPersistenceError> {
        let state = lock_state!(self, OrderPersistenceError::connection)?;
        let Some(order) = state.orders.get(&id.value()) else {
            return Ok(None);
        };
        let delivery = state
            .deliveries
            .get(&order.delivery_id.value())
            .cloned()
            .ok_or_else(|| OrderPersistenceError::query("order delivery missing"))?;
        Ok(Some(Order::new(
            order.id,
            order.member_id,
            delivery,
            order.lines.clone(),
            order.status,
            order.ordered_at,
        )))
    }

    async fn find_heads(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<OrderHead>, OrderPersistenceError> {
        let state = lock_state!(self, OrderPersistenceError::connection)?;
        Ok(state
            .matching_orders(search)
            .into_iter()
            .map(|order| OrderHead {
                id: order.id,
                member_id: order.member_id,
                delivery_id: order.delivery_id,
                status: order.status,
                ordered_at: order.ordered_at,
            })
            .collect())
    }

    async fn find_delivery(
        &self,
        id: DeliveryId,
    ) -> Result<Option<Delivery>, OrderPersistenceError> {
        let state = lock_state!(self, OrderPersistenceError::connection)?;
        Ok(state.deliveries.get(&id.value()).cloned())
    }

    async fn find_lines(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<OrderLine>, OrderPersistenceError> {
        let state = lock_state!(self, OrderPersistenceError::connection)?;
        Ok(state
            .orders
            .get(&order_id.value())
            .map(|order| order.lines.clone())
            .unwrap_or_default())
    }

    async fn find_lines_for_orders(
        &self,
        order_ids: &[OrderId],
    ) -> Result<HashMap<OrderId, Vec<OrderLine>>, OrderPersistenceError> {
        let state = lock_state!(self, OrderPersistenceError::connection)?;
        let mut grouped = HashMap::new();
        for id in order_ids {
            if let Some(order) = state.orders.get(&id.value()) {
                grouped.insert(*id, order.lines.clone());
            }
        }
        Ok(grouped)
    }

    async fn find_with_parties(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<OrderWithParties>, OrderPersistenceError> {
        let state = lock_state!(self, OrderPersistenceError::connection)?;
        Ok(state
            .matching_orders(search)
            .into_iter()
            .filter_map(|order| state.parties_for(order))
            .collect())
    }

    async fn find_page_with_parties(
        &self,
        search: &OrderSearch,
        page: &PageRequest,
    ) -> Result<Vec<OrderWithParties>, OrderPersistenceError> {
        let state = lock_state!(self, OrderPersistenceError::connection)?;
        let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
        let limit = usize::try_from(page.limit()).unwrap_or(usize::MAX);
        Ok(state
            .matching_orders(search)
            .into_iter()
            .skip(offset)
            .take(limit)
            .filter_map(|order| state.parties_for(order))
            .collect())
    }

    async fn find_detailed(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<OrderDetail>, OrderPersistenceError> {
        let state = lock_state!(self, OrderPersistenceError::connection)?;
        Ok(state
            .matching_orders(search)
            .into_iter()
            .filter_map(|order| {
                state.parties_for(order).map(|parties| OrderDetail {
                    id: parties.id,
                    member: parties.member,
                    delivery: parties.delivery,
                    lines: order.lines.clone(),
                    status: parties.status,
                    ordered_at: parties.ordered_at,
                })
            })
            .collect())
    }
}

fn summary_from(parties: &OrderWithParties, lines: Vec<OrderLineSummary>) -> OrderSummary {
    OrderSummary {
        order_id: parties.id.value(),
        member_name: parties.member.name().to_owned(),
        ordered_at: parties.ordered_at,
        status: parties.status,
        address: parties.delivery.address.clone(),
        lines,
    }
}

#[async_trait]
impl OrderQueryRepository for FixtureShop {
    async fn find_summaries(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<OrderSummary>, OrderProjectionError> {
        // The fixture cannot show the per-order query cost; it only mirrors
        // the result shape of the database adapter.
        self.find_summaries_batched(search).await
    }

    async fn find_summaries_batched(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<OrderSummary>, OrderProjectionError> {
        let state = lock_state!(self, OrderProjectionError::connection)?;
        Ok(state
            .matching_orders(search)
            .into_iter()
            .filter_map(|order| {
                state.parties_for(order).map(|parties| {
                    let lines = order
                        .lines
                        .iter()
                        .map(|line| OrderLineSummary {
                            item_name: line.item_name.clone(),
                            order_price: line.order_price,
                            count: line.count,
                        })
                        .collect();
                    summary_from(&parties, lines)
                })
            })
            .collect())
    }

    async fn find_flat_rows(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<OrderFlatRow>, OrderProjectionError> {
        let state = lock_state!(self, OrderProjectionError::connection)?;
        let mut rows = Vec::new();
        for order in state.matching_orders(search) {
            let Some(parties) = state.parties_for(order) else {
                continue;
            };
            for line in &order.lines {
                rows.push(OrderFlatRow {
                    order_id: parties.id.value(),
                    member_name: parties.member.name().to_owned(),
                    ordered_at: parties.ordered_at,
                    status: parties.status,
                    address: parties.delivery.address.clone(),
                    item_name: line.item_name.clone(),
                    order_price: line.order_price,
                    count: line.count,
                });
            }
        }
        Ok(rows)
    }

    async fn find_simple_summaries(
        &self,
        search: &OrderSearch,
    ) -> Result<Vec<SimpleOrderSummary>, OrderProjectionError> {
        let state = lock_state!(self, OrderProjectionError::connection)?;
        Ok(state
            .matching_orders(search)
            .into_iter()
            .filter_map(|order| {
                state.parties_for(order).map(|parties| SimpleOrderSummary {
                    order_id: parties.id.value(),
                    member_name: parties.member.name().to_owned(),
                    ordered_at: parties.ordered_at,
                    status: parties.status,
                    address: parties.delivery.address.clone(),
                })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[tokio::test]
    async fn seeded_shop_contains_demo_members_and_orders() {
        let shop = FixtureShop::seeded();
        let members = MemberRepository::list(&shop).await.expect("members");
        assert_eq!(members.len(), 2);
        assert_eq!(members[0].name(), "userA");

        let orders = shop.find_heads(&OrderSearch::default()).await.expect("orders");
        assert_eq!(orders.len(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn seeding_deducts_order_counts_from_stock() {
        let shop = FixtureShop::seeded();
        let items = ItemRepository::list(&shop).await.expect("items");
        let stocks: Vec<i32> = items.iter().map(Item::stock_quantity).collect();
        assert_eq!(stocks, vec![99, 98, 197, 296]);
    }

    #[rstest]
    #[tokio::test]
    async fn member_name_filter_matches_substring() {
        let shop = FixtureShop::seeded();
        let search = OrderSearch {
            member_name: Some("userB".into()),
            status: None,
        };
        let orders = shop.find_with_parties(&search).await.expect("orders");
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].member.name(), "userB");
    }

    #[rstest]
    #[tokio::test]
    async fn paging_limits_the_joined_listing() {
        let shop = FixtureShop::seeded();
        let page = PageRequest::new(Some(1), Some(1)).expect("valid page");
        let orders = shop
            .find_page_with_parties(&OrderSearch::default(), &page)
            .await
            .expect("orders");
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].member.name(), "userB");
    }

    #[rstest]
    #[tokio::test]
    async fn flat_rows_repeat_order_fields_per_line() {
        let shop = FixtureShop::seeded();
        let rows = shop
            .find_flat_rows(&OrderSearch::default())
            .await
            .expect("rows");
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].order_id, rows[1].order_id);
        assert_ne!(rows[0].item_name, rows[1].item_name);
    }
}
