//! Core business logic, independent of HTTP and persistence concerns.

pub mod address;
pub mod error;
pub mod item;
pub mod member;
pub mod order;
pub mod order_service;
pub mod ports;

pub use address::{Address, AddressValidationError};
pub use error::{Error, ErrorCode};
pub use item::{
    Item, ItemId, ItemKind, ItemUpdate, ItemValidationError, NewItem, NotEnoughStock,
};
pub use member::{Member, MemberId, MemberValidationError, NewMember};
pub use order::{
    CancelError, Delivery, DeliveryId, DeliveryStatus, NewOrder, NewOrderLine, Order, OrderDetail,
    OrderHead, OrderId, OrderLine, OrderSearch, OrderStatus, OrderWithParties, UnknownStatus,
};
pub use order_service::{OrderService, OrderServiceError};
