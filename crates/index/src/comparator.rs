//! Comparator implementations for index keys.
//!
//! This module provides comparators for ordering keys in indexes.

use alloc::vec::Vec;
use core::cmp::Ordering;

/// Sort order for index keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Order {
    /// Ascending order (smallest first)
    Asc,
    /// Descending order (largest first)
    Desc,
}

impl Order {
    /// Applies this order to a comparison result.
    #[inline]
    pub fn apply(&self, ord: Ordering) -> Ordering {
        match self {
            Order::Asc => ord,
            Order::Desc => ord.reverse(),
        }
    }
}

/// Trait for comparing index keys.
pub trait Comparator<K> {
    /// Compares two keys according to the comparator's ordering.
    fn compare(&self, a: &K, b: &K) -> Ordering;

    /// Returns true if a < b according to this comparator.
    fn is_less(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) == Ordering::Less
    }

    /// Returns true if a <= b according to this comparator.
    fn is_less_or_equal(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) != Ordering::Greater
    }

    /// Returns true if a > b according to this comparator.
    fn is_greater(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) == Ordering::Greater
    }

    /// Returns true if a >= b according to this comparator.
    fn is_greater_or_equal(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) != Ordering::Less
    }

    /// Returns true if a == b according to this comparator.
    fn is_equal(&self, a: &K, b: &K) -> bool {
        self.compare(a, b) == Ordering::Equal
    }
}

/// A simple comparator for single keys that implement Ord.
#[derive(Clone, Debug)]
pub struct SimpleComparator {
    order: Order,
}

impl SimpleComparator {
    /// Creates a new simple comparator with the given order.
    pub fn new(order: Order) -> Self {
        Self { order }
    }

    /// Creates an ascending comparator.
    pub fn asc() -> Self {
        Self::new(Order::Asc)
    }

    /// Creates a descending comparator.
    pub fn desc() -> Self {
        Self::new(Order::Desc)
    }

    /// Returns the order of this comparator.
    pub fn order(&self) -> Order {
        self.order
    }
}

impl<K: Ord> Comparator<K> for SimpleComparator {
    fn compare(&self, a: &K, b: &K) -> Ordering {
        self.order.apply(a.cmp(b))
    }
}

/// A comparator for multi-key indexes (composite keys).
#[derive(Clone, Debug)]
pub struct MultiKeyComparator {
    orders: Vec<Order>,
}

impl MultiKeyComparator {
    /// Creates a new multi-key comparator with the given orders.
    pub fn new(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    /// Creates orders for n keys, all with the same order.
    pub fn create_orders(n: usize, order: Order) -> Vec<Order> {
        (0..n).map(|_| order).collect()
    }

    /// Returns the orders of this comparator.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }
}

impl<K: Ord> Comparator<Vec<K>> for MultiKeyComparator {
    fn compare(&self, a: &Vec<K>, b: &Vec<K>) -> Ordering {
        for (i, order) in self.orders.iter().enumerate() {
            let a_val = a.get(i);
            let b_val = b.get(i);

            let cmp = match (a_val, b_val) {
                (Some(av), Some(bv)) => order.apply(av.cmp(bv)),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };

            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    }
}

/// A comparator for multi-key indexes that handles null values.
/// Null values are sorted before non-null values.
#[derive(Clone, Debug)]
pub struct MultiKeyComparatorWithNull {
    orders: Vec<Order>,
}

impl MultiKeyComparatorWithNull {
    /// Creates a new multi-key comparator with null handling.
    pub fn new(orders: Vec<Order>) -> Self {
        Self { orders }
    }

    /// Returns the orders of this comparator.
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }
}

impl<K: Ord> Comparator<Vec<Option<K>>> for MultiKeyComparatorWithNull {
    fn compare(&self, a: &Vec<Option<K>>, b: &Vec<Option<K>>) -> Ordering {
        for (i, order) in self.orders.iter().enumerate() {
            let a_val = a.get(i).and_then(|v| v.as_ref());
            let b_val = b.get(i).and_then(|v| v.as_ref());

            let cmp = match (a_val, b_val) {
                (Some(av), Some(bv)) => order.apply(av.cmp(bv)),
                (None, Some(_)) => Ordering::Less,
                (Some(_), None) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            };

            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    }
}
