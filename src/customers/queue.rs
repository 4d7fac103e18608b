//! Pending customers for one session. The front entry is the customer
//! currently being talked to.

use std::collections::VecDeque;

use super::profile::CustomerProfile;

#[derive(Debug, Clone, Default)]
pub struct CustomerQueue {
    pending: VecDeque<CustomerProfile>,
}

impl CustomerQueue {
    pub fn new(customers: impl IntoIterator<Item = CustomerProfile>) -> Self {
        Self {
            pending: customers.into_iter().collect(),
        }
    }

    pub fn current(&self) -> Option<&CustomerProfile> {
        self.pending.front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop the current customer and return the one that takes its place.
    pub fn advance(&mut self) -> Option<&CustomerProfile> {
        self.pending.pop_front();
        self.pending.front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_walks_front_to_back() {
        let mut queue = CustomerQueue::new([
            CustomerProfile::new("Jane", "Doe"),
            CustomerProfile::new("John", "Smith"),
        ]);
        assert_eq!(queue.current().unwrap().first_name, "Jane");
        assert_eq!(queue.advance().unwrap().first_name, "John");
        assert_eq!(queue.len(), 1);
        assert!(queue.advance().is_none());
        assert!(queue.is_empty());
        assert!(queue.advance().is_none());
    }
}
