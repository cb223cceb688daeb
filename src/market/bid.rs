use std::cmp::Ordering;
use std::sync::Mutex;

use crate::entities::dwelling::DwellingType;
use crate::utils::errors::{Result, SimError};

/// # Bid
/// One buyer's offer on one listing. `seller` is the listing's index
/// within its type board; `buyer` indexes the month's buyer list.
///
/// Ranking is by amount, ties broken by the higher buyer index. The tie
/// break makes the sorted order independent of the order in which
/// parallel insertion happened to interleave.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bid {
    pub amount: f32,
    pub seller: i32,
    pub buyer: i32,
}

impl Bid {
    pub fn new(amount: f32, seller: i32, buyer: i32) -> Bid {
        Bid {
            amount,
            seller,
            buyer,
        }
    }
}

/// Ascending rank order: the best bid (highest amount, then highest
/// buyer index) compares greatest, so it sits at the tail of a sorted
/// list and pops first.
pub fn bid_rank(a: &Bid, b: &Bid) -> Ordering {
    a.amount
        .partial_cmp(&b.amount)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.buyer.cmp(&b.buyer))
}

/// A buyer household in this month's market.
#[derive(Debug, Clone, Copy)]
pub struct Buyer {
    pub household: u64,
    pub persons: i32,
    pub demands_space: bool,
}

/// # Listing
/// A dwelling on offer this month, with its asking and minimum prices
/// and the bid list buyers fill in parallel. The bid list carries its
/// own lock; everything else is immutable for the month.
pub struct Listing {
    pub dwelling: u64,
    pub asking_price: f32,
    pub minimum_price: f32,
    bids: Mutex<Vec<Bid>>,
}

impl Listing {
    pub fn new(dwelling: u64, asking_price: f32, minimum_price: f32) -> Listing {
        Listing {
            dwelling,
            asking_price,
            minimum_price,
            bids: Mutex::new(Vec::new()),
        }
    }

    pub fn push_bid(&self, bid: Bid) {
        self.bids.lock().unwrap_or_else(|e| e.into_inner()).push(bid);
    }

    pub fn sort_bids(&self) {
        self.bids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .sort_unstable_by(bid_rank);
    }

    /// Pops the top bid, returning it with the second price: the new
    /// top amount, or the popped amount itself when no second exists.
    pub fn pop_top(&self) -> Option<(Bid, f32)> {
        let mut bids = self.bids.lock().unwrap_or_else(|e| e.into_inner());
        let top = bids.pop()?;
        let second = bids.last().map_or(top.amount, |b| b.amount);
        Some((top, second))
    }

    pub fn clear_bids(&self) {
        self.bids.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn retain_bids<F: FnMut(&Bid) -> bool>(&self, keep: F) {
        self.bids
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .retain(keep);
    }

    pub fn bid_count(&self) -> usize {
        self.bids.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Snapshot of the current bid list, best-ranked last.
    pub fn bids(&self) -> Vec<Bid> {
        self.bids.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

/// All listings of one dwelling type, grouped contiguously by room
/// count. A listing's seller index is its position in `listings`.
pub struct TypeBoard {
    listings: Vec<Listing>,
    ranges: Vec<(usize, usize)>,
}

impl TypeBoard {
    /// The slice of listings for one room count, with the offset that
    /// turns a slice position into a seller index.
    pub fn category(&self, rooms: i32) -> (&[Listing], usize) {
        let (start, end) = self.ranges[rooms as usize];
        (&self.listings[start..end], start)
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn listing(&self, seller: i32) -> Result<&Listing> {
        if seller < 0 {
            return Err(SimError::IndexOutOfRange(format!(
                "negative seller index {}",
                seller
            )));
        }
        self.listings.get(seller as usize).ok_or_else(|| {
            SimError::IndexOutOfRange(format!(
                "seller index {} out of range for {} listings",
                seller,
                self.listings.len()
            ))
        })
    }
}

/// # CategoryBoard
/// This month's sellers partitioned into `5 · max_bedrooms` categories
/// keyed by (dwelling type, clamped room count).
pub struct CategoryBoard {
    types: Vec<TypeBoard>,
    max_bedrooms: i32,
}

impl CategoryBoard {
    /// Builds the board from `(type, rooms, listing)` entries; room
    /// counts are clamped into `[0, max_bedrooms - 1]`.
    pub fn build(
        max_bedrooms: i32,
        entries: Vec<(DwellingType, i32, Listing)>,
    ) -> CategoryBoard {
        let rooms_per_type = max_bedrooms.max(1) as usize;
        let mut buckets: Vec<Vec<Vec<Listing>>> = (0..DwellingType::COUNT)
            .map(|_| (0..rooms_per_type).map(|_| Vec::new()).collect())
            .collect();
        for (dwelling_type, rooms, listing) in entries {
            let room = rooms.clamp(0, max_bedrooms - 1) as usize;
            buckets[dwelling_type.index()][room].push(listing);
        }
        let types = buckets
            .into_iter()
            .map(|rooms| {
                let mut listings = Vec::new();
                let mut ranges = Vec::with_capacity(rooms.len());
                for bucket in rooms {
                    let start = listings.len();
                    listings.extend(bucket);
                    ranges.push((start, listings.len()));
                }
                TypeBoard { listings, ranges }
            })
            .collect();
        CategoryBoard {
            types,
            max_bedrooms,
        }
    }

    pub fn max_bedrooms(&self) -> i32 {
        self.max_bedrooms
    }

    pub fn types(&self) -> &[TypeBoard] {
        &self.types
    }

    pub fn type_board(&self, type_index: usize) -> Result<&TypeBoard> {
        self.types.get(type_index).ok_or_else(|| {
            SimError::IndexOutOfRange(format!("type index {} out of range", type_index))
        })
    }

    pub fn listing(&self, type_index: usize, seller: i32) -> Result<&Listing> {
        self.type_board(type_index)?.listing(seller)
    }

    pub fn total_listings(&self) -> usize {
        self.types.iter().map(|t| t.listings.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total_listings() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bid_rank_orders_by_amount_then_buyer() {
        let mut bids = vec![
            Bid::new(100.0, 0, 2),
            Bid::new(250.0, 0, 0),
            Bid::new(100.0, 0, 7),
            Bid::new(175.0, 0, 1),
        ];
        bids.sort_unstable_by(bid_rank);
        let order: Vec<(f32, i32)> = bids.iter().map(|b| (b.amount, b.buyer)).collect();
        assert_eq!(
            order,
            vec![(100.0, 2), (100.0, 7), (175.0, 1), (250.0, 0)]
        );
    }

    #[test]
    fn test_pop_top_returns_second_price() {
        let listing = Listing::new(0, 100_000.0, 0.0);
        listing.push_bid(Bid::new(180_000.0, 0, 0));
        listing.push_bid(Bid::new(200_000.0, 0, 1));
        listing.sort_bids();
        let (top, second) = listing.pop_top().unwrap();
        assert_eq!(top.amount, 200_000.0);
        assert_eq!(top.buyer, 1);
        assert_eq!(second, 180_000.0);
    }

    #[test]
    fn test_pop_top_falls_back_to_winning_bid() {
        let listing = Listing::new(0, 100_000.0, 0.0);
        listing.push_bid(Bid::new(150_000.0, 0, 3));
        let (top, second) = listing.pop_top().unwrap();
        assert_eq!(top.amount, 150_000.0);
        assert_eq!(second, 150_000.0);
        assert!(listing.pop_top().is_none());
    }

    #[test]
    fn test_tied_amounts_pop_higher_buyer_first() {
        let listing = Listing::new(0, 100_000.0, 0.0);
        listing.push_bid(Bid::new(150_000.0, 0, 2));
        listing.push_bid(Bid::new(150_000.0, 0, 9));
        listing.sort_bids();
        let (top, _) = listing.pop_top().unwrap();
        assert_eq!(top.buyer, 9);
    }

    #[test]
    fn test_board_partitions_by_type_and_room() {
        let entries = vec![
            (DwellingType::Detached, 3, Listing::new(10, 1.0, 0.0)),
            (DwellingType::Detached, 3, Listing::new(11, 1.0, 0.0)),
            (DwellingType::Detached, 5, Listing::new(12, 1.0, 0.0)),
            (DwellingType::Attached, 9, Listing::new(13, 1.0, 0.0)),
        ];
        let board = CategoryBoard::build(7, entries);
        let (cat, offset) = board.types()[0].category(3);
        assert_eq!(cat.len(), 2);
        assert_eq!(offset, 0);
        let (cat, offset) = board.types()[0].category(5);
        assert_eq!(cat.len(), 1);
        assert_eq!(offset, 2);
        // rooms above the ceiling land in the top category
        let (cat, _) = board.types()[DwellingType::Attached.index()].category(6);
        assert_eq!(cat.len(), 1);
        assert_eq!(cat[0].dwelling, 13);
        assert_eq!(board.total_listings(), 4);
    }

    #[test]
    fn test_out_of_range_indices_are_errors() {
        let board = CategoryBoard::build(7, Vec::new());
        assert!(board.type_board(5).is_err());
        assert!(board.listing(0, 0).is_err());
        assert!(board.listing(0, -1).is_err());
    }
}
