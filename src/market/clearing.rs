use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

use rayon::prelude::*;
use tracing::{debug, warn};

use super::bid::{Bid, Buyer, CategoryBoard, Listing};
use super::choiceset::build_choice_sets;
use super::traits::{AskingPrices, BuyerSource, WillingnessToPay};
use crate::core::store::SimStore;
use crate::core::traits::Identifiable;
use crate::currencies::money::Money;
use crate::entities::salerecord::SaleRecord;
use crate::entities::zone::LandUse;
use crate::math::random::Substream;
use crate::time::date::Date;
use crate::utils::errors::{Result, SimError};

// Unmatched participants leave the carry sets after this many
// consecutive months.
const CARRY_LIMIT: u32 = 3;

/// One top-bid extraction: the popped bid plus the second price it
/// resolves at.
struct Win {
    type_index: usize,
    seller: i32,
    second_price: f32,
    bid: Bid,
}

/// What the iterative auction did with one board.
pub struct AuctionOutcome {
    pub sales: u32,
    pub total_value: f64,
    pub matched_households: HashSet<u64>,
    pub sold_dwellings: HashSet<u64>,
}

/// Aggregates of one monthly clear.
#[derive(Debug, Clone, Copy, Default)]
pub struct MonthOutcome {
    pub sales: u32,
    pub total_value: f64,
    pub buyers_remaining: usize,
    pub sellers_remaining: usize,
}

impl MonthOutcome {
    pub fn average_price(&self) -> f32 {
        if self.sales == 0 {
            0.0
        } else {
            (self.total_value / f64::from(self.sales)) as f32
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct CarriedBuyer {
    streak: u32,
    demands_space: bool,
}

/// # ClearingEngine
/// The monthly market clear: gathers buyers and listings through the
/// injected capability seams, builds choice sets in parallel and runs
/// the iterative second-price auction, then settles carry-over
/// bookkeeping for the unmatched.
///
/// ## Details
/// - Rounds alternate parallel top-bid extraction, serial resolution
///   and a parallel sweep, ending on a round with no wins or at the
///   iteration cap.
/// - For a fixed seed, input repositories and configuration the sale
///   stream is reproducible.
pub struct ClearingEngine {
    max_iterations: u32,
    choice_set_size: usize,
    max_bedrooms: i32,
    carry_buyers: BTreeMap<u64, CarriedBuyer>,
    carry_sellers: BTreeMap<u64, u32>,
}

impl ClearingEngine {
    pub fn new(max_iterations: u32, choice_set_size: usize, max_bedrooms: i32) -> ClearingEngine {
        ClearingEngine {
            max_iterations,
            choice_set_size,
            max_bedrooms,
            carry_buyers: BTreeMap::new(),
            carry_sellers: BTreeMap::new(),
        }
    }

    pub fn carried_buyers(&self) -> usize {
        self.carry_buyers.len()
    }

    pub fn carried_sellers(&self) -> usize {
        self.carry_sellers.len()
    }

    /// Clears the market for the store's current month.
    ///
    /// # Errors
    ///
    /// `MissingZoneData` during bid generation, `MissingRate` during
    /// conversion and `IndexOutOfRange` from a corrupted choice-set
    /// structure all abort the tick.
    pub fn clear_month<B, P, W>(
        &mut self,
        store: &mut SimStore,
        buyer_source: &B,
        pricing: &P,
        wtp: &mut W,
        rng: &mut Substream,
    ) -> Result<MonthOutcome>
    where
        B: BuyerSource + Sync,
        P: AskingPrices + Sync,
        W: WillingnessToPay + Sync,
    {
        let now = store.current_date();

        // phase (i): buyer opt-in, then merge the carried unmatched
        let mut buyers = buyer_source.collect_buyers(store, rng)?;
        let fresh: HashSet<u64> = buyers.iter().map(|b| b.household).collect();
        for (&household_id, carried) in &self.carry_buyers {
            if fresh.contains(&household_id) || store.households().try_get(household_id).is_none()
            {
                continue;
            }
            buyers.push(Buyer {
                household: household_id,
                persons: store.household_size(household_id)?,
                demands_space: carried.demands_space,
            });
        }
        if buyers.is_empty() {
            return Ok(self.idle_outcome());
        }

        // barrier: buyers fully enumerated before sellers are gathered
        let board = self.gather_listings(store, &buyers, pricing)?;
        if board.is_empty() {
            return Ok(self.idle_outcome());
        }

        wtp.warm_up(store, &buyers)?;

        // phase (iii): parallel choice-set construction
        let seeds: Vec<u64> = buyers.iter().map(|_| rng.child_seed()).collect();
        build_choice_sets(store, &board, &buyers, &*wtp, &seeds, self.choice_set_size)?;

        // phase (iv): parallel per-listing sort
        for type_board in board.types() {
            type_board.listings().par_iter().for_each(Listing::sort_bids);
        }

        let auction = run_auction(store, &board, &buyers, self.max_iterations, now)?;

        self.update_carry_sets(
            store,
            &buyers,
            &board,
            &auction.matched_households,
            &auction.sold_dwellings,
        );

        Ok(MonthOutcome {
            sales: auction.sales,
            total_value: auction.total_value,
            buyers_remaining: self.carry_buyers.len(),
            sellers_remaining: self.carry_sellers.len(),
        })
    }

    fn idle_outcome(&self) -> MonthOutcome {
        MonthOutcome {
            sales: 0,
            total_value: 0.0,
            buyers_remaining: self.carry_buyers.len(),
            sellers_remaining: self.carry_sellers.len(),
        }
    }

    /// Phase (ii): every existing dwelling that is vacant, already
    /// listed, or occupied by an opted-in buyer goes on the board.
    /// Newly listed dwellings get today's listing date; asking prices
    /// are computed in parallel.
    fn gather_listings<P: AskingPrices + Sync>(
        &self,
        store: &mut SimStore,
        buyers: &[Buyer],
        pricing: &P,
    ) -> Result<CategoryBoard> {
        let now = store.current_date();
        let buyer_households: HashSet<u64> = buyers.iter().map(|b| b.household).collect();
        let eligible: Vec<u64> = store
            .dwellings()
            .iter()
            .filter(|d| {
                d.exists
                    && (d.is_vacant()
                        || d.is_listed()
                        || d.household.is_some_and(|h| buyer_households.contains(&h)))
            })
            .filter_map(|d| d.id())
            .collect();

        for &dwelling_id in &eligible {
            let dwelling = store.dwellings_mut().get_mut(dwelling_id)?;
            if dwelling.listing_date.is_none() {
                dwelling.listing_date = Some(now);
            }
        }

        let frozen: &SimStore = store;
        let entries = eligible
            .par_iter()
            .map(|&dwelling_id| {
                let dwelling = frozen.dwellings().get(dwelling_id)?;
                let (asking_price, minimum_price) = pricing.price(frozen, dwelling);
                Ok((
                    dwelling.dwelling_type,
                    dwelling.rooms,
                    Listing::new(dwelling_id, asking_price, minimum_price),
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CategoryBoard::build(self.max_bedrooms, entries))
    }

    fn update_carry_sets(
        &mut self,
        store: &mut SimStore,
        buyers: &[Buyer],
        board: &CategoryBoard,
        matched_households: &HashSet<u64>,
        sold_dwellings: &HashSet<u64>,
    ) {
        for buyer in buyers {
            if matched_households.contains(&buyer.household) {
                self.carry_buyers.remove(&buyer.household);
                continue;
            }
            let carried = self
                .carry_buyers
                .entry(buyer.household)
                .or_insert(CarriedBuyer {
                    streak: 0,
                    demands_space: buyer.demands_space,
                });
            carried.streak += 1;
            carried.demands_space = buyer.demands_space;
            if carried.streak >= CARRY_LIMIT {
                self.carry_buyers.remove(&buyer.household);
            }
        }

        for type_board in board.types() {
            for listing in type_board.listings() {
                if sold_dwellings.contains(&listing.dwelling) {
                    self.carry_sellers.remove(&listing.dwelling);
                    continue;
                }
                let streak = self.carry_sellers.entry(listing.dwelling).or_insert(0);
                *streak += 1;
                if *streak >= CARRY_LIMIT {
                    self.carry_sellers.remove(&listing.dwelling);
                    if let Some(dwelling) = store.dwellings_mut().try_get_mut(listing.dwelling) {
                        dwelling.listing_date = None;
                    }
                }
            }
        }
    }
}

/// Phase 2: the iterative auction over an already-filled board.
///
/// Each round extracts the top bid of every listing in parallel (serial
/// over types), resolves buyers serially in index order and sweeps the
/// resolved buyers' residual bids in parallel. Terminates on a round
/// with zero wins or after `max_iterations` rounds.
///
/// # Errors
///
/// Returns `IndexOutOfRange` when a bid references a buyer, seller or
/// type outside the board; that indicates a corrupted choice-set
/// structure.
pub fn run_auction(
    store: &mut SimStore,
    board: &CategoryBoard,
    buyers: &[Buyer],
    max_iterations: u32,
    now: Date,
) -> Result<AuctionOutcome> {
    let wins: Vec<Mutex<Vec<Win>>> = buyers.iter().map(|_| Mutex::new(Vec::new())).collect();
    let mut outcome = AuctionOutcome {
        sales: 0,
        total_value: 0.0,
        matched_households: HashSet::new(),
        sold_dwellings: HashSet::new(),
    };

    for _round in 0..max_iterations {
        // (v) parallel top-bid extraction, serial over types
        for (type_index, type_board) in board.types().iter().enumerate() {
            type_board
                .listings()
                .par_iter()
                .try_for_each(|listing| -> Result<()> {
                    if let Some((top, second_price)) = listing.pop_top() {
                        let slot = usize::try_from(top.buyer)
                            .ok()
                            .and_then(|i| wins.get(i))
                            .ok_or_else(|| {
                                SimError::IndexOutOfRange(format!(
                                    "bid references buyer {} of {}",
                                    top.buyer,
                                    buyers.len()
                                ))
                            })?;
                        slot.lock().unwrap_or_else(|e| e.into_inner()).push(Win {
                            type_index,
                            seller: top.seller,
                            second_price,
                            bid: top,
                        });
                    }
                    Ok(())
                })?;
        }

        let round_wins: usize = wins
            .iter()
            .map(|w| w.lock().unwrap_or_else(|e| e.into_inner()).len())
            .sum();
        if round_wins == 0 {
            break;
        }

        // (vi) serial resolution in buyer-index order
        let mut resolved = vec![false; buyers.len()];
        for buyer_index in 0..buyers.len() {
            let mut buyer_wins = std::mem::take(&mut *wins[buyer_index]
                .lock()
                .unwrap_or_else(|e| e.into_inner()));
            if buyer_wins.is_empty() {
                continue;
            }
            let best = buyer_wins
                .iter()
                .enumerate()
                .max_by(|(_, a), (_, b)| {
                    a.second_price
                        .partial_cmp(&b.second_price)
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| a.seller.cmp(&b.seller))
                        .then_with(|| a.type_index.cmp(&b.type_index))
                })
                .map_or(0, |(i, _)| i);
            let win = buyer_wins.swap_remove(best);
            let (dwelling_id, price) =
                finalize_sale(store, board, &buyers[buyer_index], &win, now)?;
            outcome.sales += 1;
            outcome.total_value += f64::from(price);
            outcome.matched_households.insert(buyers[buyer_index].household);
            outcome.sold_dwellings.insert(dwelling_id);
            resolved[buyer_index] = true;
            // unchosen wins go back as live bids until the sweep
            for other in buyer_wins {
                board.listing(other.type_index, other.seller)?.push_bid(other.bid);
            }
        }

        // (vii) parallel sweep of resolved buyers' residual bids
        for type_board in board.types() {
            type_board.listings().par_iter().for_each(|listing| {
                listing.retain_bids(|bid| {
                    usize::try_from(bid.buyer).map_or(true, |i| !resolved.get(i).copied().unwrap_or(false))
                });
            });
        }
    }

    Ok(outcome)
}

/// Settles one sale: relinks dwelling and households, restores the
/// occupancy invariant, stamps the new value and appends the sale
/// record. Missing zone data degrades to zeroed record fields.
fn finalize_sale(
    store: &mut SimStore,
    board: &CategoryBoard,
    buyer: &Buyer,
    win: &Win,
    now: Date,
) -> Result<(u64, f32)> {
    let listing = board.listing(win.type_index, win.seller)?;
    let dwelling_id = listing.dwelling;
    let price = win.second_price;

    let (zone, rooms, square_footage, dwelling_type, seller_household) = {
        let dwelling = store.dwellings().get(dwelling_id)?;
        (
            dwelling.zone,
            dwelling.rooms,
            dwelling.square_footage,
            dwelling.dwelling_type,
            dwelling.household,
        )
    };

    if let Some(seller_id) = seller_household {
        let household = store.households_mut().get_mut(seller_id)?;
        if household.dwelling == Some(dwelling_id) {
            household.dwelling = None;
        }
    }

    let previous = store.households().get(buyer.household)?.dwelling;
    if let Some(previous_id) = previous {
        if previous_id != dwelling_id {
            store.dwellings_mut().get_mut(previous_id)?.household = None;
        }
    }
    store.households_mut().get_mut(buyer.household)?.dwelling = Some(dwelling_id);
    {
        let dwelling = store.dwellings_mut().get_mut(dwelling_id)?;
        dwelling.household = Some(buyer.household);
        dwelling.value = Money::new(price, now);
        dwelling.listing_date = None;
    }

    let land_use = store.land_use(zone).unwrap_or_else(|| {
        warn!(zone, "no land use for sold dwelling, recording zeros");
        LandUse::default()
    });
    let dist_subway = store.subway_distance(zone).unwrap_or(0.0);
    let dist_regional = store.regional_distance(zone).unwrap_or(0.0);
    store.sale_records_mut().add_new(SaleRecord::new(
        now,
        price,
        rooms,
        square_footage,
        zone,
        dist_subway,
        dist_regional,
        land_use.residential,
        land_use.commercial,
        dwelling_type,
    ));

    debug!(
        dwelling = dwelling_id,
        household = buyer.household,
        price = f64::from(price),
        month = %now,
        "dwelling sold"
    );

    listing.clear_bids();
    Ok((dwelling_id, price))
}
