use rayon::prelude::*;

use super::bid::{Bid, Buyer, CategoryBoard};
use super::traits::WillingnessToPay;
use crate::core::store::SimStore;
use crate::entities::dwelling::DwellingType;
use crate::math::random::Substream;
use crate::utils::errors::Result;

/// Builds every buyer's choice set in parallel, pushing bids onto the
/// board's per-listing lists.
///
/// Each buyer scans its eligible room sizes within every type. A
/// category smaller than the choice-set size is bid on in full and ends
/// the scan for that type; larger categories are sampled with up to
/// twice the choice-set size of draws. A draw is only accepted when the
/// generated bid clears the listing's minimum price.
///
/// `seeds` carries one child seed per buyer, drawn in buyer order, so
/// the result does not depend on parallel scheduling.
pub fn build_choice_sets<W: WillingnessToPay + Sync>(
    store: &SimStore,
    board: &CategoryBoard,
    buyers: &[Buyer],
    wtp: &W,
    seeds: &[u64],
    choice_set_size: usize,
) -> Result<()> {
    debug_assert_eq!(buyers.len(), seeds.len());
    buyers
        .par_iter()
        .enumerate()
        .try_for_each(|(buyer_index, buyer)| {
            let mut rng = Substream::new(seeds[buyer_index]);
            build_for_buyer(store, board, buyer, buyer_index, wtp, &mut rng, choice_set_size)
        })
}

fn eligible_rooms(buyer: &Buyer, max_bedrooms: i32) -> (i32, i32) {
    let (low, high) = if buyer.demands_space {
        (buyer.persons, buyer.persons + 1)
    } else {
        (buyer.persons - 1, buyer.persons)
    };
    (
        low.clamp(0, max_bedrooms - 1),
        high.clamp(0, max_bedrooms - 1),
    )
}

fn build_for_buyer<W: WillingnessToPay + Sync>(
    store: &SimStore,
    board: &CategoryBoard,
    buyer: &Buyer,
    buyer_index: usize,
    wtp: &W,
    rng: &mut Substream,
    choice_set_size: usize,
) -> Result<()> {
    let household = store.households().get(buyer.household)?;
    let (low, high) = eligible_rooms(buyer, board.max_bedrooms());

    for dwelling_type in DwellingType::ALL {
        let type_board = board.type_board(dwelling_type.index())?;
        for rooms in low..=high {
            let (category, offset) = type_board.category(rooms);
            if category.is_empty() {
                continue;
            }

            if category.len() < choice_set_size {
                for (i, listing) in category.iter().enumerate() {
                    if Some(listing.dwelling) == household.dwelling {
                        continue;
                    }
                    let dwelling = store.dwellings().get(listing.dwelling)?;
                    let amount =
                        wtp.bid(store, household, dwelling, listing.asking_price)?;
                    if amount >= listing.minimum_price {
                        listing.push_bid(Bid::new(
                            amount,
                            (offset + i) as i32,
                            buyer_index as i32,
                        ));
                    }
                }
                // small category: the whole room scan for this type ends
                break;
            }

            let mut attempted = vec![false; category.len()];
            let mut accepted = 0usize;
            for _ in 0..2 * choice_set_size {
                if accepted == choice_set_size {
                    break;
                }
                let i = rng.index(category.len());
                if attempted[i] {
                    continue;
                }
                attempted[i] = true;
                let listing = &category[i];
                if Some(listing.dwelling) == household.dwelling {
                    continue;
                }
                let dwelling = store.dwellings().get(listing.dwelling)?;
                let amount = wtp.bid(store, household, dwelling, listing.asking_price)?;
                if amount >= listing.minimum_price {
                    listing.push_bid(Bid::new(
                        amount,
                        (offset + i) as i32,
                        buyer_index as i32,
                    ));
                    accepted += 1;
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currencies::money::Money;
    use crate::entities::dwelling::Dwelling;
    use crate::entities::household::{Household, Tenure};
    use crate::entities::zone::LandUse;
    use crate::market::bid::Listing;
    use crate::time::date::Date;

    struct FlatBid(f32);

    impl WillingnessToPay for FlatBid {
        fn bid(
            &self,
            _store: &SimStore,
            _buyer: &Household,
            _dwelling: &Dwelling,
            _asking_price: f32,
        ) -> Result<f32> {
            Ok(self.0)
        }
    }

    fn fixture(listing_count: usize) -> (SimStore, CategoryBoard, Vec<Buyer>) {
        let date = Date::new(2006, 3);
        let mut store = SimStore::new(date);
        store.set_land_use(0, LandUse::default());
        let household = store.households_mut().add_new(Household::new(Tenure::Own));
        let mut entries = Vec::new();
        for _ in 0..listing_count {
            let dwelling_id = store.dwellings_mut().add_new(Dwelling::new(
                DwellingType::Detached,
                3,
                900.0,
                0,
                Money::new(100_000.0, date),
            ));
            entries.push((
                DwellingType::Detached,
                3,
                Listing::new(dwelling_id, 150_000.0, 0.0),
            ));
        }
        let board = CategoryBoard::build(7, entries);
        let buyers = vec![Buyer {
            household,
            persons: 3,
            demands_space: false,
        }];
        (store, board, buyers)
    }

    #[test]
    fn test_small_category_is_bid_in_full() {
        let (store, board, buyers) = fixture(4);
        build_choice_sets(&store, &board, &buyers, &FlatBid(120_000.0), &[9], 10).unwrap();
        let total: usize = board.types()[0]
            .listings()
            .iter()
            .map(|l| l.bid_count())
            .sum();
        assert_eq!(total, 4);
    }

    #[test]
    fn test_large_category_is_sampled() {
        let (store, board, buyers) = fixture(40);
        build_choice_sets(&store, &board, &buyers, &FlatBid(120_000.0), &[9], 10).unwrap();
        let total: usize = board.types()[0]
            .listings()
            .iter()
            .map(|l| l.bid_count())
            .sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn test_zero_choice_set_size_produces_no_bids() {
        let (store, board, buyers) = fixture(4);
        build_choice_sets(&store, &board, &buyers, &FlatBid(120_000.0), &[9], 0).unwrap();
        let total: usize = board.types()[0]
            .listings()
            .iter()
            .map(|l| l.bid_count())
            .sum();
        assert_eq!(total, 0);
    }

    #[test]
    fn test_minimum_price_filters_bids() {
        let date = Date::new(2006, 3);
        let mut store = SimStore::new(date);
        let household = store.households_mut().add_new(Household::new(Tenure::Own));
        let dwelling_id = store.dwellings_mut().add_new(Dwelling::new(
            DwellingType::Detached,
            3,
            900.0,
            0,
            Money::new(100_000.0, date),
        ));
        let board = CategoryBoard::build(
            7,
            vec![(
                DwellingType::Detached,
                3,
                Listing::new(dwelling_id, 150_000.0, 130_000.0),
            )],
        );
        let buyers = vec![Buyer {
            household,
            persons: 3,
            demands_space: false,
        }];
        build_choice_sets(&store, &board, &buyers, &FlatBid(120_000.0), &[9], 10).unwrap();
        assert_eq!(board.types()[0].listings()[0].bid_count(), 0);
    }

    #[test]
    fn test_space_demand_shifts_window_up() {
        let buyer = Buyer {
            household: 0,
            persons: 3,
            demands_space: false,
        };
        assert_eq!(eligible_rooms(&buyer, 7), (2, 3));
        let wanting = Buyer {
            demands_space: true,
            ..buyer
        };
        assert_eq!(eligible_rooms(&wanting, 7), (3, 4));
        let crowd = Buyer {
            household: 0,
            persons: 12,
            demands_space: true,
        };
        assert_eq!(eligible_rooms(&crowd, 7), (6, 6));
    }

    #[test]
    fn test_buyer_skips_own_dwelling() {
        let (mut store, board, buyers) = fixture(1);
        let own = board.types()[0].listings()[0].dwelling;
        store
            .households_mut()
            .get_mut(buyers[0].household)
            .unwrap()
            .dwelling = Some(own);
        build_choice_sets(&store, &board, &buyers, &FlatBid(120_000.0), &[9], 10).unwrap();
        assert_eq!(board.types()[0].listings()[0].bid_count(), 0);
    }
}
