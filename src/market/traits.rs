use super::bid::Buyer;
use crate::core::store::SimStore;
use crate::entities::dwelling::Dwelling;
use crate::entities::household::Household;
use crate::math::random::Substream;
use crate::utils::errors::Result;

/// Produces this month's buyer list. Implementations draw per-household
/// randomness from child seeds taken off `rng` in repository order so
/// the list is reproducible.
pub trait BuyerSource {
    fn collect_buyers(&self, store: &SimStore, rng: &mut Substream) -> Result<Vec<Buyer>>;
}

/// Prices a dwelling for listing: `(asking_price, minimum_price)`.
pub trait AskingPrices {
    fn price(&self, store: &SimStore, dwelling: &Dwelling) -> (f32, f32);
}

/// Turns (buyer, dwelling, asking price) into a willingness-to-pay.
pub trait WillingnessToPay {
    /// Hook run once per month after the buyer list is known, before
    /// any bids are generated.
    fn warm_up(&mut self, _store: &SimStore, _buyers: &[Buyer]) -> Result<()> {
        Ok(())
    }

    fn bid(
        &self,
        store: &SimStore,
        buyer: &Household,
        dwelling: &Dwelling,
        asking_price: f32,
    ) -> Result<f32>;
}
