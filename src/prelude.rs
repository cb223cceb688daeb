pub use crate::{
    core::{
        repository::Repository,
        store::SimStore,
        traits::{HasReferenceDate, Identifiable},
    },
    currencies::{inflationstore::InflationStore, money::Money},
    entities::{
        dwelling::{Dwelling, DwellingType},
        family::Family,
        household::{Household, Tenure},
        person::{Job, LabourForceStatus, Person, Sex},
        salerecord::SaleRecord,
        zone::{LandUse, ZoneSystem},
    },
    market::{
        bid::{Bid, Buyer, CategoryBoard, Listing},
        clearing::{ClearingEngine, MonthOutcome},
        traits::{AskingPrices, BuyerSource, WillingnessToPay},
    },
    math::random::Substream,
    models::{
        bidding::BidModel,
        hedonic::HedonicPriceModel,
        participation::{ParticipationCoefficients, ParticipationModel},
        supply::SupplyGenerator,
    },
    simulation::{config::SimConfig, scheduler::Simulation, stats::YearlySummary},
    time::date::Date,
    utils::errors::{Result, SimError},
};
