//! Domain models for Tollgate
//!
//! Pricing (calendar rules, destinations, rate plans, rating profiles, time
//! spans, call costs) and balances (accounts, buckets, counters, triggers,
//! actions, action timings).

pub mod account;
pub mod action;
pub mod action_timing;
pub mod balance;
pub mod bucket;
pub mod calendar;
pub mod call;
pub mod destination;
pub mod duration;
pub mod rate;
pub mod rating_profile;
pub mod timespan;
pub mod trigger;
pub mod unit_counter;

pub use account::{Account, AccountType, DebitContext, PrefixAllowance};
pub use action::{apply_actions, Action, ActionCatalog, ActionKind, Movement};
pub use action_timing::ActionTiming;
pub use balance::{Balance, BalanceCategory, BalanceChain};
pub use bucket::{MinuteBucket, PriceType};
pub use calendar::CalendarRule;
pub use call::{CallCost, CallDescriptor};
pub use destination::{Destination, DestinationIndex};
pub use rate::{Rate, RatePlan, RoundingMethod};
pub use rating_profile::{rating_profile_key, ActivationPeriod, RatingProfile};
pub use timespan::{round_to_increments, BonusInfo, TimeSpan};
pub use trigger::{ActionTrigger, ThresholdType};
pub use unit_counter::UnitsCounter;
