use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::Load;
use crate::error::Error;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Bid {
    pub id: Uuid,
    pub load_id: Uuid,
    pub carrier_id: Uuid,
    pub amount: f64,
    /// Copied from the load's budget currency at creation time; a later
    /// change to the load does not touch existing bids.
    pub currency: String,
    pub message: Option<String>,
    pub proposed_pickup_date: Option<DateTime<Utc>>,
    pub proposed_delivery_date: Option<DateTime<Utc>>,
    pub status: Status,
    pub is_winning_bid: bool,
    pub created_at: DateTime<Utc>,
    /// Copied from the load's expiration at creation time.
    pub expires_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
    Expired,
}

impl Status {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::Rejected => "Rejected",
            Self::Withdrawn => "Withdrawn",
            Self::Expired => "Expired",
        }
    }
}

/// What a carrier supplies when bidding; currency and expiry are inherited
/// from the load, never from the caller.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BidDraft {
    pub amount: f64,
    pub message: Option<String>,
    pub proposed_pickup_date: Option<DateTime<Utc>>,
    pub proposed_delivery_date: Option<DateTime<Utc>>,
}

impl Bid {
    pub fn place(
        load: &Load,
        carrier_id: Uuid,
        draft: BidDraft,
        now: DateTime<Utc>,
    ) -> Result<Self, Error> {
        let mut messages = Vec::new();

        if draft.amount <= 0.0 {
            messages.push("Please provide a bid amount".to_string());
        }

        if let Some(message) = &draft.message {
            if message.len() > 300 {
                messages.push("Message cannot be more than 300 characters".to_string());
            }
        }

        if !messages.is_empty() {
            return Err(Error::Validation { messages });
        }

        Ok(Self {
            id: Uuid::new_v4(),
            load_id: load.id,
            carrier_id,
            amount: draft.amount,
            currency: load.budget.currency.clone(),
            message: draft.message,
            proposed_pickup_date: draft.proposed_pickup_date,
            proposed_delivery_date: draft.proposed_delivery_date,
            status: Status::Pending,
            is_winning_bid: false,
            created_at: now,
            expires_at: load.expires_at,
            accepted_at: None,
        })
    }

    /// Expiry is evaluated lazily against the read clock; nothing sweeps
    /// stored rows.
    pub fn effective_status(&self, now: DateTime<Utc>) -> Status {
        match (self.status, self.expires_at) {
            (Status::Pending, Some(expires_at)) if now > expires_at => Status::Expired,
            (status, _) => status,
        }
    }

    /// A live bid blocks further bids by the same carrier on the same load.
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        matches!(
            self.effective_status(now),
            Status::Pending | Status::Accepted
        )
    }

    fn ensure_pending(&self, action: &'static str, now: DateTime<Utc>) -> Result<(), Error> {
        let status = self.effective_status(now);
        if status != Status::Pending {
            return Err(Error::invalid_state(action, status.name()));
        }

        Ok(())
    }

    /// Only the load's accept-bid transaction calls this.
    pub fn accept(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        self.ensure_pending("accept a bid", now)?;

        self.status = Status::Accepted;
        self.is_winning_bid = true;
        self.accepted_at = Some(now);
        Ok(())
    }

    /// Forced side effect of a sibling's acceptance; never touches bids that
    /// already reached a terminal status.
    pub fn reject(&mut self) -> Result<(), Error> {
        if self.status != Status::Pending {
            return Err(Error::invalid_state("reject a bid", self.status.name()));
        }

        self.status = Status::Rejected;
        Ok(())
    }

    pub fn withdraw(&mut self, now: DateTime<Utc>) -> Result<(), Error> {
        self.ensure_pending("withdraw a bid", now)?;

        self.status = Status::Withdrawn;
        Ok(())
    }

    /// Copy with the lazily-evaluated status materialized, for read views.
    pub fn normalized(mut self, now: DateTime<Utc>) -> Self {
        self.status = self.effective_status(now);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::load::tests::posted_load;
    use chrono::Duration;

    fn draft(amount: f64) -> BidDraft {
        BidDraft {
            amount,
            message: None,
            proposed_pickup_date: None,
            proposed_delivery_date: None,
        }
    }

    #[test]
    fn place_snapshots_currency_and_expiry() {
        let now = Utc::now();
        let mut load = posted_load();
        load.budget.currency = "EUR".into();
        load.expires_at = Some(now + Duration::days(2));

        let bid = Bid::place(&load, Uuid::new_v4(), draft(900.0), now).unwrap();
        assert_eq!(bid.currency, "EUR");
        assert_eq!(bid.expires_at, load.expires_at);
        assert_eq!(bid.status, Status::Pending);
        assert!(!bid.is_winning_bid);

        // later load edits must not reach through to the bid
        load.budget.currency = "CAD".into();
        assert_eq!(bid.currency, "EUR");
    }

    #[test]
    fn place_rejects_bad_input_with_all_messages() {
        let load = posted_load();
        let mut bad = draft(0.0);
        bad.message = Some("x".repeat(301));

        let err = Bid::place(&load, Uuid::new_v4(), bad, Utc::now()).unwrap_err();
        match err {
            Error::Validation { messages } => assert_eq!(messages.len(), 2),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn accept_sets_winner_and_timestamp() {
        let load = posted_load();
        let now = Utc::now();
        let mut bid = Bid::place(&load, Uuid::new_v4(), draft(850.0), now).unwrap();

        bid.accept(now).unwrap();

        assert_eq!(bid.status, Status::Accepted);
        assert!(bid.is_winning_bid);
        assert_eq!(bid.accepted_at, Some(now));
    }

    #[test]
    fn accept_after_terminal_names_current_status() {
        let load = posted_load();
        let now = Utc::now();
        let mut bid = Bid::place(&load, Uuid::new_v4(), draft(850.0), now).unwrap();
        bid.withdraw(now).unwrap();

        let err = bid.accept(now).unwrap_err();
        assert_eq!(format!("{err}"), "cannot accept a bid with status 'Withdrawn'");
    }

    #[test]
    fn reject_never_overwrites_withdrawn() {
        let load = posted_load();
        let now = Utc::now();
        let mut bid = Bid::place(&load, Uuid::new_v4(), draft(850.0), now).unwrap();
        bid.withdraw(now).unwrap();

        assert!(bid.reject().is_err());
        assert_eq!(bid.status, Status::Withdrawn);
    }

    #[test]
    fn expiry_is_lazy() {
        let load = posted_load();
        let now = Utc::now();
        let mut bid = Bid::place(&load, Uuid::new_v4(), draft(850.0), now).unwrap();
        bid.expires_at = Some(now + Duration::hours(1));

        assert_eq!(bid.effective_status(now), Status::Pending);
        assert!(bid.is_live(now));

        let later = now + Duration::hours(2);
        assert_eq!(bid.effective_status(later), Status::Expired);
        assert!(!bid.is_live(later));
        // stored status is untouched until something writes
        assert_eq!(bid.status, Status::Pending);
    }

    #[test]
    fn expired_bid_cannot_be_accepted_or_withdrawn() {
        let load = posted_load();
        let now = Utc::now();
        let mut bid = Bid::place(&load, Uuid::new_v4(), draft(850.0), now).unwrap();
        bid.expires_at = Some(now - Duration::hours(1));

        let err = bid.accept(now).unwrap_err();
        assert_eq!(format!("{err}"), "cannot accept a bid with status 'Expired'");

        let err = bid.withdraw(now).unwrap_err();
        assert_eq!(
            format!("{err}"),
            "cannot withdraw a bid with status 'Expired'"
        );
    }

    #[test]
    fn normalized_materializes_expiry_for_views() {
        let load = posted_load();
        let now = Utc::now();
        let mut bid = Bid::place(&load, Uuid::new_v4(), draft(850.0), now).unwrap();
        bid.expires_at = Some(now - Duration::minutes(1));

        assert_eq!(bid.normalized(now).status, Status::Expired);
    }
}
