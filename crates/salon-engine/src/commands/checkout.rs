//! # Walk-In Checkout
//!
//! Settles one visit with one or more services and no prior booking.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Front desk: customer + barber + [Haircut, Beard Trim, Haircut]         │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │  ┌────────────────────────────────────────────────────────────────┐     │
//! │  │  1. Validate input (1-20 items, discount >= 0, points >= 0)    │     │
//! │  │  2. Lock the SES number bucket for today                       │     │
//! │  │  3. BEGIN IMMEDIATE                                            │     │
//! │  │  4. Load staff + each service (must be active)                 │     │
//! │  │  5. Find or create the customer by phone                       │     │
//! │  │  6. settle() against the customer's point balance              │     │
//! │  │  7. Insert session + items, apply ledger                       │     │
//! │  │  8. COMMIT                                                     │     │
//! │  └────────────────────────────────────────────────────────────────┘     │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │  Receipt: SES-20240501-004, final price, points earned                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::NaiveDate;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{active_service, bookable_staff, require_id, session_items, SoldService, NUMBER_ATTEMPTS};
use crate::error::{EngineError, EngineResult};
use crate::Engine;
use salon_core::pricing::settle;
use salon_core::requests::{CheckoutRequest, CustomerInput};
use salon_core::validation::{
    validate_customer_input, validate_item_count, validate_notes, validate_payment_method,
    validate_price_cents,
};
use salon_core::{Money, NumberKind, Session};
use salon_db::repository::{customer, ledger, numbering, session};
use salon_db::LedgerEntry;

#[derive(Debug)]
struct CheckedCheckout {
    customer: CustomerInput,
    payment_method: String,
    notes: Option<String>,
}

impl Engine {
    /// Records a walk-in visit as a session and applies it to the ledger.
    ///
    /// A service listed twice is sold twice. Points are redeemed from the
    /// customer's balance as it stands inside the transaction; the balance
    /// moves by `points_earned - points_to_redeem`.
    ///
    /// ## Errors
    /// - `Validation`: no items, negative discount or points, more points
    ///   than the customer holds, inactive staff or service
    /// - `NotFound`: unknown staff or service
    pub async fn checkout_walk_in(&self, req: CheckoutRequest) -> EngineResult<Session> {
        debug!(
            staff_id = %req.staff_id,
            items = req.service_ids.len(),
            discount = req.discount_cents,
            points = req.points_to_redeem,
            "checkout_walk_in"
        );

        let checked = self.check_checkout(&req)?;

        let today = self.today();
        let _bucket = self.locks.number_bucket(NumberKind::Session, today).await?;

        for attempt in 1..=NUMBER_ATTEMPTS {
            if let Some(session) = self.record_checkout(&req, &checked, today).await? {
                info!(
                    session = %session.session_number,
                    staff = %session.staff_name,
                    items = session.items.len(),
                    final_price = session.final_price_cents,
                    points_earned = session.loyalty_points_earned,
                    points_used = session.loyalty_points_used,
                    "Walk-in checked out"
                );
                return Ok(session);
            }
            warn!(attempt, "Session number taken by another writer, retrying");
        }

        Err(EngineError::Conflict(
            "Could not reserve a session number".to_string(),
        ))
    }

    fn check_checkout(&self, req: &CheckoutRequest) -> EngineResult<CheckedCheckout> {
        let customer = validate_customer_input(&req.customer)?;
        require_id("staff_id", &req.staff_id)?;
        validate_item_count(req.service_ids.len())?;
        for id in &req.service_ids {
            require_id("service_id", id)?;
        }
        validate_price_cents("discount", req.discount_cents)?;

        let payment_method = validate_payment_method(
            req.payment_method
                .as_deref()
                .unwrap_or(self.config.shop.default_payment_method.as_str()),
        )?;

        Ok(CheckedCheckout {
            customer,
            payment_method,
            notes: validate_notes(req.notes.as_deref())?,
        })
    }

    async fn record_checkout(
        &self,
        req: &CheckoutRequest,
        checked: &CheckedCheckout,
        today: NaiveDate,
    ) -> EngineResult<Option<Session>> {
        let mut tx = self.db.begin_write().await?;

        let staff = bookable_staff(&mut tx, &req.staff_id).await?;

        let mut menu: HashMap<&str, SoldService> = HashMap::new();
        let mut sold = Vec::with_capacity(req.service_ids.len());
        for id in &req.service_ids {
            let line = match menu.get(id.as_str()) {
                Some(line) => line.clone(),
                None => {
                    let line = SoldService::from_menu(&active_service(&mut tx, id).await?);
                    menu.insert(id.as_str(), line.clone());
                    line
                }
            };
            sold.push(line);
        }

        let now = self.now();
        let customer = customer::find_or_create(&mut tx, &checked.customer, now).await?;

        let lines: Vec<_> = sold.iter().map(SoldService::line).collect();
        let settlement = settle(
            &lines,
            Some(staff.commission_rate()),
            Money::from_cents(req.discount_cents),
            req.points_to_redeem,
            customer.loyalty_points,
            &self.policy,
        )?;

        let session_id = Uuid::new_v4().to_string();
        let number = numbering::next_number(&mut *tx, NumberKind::Session, today).await?;

        let record = Session {
            id: session_id.clone(),
            session_number: number,
            appointment_id: None,
            customer_id: Some(customer.id.clone()),
            customer_name: checked.customer.name.clone(),
            customer_phone: Some(checked.customer.phone.clone()),
            staff_id: staff.id.clone(),
            staff_name: staff.name.clone(),
            total_price_cents: settlement.total_price.cents(),
            total_cost_cents: settlement.total_cost.cents(),
            total_commission_cents: settlement.total_commission.cents(),
            discount_cents: settlement.discount.cents(),
            loyalty_points_used: settlement.points_redeemed,
            redemption_cents: settlement.redemption_value.cents(),
            final_price_cents: settlement.final_price.cents(),
            loyalty_points_earned: settlement.points_earned,
            payment_method: checked.payment_method.clone(),
            total_duration_minutes: sold.iter().map(|s| s.duration_minutes).sum(),
            check_in: now,
            check_out: now,
            business_date: today,
            notes: checked.notes.clone(),
            created_at: now,
            items: session_items(&session_id, &sold, &settlement),
        };

        match session::insert(&mut tx, &record).await {
            Ok(()) => {}
            Err(e) if e.is_number_collision() => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        ledger::apply(
            &mut tx,
            &LedgerEntry {
                customer_id: Some(customer.id.as_str()),
                staff_id: &staff.id,
                final_price_cents: record.final_price_cents,
                points_delta: settlement.points_delta(),
                service_ids: sold.iter().map(|s| s.service_id.as_str()).collect(),
                at: now,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(Some(record))
    }
}
