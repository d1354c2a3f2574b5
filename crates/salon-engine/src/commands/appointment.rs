//! # Appointment Operations
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   create ──► pending ──► confirmed ──┬──► completed  (session + ledger) │
//! │                 │            │       ├──► cancelled  (slot released)    │
//! │                 └────────────┴───────┴──► no_show    (slot kept)        │
//! │                                                                         │
//! │   update: pending / confirmed only                                      │
//! │   rate:   any status, 1-5                                               │
//! │   delete: any status, hard delete                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Completion is the only way an appointment produces money. Asking
//! `change_appointment_status` for `completed` runs the same path as
//! `complete_appointment`, so a booking is settled at most once.

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::{active_service, bookable_staff, require_id, session_items, SoldService, NUMBER_ATTEMPTS};
use crate::error::{EngineError, EngineResult};
use crate::Engine;
use salon_core::pricing::{resolve_price, settle};
use salon_core::requests::{BookingRequest, CustomerInput};
use salon_core::schedule::{format_slot, has_conflict};
use salon_core::validation::{
    validate_customer_input, validate_notes, validate_payment_method, validate_price_cents,
    validate_rating, validate_search_query,
};
use salon_core::{
    Appointment, AppointmentStatus, CommissionRate, CoreError, Money, NumberKind, PaymentStatus,
    Session,
};
use salon_db::repository::{appointment, customer, ledger, numbering, session};
use salon_db::LedgerEntry;

/// A booking request after validation.
#[derive(Debug)]
struct CheckedBooking {
    customer: CustomerInput,
    override_price: Option<Money>,
    payment_method: Option<String>,
    notes: Option<String>,
}

impl Engine {
    fn check_booking(&self, req: &BookingRequest) -> EngineResult<CheckedBooking> {
        let customer = validate_customer_input(&req.customer)?;
        require_id("staff_id", &req.staff_id)?;
        require_id("service_id", &req.service_id)?;
        self.grid.check(req.time)?;

        if let Some(cents) = req.override_price_cents {
            validate_price_cents("override_price", cents)?;
        }
        let payment_method = req
            .payment_method
            .as_deref()
            .map(validate_payment_method)
            .transpose()?;

        Ok(CheckedBooking {
            customer,
            override_price: req.override_price_cents.map(Money::from_cents),
            payment_method,
            notes: validate_notes(req.notes.as_deref())?,
        })
    }

    /// Books a new appointment in `pending` status.
    ///
    /// The customer is looked up by phone and created on first visit. The
    /// price, cost and commission are fixed at booking time.
    ///
    /// ## Errors
    /// - `Validation`: bad input, time off the slot grid, inactive staff or
    ///   service
    /// - `NotFound`: unknown staff or service
    /// - `Conflict`: slot already booked, or being booked right now
    pub async fn create_appointment(&self, req: BookingRequest) -> EngineResult<Appointment> {
        debug!(
            staff_id = %req.staff_id,
            date = %req.date,
            time = %format_slot(req.time),
            "create_appointment"
        );

        let checked = self.check_booking(&req)?;

        let _slot = self.locks.try_slot(
            self.config.booking.conflict_mode,
            &req.staff_id,
            req.date,
            req.time,
        )?;
        let today = self.today();
        let _bucket = self.locks.number_bucket(NumberKind::Appointment, today).await?;

        for attempt in 1..=NUMBER_ATTEMPTS {
            if let Some(appt) = self.insert_booking(&req, &checked, today).await? {
                info!(
                    number = %appt.appointment_number,
                    staff = %appt.staff_name,
                    date = %appt.appointment_date,
                    time = %format_slot(appt.appointment_time),
                    price = appt.price_cents,
                    "Appointment created"
                );
                return Ok(appt);
            }
            warn!(attempt, "Appointment number taken by another writer, retrying");
        }

        Err(EngineError::Conflict(
            "Could not reserve an appointment number".to_string(),
        ))
    }

    /// One attempt at the create transaction. `None` means the number was
    /// lost to a concurrent writer and everything was rolled back.
    async fn insert_booking(
        &self,
        req: &BookingRequest,
        checked: &CheckedBooking,
        today: NaiveDate,
    ) -> EngineResult<Option<Appointment>> {
        let mut tx = self.db.begin_write().await?;

        let staff = bookable_staff(&mut tx, &req.staff_id).await?;
        let service = active_service(&mut tx, &req.service_id).await?;

        let booked = appointment::booked_slots(&mut *tx, &staff.id, req.date).await?;
        if has_conflict(
            self.config.booking.conflict_mode,
            req.time,
            service.duration_minutes,
            &booked,
            None,
        ) {
            warn!(staff_id = %staff.id, date = %req.date, time = %format_slot(req.time), "Slot already booked");
            return Err(CoreError::SlotTaken {
                staff_id: staff.id,
                date: req.date.to_string(),
                time: format_slot(req.time),
            }
            .into());
        }

        let now = self.now();
        let customer = customer::find_or_create(&mut tx, &checked.customer, now).await?;
        let quote = resolve_price(&service, &staff, checked.override_price);
        let number = numbering::next_number(&mut *tx, NumberKind::Appointment, today).await?;

        let appt = Appointment {
            id: Uuid::new_v4().to_string(),
            appointment_number: number,
            customer_id: Some(customer.id),
            customer_name: checked.customer.name.clone(),
            customer_phone: checked.customer.phone.clone(),
            staff_id: staff.id,
            staff_name: staff.name,
            service_id: service.id,
            service_name: service.name,
            appointment_date: req.date,
            appointment_time: req.time,
            duration_minutes: quote.duration_minutes,
            status: AppointmentStatus::Pending,
            price_cents: quote.price.cents(),
            cost_cents: quote.cost.cents(),
            commission_rate_bps: quote.commission_rate.bps(),
            commission_cents: quote.commission.cents(),
            payment_method: checked.payment_method.clone(),
            payment_status: PaymentStatus::Unpaid,
            rating: None,
            notes: checked.notes.clone(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        };

        match appointment::insert(&mut *tx, &appt).await {
            Ok(()) => {}
            Err(e) if e.is_number_collision() => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        tx.commit().await?;
        Ok(Some(appt))
    }

    /// Replaces the booking fields of a pending or confirmed appointment.
    ///
    /// The number, status and creation time are kept. Price and commission
    /// are re-resolved against the current menu.
    pub async fn update_appointment(
        &self,
        id: &str,
        req: BookingRequest,
    ) -> EngineResult<Appointment> {
        debug!(id = %id, "update_appointment");

        let checked = self.check_booking(&req)?;

        let _appt = self.locks.try_appointment(id)?;
        let _slot = self.locks.try_slot(
            self.config.booking.conflict_mode,
            &req.staff_id,
            req.date,
            req.time,
        )?;

        let mut tx = self.db.begin_write().await?;

        let current = appointment::fetch(&mut *tx, id)
            .await?
            .ok_or_else(|| EngineError::not_found("Appointment", id))?;
        if current.status.is_terminal() {
            return Err(CoreError::AlreadyFinal {
                number: current.appointment_number,
                status: current.status.to_string(),
            }
            .into());
        }

        let staff = bookable_staff(&mut tx, &req.staff_id).await?;
        let service = active_service(&mut tx, &req.service_id).await?;

        let booked = appointment::booked_slots(&mut *tx, &staff.id, req.date).await?;
        if has_conflict(
            self.config.booking.conflict_mode,
            req.time,
            service.duration_minutes,
            &booked,
            Some(id),
        ) {
            warn!(id = %id, staff_id = %staff.id, date = %req.date, time = %format_slot(req.time), "Slot already booked");
            return Err(CoreError::SlotTaken {
                staff_id: staff.id,
                date: req.date.to_string(),
                time: format_slot(req.time),
            }
            .into());
        }

        let now = self.now();
        let customer = customer::find_or_create(&mut tx, &checked.customer, now).await?;
        let quote = resolve_price(&service, &staff, checked.override_price);

        let updated = Appointment {
            customer_id: Some(customer.id),
            customer_name: checked.customer.name.clone(),
            customer_phone: checked.customer.phone.clone(),
            staff_id: staff.id,
            staff_name: staff.name,
            service_id: service.id,
            service_name: service.name,
            appointment_date: req.date,
            appointment_time: req.time,
            duration_minutes: quote.duration_minutes,
            price_cents: quote.price.cents(),
            cost_cents: quote.cost.cents(),
            commission_rate_bps: quote.commission_rate.bps(),
            commission_cents: quote.commission.cents(),
            payment_method: checked.payment_method.clone(),
            notes: checked.notes.clone(),
            updated_at: now,
            ..current
        };

        appointment::update_booking(&mut *tx, &updated).await?;
        tx.commit().await?;

        info!(number = %updated.appointment_number, "Appointment updated");
        Ok(updated)
    }

    /// Moves an appointment along its lifecycle.
    ///
    /// `Completed` settles the appointment exactly like
    /// [`Engine::complete_appointment`] with the stored payment method.
    pub async fn change_appointment_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> EngineResult<Appointment> {
        debug!(id = %id, status = %status, "change_appointment_status");

        if status == AppointmentStatus::Completed {
            self.complete_appointment(id, None).await?;
            return self.get_appointment(id).await;
        }

        let _appt = self.locks.try_appointment(id)?;
        let mut tx = self.db.begin_write().await?;

        let current = appointment::fetch(&mut *tx, id)
            .await?
            .ok_or_else(|| EngineError::not_found("Appointment", id))?;

        if !current.status.can_transition_to(status) {
            let err = if current.status.is_terminal() {
                CoreError::AlreadyFinal {
                    number: current.appointment_number,
                    status: current.status.to_string(),
                }
            } else {
                CoreError::InvalidTransition {
                    number: current.appointment_number,
                    from: current.status.to_string(),
                    to: status.to_string(),
                }
            };
            return Err(err.into());
        }

        let now = self.now();
        appointment::set_status(&mut *tx, id, current.status, status, now).await?;
        tx.commit().await?;

        info!(
            number = %current.appointment_number,
            from = %current.status,
            to = %status,
            "Appointment status changed"
        );

        Ok(Appointment {
            status,
            updated_at: now,
            ..current
        })
    }

    /// Completes a pending or confirmed appointment and settles it.
    ///
    /// ## What Happens (one transaction)
    /// 1. One-line settlement from the prices stored on the appointment
    /// 2. Session `SES-YYYYMMDD-NNN` inserted with its single item
    /// 3. Appointment marked completed and paid
    /// 4. Customer, staff and service counters updated
    ///
    /// `payment_method` falls back to the one stored on the appointment,
    /// then to the configured default.
    ///
    /// ## Errors
    /// - `InvalidState`: already completed, cancelled or no-show
    /// - `Conflict`: the appointment is being modified by another request
    pub async fn complete_appointment(
        &self,
        id: &str,
        payment_method: Option<String>,
    ) -> EngineResult<Session> {
        debug!(id = %id, "complete_appointment");

        let payment_method = payment_method
            .as_deref()
            .map(validate_payment_method)
            .transpose()?;

        let _appt = self.locks.try_appointment(id)?;
        let today = self.today();
        let _bucket = self.locks.number_bucket(NumberKind::Session, today).await?;

        for attempt in 1..=NUMBER_ATTEMPTS {
            if let Some(session) = self
                .settle_appointment(id, payment_method.as_deref(), today)
                .await?
            {
                info!(
                    session = %session.session_number,
                    appointment_id = %id,
                    final_price = session.final_price_cents,
                    points_earned = session.loyalty_points_earned,
                    "Appointment completed"
                );
                return Ok(session);
            }
            warn!(attempt, "Session number taken by another writer, retrying");
        }

        Err(EngineError::Conflict(
            "Could not reserve a session number".to_string(),
        ))
    }

    async fn settle_appointment(
        &self,
        id: &str,
        payment_method: Option<&str>,
        today: NaiveDate,
    ) -> EngineResult<Option<Session>> {
        let mut tx = self.db.begin_write().await?;

        let appt = appointment::fetch(&mut *tx, id)
            .await?
            .ok_or_else(|| EngineError::not_found("Appointment", id))?;
        if !appt.status.can_transition_to(AppointmentStatus::Completed) {
            return Err(CoreError::AlreadyFinal {
                number: appt.appointment_number,
                status: appt.status.to_string(),
            }
            .into());
        }

        let payment_method = payment_method
            .or(appt.payment_method.as_deref())
            .unwrap_or(self.config.shop.default_payment_method.as_str())
            .to_string();

        let sold = [SoldService {
            service_id: appt.service_id.clone(),
            service_name: appt.service_name.clone(),
            price: Money::from_cents(appt.price_cents),
            cost: Money::from_cents(appt.cost_cents),
            commission_rate: Some(CommissionRate::from_bps(appt.commission_rate_bps)),
            duration_minutes: appt.duration_minutes,
        }];
        let lines: Vec<_> = sold.iter().map(SoldService::line).collect();
        let settlement = settle(&lines, None, Money::zero(), 0, 0, &self.policy)?;

        let now = self.now();
        let session_id = Uuid::new_v4().to_string();
        let number = numbering::next_number(&mut *tx, NumberKind::Session, today).await?;

        let record = Session {
            id: session_id.clone(),
            session_number: number,
            appointment_id: Some(appt.id.clone()),
            customer_id: appt.customer_id.clone(),
            customer_name: appt.customer_name.clone(),
            customer_phone: Some(appt.customer_phone.clone()),
            staff_id: appt.staff_id.clone(),
            staff_name: appt.staff_name.clone(),
            total_price_cents: settlement.total_price.cents(),
            total_cost_cents: settlement.total_cost.cents(),
            total_commission_cents: settlement.total_commission.cents(),
            discount_cents: settlement.discount.cents(),
            loyalty_points_used: settlement.points_redeemed,
            redemption_cents: settlement.redemption_value.cents(),
            final_price_cents: settlement.final_price.cents(),
            loyalty_points_earned: settlement.points_earned,
            payment_method: payment_method.clone(),
            total_duration_minutes: appt.duration_minutes,
            check_in: now,
            check_out: now,
            business_date: today,
            notes: appt.notes.clone(),
            created_at: now,
            items: session_items(&session_id, &sold, &settlement),
        };

        match session::insert(&mut tx, &record).await {
            Ok(()) => {}
            Err(e) if e.is_number_collision() => return Ok(None),
            Err(e) => return Err(e.into()),
        }

        appointment::mark_completed(&mut *tx, &appt.id, &payment_method, now).await?;
        ledger::apply(
            &mut tx,
            &LedgerEntry {
                customer_id: appt.customer_id.as_deref(),
                staff_id: &appt.staff_id,
                final_price_cents: record.final_price_cents,
                points_delta: settlement.points_delta(),
                service_ids: vec![appt.service_id.as_str()],
                at: now,
            },
        )
        .await?;

        tx.commit().await?;
        Ok(Some(record))
    }

    /// Hard-deletes an appointment in any status. A session it produced is
    /// kept and loses the reference.
    pub async fn delete_appointment(&self, id: &str) -> EngineResult<()> {
        debug!(id = %id, "delete_appointment");

        let _appt = self.locks.try_appointment(id)?;
        self.db.appointments().delete(id).await?;

        info!(id = %id, "Appointment deleted");
        Ok(())
    }

    /// Appointments on `date` (every date when `None`) whose number,
    /// customer name or phone contains `search`.
    pub async fn list_appointments(
        &self,
        date: Option<NaiveDate>,
        search: &str,
    ) -> EngineResult<Vec<Appointment>> {
        let search = validate_search_query(search)?;
        Ok(self.db.appointments().list(date, &search).await?)
    }

    pub async fn get_appointment(&self, id: &str) -> EngineResult<Appointment> {
        self.db
            .appointments()
            .get_by_id(id)
            .await?
            .ok_or_else(|| EngineError::not_found("Appointment", id))
    }

    pub async fn get_appointment_by_number(&self, number: &str) -> EngineResult<Appointment> {
        self.db
            .appointments()
            .get_by_number(number.trim())
            .await?
            .ok_or_else(|| EngineError::not_found("Appointment", number))
    }

    /// Records a 1-5 customer rating.
    pub async fn rate_appointment(&self, id: &str, rating: u8) -> EngineResult<()> {
        validate_rating(rating)?;
        self.db.appointments().set_rating(id, rating).await?;

        info!(id = %id, rating, "Appointment rated");
        Ok(())
    }

    /// Every bookable slot label of the day ("09:00", "09:15", ...).
    pub fn time_slots(&self) -> Vec<String> {
        self.grid.slots().into_iter().map(format_slot).collect()
    }

    /// Slot labels on `date` where `staff_id` can still be booked.
    ///
    /// In overlap mode a slot counts as free when a booking one slot long
    /// would fit there.
    pub async fn available_slots(&self, staff_id: &str, date: NaiveDate) -> EngineResult<Vec<String>> {
        require_id("staff_id", staff_id)?;
        self.db
            .staff()
            .get_by_id(staff_id)
            .await?
            .ok_or_else(|| EngineError::not_found("Staff", staff_id))?;

        let booked = self.db.appointments().booked_slots(staff_id, date).await?;
        let mode = self.config.booking.conflict_mode;
        let length = i64::from(self.config.booking.slot_minutes);

        Ok(self
            .grid
            .slots()
            .into_iter()
            .filter(|slot| !has_conflict(mode, *slot, length, &booked, None))
            .map(format_slot)
            .collect())
    }

    /// The session produced by completing `appointment_id`, if it has been
    /// completed.
    pub async fn get_session_for_appointment(
        &self,
        appointment_id: &str,
    ) -> EngineResult<Option<Session>> {
        Ok(self.db.sessions().get_by_appointment(appointment_id).await?)
    }

    pub async fn get_session_by_number(&self, number: &str) -> EngineResult<Session> {
        self.db
            .sessions()
            .get_by_number(number.trim())
            .await?
            .ok_or_else(|| EngineError::not_found("Session", number))
    }

    /// Sessions reported under `date`, newest first, without their items.
    pub async fn list_sessions(&self, date: NaiveDate) -> EngineResult<Vec<Session>> {
        Ok(self.db.sessions().list_for_date(date).await?)
    }
}
