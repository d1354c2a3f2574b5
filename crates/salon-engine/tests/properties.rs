//! End-to-end booking and settlement properties, driven only through the
//! public `Engine` API.

use chrono::{Local, NaiveDate, NaiveTime};

use salon_core::requests::{BookingRequest, CheckoutRequest, CustomerInput, ServiceInput, StaffInput};
use salon_core::{AppointmentStatus, Service, Staff};
use salon_engine::{Engine, EngineConfig, ErrorCode};

struct Shop {
    engine: Engine,
    ali: Staff,
    haircut: Service,
}

async fn shop() -> Shop {
    let engine = Engine::open_in_memory(EngineConfig::default()).await.unwrap();

    let ali = engine
        .add_staff(StaffInput {
            name: "Ali".to_string(),
            phone: None,
            specialization: None,
            commission_rate_bps: Some(3500),
            status: None,
        })
        .await
        .unwrap();
    let haircut = add_service(&engine, "Haircut", 5000, 500, Some(3000)).await;

    Shop { engine, ali, haircut }
}

async fn add_service(
    engine: &Engine,
    name: &str,
    price_cents: i64,
    cost_cents: i64,
    commission_rate_bps: Option<u32>,
) -> Service {
    engine
        .add_service(ServiceInput {
            name: name.to_string(),
            category: "Hair".to_string(),
            description: None,
            duration_minutes: 30,
            price_cents,
            cost_cents,
            commission_rate_bps,
        })
        .await
        .unwrap()
}

fn customer(name: &str, phone: &str) -> CustomerInput {
    CustomerInput {
        name: name.to_string(),
        phone: phone.to_string(),
        email: None,
        notes: None,
    }
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
}

fn ten() -> NaiveTime {
    NaiveTime::from_hms_opt(10, 0, 0).unwrap()
}

fn book(shop: &Shop, who: CustomerInput, time: NaiveTime) -> BookingRequest {
    BookingRequest {
        customer: who,
        staff_id: shop.ali.id.clone(),
        service_id: shop.haircut.id.clone(),
        date: date(),
        time,
        override_price_cents: None,
        payment_method: None,
        notes: None,
    }
}

#[tokio::test]
async fn test_one_active_appointment_per_slot() {
    let shop = shop().await;

    let first = shop
        .engine
        .create_appointment(book(&shop, customer("Omar", "03001234567"), ten()))
        .await
        .unwrap();

    let err = shop
        .engine
        .create_appointment(book(&shop, customer("Bilal", "03119876543"), ten()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Conflict);

    let eleven = NaiveTime::from_hms_opt(11, 0, 0).unwrap();
    let second = shop
        .engine
        .create_appointment(book(&shop, customer("Bilal", "03119876543"), eleven))
        .await
        .unwrap();

    let err = shop
        .engine
        .update_appointment(&second.id, book(&shop, customer("Bilal", "03119876543"), ten()))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::Conflict);

    // once cancelled, the slot is free again
    shop.engine
        .change_appointment_status(&first.id, AppointmentStatus::Cancelled)
        .await
        .unwrap();
    shop.engine
        .update_appointment(&second.id, book(&shop, customer("Bilal", "03119876543"), ten()))
        .await
        .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_racing_bookings_produce_one_appointment() {
    let shop = shop().await;

    let mut handles = Vec::new();
    for i in 0..8 {
        let engine = shop.engine.clone();
        let req = book(&shop, customer("Racer", &format!("0300555000{i}")), ten());
        handles.push(tokio::spawn(async move { engine.create_appointment(req).await }));
    }

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => winners += 1,
            Err(e) => assert_eq!(e.code(), ErrorCode::Conflict),
        }
    }
    assert_eq!(winners, 1);
    assert_eq!(shop.engine.list_appointments(Some(date()), "").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_completing_twice_yields_one_session() {
    let shop = shop().await;
    let appt = shop
        .engine
        .create_appointment(book(&shop, customer("Omar", "03001234567"), ten()))
        .await
        .unwrap();

    let session = shop.engine.complete_appointment(&appt.id, None).await.unwrap();
    let err = shop.engine.complete_appointment(&appt.id, None).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidState);

    let sessions = shop.engine.list_sessions(session.business_date).await.unwrap();
    assert_eq!(sessions.len(), 1);
}

#[tokio::test]
async fn test_serial_numbers_count_up_per_day() {
    let shop = shop().await;
    let prefix = format!("APP-{}", Local::now().date_naive().format("%Y%m%d"));

    let mut numbers = Vec::new();
    for (i, hour) in [9, 10, 11].into_iter().enumerate() {
        let time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap();
        let who = customer("Omar", &format!("0300123456{i}"));
        let appt = shop.engine.create_appointment(book(&shop, who, time)).await.unwrap();
        numbers.push(appt.appointment_number);
    }

    assert_eq!(
        numbers,
        vec![
            format!("{prefix}-001"),
            format!("{prefix}-002"),
            format!("{prefix}-003"),
        ]
    );
}

#[tokio::test]
async fn test_created_appointment_reads_back_unchanged() {
    let shop = shop().await;
    let mut req = book(&shop, customer("Omar", "03001234567"), ten());
    req.notes = Some("first visit".to_string());
    req.payment_method = Some("card".to_string());

    let created = shop.engine.create_appointment(req).await.unwrap();
    let fetched = shop
        .engine
        .get_appointment_by_number(&created.appointment_number)
        .await
        .unwrap();
    assert_eq!(fetched, created);
}

#[tokio::test]
async fn test_settlement_examples() {
    let shop = shop().await;
    let wash = add_service(&shop.engine, "Hair Wash", 3000, 300, None).await;
    let trim = add_service(&shop.engine, "Eyebrow Trim", 4000, 0, None).await;

    // {50, 5, 30%} + {30, 3, staff 35%}
    let session = shop
        .engine
        .checkout_walk_in(CheckoutRequest {
            customer: customer("Omar", "03001234567"),
            staff_id: shop.ali.id.clone(),
            service_ids: vec![shop.haircut.id.clone(), wash.id.clone()],
            discount_cents: 0,
            points_to_redeem: 0,
            payment_method: None,
            notes: None,
        })
        .await
        .unwrap();
    assert_eq!(session.total_price_cents, 8000);
    assert_eq!(session.total_cost_cents, 800);
    assert_eq!(session.total_commission_cents, 2550);
    assert_eq!(session.final_price_cents, 8000);

    // a discount bigger than the bill floors at zero
    let session = shop
        .engine
        .checkout_walk_in(CheckoutRequest {
            customer: customer("Omar", "03001234567"),
            staff_id: shop.ali.id.clone(),
            service_ids: vec![trim.id.clone()],
            discount_cents: 100_000,
            points_to_redeem: 0,
            payment_method: None,
            notes: None,
        })
        .await
        .unwrap();
    assert_eq!(session.final_price_cents, 0);
    assert_eq!(session.loyalty_points_earned, 0);
}

#[tokio::test]
async fn test_checkout_moves_balance_by_earned_minus_redeemed() {
    let shop = shop().await;
    let omar = customer("Omar", "03001234567");

    // 50.00 earns 5 points
    let checkout = |service: &Service, redeem: i64| CheckoutRequest {
        customer: omar.clone(),
        staff_id: shop.ali.id.clone(),
        service_ids: vec![service.id.clone()],
        discount_cents: 0,
        points_to_redeem: redeem,
        payment_method: None,
        notes: None,
    };
    shop.engine.checkout_walk_in(checkout(&shop.haircut, 0)).await.unwrap();
    let before = shop.engine.search_customers("Omar", 1).await.unwrap()[0].loyalty_points;
    assert_eq!(before, 5);

    // 102.00 - 4 points (2.00) = 100.00, earning 10
    let package = add_service(&shop.engine, "Groom Package", 10200, 1000, None).await;
    let session = shop.engine.checkout_walk_in(checkout(&package, 4)).await.unwrap();
    assert_eq!(session.loyalty_points_earned, 10);

    let after = shop.engine.search_customers("Omar", 1).await.unwrap()[0].loyalty_points;
    assert_eq!(after - before, 6);
}
