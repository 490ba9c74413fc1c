//! Shared fixtures for integration tests
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use salon_server::db::DbService;
use salon_server::db::repository::{customer, service, shop, staff};
use salon_server::scheduling::Caller;
use shared::models::{AppointmentCreate, CommissionType, NewCustomer, Role};

pub struct Shop {
    pub db: DbService,
    pub tenant_id: i64,
    pub owner: Caller,
    /// 40% commission
    pub ana: i64,
    /// fixed 120 commission
    pub bo: i64,
    /// 800 / 30 min
    pub cut: i64,
    /// 500 / 20 min
    pub beard: i64,
    pub customer_id: i64,
}

impl Shop {
    pub fn barber(&self, staff_id: i64) -> Caller {
        Caller::new(staff_id, self.tenant_id, Role::Barber)
    }
}

pub async fn seed(db: DbService) -> Shop {
    let mut conn = db.pool.acquire().await.unwrap();
    let shop = shop::create(&mut conn, "Northside Barbers").await.unwrap();
    let ana = staff::create(
        &mut conn,
        shop.id,
        staff::StaffCreate {
            name: "Ana".into(),
            role: Role::Barber,
            commission_type: Some(CommissionType::Percentage),
            commission_value: Decimal::from(40),
        },
    )
    .await
    .unwrap();
    let bo = staff::create(
        &mut conn,
        shop.id,
        staff::StaffCreate {
            name: "Bo".into(),
            role: Role::Barber,
            commission_type: Some(CommissionType::Fixed),
            commission_value: Decimal::from(120),
        },
    )
    .await
    .unwrap();
    let cut = service::create(&mut conn, shop.id, "Haircut", Decimal::from(800), 30)
        .await
        .unwrap();
    let beard = service::create(&mut conn, shop.id, "Beard trim", Decimal::from(500), 20)
        .await
        .unwrap();
    let regular = customer::create(
        &mut conn,
        shop.id,
        &NewCustomer {
            name: "Marco".into(),
            phone: Some("555-0101".into()),
            notes: None,
        },
    )
    .await
    .unwrap();
    drop(conn);

    Shop {
        owner: Caller::new(1, shop.id, Role::Owner),
        tenant_id: shop.id,
        ana: ana.id,
        bo: bo.id,
        cut: cut.id,
        beard: beard.id,
        customer_id: regular.id,
        db,
    }
}

pub async fn in_memory_shop() -> Shop {
    seed(DbService::in_memory().await.unwrap()).await
}

pub fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 10, h, m, 0).unwrap()
}

pub fn booking(staff_id: i64, service_ids: Vec<i64>, start: DateTime<Utc>) -> AppointmentCreate {
    AppointmentCreate {
        staff_id,
        customer_id: None,
        new_customer: None,
        service_ids,
        start_at: start,
        duration_minutes: None,
        total_price: None,
        notes: None,
    }
}
