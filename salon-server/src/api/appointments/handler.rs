//! Appointment API handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use http::StatusCode;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppResult;
use shared::models::{
    Appointment, AppointmentCreate, AppointmentFilter, AppointmentReschedule,
    AppointmentStatusChange, AppointmentUpdate, Payment, PendingPaymentCreate,
};

/// POST /api/appointments - book an appointment
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<AppointmentCreate>,
) -> AppResult<(StatusCode, Json<Appointment>)> {
    let appt = state
        .scheduling
        .book_appointment(&user.caller(), payload)
        .await?;
    Ok((StatusCode::CREATED, Json(appt)))
}

/// GET /api/appointments?from=&to=&staff_id=&status=&payment_status=&limit=&offset=
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(filter): Query<AppointmentFilter>,
) -> AppResult<Json<Vec<Appointment>>> {
    let appts = state
        .scheduling
        .list_appointments(&user.caller(), filter)
        .await?;
    Ok(Json(appts))
}

/// GET /api/appointments/{id}
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Appointment>> {
    let appt = state.scheduling.get_appointment(&user.caller(), id).await?;
    Ok(Json(appt))
}

/// PATCH /api/appointments/{id}
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<AppointmentUpdate>,
) -> AppResult<Json<Appointment>> {
    let appt = state
        .scheduling
        .edit_appointment(&user.caller(), id, payload)
        .await?;
    Ok(Json(appt))
}

/// PUT /api/appointments/{id}/time
pub async fn reschedule(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<AppointmentReschedule>,
) -> AppResult<Json<Appointment>> {
    let appt = state
        .scheduling
        .move_appointment(&user.caller(), id, payload)
        .await?;
    Ok(Json(appt))
}

/// PUT /api/appointments/{id}/status
pub async fn change_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<AppointmentStatusChange>,
) -> AppResult<Json<Appointment>> {
    let appt = state
        .scheduling
        .change_status(&user.caller(), id, payload)
        .await?;
    Ok(Json(appt))
}

/// POST /api/appointments/{id}/cancel
pub async fn cancel(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Json<Appointment>> {
    let appt = state
        .scheduling
        .cancel_appointment(&user.caller(), id)
        .await?;
    Ok(Json(appt))
}

/// DELETE /api/appointments/{id}
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state
        .scheduling
        .delete_appointment(&user.caller(), id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/appointments/{id}/payment-intent
pub async fn register_payment_intent(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(payload): Json<PendingPaymentCreate>,
) -> AppResult<(StatusCode, Json<Payment>)> {
    let payment = state
        .scheduling
        .register_pending_payment(&user.caller(), id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}
